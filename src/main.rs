mod cli;
mod config;
mod detector;
mod error;
mod feed;
mod monitor;
mod notifier;
mod snapshot;
#[cfg(test)]
mod testing;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use feed::HttpFeedSource;
use log::{debug, info, warn};
use monitor::{Monitor, RunOutcome};
use notifier::{Dispatcher, Report};
use snapshot::SnapshotStore;

fn print_welcome() {
    println!("--------------------------------");
    println!("蓝桥杯通知监控系统");
    println!("By W1ndys");
    println!("开源地址：https://github.com/W1ndys/BlueBridgeCupNoticeMonitor");
    println!("--------------------------------");
}

fn log_reports(reports: &[(&'static str, Report)]) {
    for (name, report) in reports {
        match report {
            Report::Skipped => debug!("{} is disabled", name),
            Report::ConfigError(_) => {}
            Report::Delivered(deliveries) => {
                info!("{}: {} sent, {} failed", name, report.sent(), report.failed());
                let failed: Vec<&str> = deliveries
                    .iter()
                    .filter(|d| d.result.is_err())
                    .map(|d| d.entry_id.as_str())
                    .collect();
                if !failed.is_empty() {
                    info!("{}: undelivered notices {:?}", name, failed);
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if !args.no_banner {
        print_welcome();
    }

    let mut config = config::load(args.config.as_deref()).await?;
    config.apply_env(|key| env::var(key).ok());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.feed.timeout_secs))
        .build()
        .context("build http client")?;
    let dispatcher = Dispatcher::from_config(&client, &config);

    if args.test_notification {
        info!("sending test notification");
        log_reports(&dispatcher.send_test(&config.feed.url).await);
        return Ok(());
    }

    let store = SnapshotStore::new(
        args.data_file
            .or_else(|| config.snapshot.path.clone())
            .unwrap_or_else(SnapshotStore::default_path),
    );
    debug!("snapshot file {}", store.path().display());

    let monitor = Monitor::new(
        HttpFeedSource::new(client, config.feed.url.clone()),
        store,
        dispatcher,
    );
    match monitor.run().await {
        RunOutcome::Completed {
            new_entries,
            reports,
            saved,
        } => {
            log_reports(&reports);
            if !saved {
                warn!("{} new notice(s) may be reported again next run", new_entries.len());
            }
        }
        RunOutcome::FetchFailed(err) => debug!("run aborted: {:?}", err),
    }

    Ok(())
}
