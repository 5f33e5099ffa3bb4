use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the config file. Defaults to "notice-monitor.toml" next to
    /// the executable, which is silently skipped when it does not exist.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where the last seen feed is stored. Overrides the config file.
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Send a test message to every enabled channel and exit without
    /// polling the feed.
    #[arg(long)]
    pub test_notification: bool,

    /// Do not print the welcome banner.
    #[arg(long)]
    pub no_banner: bool,
}
