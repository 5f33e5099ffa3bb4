use chrono::Local;
use log::{error, info, warn};

use crate::detector;
use crate::error::Error;
use crate::feed::{FeedEntry, FeedSource};
use crate::notifier::{Dispatcher, Report};
use crate::snapshot::SnapshotStore;

#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing was notified or saved; the stored snapshot stays as it was.
    FetchFailed(Error),
    Completed {
        new_entries: Vec<FeedEntry>,
        reports: Vec<(&'static str, Report)>,
        saved: bool,
    },
}

/// One poll: fetch, compare with the stored snapshot, notify, store.
pub struct Monitor<S> {
    source: S,
    store: SnapshotStore,
    dispatcher: Dispatcher,
}

impl<S: FeedSource> Monitor<S> {
    pub fn new(source: S, store: SnapshotStore, dispatcher: Dispatcher) -> Self {
        Self {
            source,
            store,
            dispatcher,
        }
    }

    pub async fn run(&self) -> RunOutcome {
        info!("notice monitor started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

        let current = match self.source.fetch().await {
            Ok(current) => current,
            Err(err) => {
                error!("{}, giving up this run", err);
                return RunOutcome::FetchFailed(err);
            }
        };

        let previous = self.store.load().await;
        let new_entries = detector::diff(previous.as_ref(), &current);

        // Notifications go out before the snapshot is replaced: a crash in
        // between repeats them on the next run instead of losing them.
        let reports = if new_entries.is_empty() {
            info!("no new notices");
            Vec::new()
        } else {
            info!("found {} new notice(s)", new_entries.len());
            self.dispatcher.notify(&new_entries).await
        };

        let saved = match self.store.save(&current).await {
            Ok(()) => true,
            Err(err) => {
                warn!("{}", err);
                false
            }
        };

        info!("notice monitor finished at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        RunOutcome::Completed {
            new_entries,
            reports,
            saved,
        }
    }
}
