use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fetch feed: {0}")]
    Fetch(String),
    #[error("load snapshot {}: {reason}", path.display())]
    SnapshotLoad { path: PathBuf, reason: String },
    #[error("save snapshot {}: {reason}", path.display())]
    SnapshotSave { path: PathBuf, reason: String },
    #[error("{channel} is not configured: missing {missing}")]
    ChannelConfig {
        channel: &'static str,
        missing: &'static str,
    },
    #[error("{channel} delivery failed: {reason}")]
    Delivery {
        channel: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
