use crate::feed::RecordId;
use std::path::PathBuf;
use time::OffsetDateTime;

/// Boxed error returned by a [`Feed`](crate::Feed) implementation.
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    #[error("invalid window: since ({since}) is after until ({until})")]
    InvalidWindow {
        since: OffsetDateTime,
        until: OffsetDateTime,
    },

    #[error("invalid option: {0}")]
    InvalidOption(&'static str),

    /// The feed broke its newest-first contract. Continuing would silently
    /// drop records, so the walk aborts.
    #[error("feed returned id {got} after {previous}; pages must be newest-first")]
    OutOfOrder { previous: RecordId, got: RecordId },

    #[error("fetching page failed: {0}")]
    Fetch(#[source] FetchError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding row for {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
