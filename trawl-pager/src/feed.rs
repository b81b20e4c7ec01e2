use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Numeric record identifier. Feeds hand records out in descending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// Upper bound (inclusive) for the next page request.
///
/// ```
/// use trawl_pager::{Cursor, RecordId};
///
/// let next = Cursor::after(RecordId(1_000)).unwrap();
/// assert_eq!(next.max_id(), RecordId(999));
/// assert!(Cursor::after(RecordId(0)).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(RecordId);

impl Cursor {
    /// Cursor for the page following a page whose last record was `last`.
    /// `None` when nothing can follow.
    pub fn after(last: RecordId) -> Option<Self> {
        last.0.checked_sub(1).map(|id| Cursor(RecordId(id)))
    }

    pub fn max_id(&self) -> RecordId {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Something a feed yields.
pub trait Record {
    fn id(&self) -> RecordId;
}

/// A record that carries a creation time, required by the windowed walks.
pub trait Timestamped: Record {
    fn timestamp(&self) -> OffsetDateTime;
}

/// A paginated, newest-first source of records.
///
/// `fetch_page(None, n)` returns the newest page. `fetch_page(Some(c), n)`
/// returns up to `n` records with `id <= c.max_id()`. An empty page means the
/// feed is exhausted.
#[async_trait]
pub trait Feed: Send + Sync {
    type Item: Record + Send;

    async fn fetch_page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Vec<Self::Item>, FetchError>;

    /// Short label used in logs.
    fn describe(&self) -> String {
        "feed".to_string()
    }
}
