//! Cursor pagination over newest-first feeds.
//!
//! A [`Feed`] hands out pages of records in descending identifier order; the
//! next page is requested with a [`Cursor`] one below the last identifier
//! seen. Three walks are built on top of that:
//!
//! - [`collect_window`]: keep records inside a [`Window`], flushing to the sink
//!   every `flush_every` records (or once at the end), optionally capped.
//! - [`collect_daily`]: keep up to a quota of records per UTC calendar day.
//! - [`collect_all`]: keep everything until the feed runs dry.
//!
//! All three share the state machine in [`walk`] and report what happened
//! through a [`WalkReport`].
pub mod daily;
pub mod error;
pub mod exhaust;
pub mod feed;
pub mod sink;
pub mod stream;
pub mod walk;
pub mod window;

pub use daily::{DailyOptions, collect_daily};
pub use error::{PagerError, SinkError};
pub use exhaust::collect_all;
pub use feed::{Cursor, Feed, Record, RecordId, Timestamped};
pub use sink::{CsvSink, MemorySink, RecordSink};
pub use stream::{StreamOptions, collect_window};
pub use walk::{Completion, StopReason, WalkReport};
pub use window::Window;
