//! Time-windowed collection with optional periodic flushing and a record cap.
use crate::error::PagerError;
use crate::feed::{Feed, Timestamped};
use crate::sink::RecordSink;
use crate::walk::{self, Completion, Policy, StopReason, Verdict, WalkReport};
use crate::window::Window;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub page_size: u32,
    /// Write to the sink whenever this many records are buffered. `None`
    /// writes everything in one batch when the walk ends.
    pub flush_every: Option<NonZeroUsize>,
    /// Stop once this many records were kept.
    pub max_records: Option<NonZeroUsize>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            page_size: 40,
            flush_every: None,
            max_records: None,
        }
    }
}

struct WindowPolicy<T> {
    window: Window,
    flush_every: Option<usize>,
    max_records: Option<usize>,
    buffer: Vec<T>,
    kept: usize,
}

impl<T: Timestamped> Policy<T> for WindowPolicy<T> {
    fn offer(&mut self, item: T) -> Verdict {
        let ts = item.timestamp();
        if self.window.is_behind(ts) {
            return Verdict::Stop(StopReason::PassedWindow);
        }
        if !self.window.contains(ts) {
            // newer than `until`; older records may still qualify
            return Verdict::Skip;
        }

        self.buffer.push(item);
        self.kept += 1;
        if self.max_records.is_some_and(|cap| self.kept >= cap) {
            return Verdict::KeepAndStop(StopReason::MaxRecords);
        }
        match self.flush_every {
            Some(n) if self.buffer.len() >= n => Verdict::Flush,
            _ => Verdict::Keep,
        }
    }

    fn take_ready(&mut self) -> Vec<Vec<T>> {
        vec![std::mem::take(&mut self.buffer)]
    }

    fn take_remaining(&mut self) -> Vec<Vec<T>> {
        vec![std::mem::take(&mut self.buffer)]
    }

    fn completion(&self, stop: StopReason) -> Completion {
        match stop {
            StopReason::FeedExhausted => Completion::PartialDone,
            _ => Completion::Done,
        }
    }
}

/// Collect every record of `feed` inside `window`, newest first.
///
/// The walk stops at the first record older than `window.since()`, when
/// `max_records` records were kept, or when the feed runs out. Running out
/// first is reported as [`Completion::PartialDone`]; whatever was collected
/// is written either way. At most `flush_every` records are held in memory.
pub async fn collect_window<F, S>(
    feed: &F,
    window: &Window,
    opts: &StreamOptions,
    sink: &mut S,
) -> Result<WalkReport, PagerError>
where
    F: Feed,
    F::Item: Timestamped,
    S: RecordSink<F::Item> + ?Sized,
{
    let policy = WindowPolicy {
        window: *window,
        flush_every: opts.flush_every.map(NonZeroUsize::get),
        max_records: opts.max_records.map(NonZeroUsize::get),
        buffer: Vec::new(),
        kept: 0,
    };
    walk::run(feed, opts.page_size, policy, sink).await
}
