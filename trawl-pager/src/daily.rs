//! Per-day reservoir: up to `quota` records for every UTC date in a window.
use crate::error::PagerError;
use crate::feed::{Feed, Timestamped};
use crate::sink::RecordSink;
use crate::walk::{self, Completion, Policy, StopReason, Verdict, WalkReport};
use crate::window::{Window, utc_date};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyOptions {
    pub page_size: u32,
    pub quota: NonZeroUsize,
}

struct DailyPolicy<T> {
    window: Window,
    quota: usize,
    /// Dates still accepting records.
    needed: BTreeSet<Date>,
    buckets: BTreeMap<Date, Vec<T>>,
    ready: Vec<Vec<T>>,
}

impl<T> DailyPolicy<T> {
    fn new(window: Window, quota: usize) -> Self {
        Self {
            needed: window.days(),
            window,
            quota,
            buckets: BTreeMap::new(),
            ready: Vec::new(),
        }
    }
}

impl<T: Timestamped> Policy<T> for DailyPolicy<T> {
    fn offer(&mut self, item: T) -> Verdict {
        let ts = item.timestamp();
        if self.window.is_behind(ts) {
            self.needed.clear();
            return Verdict::Stop(StopReason::PassedWindow);
        }
        let day = utc_date(ts);
        if !self.needed.contains(&day) || !self.window.contains(ts) {
            return Verdict::Skip;
        }

        let bucket = self.buckets.entry(day).or_default();
        bucket.push(item);
        if bucket.len() < self.quota {
            return Verdict::Keep;
        }

        if let Some(full) = self.buckets.remove(&day) {
            self.ready.push(full);
        }
        self.needed.remove(&day);
        tracing::debug!(%day, quota = self.quota, remaining = self.needed.len(), "daily.bucket_full");
        if self.needed.is_empty() {
            Verdict::KeepAndStop(StopReason::QuotasFilled)
        } else {
            Verdict::Flush
        }
    }

    fn take_ready(&mut self) -> Vec<Vec<T>> {
        std::mem::take(&mut self.ready)
    }

    fn take_remaining(&mut self) -> Vec<Vec<T>> {
        let mut out = std::mem::take(&mut self.ready);
        // partial buckets, oldest date first
        out.extend(std::mem::take(&mut self.buckets).into_values());
        out
    }

    fn completion(&self, stop: StopReason) -> Completion {
        if stop == StopReason::FeedExhausted && !self.needed.is_empty() {
            Completion::PartialDone
        } else {
            Completion::Done
        }
    }

    fn unfilled_days(&self) -> Vec<Date> {
        self.needed.iter().copied().collect()
    }
}

/// Collect up to `opts.quota` records for every UTC date spanned by `window`.
///
/// A day's bucket is written to `sink` the moment it fills and is then
/// closed. The walk ends when every day is full, when the feed pages past
/// `window.since()`, or when the feed runs out. Buckets that never filled are
/// still written at the end; if the feed ran out while days were still open,
/// the report is [`Completion::PartialDone`] and lists them in
/// [`WalkReport::unfilled_days`].
pub async fn collect_daily<F, S>(
    feed: &F,
    window: &Window,
    opts: &DailyOptions,
    sink: &mut S,
) -> Result<WalkReport, PagerError>
where
    F: Feed,
    F::Item: Timestamped,
    S: RecordSink<F::Item> + ?Sized,
{
    let policy = DailyPolicy::new(*window, opts.quota.get());
    walk::run(feed, opts.page_size, policy, sink).await
}
