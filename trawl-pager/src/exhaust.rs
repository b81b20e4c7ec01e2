//! Unfiltered walk used for follower lists.
use crate::error::PagerError;
use crate::feed::Feed;
use crate::sink::RecordSink;
use crate::walk::{self, Completion, Policy, StopReason, Verdict, WalkReport};

struct KeepAll<T> {
    all: Vec<T>,
}

impl<T> Policy<T> for KeepAll<T> {
    fn offer(&mut self, item: T) -> Verdict {
        self.all.push(item);
        Verdict::Keep
    }

    fn take_ready(&mut self) -> Vec<Vec<T>> {
        Vec::new()
    }

    fn take_remaining(&mut self) -> Vec<Vec<T>> {
        vec![std::mem::take(&mut self.all)]
    }

    fn completion(&self, _stop: StopReason) -> Completion {
        Completion::Done
    }
}

/// Read `feed` until it returns an empty page and write everything in one
/// batch. Memory is unbounded: only use this for small feeds such as
/// follower lists.
///
/// Pages must still be in descending id order, as for the windowed walks:
/// the next cursor is derived from the last id. A feed sorted by anything
/// else (Mastodon orders followers by follow time, not account id) fails
/// with [`PagerError::OutOfOrder`] as soon as an id goes up, and nothing is
/// written.
pub async fn collect_all<F, S>(
    feed: &F,
    page_size: u32,
    sink: &mut S,
) -> Result<WalkReport, PagerError>
where
    F: Feed,
    S: RecordSink<F::Item> + ?Sized,
{
    walk::run(feed, page_size, KeepAll { all: Vec::new() }, sink).await
}
