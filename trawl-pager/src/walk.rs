//! The cursor walk shared by every collection mode.
//!
//! The walk is a small state machine:
//!
//! ```text
//! Fetching --empty page--------------------------> Flushing(stop) --> Done | PartialDone
//! Fetching --page--> Filtering --page consumed---> Fetching
//!                    Filtering --batch ready-----> Flushing(resume) --> Filtering
//!                    Filtering --stop event------> Flushing(stop)
//! ```
//!
//! What a record means (keep, skip, stop) is decided by a [`Policy`]; the
//! walk owns the cursor, the ordering check and all sink writes.
use crate::error::PagerError;
use crate::feed::{Cursor, Feed, Record, RecordId};
use crate::sink::RecordSink;
use time::Date;
use tracing::Instrument;
use uuid::Uuid;

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The feed returned an empty page (or no further cursor exists).
    FeedExhausted,
    /// A record older than the window's lower edge was reached.
    PassedWindow,
    /// The global record cap was hit.
    MaxRecords,
    /// Every per-day bucket reached its quota.
    QuotasFilled,
}

/// Whether the requested range was fully covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// The feed ran out first. What was collected has still been written.
    PartialDone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkReport {
    pub pages_fetched: usize,
    pub records_seen: usize,
    pub records_written: usize,
    pub batches_flushed: usize,
    pub stop: StopReason,
    pub completion: Completion,
    /// Per-day walks only: dates still short of quota when the walk ended.
    pub unfilled_days: Vec<Date>,
}

impl WalkReport {
    pub fn is_partial(&self) -> bool {
        self.completion == Completion::PartialDone
    }
}

/// Outcome of offering one record to a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Skip,
    Keep,
    /// Kept, and at least one batch is ready to be written.
    Flush,
    /// Stop walking; the record was not kept.
    Stop(StopReason),
    /// Kept, and it was the last record the walk needs.
    KeepAndStop(StopReason),
}

pub(crate) trait Policy<T> {
    fn offer(&mut self, item: T) -> Verdict;

    /// Batches ready to be written mid-walk.
    fn take_ready(&mut self) -> Vec<Vec<T>>;

    /// Everything still held when the walk ends, in write order.
    fn take_remaining(&mut self) -> Vec<Vec<T>>;

    fn completion(&self, stop: StopReason) -> Completion;

    fn unfilled_days(&self) -> Vec<Date> {
        Vec::new()
    }
}

enum State<T> {
    Fetching,
    Filtering(std::vec::IntoIter<T>),
    Flushing {
        resume: Option<std::vec::IntoIter<T>>,
        stop: Option<StopReason>,
    },
    Done(StopReason),
    PartialDone(StopReason),
}

pub(crate) fn check_page_size(page_size: u32) -> Result<(), PagerError> {
    if page_size == 0 {
        return Err(PagerError::InvalidOption("page_size must be at least 1"));
    }
    Ok(())
}

/// Drive `feed` to completion under `policy`, writing batches to `sink`.
pub(crate) async fn run<F, P, S>(
    feed: &F,
    page_size: u32,
    policy: P,
    sink: &mut S,
) -> Result<WalkReport, PagerError>
where
    F: Feed,
    P: Policy<F::Item>,
    S: RecordSink<F::Item> + ?Sized,
{
    check_page_size(page_size)?;
    let span = tracing::info_span!("walk", run_id = %Uuid::new_v4(), feed = %feed.describe());
    Walk {
        page_size,
        cursor: None,
        next_cursor: None,
        last_seen: None,
        kept: 0,
        report: Tally::default(),
        policy,
    }
    .drive(feed, sink)
    .instrument(span)
    .await
}

#[derive(Default)]
struct Tally {
    pages_fetched: usize,
    records_seen: usize,
    records_written: usize,
    batches_flushed: usize,
}

struct Walk<P> {
    page_size: u32,
    cursor: Option<Cursor>,
    /// Cursor derived from the page being filtered; committed once the page
    /// is fully consumed.
    next_cursor: Option<Cursor>,
    last_seen: Option<RecordId>,
    kept: usize,
    report: Tally,
    policy: P,
}

impl<P> Walk<P> {
    async fn drive<F, S>(mut self, feed: &F, sink: &mut S) -> Result<WalkReport, PagerError>
    where
        F: Feed,
        P: Policy<F::Item>,
        S: RecordSink<F::Item> + ?Sized,
    {
        let mut state = State::Fetching;
        loop {
            state = match state {
                State::Fetching => self.fetch(feed).await?,
                State::Filtering(page) => self.filter(page)?,
                State::Flushing { resume, stop } => self.flush(sink, resume, stop)?,
                State::Done(stop) => {
                    tracing::info!(
                        stop = ?stop,
                        pages = self.report.pages_fetched,
                        written = self.report.records_written,
                        "walk.done"
                    );
                    let unfilled = <P as Policy<F::Item>>::unfilled_days(&self.policy);
                    return Ok(self.finish(stop, Completion::Done, unfilled));
                }
                State::PartialDone(stop) => {
                    let unfilled = <P as Policy<F::Item>>::unfilled_days(&self.policy);
                    tracing::warn!(
                        stop = ?stop,
                        pages = self.report.pages_fetched,
                        written = self.report.records_written,
                        unfilled_days = ?unfilled,
                        "walk.partial: feed exhausted before the requested range was covered"
                    );
                    return Ok(self.finish(stop, Completion::PartialDone, unfilled));
                }
            };
        }
    }

    async fn fetch<F>(&mut self, feed: &F) -> Result<State<F::Item>, PagerError>
    where
        F: Feed,
    {
        let page = feed
            .fetch_page(self.cursor, self.page_size)
            .await
            .map_err(PagerError::Fetch)?;
        self.report.pages_fetched += 1;

        let Some(last) = page.last() else {
            tracing::info!(cursor = ?self.cursor.map(|c| c.max_id()), "walk.empty_page");
            return Ok(State::Flushing {
                resume: None,
                stop: Some(StopReason::FeedExhausted),
            });
        };
        self.next_cursor = Cursor::after(last.id());
        tracing::info!(
            page = self.report.pages_fetched,
            page_len = page.len(),
            kept_so_far = self.kept,
            next_max_id = ?self.next_cursor.map(|c| c.max_id()),
            "walk.page"
        );
        Ok(State::Filtering(page.into_iter()))
    }

    fn filter<T>(&mut self, mut page: std::vec::IntoIter<T>) -> Result<State<T>, PagerError>
    where
        T: Record,
        P: Policy<T>,
    {
        for item in page.by_ref() {
            let id = item.id();
            match self.last_seen {
                Some(previous) if id > previous => {
                    return Err(PagerError::OutOfOrder { previous, got: id });
                }
                Some(previous) if id == previous => {
                    tracing::debug!(%id, "walk.duplicate_skipped");
                    continue;
                }
                _ => {}
            }
            self.last_seen = Some(id);
            self.report.records_seen += 1;

            match self.policy.offer(item) {
                Verdict::Skip => {}
                Verdict::Keep => self.kept += 1,
                Verdict::Flush => {
                    self.kept += 1;
                    return Ok(State::Flushing {
                        resume: Some(page),
                        stop: None,
                    });
                }
                Verdict::Stop(reason) => return Ok(self.stop_at(id, reason)),
                Verdict::KeepAndStop(reason) => {
                    self.kept += 1;
                    return Ok(self.stop_at(id, reason));
                }
            }
        }

        self.cursor = self.next_cursor.take();
        if self.cursor.is_none() {
            // last id was 0: nothing can follow
            return Ok(State::Flushing {
                resume: None,
                stop: Some(StopReason::FeedExhausted),
            });
        }
        Ok(State::Fetching)
    }

    fn stop_at<T>(&self, id: RecordId, reason: StopReason) -> State<T> {
        tracing::info!(%id, reason = ?reason, kept_so_far = self.kept, "walk.stop_event");
        State::Flushing {
            resume: None,
            stop: Some(reason),
        }
    }

    fn flush<T, S>(
        &mut self,
        sink: &mut S,
        resume: Option<std::vec::IntoIter<T>>,
        stop: Option<StopReason>,
    ) -> Result<State<T>, PagerError>
    where
        P: Policy<T>,
        S: RecordSink<T> + ?Sized,
    {
        let batches = match stop {
            Some(_) => self.policy.take_remaining(),
            None => self.policy.take_ready(),
        };
        for batch in batches.into_iter().filter(|b| !b.is_empty()) {
            sink.write_batch(&batch)?;
            self.report.batches_flushed += 1;
            self.report.records_written += batch.len();
            tracing::debug!(
                batch_len = batch.len(),
                written = self.report.records_written,
                "walk.flush"
            );
        }

        Ok(match (stop, resume) {
            (Some(reason), _) => match self.policy.completion(reason) {
                Completion::Done => State::Done(reason),
                Completion::PartialDone => State::PartialDone(reason),
            },
            (None, Some(page)) => State::Filtering(page),
            (None, None) => State::Fetching,
        })
    }

    fn finish(self, stop: StopReason, completion: Completion, unfilled_days: Vec<Date>) -> WalkReport {
        WalkReport {
            pages_fetched: self.report.pages_fetched,
            records_seen: self.report.records_seen,
            records_written: self.report.records_written,
            batches_flushed: self.report.batches_flushed,
            stop,
            completion,
            unfilled_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Id(u64);

    impl Record for Id {
        fn id(&self) -> RecordId {
            RecordId(self.0)
        }
    }

    /// Keeps records until `cap` are held, the last one ending the walk.
    struct Cap {
        cap: usize,
        held: Vec<Id>,
    }

    impl Policy<Id> for Cap {
        fn offer(&mut self, item: Id) -> Verdict {
            self.held.push(item);
            if self.held.len() >= self.cap {
                Verdict::KeepAndStop(StopReason::MaxRecords)
            } else {
                Verdict::Keep
            }
        }

        fn take_ready(&mut self) -> Vec<Vec<Id>> {
            Vec::new()
        }

        fn take_remaining(&mut self) -> Vec<Vec<Id>> {
            vec![std::mem::take(&mut self.held)]
        }

        fn completion(&self, _stop: StopReason) -> Completion {
            Completion::Done
        }
    }

    fn walk(cap: usize) -> Walk<Cap> {
        Walk {
            page_size: 10,
            cursor: None,
            next_cursor: None,
            last_seen: None,
            kept: 0,
            report: Tally::default(),
            policy: Cap {
                cap,
                held: Vec::new(),
            },
        }
    }

    #[test]
    fn record_that_hits_the_cap_is_counted() {
        let mut w = walk(3);
        let state = w
            .filter(vec![Id(9), Id(8), Id(7), Id(6)].into_iter())
            .unwrap();

        assert!(matches!(
            state,
            State::Flushing {
                resume: None,
                stop: Some(StopReason::MaxRecords)
            }
        ));
        assert_eq!(w.kept, 3);
        assert_eq!(w.report.records_seen, 3);
    }

    #[test]
    fn increasing_id_is_rejected() {
        let mut w = walk(10);
        let err = w.filter(vec![Id(5), Id(6)].into_iter()).err();
        assert!(matches!(
            err,
            Some(PagerError::OutOfOrder {
                previous: RecordId(5),
                got: RecordId(6)
            })
        ));
    }

    #[test]
    fn zero_page_size_is_an_invalid_option() {
        assert!(matches!(check_page_size(0), Err(PagerError::InvalidOption(_))));
        assert!(check_page_size(1).is_ok());
    }
}
