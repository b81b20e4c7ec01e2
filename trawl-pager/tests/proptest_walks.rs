//! Property tests for the windowed and per-day walks against a well-behaved
//! timeline: window membership, no duplicates, descending order within each
//! batch, per-day quota bounds.

mod common;

use common::{TimelineFeed, post};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use trawl_pager::window::utc_date;
use trawl_pager::{
    DailyOptions, MemorySink, StopReason, StreamOptions, Window, collect_daily, collect_window,
};

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(fut)
}

/// Posts with strictly increasing ids and non-decreasing timestamps
/// (newer id, newer post), spread over ~10 days.
fn arb_timeline() -> impl Strategy<Value = Vec<(u64, OffsetDateTime)>> {
    proptest::collection::vec((1_u64..50, 0_i64..7_200), 0..60).prop_map(|steps| {
        let mut id = 0;
        let mut at = datetime!(2025-05-01 0:00 UTC);
        steps
            .into_iter()
            .map(|(id_step, minutes)| {
                id += id_step;
                at += Duration::minutes(minutes / 20);
                (id, at)
            })
            .collect()
    })
}

fn arb_window() -> impl Strategy<Value = Window> {
    (0_i64..10 * 24, 0_i64..6 * 24).prop_map(|(start_h, len_h)| {
        let since = datetime!(2025-05-01 0:00 UTC) + Duration::hours(start_h);
        Window::new(since, since + Duration::hours(len_h)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_walk_keeps_exactly_the_in_window_records(
        timeline in arb_timeline(),
        window in arb_window(),
        page_size in 1_u32..7,
        flush_every in proptest::option::of(1_usize..5),
    ) {
        let feed = TimelineFeed::new(timeline.iter().map(|(id, at)| post(*id, *at)).collect());
        let opts = StreamOptions {
            page_size,
            flush_every: flush_every.and_then(NonZeroUsize::new),
            max_records: None,
        };
        let mut sink = MemorySink::new();
        let report = block_on(collect_window(&feed, &window, &opts, &mut sink)).unwrap();

        let mut expected: Vec<u64> = timeline
            .iter()
            .filter(|(_, at)| window.contains(*at))
            .map(|(id, _)| *id)
            .collect();
        expected.reverse();
        let got: Vec<u64> = sink.records().map(|p| p.id).collect();
        prop_assert_eq!(&got, &expected);

        for batch in sink.batches() {
            prop_assert!(batch.windows(2).all(|w| w[0].id > w[1].id));
            if let Some(n) = flush_every {
                prop_assert!(batch.len() <= n);
            }
        }
        let unique: HashSet<u64> = got.iter().copied().collect();
        prop_assert_eq!(unique.len(), got.len());
        prop_assert_eq!(report.records_written, got.len());
    }

    #[test]
    fn daily_walk_respects_quota(
        timeline in arb_timeline(),
        window in arb_window(),
        page_size in 1_u32..7,
        quota in 1_usize..4,
    ) {
        let feed = TimelineFeed::new(timeline.iter().map(|(id, at)| post(*id, *at)).collect());
        let opts = DailyOptions { page_size, quota: NonZeroUsize::new(quota).unwrap() };
        let mut sink = MemorySink::new();
        let report = block_on(collect_daily(&feed, &window, &opts, &mut sink)).unwrap();

        let mut per_day: BTreeMap<time::Date, usize> = BTreeMap::new();
        let mut seen = HashSet::new();
        for p in sink.records() {
            prop_assert!(window.contains(p.at));
            prop_assert!(seen.insert(p.id));
            *per_day.entry(utc_date(p.at)).or_default() += 1;
        }
        for (day, count) in &per_day {
            prop_assert!(*count <= quota);
            let available = timeline
                .iter()
                .filter(|(_, at)| window.contains(*at) && utc_date(*at) == *day)
                .count();
            if report.stop == StopReason::FeedExhausted && !report.unfilled_days.contains(day) {
                prop_assert_eq!(*count, quota);
            }
            prop_assert!(*count == quota || *count == available);
        }
    }
}
