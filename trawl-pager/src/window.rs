use crate::error::PagerError;
use std::collections::BTreeSet;
use time::{Date, OffsetDateTime, UtcOffset};

/// Inclusive time range `[since, until]`.
///
/// Feeds are newest-first, so a record older than `since` means every record
/// still to come is older too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    since: OffsetDateTime,
    until: OffsetDateTime,
}

impl Window {
    pub fn new(since: OffsetDateTime, until: OffsetDateTime) -> Result<Self, PagerError> {
        if since > until {
            return Err(PagerError::InvalidWindow { since, until });
        }
        Ok(Self { since, until })
    }

    pub fn since(&self) -> OffsetDateTime {
        self.since
    }

    pub fn until(&self) -> OffsetDateTime {
        self.until
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        self.since <= ts && ts <= self.until
    }

    /// `true` once the walk has paged past the window.
    pub fn is_behind(&self, ts: OffsetDateTime) -> bool {
        ts < self.since
    }

    /// Every UTC calendar date touched by the window.
    ///
    /// ```
    /// use time::macros::{date, datetime};
    /// use trawl_pager::Window;
    ///
    /// let w = Window::new(datetime!(2025-05-30 12:00 UTC), datetime!(2025-06-01 00:30 UTC)).unwrap();
    /// let days: Vec<_> = w.days().into_iter().collect();
    /// assert_eq!(days, vec![date!(2025-05-30), date!(2025-05-31), date!(2025-06-01)]);
    /// ```
    pub fn days(&self) -> BTreeSet<Date> {
        let last = utc_date(self.until);
        let mut days = BTreeSet::new();
        let mut day = Some(utc_date(self.since));
        while let Some(d) = day.filter(|d| *d <= last) {
            days.insert(d);
            day = d.next_day();
        }
        days
    }
}

/// Calendar date of `ts` in UTC.
pub fn utc_date(ts: OffsetDateTime) -> Date {
    ts.to_offset(UtcOffset::UTC).date()
}
