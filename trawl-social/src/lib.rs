//! Social network clients used by trawl.
//!
//! Only the Mastodon API is implemented: timelines, follower lists and the
//! authenticated account, plus the flat record projections written to CSV.
pub mod mastodon;
