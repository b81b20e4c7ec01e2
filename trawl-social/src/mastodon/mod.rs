//! Mastodon API surface.
//!
//! `client` wraps the REST endpoints, `types` mirrors their JSON, `extract`
//! flattens wire objects into CSV-ready records and `feeds` adapts the
//! endpoints to the paginator's `Feed` trait.
pub mod client;
pub mod extract;
pub mod feeds;
pub mod types;

pub use client::{MastodonApi, SocialError};
pub use extract::{AccountRecord, RecordError, StatusRecord};
pub use feeds::{Followers, PublicTimeline};
