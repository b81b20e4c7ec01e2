//! Mastodon endpoints as paginator feeds.
use crate::mastodon::client::{MAX_ACCOUNT_PAGE, MAX_STATUS_PAGE, MastodonApi};
use crate::mastodon::extract::{AccountRecord, StatusRecord, account_record, status_record};
use async_trait::async_trait;
use trawl_pager::error::FetchError;
use trawl_pager::{Cursor, Feed, RecordId};

/// The paginator's cursor is an inclusive upper bound; Mastodon's `max_id`
/// is exclusive.
fn server_max_id(cursor: Option<Cursor>) -> Option<RecordId> {
    cursor.map(|c| RecordId(c.max_id().0.saturating_add(1)))
}

/// The public timeline, optionally restricted to local posts.
pub struct PublicTimeline {
    api: MastodonApi,
    local: bool,
}

impl PublicTimeline {
    pub fn new(api: MastodonApi, local: bool) -> Self {
        Self { api, local }
    }
}

#[async_trait]
impl Feed for PublicTimeline {
    type Item = StatusRecord;

    async fn fetch_page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Vec<StatusRecord>, FetchError> {
        let statuses = self
            .api
            .timeline_public(
                page_size.min(MAX_STATUS_PAGE),
                server_max_id(cursor),
                self.local,
            )
            .await?;
        let records = statuses
            .iter()
            .map(status_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn describe(&self) -> String {
        let scope = if self.local { "local" } else { "public" };
        format!("{}timelines/{scope}", self.api.base_url())
    }
}

/// Everyone following one account.
pub struct Followers {
    api: MastodonApi,
    account_id: String,
}

impl Followers {
    pub fn new(api: MastodonApi, account_id: impl Into<String>) -> Self {
        Self {
            api,
            account_id: account_id.into(),
        }
    }
}

#[async_trait]
impl Feed for Followers {
    type Item = AccountRecord;

    async fn fetch_page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Vec<AccountRecord>, FetchError> {
        let accounts = self
            .api
            .account_followers(
                &self.account_id,
                page_size.min(MAX_ACCOUNT_PAGE),
                server_max_id(cursor),
            )
            .await?;
        let records = accounts
            .iter()
            .map(account_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("{}accounts/{}/followers", self.api.base_url(), self.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_maps_to_exclusive_max_id() {
        let cursor = Cursor::after(RecordId(1_000));
        assert_eq!(server_max_id(cursor), Some(RecordId(1_000)));
        assert_eq!(server_max_id(None), None);
    }
}
