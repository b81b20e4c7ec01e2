//! Thin wrapper around the Mastodon REST endpoints trawl reads.
//!
//! Every call is a single authenticated GET; failures are returned as-is so
//! the caller's walk aborts instead of retrying.
use crate::mastodon::extract::RecordError;
use crate::mastodon::types::{Account, Status};
use std::borrow::Cow;
use std::time::Duration;
use trawl_http::{Auth, HttpClient, HttpError, RequestOpts};
use trawl_pager::RecordId;

/// Largest `limit` the server honours for status timelines.
pub const MAX_STATUS_PAGE: u32 = 40;
/// Largest `limit` the server honours for account lists.
pub const MAX_ACCOUNT_PAGE: u32 = 80;

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("malformed record: {0}")]
    Record(#[from] RecordError),
}

#[derive(Clone, Debug)]
pub struct MastodonApi {
    http: HttpClient,
    token: String,
}

impl MastodonApi {
    /// ```
    /// use trawl_social::mastodon::MastodonApi;
    ///
    /// let api = MastodonApi::new("https://mastodon.example", "token").unwrap();
    /// assert_eq!(api.base_url(), "https://mastodon.example/");
    /// ```
    pub fn new(api_base_url: &str, access_token: impl Into<String>) -> Result<Self, SocialError> {
        Ok(Self {
            http: HttpClient::new(api_base_url)?,
            token: access_token.into(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.http.base().as_str()
    }

    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            query: (!query.is_empty()).then_some(query),
            ..Default::default()
        }
    }

    /// `GET /api/v1/timelines/public`, newest first.
    ///
    /// `max_id` is exclusive on the server: only statuses with `id < max_id`
    /// come back.
    pub async fn timeline_public(
        &self,
        limit: u32,
        max_id: Option<RecordId>,
        local: bool,
    ) -> Result<Vec<Status>, SocialError> {
        let mut query: Vec<(&str, Cow<'_, str>)> =
            vec![("limit", limit.clamp(1, MAX_STATUS_PAGE).to_string().into())];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string().into()));
        }
        if local {
            query.push(("local", "true".into()));
        }

        let statuses: Vec<Status> = self
            .http
            .get_json("api/v1/timelines/public", self.opts(query))
            .await?;
        tracing::debug!(count = statuses.len(), ?max_id, local, "mastodon.timeline_public");
        Ok(statuses)
    }

    /// `GET /api/v1/accounts/{id}/followers`, most recent follow first.
    /// `max_id` is exclusive, as for timelines.
    pub async fn account_followers(
        &self,
        account_id: &str,
        limit: u32,
        max_id: Option<RecordId>,
    ) -> Result<Vec<Account>, SocialError> {
        let mut query: Vec<(&str, Cow<'_, str>)> =
            vec![("limit", limit.clamp(1, MAX_ACCOUNT_PAGE).to_string().into())];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string().into()));
        }

        let path = format!("api/v1/accounts/{}/followers", account_id.trim());
        let followers: Vec<Account> = self.http.get_json(&path, self.opts(query)).await?;
        tracing::debug!(count = followers.len(), account_id, ?max_id, "mastodon.account_followers");
        Ok(followers)
    }

    /// `GET /api/v1/accounts/verify_credentials`: the account owning the token.
    pub async fn verify_credentials(&self) -> Result<Account, SocialError> {
        let me: Account = self
            .http
            .get_json("api/v1/accounts/verify_credentials", self.opts(Vec::new()))
            .await?;
        tracing::info!(acct = ?me.acct, id = ?me.id, "mastodon.verify_credentials");
        Ok(me)
    }
}
