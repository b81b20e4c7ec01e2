//! Flatten Mastodon wire objects into the rows written to CSV.
//!
//! Author fields are lifted onto the status row under dotted column names
//! (`account.username`, ...) and hashtags are reduced to a JSON array of
//! names in `tag_list`. `id`, `created_at` and the author's `id` are
//! mandatory; anything else may be blank.
use crate::mastodon::types::{Account, Status};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use trawl_pager::{Record, RecordId, Timestamped};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}` ({value:?}): {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub id: RecordId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub url: Option<String>,
    pub uri: Option<String>,
    pub visibility: Option<String>,
    pub language: Option<String>,
    pub sensitive: bool,
    pub spoiler_text: String,
    pub content: String,
    pub in_reply_to_id: Option<String>,
    pub replies_count: u64,
    pub reblogs_count: u64,
    pub favourites_count: u64,
    #[serde(rename = "account.id")]
    pub account_id: RecordId,
    #[serde(rename = "account.username")]
    pub account_username: Option<String>,
    #[serde(rename = "account.acct")]
    pub account_acct: Option<String>,
    #[serde(rename = "account.display_name")]
    pub account_display_name: Option<String>,
    #[serde(rename = "account.followers_count")]
    pub account_followers_count: u64,
    #[serde(rename = "account.following_count")]
    pub account_following_count: u64,
    #[serde(rename = "account.statuses_count")]
    pub account_statuses_count: u64,
    #[serde(rename = "account.bot")]
    pub account_bot: bool,
    /// JSON array of hashtag names, e.g. `["rust","fediverse"]`.
    pub tag_list: String,
}

impl Record for StatusRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Timestamped for StatusRecord {
    fn timestamp(&self) -> OffsetDateTime {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRecord {
    pub id: RecordId,
    pub username: Option<String>,
    pub acct: Option<String>,
    pub display_name: Option<String>,
    pub created_at: Option<String>,
    pub url: Option<String>,
    pub locked: bool,
    pub bot: bool,
    pub followers_count: u64,
    pub following_count: u64,
    pub statuses_count: u64,
    pub note: Option<String>,
}

impl Record for AccountRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

fn parse_id(field: &'static str, raw: Option<&str>) -> Result<RecordId, RecordError> {
    let raw = raw.ok_or(RecordError::MissingField(field))?;
    raw.parse().map_err(|e: std::num::ParseIntError| RecordError::InvalidField {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_timestamp(field: &'static str, raw: Option<&str>) -> Result<OffsetDateTime, RecordError> {
    let raw = raw.ok_or(RecordError::MissingField(field))?;
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| RecordError::InvalidField {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Project a timeline status onto a [`StatusRecord`].
pub fn status_record(status: &Status) -> Result<StatusRecord, RecordError> {
    let id = parse_id("id", status.id.as_deref())?;
    let created_at = parse_timestamp("created_at", status.created_at.as_deref())?;
    let account = status
        .account
        .as_ref()
        .ok_or(RecordError::MissingField("account"))?;
    let account_id = parse_id("account.id", account.id.as_deref())?;

    let names: Vec<&str> = status.tags.iter().map(|t| t.name.as_str()).collect();
    let tag_list = serde_json::to_string(&names).map_err(|e| RecordError::InvalidField {
        field: "tags",
        value: format!("{names:?}"),
        reason: e.to_string(),
    })?;

    Ok(StatusRecord {
        id,
        created_at,
        url: status.url.clone(),
        uri: status.uri.clone(),
        visibility: status.visibility.clone(),
        language: status.language.clone(),
        sensitive: status.sensitive.unwrap_or(false),
        spoiler_text: status.spoiler_text.clone().unwrap_or_default(),
        content: status.content.clone().unwrap_or_default(),
        in_reply_to_id: status.in_reply_to_id.clone(),
        replies_count: status.replies_count.unwrap_or(0),
        reblogs_count: status.reblogs_count.unwrap_or(0),
        favourites_count: status.favourites_count.unwrap_or(0),
        account_id,
        account_username: account.username.clone(),
        account_acct: account.acct.clone(),
        account_display_name: account.display_name.clone(),
        account_followers_count: account.followers_count.unwrap_or(0),
        account_following_count: account.following_count.unwrap_or(0),
        account_statuses_count: account.statuses_count.unwrap_or(0),
        account_bot: account.bot.unwrap_or(false),
        tag_list,
    })
}

/// Project an account (follower or the caller's own) onto an [`AccountRecord`].
pub fn account_record(account: &Account) -> Result<AccountRecord, RecordError> {
    Ok(AccountRecord {
        id: parse_id("id", account.id.as_deref())?,
        username: account.username.clone(),
        acct: account.acct.clone(),
        display_name: account.display_name.clone(),
        created_at: account.created_at.clone(),
        url: account.url.clone(),
        locked: account.locked.unwrap_or(false),
        bot: account.bot.unwrap_or(false),
        followers_count: account.followers_count.unwrap_or(0),
        following_count: account.following_count.unwrap_or(0),
        statuses_count: account.statuses_count.unwrap_or(0),
        note: account.note.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn status_json() -> serde_json::Value {
        json!({
            "id": "114433221100",
            "created_at": "2025-05-03T10:15:30.000Z",
            "url": "https://mastodon.example/@alice/114433221100",
            "visibility": "public",
            "language": "en",
            "content": "<p>hello #rust</p>",
            "replies_count": 1,
            "reblogs_count": 2,
            "favourites_count": 3,
            "account": {
                "id": "42",
                "username": "alice",
                "acct": "alice",
                "display_name": "Alice",
                "followers_count": 10,
                "bot": false
            },
            "tags": [{"name": "rust", "url": "https://mastodon.example/tags/rust"}, {"name": "fediverse"}]
        })
    }

    #[test]
    fn flattens_status() {
        let status: Status = serde_json::from_value(status_json()).unwrap();
        let rec = status_record(&status).unwrap();
        assert_eq!(rec.id, RecordId(114433221100));
        assert_eq!(rec.created_at, datetime!(2025-05-03 10:15:30 UTC));
        assert_eq!(rec.account_id, RecordId(42));
        assert_eq!(rec.account_username.as_deref(), Some("alice"));
        assert_eq!(rec.tag_list, r#"["rust","fediverse"]"#);
        assert_eq!(rec.favourites_count, 3);
        assert_eq!(rec.spoiler_text, "");
    }

    #[test]
    fn untagged_status_has_empty_list() {
        let mut v = status_json();
        v.as_object_mut().unwrap().remove("tags");
        let status: Status = serde_json::from_value(v).unwrap();
        assert_eq!(status_record(&status).unwrap().tag_list, "[]");
    }

    #[test]
    fn missing_fields_fail_fast() {
        for (field, expected) in [
            ("id", RecordError::MissingField("id")),
            ("created_at", RecordError::MissingField("created_at")),
            ("account", RecordError::MissingField("account")),
        ] {
            let mut v = status_json();
            v.as_object_mut().unwrap().remove(field);
            let status: Status = serde_json::from_value(v).unwrap();
            assert_eq!(status_record(&status).unwrap_err(), expected);
        }

        let mut v = status_json();
        v["account"].as_object_mut().unwrap().remove("id");
        let status: Status = serde_json::from_value(v).unwrap();
        assert_eq!(
            status_record(&status).unwrap_err(),
            RecordError::MissingField("account.id")
        );
    }

    #[test]
    fn bad_values_name_the_field() {
        let mut v = status_json();
        v["id"] = json!("abc");
        let status: Status = serde_json::from_value(v).unwrap();
        let err = status_record(&status).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "id", .. }));

        let mut v = status_json();
        v["created_at"] = json!("yesterday");
        let status: Status = serde_json::from_value(v).unwrap();
        assert!(err_field(status_record(&status)) == Some("created_at"));
    }

    fn err_field(r: Result<StatusRecord, RecordError>) -> Option<&'static str> {
        match r {
            Err(RecordError::InvalidField { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn account_projection() {
        let account: Account = serde_json::from_value(json!({
            "id": "7",
            "username": "bob",
            "acct": "bob@elsewhere.example",
            "locked": true,
            "followers_count": 5
        }))
        .unwrap();
        let rec = account_record(&account).unwrap();
        assert_eq!(rec.id, RecordId(7));
        assert!(rec.locked);
        assert_eq!(rec.following_count, 0);
        assert_eq!(
            account_record(&Account::default()).unwrap_err(),
            RecordError::MissingField("id")
        );
    }
}
