#![allow(dead_code)]

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use time::OffsetDateTime;
use trawl_pager::error::FetchError;
use trawl_pager::{Cursor, Feed, Record, RecordId, Timestamped};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl Record for Post {
    fn id(&self) -> RecordId {
        RecordId(self.id)
    }
}

impl Timestamped for Post {
    fn timestamp(&self) -> OffsetDateTime {
        self.at
    }
}

pub fn post(id: u64, at: OffsetDateTime) -> Post {
    Post { id, at }
}

/// Behaves like a real timeline endpoint: records sorted newest-first,
/// `max_id` honoured, pages cut at `page_size`.
pub struct TimelineFeed {
    posts: Vec<Post>,
    pub requests: Mutex<Vec<Option<u64>>>,
}

impl TimelineFeed {
    pub fn new(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        Self {
            posts,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Option<u64>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Feed for TimelineFeed {
    type Item = Post;

    async fn fetch_page(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Vec<Post>, FetchError> {
        let max_id = cursor.map(|c| c.max_id().0);
        self.requests.lock().unwrap().push(max_id);
        Ok(self
            .posts
            .iter()
            .filter(|p| max_id.is_none_or(|m| p.id <= m))
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}

/// Serves fixed pages in order, ignoring the cursor. A page of `None` fails.
pub struct ScriptedFeed {
    pages: Mutex<Vec<Option<Vec<Post>>>>,
    pub calls: Mutex<usize>,
}

impl ScriptedFeed {
    pub fn new(pages: Vec<Option<Vec<Post>>>) -> Self {
        let mut pages = pages;
        pages.reverse();
        Self {
            pages: Mutex::new(pages),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Feed for ScriptedFeed {
    type Item = Post;

    async fn fetch_page(
        &self,
        _cursor: Option<Cursor>,
        _page_size: u32,
    ) -> Result<Vec<Post>, FetchError> {
        *self.calls.lock().unwrap() += 1;
        match self.pages.lock().unwrap().pop() {
            Some(Some(page)) => Ok(page),
            Some(None) => Err("connection reset".into()),
            None => Ok(Vec::new()),
        }
    }
}
