//! Post sources.
//!
//! A source returns the current collection of posts in one request. Records
//! that fail to parse are carried alongside the parsed posts so the sync
//! cycle can count them as item failures instead of dropping the whole batch.

mod wordpress;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{record_id_hint, Post, PostId};
use crate::{Error, Result};

pub use wordpress::WordPressClient;

/// Capability to fetch the current post collection.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch every post one request yields, in source order.
    ///
    /// Fails with [`Error::Fetch`] or [`Error::Decode`]; individual record
    /// failures are reported through [`FetchedPosts::rejected`].
    async fn fetch_posts(&self) -> Result<FetchedPosts>;
}

/// Outcome of a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPosts {
    pub posts: Vec<Post>,
    pub rejected: Vec<RejectedRecord>,
}

impl FetchedPosts {
    /// Total records in the response, parsed or not.
    pub fn len(&self) -> usize {
        self.posts.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.rejected.is_empty()
    }
}

impl From<Vec<Post>> for FetchedPosts {
    fn from(posts: Vec<Post>) -> Self {
        Self {
            posts,
            rejected: Vec::new(),
        }
    }
}

/// A record from the response that could not be parsed into a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Position in the response array
    pub index: usize,
    /// Integer `id` of the record, when one could be read
    pub id_hint: Option<PostId>,
    pub reason: String,
}

/// Parse a source response body.
///
/// Callers can exercise parsing without network access.
pub fn parse_posts(body: &str) -> Result<FetchedPosts> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body).map_err(|error| {
        Error::Decode(format!("expected a JSON array of post records: {error}"))
    })?;

    let mut fetched = FetchedPosts::default();
    for (index, record) in records.into_iter().enumerate() {
        let id_hint = record_id_hint(&record);
        match Post::from_record(record) {
            Ok(post) => fetched.posts.push(post),
            Err(error) => fetched.rejected.push(RejectedRecord {
                index,
                id_hint,
                reason: error.to_string(),
            }),
        }
    }

    Ok(fetched)
}
