//! Post model

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

static FEATURED_IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http[^\s]*scaled\.jpeg").expect("Invalid regex"));

/// Source-assigned post identifier, stable across fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Rendered body of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// Raw markup
    #[serde(default)]
    pub rendered: String,
    /// Password-protected flag
    #[serde(default)]
    pub protected: bool,
}

/// A blog post as fetched from the source.
///
/// Equality covers every persisted field. The featured image is derived from
/// `content.rendered` and is neither compared nor persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub author: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_content")]
    pub content: PostContent,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub link: String,
}

impl Post {
    /// Parse a single source record.
    ///
    /// Fails with [`Error::MalformedRecord`] when the record is not an object,
    /// `id` is missing or not an integer, or a field has an unsupported shape.
    pub fn from_record(record: serde_json::Value) -> Result<Self> {
        if !record.is_object() {
            return Err(Error::MalformedRecord(
                "record is not a JSON object".to_string(),
            ));
        }

        let id_hint = record_id_hint(&record);
        serde_json::from_value(record).map_err(|error| {
            Error::MalformedRecord(id_hint.map_or_else(
                || error.to_string(),
                |id| format!("post {id}: {error}"),
            ))
        })
    }

    /// Canonical JSON of the persisted fields.
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a stored snapshot back into a post.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|error| Error::CorruptSnapshot(error.to_string()))
    }

    /// First `http...scaled.jpeg` URL in the rendered markup, or an empty string.
    #[must_use]
    pub fn featured_image(&self) -> String {
        featured_image(&self.content.rendered)
    }
}

/// Extract the featured image URL from rendered markup.
///
/// Returns the first substring matching `http[^\s]*scaled\.jpeg`, or an empty
/// string when nothing matches.
///
/// # Examples
///
/// ```
/// use wpmirror_core::models::featured_image;
///
/// let markup = r#"<img src="https://cdn.example.com/a-scaled.jpeg" alt="">"#;
/// assert_eq!(featured_image(markup), "https://cdn.example.com/a-scaled.jpeg");
/// assert_eq!(featured_image("<p>no image</p>"), "");
/// ```
#[must_use]
pub fn featured_image(markup: &str) -> String {
    FEATURED_IMAGE_PATTERN
        .find(markup)
        .map(|found| found.as_str().to_string())
        .unwrap_or_default()
}

/// Best-effort integer id of a raw record, for error reporting.
#[must_use]
pub fn record_id_hint(record: &serde_json::Value) -> Option<PostId> {
    record
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .map(PostId)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Number(serde_json::Number),
    Rendered { rendered: String },
}

// WordPress REST returns `title`/`excerpt` as `{ "rendered": ... }` and
// `author` as a number; both collapse to plain text.
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextField>::deserialize(deserializer)? {
        None => String::new(),
        Some(TextField::Plain(value) | TextField::Rendered { rendered: value }) => value,
        Some(TextField::Number(value)) => value.to_string(),
    })
}

fn deserialize_content<'de, D>(deserializer: D) -> std::result::Result<PostContent, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PostContent>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) fn sample_post(id: i64, title: &str) -> Post {
    Post {
        id: PostId(id),
        author: "Ada".to_string(),
        title: title.to_string(),
        content: PostContent {
            rendered: format!("<p>{title}</p>"),
            protected: false,
        },
        excerpt: format!("About {title}"),
        date: "2024-05-01T10:00:00".to_string(),
        link: format!("https://blog.example.com/?p={id}"),
    }
}
