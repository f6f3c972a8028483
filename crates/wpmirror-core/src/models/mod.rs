//! Data models for wpmirror

mod post;

#[cfg(test)]
pub(crate) use post::sample_post;
pub use post::{featured_image, record_id_hint, Post, PostContent, PostId};
