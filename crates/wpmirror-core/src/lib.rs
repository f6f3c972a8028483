//! wpmirror-core - Core library for wpmirror
//!
//! Mirrors a remote collection of blog posts into an object store as one JSON
//! snapshot per post. A sync cycle fetches the collection once, compares each
//! post with its stored snapshot, and creates, updates, or skips it.

pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod state;
pub mod storage;
pub mod sync;
pub mod util;

pub use config::MirrorConfig;
pub use error::{Error, Result};
pub use models::{Post, PostId};
pub use state::RunState;
pub use sync::{Decision, RunReport, SyncRunner};
