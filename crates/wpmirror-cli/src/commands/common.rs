use serde::Serialize;
use wpmirror_core::source::WordPressClient;
use wpmirror_core::storage::R2Storage;
use wpmirror_core::sync::{FailureStage, RunReport};
use wpmirror_core::{MirrorConfig, Post};

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub link: String,
    pub featured_image: String,
    pub protected: bool,
}

pub fn load_config() -> Result<MirrorConfig, CliError> {
    let config = MirrorConfig::from_env()?;
    tracing::debug!(?config, "Loaded mirror configuration");
    Ok(config)
}

pub fn build_source(config: &MirrorConfig) -> Result<WordPressClient, CliError> {
    Ok(WordPressClient::new(
        config.source_url.clone(),
        config.request_timeout,
    )?)
}

pub fn build_store(config: &MirrorConfig) -> R2Storage {
    R2Storage::new(config.r2_config())
}

pub fn post_to_list_item(post: &Post) -> PostListItem {
    PostListItem {
        id: post.id.get(),
        title: post.title.clone(),
        date: post.date.clone(),
        link: post.link.clone(),
        featured_image: post.featured_image(),
        protected: post.content.protected,
    }
}

pub fn format_post_lines(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .map(|post| {
            let image = post.featured_image();
            let title = if post.title.trim().is_empty() {
                "(untitled)"
            } else {
                post.title.trim()
            };
            if image.is_empty() {
                format!("{}  {}  {title}", post.id, post.date)
            } else {
                format!("{}  {}  {title}  [{image}]", post.id, post.date)
            }
        })
        .collect()
}

pub fn format_report_lines(report: &RunReport) -> Vec<String> {
    let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();
    let mut lines = vec![
        format!("Sync completed (run {}, {elapsed_ms} ms)", report.run_id),
        format!(
            "fetched={} created={} updated={} skipped={} failed={}",
            report.fetched,
            report.created,
            report.updated,
            report.skipped,
            report.failed()
        ),
    ];

    for failure in &report.failures {
        let post = failure
            .post_id
            .map_or_else(|| "record".to_string(), |id| format!("post {id}"));
        lines.push(format!(
            "  {post} failed at {}: {}",
            stage_label(failure.stage),
            failure.reason
        ));
    }

    lines
}

const fn stage_label(stage: FailureStage) -> &'static str {
    match stage {
        FailureStage::Parse => "parse",
        FailureStage::Decide => "decide",
        FailureStage::Write => "write",
    }
}
