use std::time::Duration;

use wpmirror_core::source::{PostSource, WordPressClient};

use crate::commands::common::{format_post_lines, post_to_list_item, PostListItem};
use crate::error::CliError;

pub async fn run_posts(
    url: &str,
    timeout_secs: u64,
    limit: Option<usize>,
    as_json: bool,
) -> Result<(), CliError> {
    if !(1..=300).contains(&timeout_secs) {
        return Err(CliError::Config(
            "timeout must be in [1, 300] seconds".to_string(),
        ));
    }

    let source = WordPressClient::new(url, Duration::from_secs(timeout_secs))?;
    let fetched = source.fetch_posts().await?;
    let shown = limit.unwrap_or(fetched.posts.len()).min(fetched.posts.len());
    let posts = &fetched.posts[..shown];

    if as_json {
        let json_items = posts
            .iter()
            .map(post_to_list_item)
            .collect::<Vec<PostListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_post_lines(posts) {
            println!("{line}");
        }
    }

    for rejected in &fetched.rejected {
        eprintln!("Skipped record #{}: {}", rejected.index, rejected.reason);
    }

    Ok(())
}
