use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wpmirror")]
#[command(about = "Mirror a WordPress post feed into object storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync cycle: fetch posts, then create, update, or skip each snapshot
    Sync {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
        /// Exit non-zero when any post failed to sync
        #[arg(long)]
        strict: bool,
    },
    /// Fetch posts once and list them without writing anything
    Posts {
        /// Posts endpoint URL
        #[arg(long, env = "WP_BLOG_API_URL", value_name = "URL")]
        url: String,
        /// Request timeout in seconds
        #[arg(long, env = "WP_REQUEST_TIMEOUT_SECS", default_value = "30")]
        timeout_secs: u64,
        /// Number of posts to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the configured bucket is reachable
    Check,
}
