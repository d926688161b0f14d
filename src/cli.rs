//! Command line interface for git2wp

use crate::wordpress::PostStatus;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Publish git repository changes to WordPress
#[derive(Parser, Debug)]
#[command(name = "git2wp")]
#[command(version)]
#[command(long_about = r#"
Publish git repository changes to WordPress

The post body is written by the fastest reachable Ollama server
(OLLAMA_BASE_URL, optionally SEC_OLLAMA_BASE_URL). When no server answers,
or generation fails, a plain summary of the commit is used instead.

Settings are read from the environment and from ~/.config/git2wp/.env.

Examples:
  git2wp publish .                      # Publish HEAD as a draft
  git2wp publish ~/src/app -c HEAD~1    # Publish an older commit
  git2wp publish . --dry-run            # Preview without publishing
  git2wp test-connection                # Check WordPress credentials
"#)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a commit as a WordPress post
    Publish(PublishArgs),

    /// Test the connection to WordPress
    TestConnection,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// Path to the git repository
    pub repo_path: PathBuf,

    /// Commit to publish
    #[arg(long, short, default_value = "HEAD")]
    pub commit: String,

    /// Show what would be published without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Status for the WordPress post
    #[arg(long, value_enum, default_value_t = PostStatus::Draft)]
    pub status: PostStatus,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

impl PublishArgs {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            commit: "HEAD".to_string(),
            dry_run: false,
            status: PostStatus::Draft,
        }
    }
}
