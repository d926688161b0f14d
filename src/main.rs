//! git2wp - Main entry point
//!
//! Publishes git commits to WordPress, with the post body written by the
//! fastest available Ollama server.

use anyhow::Context;
use git2wp::{
    cli::{Cli, Command, PublishArgs},
    commit::{CommitDescriptor, GitRepo},
    wordpress::{Post, WordPressClient, WordPressConfig},
    BackendConfig, BackendSelector, EndpointRegistry, OllamaClient, SummaryGenerator,
};
use log::debug;
use std::path::PathBuf;
use std::process;

const PREVIEW_CHARS: usize = 500;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if let Some(path) = load_dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run(cli, BackendConfig::from_env(), WordPressConfig::from_env()).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Load `~/.config/git2wp/.env`; variables already set win
fn load_dotenv() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("HOME")?)
        .join(".config")
        .join("git2wp")
        .join(".env");
    dotenvy::from_path(&path).ok().map(|_| path)
}

async fn run(cli: Cli, backend: BackendConfig, wordpress: WordPressConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Publish(args) => publish(args, backend, wordpress).await,
        Command::TestConnection => test_connection(wordpress).await,
    }
}

async fn publish(
    args: PublishArgs,
    backend: BackendConfig,
    wordpress: WordPressConfig,
) -> anyhow::Result<()> {
    let repo = GitRepo::open(&args.repo_path)?;
    let commit = repo
        .describe(&args.commit)
        .with_context(|| format!("reading commit {}", args.commit))?;

    print_commit(&commit);

    let wordpress = if args.dry_run {
        None
    } else {
        Some(WordPressClient::new(wordpress)?)
    };

    let registry = EndpointRegistry::load(&backend);
    let ollama = OllamaClient::new()?;
    let selection = BackendSelector::new(ollama.clone())
        .select(registry.endpoints())
        .await;
    let summary = SummaryGenerator::new(ollama).generate(&selection, &commit).await;

    if summary.is_fallback() {
        println!("\nNote: using the plain commit summary, no Ollama server produced one.");
    } else if let Some(endpoint) = selection.endpoint() {
        println!("\nSummary written by {} ({})", endpoint.name, endpoint.model);
    }

    let post = Post::from_summary(summary, args.status);

    let Some(client) = wordpress else {
        println!("\n=== Dry Run ===");
        println!("Would publish to WordPress with status: {}", post.status);
        println!("Title: {}", post.title);
        println!("Content Preview:");
        println!("{}", "-".repeat(80));
        let preview: String = post.content.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if post.content.chars().count() > PREVIEW_CHARS { "..." } else { "" };
        println!("{}{}", preview, ellipsis);
        println!("{}", "-".repeat(80));
        return Ok(());
    };

    println!("\n=== Publishing to WordPress ===");
    let published = client.publish(&post).await.context("publishing post")?;
    println!("Successfully published post: {}", published.link);

    Ok(())
}

async fn test_connection(wordpress: WordPressConfig) -> anyhow::Result<()> {
    println!("Testing WordPress connection...");
    let client = WordPressClient::new(wordpress)?;
    let user = client
        .test_connection()
        .await
        .context("could not connect to WordPress")?;
    println!("Successfully connected to WordPress as {}", user);
    Ok(())
}

fn print_commit(commit: &CommitDescriptor) {
    println!("=== Commit Information ===");
    println!("Repository: {}", commit.repository_name);
    println!("Commit: {}", commit.short_id);
    println!("Author: {} <{}>", commit.author, commit.email);
    println!("Date: {}", commit.date);
    println!("Subject: {}", commit.subject());

    if !commit.changed_files.is_empty() {
        println!("\n=== Changed Files ===");
        for file in &commit.changed_files {
            println!("{} {}", file.status, file.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2wp::Error;
    use std::process::Command as Git;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_repo_with_commit() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path();

        for args in [
            vec!["init"],
            vec!["config", "user.name", "Test User"],
            vec!["config", "user.email", "test@example.com"],
        ] {
            Git::new("git").args(&args).current_dir(repo_path).output().unwrap();
        }

        std::fs::create_dir_all(repo_path.join("path/to")).unwrap();
        std::fs::write(repo_path.join("path/to/new_file.txt"), "hello").unwrap();
        Git::new("git")
            .args(["add", "."])
            .current_dir(repo_path)
            .output()
            .unwrap();
        Git::new("git")
            .args(["commit", "-m", "Add new file"])
            .current_dir(repo_path)
            .output()
            .unwrap();

        temp_dir
    }

    fn publish_cli(args: PublishArgs) -> Cli {
        Cli {
            verbose: false,
            command: Command::Publish(args),
        }
    }

    #[tokio::test]
    async fn test_dry_run_without_backends() {
        let temp_dir = create_test_repo_with_commit();
        let mut args = PublishArgs::new(temp_dir.path());
        args.dry_run = true;

        let result = run(
            publish_cli(args),
            BackendConfig::default(),
            WordPressConfig::default(),
        )
        .await;

        assert!(result.is_ok(), "{:?}", result);
    }

    #[tokio::test]
    async fn test_publish_requires_wordpress_settings() {
        let temp_dir = create_test_repo_with_commit();

        let result = run(
            publish_cli(PublishArgs::new(temp_dir.path())),
            BackendConfig::default(),
            WordPressConfig::default(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingWordPressSetting { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_wordpress_settings_fail_before_backend_selection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/version"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let temp_dir = create_test_repo_with_commit();

        let result = run(
            publish_cli(PublishArgs::new(temp_dir.path())),
            BackendConfig::default().with_primary(server.uri()),
            WordPressConfig::default(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingWordPressSetting { .. })
        ));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_non_git_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = run(
            publish_cli(PublishArgs::new(temp_dir.path())),
            BackendConfig::default(),
            WordPressConfig::default(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotGitRepository { .. })
        ));
    }
}
