//! Reading commit metadata from a git repository

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, Delta, DiffDelta, DiffFindOptions, Repository};
use std::path::{Path, PathBuf};

/// Everything the summary needs to know about one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDescriptor {
    pub repository_name: String,
    pub short_id: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String,
    pub changed_files: Vec<ChangedFile>,
}

impl CommitDescriptor {
    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

/// One line of `git diff --name-status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub status: String,
    pub path: String,
}

impl ChangedFile {
    pub fn new(status: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            path: path.into(),
        }
    }

    fn from_delta(delta: &DiffDelta) -> Self {
        let status = match delta.status() {
            Delta::Added => "A",
            Delta::Deleted => "D",
            Delta::Modified => "M",
            Delta::Renamed => "R",
            Delta::Copied => "C",
            Delta::Typechange => "T",
            Delta::Conflicted => "U",
            _ => "?",
        };

        let file = match delta.status() {
            Delta::Deleted => delta.old_file(),
            _ => delta.new_file(),
        };
        let path = file
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(status, path)
    }
}

/// Git repository wrapper
pub struct GitRepo {
    repo: Repository,
    root_path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let repo = Repository::discover(&path).map_err(|_| Error::NotGitRepository {
            path: path.clone(),
        })?;
        let root_path = repo
            .workdir()
            .ok_or_else(|| Error::NotGitRepository { path: path.clone() })?
            .to_path_buf();

        Ok(Self { repo, root_path })
    }

    /// Directory name of the working tree
    pub fn name(&self) -> String {
        self.root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string())
    }

    /// Describe the commit `rev` resolves to (for example `HEAD` or `HEAD~2`)
    pub fn describe(&self, rev: &str) -> Result<CommitDescriptor> {
        let commit = self
            .repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Error::CommitNotFound {
                rev: rev.to_string(),
            })?;

        let short_id = commit
            .as_object()
            .short_id()?
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| commit.id().to_string()[..7].to_string());

        let author = commit.author();
        let author_name = String::from_utf8_lossy(author.name_bytes()).trim().to_string();

        Ok(CommitDescriptor {
            repository_name: self.name(),
            short_id,
            author: if author_name.is_empty() {
                "Unknown".to_string()
            } else {
                author_name
            },
            email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            date: format_time(&commit.time()),
            message: String::from_utf8_lossy(commit.message_bytes())
                .trim_end()
                .to_string(),
            changed_files: self.changed_files(&commit)?,
        })
    }

    /// Name-status diff against the first parent, with rename and copy detection
    fn changed_files(&self, commit: &Commit) -> Result<Vec<ChangedFile>> {
        let new_tree = commit.tree()?;
        let old_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;

        let mut find = DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))?;

        Ok(diff.deltas().map(|delta| ChangedFile::from_delta(&delta)).collect())
    }
}

fn format_time(time: &git2::Time) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

    let Some(utc) = DateTime::from_timestamp(time.seconds(), 0) else {
        return time.seconds().to_string();
    };

    match FixedOffset::east_opt(time.offset_minutes() * 60) {
        Some(offset) => utc.with_timezone(&offset).format(FORMAT).to_string(),
        None => utc.format(FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(repo_path: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(repo_path)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    fn create_test_repo() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path();

        git(repo_path, &["init"]);
        git(repo_path, &["config", "user.name", "Test User"]);
        git(repo_path, &["config", "user.email", "test@example.com"]);

        std::fs::write(repo_path.join("README.md"), "# Test Repo").unwrap();
        std::fs::write(repo_path.join("old.txt"), "to be removed").unwrap();
        git(repo_path, &["add", "."]);
        git(repo_path, &["commit", "-m", "Initial commit"]);

        temp_dir
    }

    #[test]
    fn test_describe_root_commit() {
        let temp_dir = create_test_repo();
        let repo = GitRepo::open(temp_dir.path()).unwrap();

        let commit = repo.describe("HEAD").unwrap();

        assert_eq!(commit.author, "Test User");
        assert_eq!(commit.email, "test@example.com");
        assert_eq!(commit.message, "Initial commit");
        assert!(commit.short_id.len() >= 7);
        assert_eq!(
            commit.changed_files,
            vec![
                ChangedFile::new("A", "README.md"),
                ChangedFile::new("A", "old.txt"),
            ]
        );
    }

    #[test]
    fn test_describe_lists_name_status() {
        let temp_dir = create_test_repo();
        let repo_path = temp_dir.path();

        std::fs::write(repo_path.join("README.md"), "# Test Repo\n\nMore").unwrap();
        std::fs::create_dir_all(repo_path.join("path/to")).unwrap();
        std::fs::write(repo_path.join("path/to/new_file.txt"), "hello").unwrap();
        std::fs::remove_file(repo_path.join("old.txt")).unwrap();
        git(repo_path, &["add", "-A"]);
        git(repo_path, &["commit", "-m", "Rework docs\n\nLonger body"]);

        let repo = GitRepo::open(repo_path).unwrap();
        let commit = repo.describe("HEAD").unwrap();

        assert_eq!(commit.subject(), "Rework docs");
        assert!(commit.changed_files.contains(&ChangedFile::new("M", "README.md")));
        assert!(commit
            .changed_files
            .contains(&ChangedFile::new("A", "path/to/new_file.txt")));
        assert!(commit.changed_files.contains(&ChangedFile::new("D", "old.txt")));
    }

    #[test]
    fn test_describe_keeps_non_utf8_text() {
        let temp_dir = create_test_repo();
        let repo = GitRepo::open(temp_dir.path()).unwrap();

        // Latin-1 encoded author and message, written as a raw commit object.
        let tree = repo.repo.head().unwrap().peel_to_tree().unwrap().id();
        let mut raw = format!("tree {}\n", tree).into_bytes();
        raw.extend_from_slice(b"author Jos\xe9 Doe <jose@example.com> 1700000000 +0000\n");
        raw.extend_from_slice(b"committer Jos\xe9 Doe <jose@example.com> 1700000000 +0000\n");
        raw.extend_from_slice(b"\nCaf\xe9 menu update\n");
        let oid = repo
            .repo
            .odb()
            .unwrap()
            .write(git2::ObjectType::Commit, &raw)
            .unwrap();

        let commit = repo.describe(&oid.to_string()).unwrap();

        assert_eq!(commit.author, "Jos\u{FFFD} Doe");
        assert_eq!(commit.message, "Caf\u{FFFD} menu update");
        assert_eq!(commit.date, "2023-11-14 22:13:20 +0000");
    }

    #[test]
    fn test_repository_name_from_workdir() {
        let temp_dir = create_test_repo();
        let repo = GitRepo::open(temp_dir.path()).unwrap();

        let expected = temp_dir
            .path()
            .canonicalize()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(repo.name(), expected);
    }

    #[test]
    fn test_unknown_revision() {
        let temp_dir = create_test_repo();
        let repo = GitRepo::open(temp_dir.path()).unwrap();

        let result = repo.describe("no-such-branch");
        assert!(matches!(result, Err(Error::CommitNotFound { .. })));
    }

    #[test]
    fn test_not_git_repo() {
        let temp_dir = TempDir::new().unwrap();
        let result = GitRepo::open(temp_dir.path());
        assert!(matches!(result, Err(Error::NotGitRepository { .. })));
    }
}
