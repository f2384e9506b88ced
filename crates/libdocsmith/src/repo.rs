//! Repository acquisition: GitHub source detection, cloning, ref checkout and version keys.

use std::{path::Path, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;
use tracing::info;

use crate::{error::Result, exec, slug::slug};

/// `owner/repo` shorthand. Segments may not start with a dot, so relative paths never match.
static SHORT_REPO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*/[A-Za-z0-9_-][A-Za-z0-9._-]*$").expect("short repository pattern")
});

/// Canonical GitHub URL prefix.
const GITHUB_HTTPS: &str = "https://github.com/";

/// Alternative prefixes accepted for GitHub sources.
const GITHUB_ALIASES: &[&str] = &["http://github.com/", "git@github.com:"];

/// Whether `source` names a GitHub repository rather than a local path. The `owner/repo`
/// shorthand only counts when no such local path exists.
pub fn is_github_repo(source: &str) -> bool {
    source.starts_with(GITHUB_HTTPS)
        || GITHUB_ALIASES.iter().any(|prefix| source.starts_with(prefix))
        || is_short_form(source)
}

/// `owner/repo` that does not name an existing local path.
fn is_short_form(source: &str) -> bool {
    SHORT_REPO.is_match(source) && !Path::new(source).exists()
}

/// Rewrite any accepted GitHub source form to an `https://github.com/` URL. Other sources are
/// returned unchanged.
pub fn normalize_github_url(source: &str) -> String {
    for prefix in GITHUB_ALIASES {
        if let Some(rest) = source.strip_prefix(prefix) {
            return format!("{GITHUB_HTTPS}{rest}");
        }
    }
    if is_short_form(source) {
        return format!("{GITHUB_HTTPS}{source}");
    }
    source.to_string()
}

/// Directory name for a repository's documents: `owner_repo` for GitHub sources, the final path
/// component otherwise.
pub fn repo_slug(source: &str) -> String {
    if is_github_repo(source) {
        let url = normalize_github_url(source);
        let path = url.trim_start_matches(GITHUB_HTTPS).trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        return path.replace('/', "_");
    }
    let trimmed = source.trim_end_matches(['/', '\\']);
    Path::new(trimmed)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| slug(trimmed))
}

/// Clone a GitHub source into a temporary directory, removed when the returned handle drops. A
/// `depth` of zero clones the full history.
pub fn clone_to_temp(source: &str, depth: u32, timeout: Option<Duration>) -> Result<TempDir> {
    exec::require_tool("git")?;
    let url = normalize_github_url(source);
    let dir = tempfile::Builder::new().prefix("docsmith-").tempdir()?;

    let mut args = vec!["clone".to_string()];
    if depth > 0 {
        args.push("--depth".to_string());
        args.push(depth.to_string());
    }
    args.push(url.clone());
    args.push(dir.path().to_string_lossy().into_owned());

    info!(%url, "cloning");
    exec::run("git", &args, None, None, timeout)?;
    Ok(dir)
}

/// Check out `git_ref` in `repo_path`.
pub fn checkout_ref(repo_path: &Path, git_ref: &str, timeout: Option<Duration>) -> Result<()> {
    if git_ref.is_empty() {
        return Ok(());
    }
    let args = ["checkout", git_ref].map(String::from);
    exec::run("git", &args, Some(repo_path), None, timeout)?;
    Ok(())
}

/// Derive the version key for the checked-out snapshot: `<tag>-<commit>`, with `untagged` and
/// `unknown` standing in when either probe comes up empty or fails.
pub fn version_key(repo_path: &Path, timeout: Option<Duration>) -> String {
    let git = |args: &[&str]| {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        exec::run("git", &args, Some(repo_path), None, timeout).ok()
    };
    let commit = git(&["rev-parse", "HEAD"])
        .map(|out| out.trim().to_string())
        .filter(|commit| !commit.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let tag = git(&["tag", "--points-at", "HEAD"])
        .and_then(|out| first_non_empty_line(&out).map(str::to_string))
        .unwrap_or_else(|| "untagged".to_string());
    format!("{}-{commit}", slug(&tag))
}

/// The first line of `text` with content, trimmed.
fn first_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
