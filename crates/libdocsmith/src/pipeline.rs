//! The end-to-end run: resolve a checkout, collect its API items and generate documents.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::{
    error::Result,
    generator::{Generator, build_prompt},
    item::{ApiItem, normalize},
    listing::list_packages,
    repo,
    store::{DocStore, GeneratedDoc},
};

/// Default directory documents are written under.
pub const DEFAULT_OUTPUT: &str = "docs/generated";

/// Default language requested in prompts.
pub const DEFAULT_LANGUAGE: &str = "English";

/// A repository snapshot ready for extraction.
#[derive(Debug)]
pub struct Checkout {
    /// Working tree location.
    pub path: PathBuf,
    /// Directory name used for this repository in the store.
    pub repo_slug: String,
    /// Version key of the checked-out snapshot.
    pub version: String,
    /// Keeps a temporary clone alive; dropping it removes the clone.
    _temp: Option<TempDir>,
}

/// Counts reported at the end of a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents written.
    pub generated: usize,
    /// Items skipped because their document already existed.
    pub skipped: usize,
}

/// Docsmith extracts a Go repository's exported API and writes one generated document per item.
///
/// Runs are sequential. An error on any item aborts the run; documents already written stay on
/// disk, and a later run without `force` resumes by skipping them.
#[derive(Debug, Clone)]
pub struct Docsmith {
    /// The document store root.
    output: PathBuf,
    /// Regenerate documents that already exist.
    force: bool,
    /// Process at most this many items.
    max_items: Option<usize>,
    /// Ref to check out before extraction.
    git_ref: Option<String>,
    /// Time limit for each external command.
    timeout: Option<Duration>,
    /// Model name recorded in documents.
    model: Option<String>,
    /// Language requested in prompts.
    language: String,
}

impl Default for Docsmith {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl Docsmith {
    /// Creates a new instance writing under `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            force: false,
            max_items: None,
            git_ref: None,
            timeout: Some(Duration::from_secs(120)),
            model: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Regenerate documents even when they already exist.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Cap the number of items processed; `None` or zero means no limit.
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items.filter(|&n| n > 0);
        self
    }

    /// Check out `git_ref` before extracting. Remote sources are then cloned with full history.
    pub fn with_ref(mut self, git_ref: Option<String>) -> Self {
        self.git_ref = git_ref.filter(|r| !r.is_empty());
        self
    }

    /// Time limit for every external command; `None` disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model name recorded in each document.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Language requested in prompts.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Time limit applied to external commands.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The document store this instance writes to.
    pub fn store(&self) -> DocStore {
        DocStore::new(&self.output)
    }

    /// Resolve `source` to a local working tree: clone GitHub sources to a temporary directory,
    /// check out the configured ref, and derive the version key.
    pub fn checkout(&self, source: &str) -> Result<Checkout> {
        let repo_slug = repo::repo_slug(source);
        let (path, temp) = if repo::is_github_repo(source) {
            let depth = if self.git_ref.is_some() { 0 } else { 1 };
            let temp = repo::clone_to_temp(source, depth, self.timeout)?;
            (temp.path().to_path_buf(), Some(temp))
        } else {
            (PathBuf::from(source), None)
        };

        if let Some(git_ref) = &self.git_ref {
            repo::checkout_ref(&path, git_ref, self.timeout)?;
        }
        let version = repo::version_key(&path, self.timeout);
        info!(repo = %repo_slug, %version, "resolved repository");

        Ok(Checkout {
            path,
            repo_slug,
            version,
            _temp: temp,
        })
    }

    /// Extract and normalize the API items of a working tree, honouring the item cap.
    pub fn collect(&self, path: &Path) -> Result<Vec<ApiItem>> {
        let packages = list_packages(path, self.timeout)?;
        let items = normalize(&packages, self.max_items);
        info!(packages = packages.len(), items = items.len(), "collected API items");
        Ok(items)
    }

    /// Generate and store a document for each item, in order.
    ///
    /// Items whose document already exists are skipped unless `force` is set.
    pub fn generate(
        &self,
        repo_slug: &str,
        version: &str,
        items: &[ApiItem],
        generator: &dyn Generator,
    ) -> Result<RunSummary> {
        let store = self.store();
        let mut summary = RunSummary::default();
        for item in items {
            if !self.force && store.exists(repo_slug, version, item) {
                debug!(id = %item.item_id, "document exists, skipping");
                summary.skipped += 1;
                continue;
            }
            let prompt = build_prompt(item, &self.language);
            let content = generator.generate(&prompt)?;
            let doc = GeneratedDoc::new(item.clone(), content, generator.name())
                .with_model(self.model.clone());
            let path = store.upsert(repo_slug, version, &doc)?;
            info!(id = %item.item_id, path = %path.display(), "generated");
            summary.generated += 1;
        }
        Ok(summary)
    }
}

/// One tab-separated line describing `item`, as printed by a dry run.
pub fn dry_run_line(version: &str, item: &ApiItem) -> String {
    format!(
        "{version}\t{}\t{}\t{}\t{}",
        item.import_path, item.kind, item.package, item.signature
    )
}
