//! On-disk document store.
//!
//! Layout under the base directory:
//!
//! ```text
//! <repo>/<version>/index.json
//! <repo>/<version>/<package>/<kind>/<name>.md
//! ```
//!
//! Every segment after the repository slug passes through [`slug`]. The store assumes a single
//! writer per (repository, version) pair; concurrent runs against the same tree are not
//! coordinated.

use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{
    error::{DocsmithError, Result},
    item::{ApiItem, ItemKind},
    slug::slug,
};

/// File name of the per-version index.
pub const INDEX_FILE: &str = "index.json";

/// Marker delimiting the rendered header block.
const HEADER_MARKER: &str = "---";

/// Format a timestamp as RFC 3339 UTC with second precision, e.g. `2024-05-01T12:00:00Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Generated prose for one API item, plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDoc {
    /// The documented item.
    pub item: ApiItem,
    /// Generated body text.
    pub content: String,
    /// When the content was produced.
    pub generated_at: DateTime<Utc>,
    /// Tag naming the producer.
    pub generator: String,
    /// Model used by the producer, if known.
    pub model: Option<String>,
}

impl GeneratedDoc {
    /// Wrap freshly generated content, stamped with the current time.
    pub fn new(item: ApiItem, content: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            item,
            content: content.into(),
            generated_at: Utc::now(),
            generator: generator.into(),
            model: None,
        }
    }

    /// Record the model that produced the content.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Render the document: a fixed-order header block, a blank line, then the trimmed body.
    pub fn render(&self) -> String {
        let item = &self.item;
        let header = [
            HEADER_MARKER.to_string(),
            format!("id: {}", item.item_id),
            format!("kind: {}", item.kind),
            format!("name: {}", item.name),
            format!("package: {}", item.package),
            format!("import_path: {}", item.import_path),
            format!("signature: {}", item.signature),
            format!("generated_at: {}", format_timestamp(self.generated_at)),
            format!("generator: {}", self.generator),
            format!("model: {}", self.model.as_deref().unwrap_or_default()),
            HEADER_MARKER.to_string(),
            String::new(),
        ];
        format!("{}\n{}\n", header.join("\n"), self.content.trim())
    }
}

/// One row of the per-version index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Item identity.
    pub id: String,
    /// Item kind.
    pub kind: ItemKind,
    /// Exported identifier.
    pub name: String,
    /// Short package name.
    pub package: String,
    /// Full import path.
    pub import_path: String,
    /// Rendered signature.
    pub signature: String,
    /// Document path relative to the store root, `/`-separated.
    pub path: String,
    /// Generation timestamp.
    pub generated_at: String,
    /// Producer tag.
    pub generator: String,
    /// Model, if recorded.
    #[serde(default)]
    pub model: Option<String>,
}

impl IndexEntry {
    /// Build the entry describing `doc`, stored at `path`.
    fn for_doc(doc: &GeneratedDoc, path: String) -> Self {
        Self {
            id: doc.item.item_id.clone(),
            kind: doc.item.kind,
            name: doc.item.name.clone(),
            package: doc.item.package.clone(),
            import_path: doc.item.import_path.clone(),
            signature: doc.item.signature.clone(),
            path,
            generated_at: format_timestamp(doc.generated_at),
            generator: doc.generator.clone(),
            model: doc.model.clone(),
        }
    }
}

/// Serialized shape of the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    /// Repository slug.
    repo: String,
    /// Version key.
    version: String,
    /// Last write time.
    updated_at: String,
    /// Entries in insertion order.
    #[serde(default)]
    items: Vec<IndexEntry>,
}

/// The per-version manifest of generated documents.
///
/// Entries keep insertion order; an id-to-position map makes upserts constant time. There is at
/// most one entry per id.
#[derive(Debug, Clone)]
pub struct Index {
    /// Repository slug.
    repo: String,
    /// Version key.
    version: String,
    /// Last write time.
    updated_at: String,
    /// Entries in insertion order.
    entries: Vec<IndexEntry>,
    /// Position of each id in `entries`.
    positions: HashMap<String, usize>,
}

impl Index {
    /// An index with no entries.
    pub fn empty(repo: &str, version: &str) -> Self {
        Self {
            repo: repo.to_string(),
            version: version.to_string(),
            updated_at: format_timestamp(Utc::now()),
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Rebuild from a decoded file, scoped to `repo`/`version`. Duplicate ids keep the first
    /// occurrence.
    fn from_file(file: IndexFile, repo: &str, version: &str) -> Self {
        let mut index = Self {
            updated_at: file.updated_at,
            ..Self::empty(repo, version)
        };
        for entry in file.items {
            if !index.positions.contains_key(&entry.id) {
                index.positions.insert(entry.id.clone(), index.entries.len());
                index.entries.push(entry);
            }
        }
        index
    }

    /// Read the index at `path`. A missing or undecodable file yields an empty index; other read
    /// failures are errors.
    pub fn load(path: &Path, repo: &str, version: &str) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::empty(repo, version)),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<IndexFile>(&raw) {
            Ok(file) => Ok(Self::from_file(file, repo, version)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "resetting malformed index");
                Ok(Self::empty(repo, version))
            }
        }
    }

    /// Replace the entry with the same id in place, or append. Returns true on replacement.
    pub fn upsert(&mut self, entry: IndexEntry) -> bool {
        self.updated_at = format_timestamp(Utc::now());
        if let Some(&pos) = self.positions.get(&entry.id) {
            self.entries[pos] = entry;
            true
        } else {
            self.positions.insert(entry.id.clone(), self.entries.len());
            self.entries.push(entry);
            false
        }
    }

    /// Look up an entry by item id.
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.positions.get(id).map(|&pos| &self.entries[pos])
    }

    /// Entries in index order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Repository slug this index belongs to.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Version key this index belongs to.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Time of the last upsert, RFC 3339.
    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Serialize and write the index to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = IndexFile {
            repo: self.repo.clone(),
            version: self.version.clone(),
            updated_at: self.updated_at.clone(),
            items: self.entries.clone(),
        };
        let mut encoded = serde_json::to_string_pretty(&file)?;
        encoded.push('\n');
        write_file(path, encoded.as_bytes())
    }
}

/// Write `contents` to `path` through a temporary sibling file, creating parent directories.
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    // Temp files start owner-only; stored files are meant to be shared.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path)?;
    Ok(())
}

/// Owner of generated documents and index files under a base directory.
#[derive(Debug, Clone)]
pub struct DocStore {
    /// Root of the store.
    base_dir: PathBuf,
}

impl DocStore {
    /// Create a store rooted at `base_dir`. Nothing is touched on disk until the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The store root.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding one version's documents and index.
    fn version_dir(&self, repo_slug: &str, version: &str) -> PathBuf {
        self.base_dir.join(repo_slug).join(slug(version))
    }

    /// Canonical document path for `item`. Pure; performs no I/O.
    pub fn doc_path(&self, repo_slug: &str, version: &str, item: &ApiItem) -> PathBuf {
        self.version_dir(repo_slug, version)
            .join(slug(&item.package))
            .join(slug(item.kind.label()))
            .join(format!("{}.md", slug(&item.file_stem())))
    }

    /// Path of the index file for a repository version.
    pub fn index_path(&self, repo_slug: &str, version: &str) -> PathBuf {
        self.version_dir(repo_slug, version).join(INDEX_FILE)
    }

    /// Whether the document for `item` already exists.
    pub fn exists(&self, repo_slug: &str, version: &str, item: &ApiItem) -> bool {
        self.doc_path(repo_slug, version, item).is_file()
    }

    /// Read the index for a repository version.
    pub fn load_index(&self, repo_slug: &str, version: &str) -> Result<Index> {
        Index::load(&self.index_path(repo_slug, version), repo_slug, version)
    }

    /// Write `doc` to its canonical path and record it in the version index, returning the
    /// document path.
    pub fn upsert(&self, repo_slug: &str, version: &str, doc: &GeneratedDoc) -> Result<PathBuf> {
        let path = self.doc_path(repo_slug, version, &doc.item);
        write_file(&path, doc.render().as_bytes())?;
        debug!(path = %path.display(), id = %doc.item.item_id, "wrote document");

        let relative = self.relative(&path)?;
        let index_path = self.index_path(repo_slug, version);
        let mut index = Index::load(&index_path, repo_slug, version)?;
        index.upsert(IndexEntry::for_doc(doc, relative));
        index.save(&index_path)?;
        Ok(path)
    }

    /// Express `path` relative to the store root with `/` separators.
    fn relative(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.base_dir)
            .map_err(|_| DocsmithError::OutsideStore(path.to_path_buf()))?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::item::{Package, normalize};
    use crate::parser::parse;

    fn items() -> Vec<ApiItem> {
        let text = "\
func Greet(name string) string
func (c *Client) Send(msg string) error
type Client struct {
	Addr string
}
";
        let package = Package {
            name: "greet".to_string(),
            import_path: "example.com/greet".to_string(),
            doc: String::new(),
            listing: parse(text),
        };
        normalize(&[package], None)
    }

    fn doc(item: ApiItem, content: &str) -> GeneratedDoc {
        GeneratedDoc {
            item,
            content: content.to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            generator: "test".to_string(),
            model: None,
        }
    }

    #[test]
    fn doc_paths() {
        let store = DocStore::new("/docs");
        let items = items();
        assert_eq!(
            store.doc_path("acme_greet", "v1.0-abc", &items[0]),
            PathBuf::from("/docs/acme_greet/v1.0-abc/greet/function/Greet.md")
        );
        assert_eq!(
            store.doc_path("acme_greet", "v1.0/abc", &items[1]),
            PathBuf::from("/docs/acme_greet/v1.0_abc/greet/method/Client_Send.md")
        );
        assert_eq!(
            store.doc_path("acme_greet", "", &items[2]),
            PathBuf::from("/docs/acme_greet/unknown/greet/type/Client.md")
        );
    }

    #[test]
    fn render_layout() {
        let item = items().remove(0);
        let rendered = doc(item, "\n\n  Greets someone.  \n\n").render();
        assert_eq!(
            rendered,
            "---\n\
             id: example.com/greet:func Greet(name string) string\n\
             kind: function\n\
             name: Greet\n\
             package: greet\n\
             import_path: example.com/greet\n\
             signature: func Greet(name string) string\n\
             generated_at: 2024-05-01T12:00:00Z\n\
             generator: test\n\
             model: \n\
             ---\n\
             \n\
             Greets someone.\n"
        );
    }

    #[test]
    fn upsert_then_exists() -> Result<()> {
        let dir = tempdir()?;
        let store = DocStore::new(dir.path());
        for item in items() {
            assert!(!store.exists("r", "v", &item));
            let path = store.upsert("r", "v", &doc(item.clone(), "body"))?;
            assert!(store.exists("r", "v", &item));
            assert!(path.starts_with(dir.path()));
        }
        let index = store.load_index("r", "v")?;
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.get(&items()[1].item_id).map(|e| e.path.as_str()),
            Some("r/v/greet/method/Client_Send.md")
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn stored_files_are_world_readable() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let store = DocStore::new(dir.path());
        let path = store.upsert("r", "v", &doc(items().remove(0), "body"))?;
        let mode = |p: &Path| fs::metadata(p).map(|m| m.permissions().mode() & 0o777);
        assert_eq!(mode(&path)?, 0o644);
        assert_eq!(mode(&store.index_path("r", "v"))?, 0o644);
        Ok(())
    }

    #[test]
    fn malformed_index_is_reset() -> Result<()> {
        let dir = tempdir()?;
        let store = DocStore::new(dir.path());
        let index_path = store.index_path("r", "v");
        fs::create_dir_all(index_path.parent().unwrap())?;
        fs::write(&index_path, "{not json")?;

        let item = items().remove(0);
        store.upsert("r", "v", &doc(item, "body"))?;
        let index = store.load_index("r", "v")?;
        assert_eq!(index.len(), 1);
        assert_eq!(index.repo(), "r");
        assert_eq!(index.version(), "v");
        Ok(())
    }

    #[test]
    fn duplicate_ids_collapse_on_load() {
        let entry = IndexEntry::for_doc(&doc(items().remove(0), "x"), "a.md".to_string());
        let file = IndexFile {
            repo: "r".to_string(),
            version: "v".to_string(),
            updated_at: String::new(),
            items: vec![entry.clone(), entry],
        };
        let index = Index::from_file(file, "r", "v");
        assert_eq!(index.len(), 1);
    }
}
