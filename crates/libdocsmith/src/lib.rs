//! Docsmith writes per-item API documentation for Go repositories.
//!
//! It runs the Go toolchain's documentation listing over every package in a repository, parses
//! the text into function, method and type records, and normalizes those into uniquely identified
//! API items. Each item is handed to an external generator command for prose, and the result is
//! stored under a deterministic path alongside a per-version index.
//!
//! Storage is idempotent: an item's document path depends only on its identity, so an interrupted
//! run can be resumed by running again without `force`.
//!
//! You must have `go` on your `PATH` to extract listings, and `git` for remote sources.

mod error;
mod exec;
mod generator;
mod item;
mod keywords;
mod listing;
mod parser;
mod pipeline;
mod repo;
mod slug;
mod store;

pub use crate::error::{DocsmithError, Result};
pub use crate::exec::{require_tool, run as run_command};
pub use crate::generator::{CommandGenerator, Generator, build_prompt};
pub use crate::item::{ApiItem, ItemKind, Package, normalize};
pub use crate::listing::list_packages;
pub use crate::parser::{FunctionRecord, Listing, TypeKind, TypeRecord, parse};
pub use crate::pipeline::{
    Checkout, DEFAULT_LANGUAGE, DEFAULT_OUTPUT, Docsmith, RunSummary, dry_run_line,
};
pub use crate::repo::{
    checkout_ref, clone_to_temp, is_github_repo, normalize_github_url, repo_slug, version_key,
};
pub use crate::slug::{PLACEHOLDER, slug};
pub use crate::store::{DocStore, GeneratedDoc, INDEX_FILE, Index, IndexEntry, format_timestamp};
