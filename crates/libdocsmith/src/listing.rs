//! Package discovery and documentation listings via the `go` tool.

use std::{path::Path, time::Duration};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::Result,
    exec,
    item::Package,
    parser::parse,
};

/// The fields of a `go list -json` record that the listing needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GoListPackage {
    /// Full import path.
    import_path: String,
    /// Short package name.
    name: String,
    /// Directory containing the package sources.
    dir: String,
    /// Package doc comment synopsis.
    doc: String,
}

/// Decode the stream of concatenated JSON objects printed by `go list -json`. Decoding stops at the
/// first malformed object.
fn decode_go_list(payload: &str) -> Vec<GoListPackage> {
    serde_json::Deserializer::from_str(payload)
        .into_iter::<GoListPackage>()
        .map_while(|record| record.ok())
        .collect()
}

/// Fetch the `go doc -all` text for one package, preferring its directory and falling back to the
/// import path.
fn package_doc(record: &GoListPackage, timeout: Option<Duration>) -> Result<String> {
    let all = |target: &str| vec!["doc".to_string(), "-all".to_string(), target.to_string()];

    if !record.dir.is_empty() {
        match exec::run("go", &all("./"), Some(Path::new(&record.dir)), None, timeout) {
            Ok(text) => return Ok(text),
            Err(e) => debug!(dir = %record.dir, error = %e, "go doc in directory failed"),
        }
    }
    if record.import_path.is_empty() {
        return Ok(String::new());
    }
    exec::run("go", &all(&record.import_path), None, None, timeout)
}

/// List every package under `repo_path` and parse its documentation listing.
pub fn list_packages(repo_path: &Path, timeout: Option<Duration>) -> Result<Vec<Package>> {
    exec::require_tool("go")?;
    let args = ["list", "-json", "./..."].map(String::from);
    let payload = exec::run("go", &args, Some(repo_path), None, timeout)?;

    let mut packages = Vec::new();
    for record in decode_go_list(&payload) {
        let text = package_doc(&record, timeout)?;
        let listing = parse(&text);
        info!(
            package = %record.import_path,
            functions = listing.functions.len(),
            types = listing.types.len(),
            "parsed package"
        );
        packages.push(Package {
            name: record.name,
            import_path: record.import_path,
            doc: record.doc,
            listing,
        });
    }
    Ok(packages)
}
