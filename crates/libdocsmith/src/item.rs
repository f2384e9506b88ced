//! Normalized, cross-package API items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{FunctionRecord, Listing, TypeKind, TypeRecord, bare_receiver_type};

/// What an API item documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Free function.
    Function,
    /// Function with a receiver.
    Method,
    /// Struct or interface.
    Type,
}

impl ItemKind {
    /// Lowercase label used in ids, paths and index entries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One package's parsed listing together with its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Short package name.
    pub name: String,
    /// Full import path.
    pub import_path: String,
    /// Package-level doc comment.
    pub doc: String,
    /// Parsed declarations.
    pub listing: Listing,
}

/// A uniquely identified exported function, method or type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiItem {
    /// `import_path:signature` for functions and methods, `import_path:type:Name` for types.
    pub item_id: String,
    /// Item kind.
    pub kind: ItemKind,
    /// Exported identifier.
    pub name: String,
    /// Rendered signature; `type Name kind` for types.
    pub signature: String,
    /// Short package name.
    pub package: String,
    /// Full import path.
    pub import_path: String,
    /// Receiver clause for methods.
    pub receiver: Option<String>,
    /// Parameter list for functions and methods.
    pub params: Option<String>,
    /// Result clause for functions and methods.
    pub returns: Option<String>,
    /// Struct or interface, for types.
    pub type_kind: Option<TypeKind>,
    /// Rendered fields, for types.
    pub fields: Vec<String>,
    /// Method lines, for types.
    pub methods: Vec<String>,
    /// Description already present in the listing.
    pub source_description: Option<String>,
}

impl ApiItem {
    fn from_function(package: &Package, function: &FunctionRecord) -> Self {
        let kind = if function.is_method() {
            ItemKind::Method
        } else {
            ItemKind::Function
        };
        Self {
            item_id: format!("{}:{}", package.import_path, function.signature),
            kind,
            name: function.name.clone(),
            signature: function.signature.clone(),
            package: package.name.clone(),
            import_path: package.import_path.clone(),
            receiver: function.receiver.clone(),
            params: Some(function.params.clone()),
            returns: Some(function.returns.clone()).filter(|r| !r.is_empty()),
            type_kind: None,
            fields: Vec::new(),
            methods: Vec::new(),
            source_description: function.description.clone(),
        }
    }

    fn from_type(package: &Package, record: &TypeRecord) -> Self {
        Self {
            item_id: format!("{}:type:{}", package.import_path, record.name),
            kind: ItemKind::Type,
            name: record.name.clone(),
            signature: format!("type {} {}", record.name, record.kind),
            package: package.name.clone(),
            import_path: package.import_path.clone(),
            receiver: None,
            params: None,
            returns: None,
            type_kind: Some(record.kind),
            fields: record.fields.clone(),
            methods: record.methods.clone(),
            source_description: record.description.clone(),
        }
    }

    /// File name stem for this item's document. Methods are prefixed with their receiver type so
    /// same-named methods on different receivers do not collide.
    pub fn file_stem(&self) -> String {
        match (self.kind, self.receiver_type()) {
            (ItemKind::Method, Some(receiver)) => format!("{receiver}_{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// The receiver's bare type name, for methods.
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver.as_deref().and_then(bare_receiver_type)
    }
}

/// Flatten per-package listings into API items.
///
/// Items come out in package order; within a package functions precede types, each in listing
/// order. `limit` keeps only the first N items.
pub fn normalize(packages: &[Package], limit: Option<usize>) -> Vec<ApiItem> {
    let items = packages.iter().flat_map(|package| {
        let functions = package
            .listing
            .functions
            .iter()
            .map(move |function| ApiItem::from_function(package, function));
        let types = package
            .listing
            .types
            .iter()
            .map(move |record| ApiItem::from_type(package, record));
        functions.chain(types)
    });
    match limit {
        Some(limit) => items.take(limit).collect(),
        None => items.collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse;

    fn package(name: &str, import_path: &str, text: &str) -> Package {
        Package {
            name: name.to_string(),
            import_path: import_path.to_string(),
            doc: String::new(),
            listing: parse(text),
        }
    }

    #[test]
    fn same_name_in_two_packages_gets_distinct_ids() {
        let packages = vec![
            package("a", "example.com/a", "func New() *T"),
            package("b", "example.com/b", "func New() *T"),
        ];
        let items = normalize(&packages, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_id, "example.com/a:func New() *T");
        assert_eq!(items[1].item_id, "example.com/b:func New() *T");
    }

    #[test]
    fn kinds_ids_and_order() {
        let text = "\
type Client struct {
	Addr string
}

func Dial(addr string) (*Client, error)
func (c *Client) Close() error
";
        let items = normalize(&[package("net", "example.com/net", text)], None);
        let summary: Vec<(ItemKind, &str)> =
            items.iter().map(|i| (i.kind, i.item_id.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (
                    ItemKind::Function,
                    "example.com/net:func Dial(addr string) (*Client, error)"
                ),
                (
                    ItemKind::Method,
                    "example.com/net:func (c *Client) Close() error"
                ),
                (ItemKind::Type, "example.com/net:type:Client"),
            ]
        );
        let ty = &items[2];
        assert_eq!(ty.signature, "type Client struct");
        assert_eq!(ty.type_kind, Some(TypeKind::Struct));
        assert_eq!(ty.fields, vec!["Addr string"]);
        assert_eq!(items[1].file_stem(), "Client_Close");
    }

    #[test]
    fn limit_truncates_without_reordering() {
        let text = "func A()\nfunc B()\nfunc C()\n";
        let items = normalize(&[package("p", "p", text)], Some(2));
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn normalization_is_deterministic() {
        let packages = vec![package("p", "example.com/p", "func A(x int) int\n")];
        assert_eq!(normalize(&packages, None), normalize(&packages, None));
    }
}
