//! Integration tests parsing realistic `go doc -all` listings.
#![allow(clippy::tests_outside_test_module)]

use libdocsmith::{ItemKind, Package, TypeKind, normalize, parse};
use pretty_assertions::assert_eq;

const LISTING: &str = r#"package kv // import "example.com/kv"

Package kv implements a tiny key/value store.

CONSTANTS

const DefaultTimeout = 5
    DefaultTimeout is used when no timeout is configured.


VARIABLES

var ErrNotFound = errors.New("kv: not found")
    ErrNotFound is returned when a key is missing.


FUNCTIONS

func Open(path string, opts ...Option) (*Store, error)
    Open opens the store at path.

func WithTimeout(d time.Duration) Option
    WithTimeout sets the operation timeout.


TYPES

type Option func(*options)
    Option configures a Store.

type Store struct {
	Path string // location on disk

	// Has unexported fields.
}
    Store is a handle to an open database.

func (s *Store) Close() error
    Close releases the store.

func (s *Store) Get(key string) ([]byte, error)
    Get fetches a key.

type Walker interface {
	Walk(fn func(key string, value []byte) error) error
}
    Walker iterates over entries.

"#;

#[test]
fn realistic_listing() {
    let listing = parse(LISTING);

    let functions: Vec<(&str, Option<&str>, &str)> = listing
        .functions
        .iter()
        .map(|f| (f.name.as_str(), f.receiver.as_deref(), f.signature.as_str()))
        .collect();
    assert_eq!(
        functions,
        vec![
            (
                "Open",
                None,
                "func Open(path string, opts ...Option) (*Store, error)"
            ),
            ("WithTimeout", None, "func WithTimeout(d time.Duration) Option"),
            ("Close", Some("s *Store"), "func (s *Store) Close() error"),
            (
                "Get",
                Some("s *Store"),
                "func (s *Store) Get(key string) ([]byte, error)"
            ),
        ]
    );
    assert!(
        listing
            .functions
            .iter()
            .all(|f| f.package.as_deref() == Some("kv"))
    );

    assert_eq!(listing.types.len(), 2);
    let store = &listing.types[0];
    assert_eq!(store.name, "Store");
    assert_eq!(store.kind, TypeKind::Struct);
    assert_eq!(store.fields, vec!["Path string // location on disk"]);
    assert!(store.methods.is_empty());

    let walker = &listing.types[1];
    assert_eq!(walker.kind, TypeKind::Interface);
    assert_eq!(
        walker.methods,
        vec!["Walk(fn func(key string, value []byte) error) error"]
    );
}

#[test]
fn body_scan_resumes_on_the_closing_line() {
    let text = "type A struct {\n\tX int\n}\nfunc After() int\ntype B struct {\n\tY int\n}\n";
    let listing = parse(text);
    assert_eq!(listing.functions.len(), 1);
    assert_eq!(listing.functions[0].name, "After");
    let names: Vec<&str> = listing.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn unterminated_body_is_kept() {
    let listing = parse("type A struct {\n\tX int\n\tY string // why");
    assert_eq!(listing.types.len(), 1);
    assert_eq!(listing.types[0].fields, vec!["X int", "Y string // why"]);
}

#[test]
fn garbage_is_dropped_silently() {
    let listing = parse("%%%\n\u{0}\nfunc\nfunc (\ntype\ntype X\n}\n");
    assert!(listing.functions.is_empty());
    assert!(listing.types.is_empty());
}

#[test]
fn windows_line_endings() {
    let listing = parse("func A() int\r\ntype T struct {\r\n\tX int\r\n}\r\n");
    assert_eq!(listing.functions[0].returns, "int");
    assert_eq!(listing.types[0].fields, vec!["X int"]);
}

#[test]
fn listing_to_items() {
    let package = Package {
        name: "kv".to_string(),
        import_path: "example.com/kv".to_string(),
        doc: "Package kv implements a tiny key/value store.".to_string(),
        listing: parse(LISTING),
    };
    let items = normalize(&[package], None);
    let kinds: Vec<ItemKind> = items.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ItemKind::Function,
            ItemKind::Function,
            ItemKind::Method,
            ItemKind::Method,
            ItemKind::Type,
            ItemKind::Type,
        ]
    );
    assert_eq!(items[4].item_id, "example.com/kv:type:Store");
    assert_eq!(items[5].signature, "type Walker interface");
}
