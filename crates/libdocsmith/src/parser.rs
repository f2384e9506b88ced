//! Line-oriented recognizer for `go doc -all` listings.
//!
//! The listing format is informal, so parsing is best effort: each line is classified against a
//! small set of patterns and anything unrecognized is dropped. The scanner has two states, top
//! level and inside a type body, and makes a single forward pass over the input.
//!
//! Signatures must fit on one physical line. Declarations wrapped across several lines fail to
//! match and are dropped with the rest of the unrecognized input.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::keywords::is_reserved_word;

/// Function or method header: `func [(receiver)] Name`. Everything after the name is split off
/// by hand so that nested parentheses in parameter lists are handled.
static FUNC_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func(?:\s+\(([^()]+)\))?\s+([A-Z]\w*)").expect("function header pattern")
});

/// Type header: `type Name[params] struct|interface`.
static TYPE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^type\s+([A-Z]\w*)(?:\[[^\]]*\])?\s+(struct|interface)\b")
        .expect("type header pattern")
});

/// Field line inside a type body: `name type [// comment]`.
static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s+([^/\s].*?)\s*(?://\s*(.*?))?\s*$").expect("field pattern")
});

/// Interface method line inside a type body: `Name(args) results`.
static INTERFACE_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\w*(?:\[[^\]]*\])?\(").expect("interface method pattern"));

/// A run of spaces separating a header from a trailing summary.
static DESCRIPTION_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("gap pattern"));

/// Section banners printed by `go doc -all`.
const BANNERS: &[&str] = &["CONSTANTS", "VARIABLES", "FUNCTIONS", "TYPES"];

/// A function or method header extracted from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    /// Exported identifier.
    pub name: String,
    /// Receiver clause without parentheses, e.g. `c *Client`. Present only for methods.
    pub receiver: Option<String>,
    /// Type parameter list including brackets, e.g. `[T any]`.
    pub type_params: Option<String>,
    /// Parameter list including parentheses, exactly as written.
    pub params: String,
    /// Result clause as written, possibly empty.
    pub returns: String,
    /// Canonical `func [(receiver)] Name[T](params) returns` rendering.
    pub signature: String,
    /// Summary text trailing the header on the same line.
    pub description: Option<String>,
    /// Package the record was found in, when a package line preceded it.
    pub package: Option<String>,
}

impl FunctionRecord {
    /// Whether this record has a receiver.
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// The receiver's type as written, binding name dropped: `c *Client` gives `*Client`.
    pub fn receiver_type_ref(&self) -> Option<&str> {
        self.receiver.as_deref()?.split_whitespace().last()
    }

    /// The receiver's type with any pointer marker and binding name stripped: `c *Client` gives
    /// `Client`.
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver.as_deref().and_then(bare_receiver_type)
    }
}

/// Reduce a receiver clause to its type name: `s *Set[T]` gives `Set`.
pub fn bare_receiver_type(receiver: &str) -> Option<&str> {
    let ty = receiver.split_whitespace().last()?.trim_start_matches('*');
    ty.split('[').next().filter(|ty| !ty.is_empty())
}

/// The composite kinds recognized in type headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `struct` declaration.
    Struct,
    /// `interface` declaration.
    Interface,
}

impl TypeKind {
    /// The Go keyword for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Interface => "interface",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A struct or interface declaration extracted from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    /// Exported identifier.
    pub name: String,
    /// Declaration kind.
    pub kind: TypeKind,
    /// Rendered `name type [// comment]` lines in source order.
    pub fields: Vec<String>,
    /// Method signature lines found in the body, verbatim.
    pub methods: Vec<String>,
    /// Summary text. The line scanner never fills this in.
    pub description: Option<String>,
    /// Package the record was found in, when a package line preceded it.
    pub package: Option<String>,
}

impl TypeRecord {
    /// Create an empty record for a type header.
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            fields: Vec::new(),
            methods: Vec::new(),
            description: None,
            package: None,
        }
    }
}

/// Everything extracted from one package listing, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Function and method records.
    pub functions: Vec<FunctionRecord>,
    /// Struct and interface records.
    pub types: Vec<TypeRecord>,
}

/// Scanner state.
enum ScanState {
    /// Between declarations.
    TopLevel,
    /// Inside the braces of a type declaration.
    TypeBody(TypeRecord),
}

/// A classified line from inside a type body.
enum BodyLine {
    /// A rendered field.
    Field(String),
    /// A method signature line.
    Method(String),
}

/// Parse the text of one package's documentation listing.
///
/// Records come back in input order with no deduplication. Lines that match neither a function
/// header nor a type header are dropped without error.
pub fn parse(text: &str) -> Listing {
    let mut listing = Listing::default();
    let mut package: Option<String> = None;
    let mut state = ScanState::TopLevel;

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');

        if let ScanState::TypeBody(record) = &mut state {
            if line.trim().is_empty() {
                continue;
            }
            if is_indented(line) {
                match classify_body_line(line.trim()) {
                    Some(BodyLine::Field(field)) => record.fields.push(field),
                    Some(BodyLine::Method(method)) => record.methods.push(method),
                    None => trace!(line, "dropping type body line"),
                }
                continue;
            }
            // An unindented line closes the body and is then handled at top level.
            if let ScanState::TypeBody(record) = std::mem::replace(&mut state, ScanState::TopLevel)
            {
                listing.types.push(record);
            }
        }

        if let Some(rest) = line.strip_prefix("package ") {
            package = rest.split_whitespace().next().map(str::to_string);
            continue;
        }

        if line.trim().is_empty() || is_indented(line) || is_banner(line) {
            continue;
        }

        if let Some(mut function) = parse_function(line) {
            function.package = package.clone();
            listing.functions.push(function);
            continue;
        }

        if let Some((mut record, opens_body)) = parse_type_header(line) {
            record.package = package.clone();
            if opens_body {
                state = ScanState::TypeBody(record);
            } else {
                listing.types.push(record);
            }
            continue;
        }

        trace!(line, "dropping unrecognized line");
    }

    if let ScanState::TypeBody(record) = state {
        listing.types.push(record);
    }

    listing
}

/// Whether the line starts with whitespace.
fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// Whether the line is one of the listing's section banners.
fn is_banner(line: &str) -> bool {
    BANNERS.iter().any(|banner| line.starts_with(banner))
}

/// Split a header line into the declaration and the summary trailing the last run of two or more
/// spaces.
fn split_description(line: &str) -> (&str, Option<String>) {
    let mut gaps = DESCRIPTION_GAP.find_iter(line);
    let Some(first) = gaps.next() else {
        return (line.trim_end(), None);
    };
    let last = gaps.last().unwrap_or(first);
    let description = line[last.end()..].trim();
    if description.is_empty() {
        return (line.trim_end(), None);
    }
    (line[..first.start()].trim_end(), Some(description.to_string()))
}

/// Take a bracketed group from the start of `text`, honouring nesting. Returns the group,
/// brackets included, and the remainder; `None` when the group never closes.
fn take_balanced(text: &str, open: char, close: char) -> Option<(&str, &str)> {
    if !text.starts_with(open) {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let end = idx + ch.len_utf8();
                return Some((&text[..end], &text[end..]));
            }
        }
    }
    None
}

/// Match a function or method header line.
fn parse_function(line: &str) -> Option<FunctionRecord> {
    let caps = FUNC_HEADER.captures(line)?;
    let receiver = caps
        .get(1)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));
    let name = caps.get(2)?.as_str().to_string();
    let mut rest = &line[caps.get(0)?.end()..];

    let mut type_params = None;
    if rest.starts_with('[') {
        let (group, tail) = take_balanced(rest, '[', ']')?;
        type_params = Some(group.to_string());
        rest = tail;
    }

    let (params, rest) = if rest.trim_start().starts_with('(') {
        take_balanced(rest.trim_start(), '(', ')')?
    } else {
        ("()", rest)
    };
    // Only the text after the parameter list can carry the trailing summary.
    let (returns, description) = split_description(rest);
    let returns = returns.trim().to_string();

    let mut signature = String::from("func");
    if let Some(receiver) = &receiver {
        signature.push_str(&format!(" ({receiver})"));
    }
    signature.push(' ');
    signature.push_str(&name);
    if let Some(type_params) = &type_params {
        signature.push_str(type_params);
    }
    signature.push_str(params);
    if !returns.is_empty() {
        signature.push(' ');
        signature.push_str(&returns);
    }

    Some(FunctionRecord {
        name,
        receiver,
        type_params,
        params: params.to_string(),
        returns,
        signature,
        description,
        package: None,
    })
}

/// Match a type header line. The flag reports whether the header leaves a brace open, in which
/// case the indented lines that follow are the type's body.
fn parse_type_header(line: &str) -> Option<(TypeRecord, bool)> {
    let caps = TYPE_HEADER.captures(line)?;
    let kind = match caps.get(2)?.as_str() {
        "struct" => TypeKind::Struct,
        _ => TypeKind::Interface,
    };
    let record = TypeRecord::new(caps.get(1)?.as_str(), kind);
    let opens_body = line[caps.get(0)?.end()..].trim_end().ends_with('{');
    Some((record, opens_body))
}

/// Classify a trimmed, non-empty line from inside a type body.
fn classify_body_line(content: &str) -> Option<BodyLine> {
    if content.starts_with("//") {
        return None;
    }
    if let Some(caps) = FIELD.captures(content)
        && !is_reserved_word(&caps[1])
    {
        let field = match caps.get(3).map(|m| m.as_str()).filter(|c| !c.is_empty()) {
            Some(comment) => format!("{} {} // {}", &caps[1], &caps[2], comment),
            None => format!("{} {}", &caps[1], &caps[2]),
        };
        return Some(BodyLine::Field(field));
    }
    if content.starts_with("func") || INTERFACE_METHOD.is_match(content) {
        return Some(BodyLine::Method(content.to_string()));
    }
    None
}
