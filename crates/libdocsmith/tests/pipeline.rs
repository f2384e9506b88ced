//! Integration tests for generation runs against a stub generator.
#![allow(clippy::tests_outside_test_module)]

use std::{cell::RefCell, fs};

use libdocsmith::{
    ApiItem, DocsmithError, Docsmith, Generator, Package, Result, RunSummary, dry_run_line,
    normalize, parse,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Records prompts and answers with a numbered reply, optionally failing on one call.
struct Stub {
    prompts: RefCell<Vec<String>>,
    fail_on: Option<usize>,
}

impl Stub {
    fn new() -> Self {
        Self {
            prompts: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl Generator for Stub {
    fn name(&self) -> &str {
        "stub"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let call = self.calls();
        self.prompts.borrow_mut().push(prompt.to_string());
        if self.fail_on == Some(call) {
            return Err(DocsmithError::CommandFailed {
                command: "stub".to_string(),
                output: "boom".to_string(),
            });
        }
        Ok(format!("reply {call}\n"))
    }
}

fn items() -> Vec<ApiItem> {
    let text = "\
func A() int
func B() int
func (t *T) C() error
type T struct {
	X int
}
";
    let package = Package {
        name: "p".to_string(),
        import_path: "example.com/p".to_string(),
        doc: String::new(),
        listing: parse(text),
    };
    normalize(&[package], None)
}

#[test]
fn first_run_generates_everything() -> Result<()> {
    let dir = TempDir::new()?;
    let docsmith = Docsmith::new(dir.path()).with_model(Some("m".to_string()));
    let stub = Stub::new();

    let summary = docsmith.generate("r", "v", &items(), &stub)?;
    assert_eq!(
        summary,
        RunSummary {
            generated: 4,
            skipped: 0
        }
    );
    assert_eq!(stub.calls(), 4);

    let store = docsmith.store();
    let index = store.load_index("r", "v")?;
    assert_eq!(index.len(), 4);
    assert!(index.entries().iter().all(|e| e.generator == "stub"));
    assert!(index.entries().iter().all(|e| e.model.as_deref() == Some("m")));

    let method = &items()[2];
    let body = fs::read_to_string(store.doc_path("r", "v", method))?;
    assert!(body.ends_with("\nreply 2\n"));
    Ok(())
}

#[test]
fn second_run_skips_existing_documents() -> Result<()> {
    let dir = TempDir::new()?;
    let docsmith = Docsmith::new(dir.path());
    docsmith.generate("r", "v", &items(), &Stub::new())?;

    let stub = Stub::new();
    let summary = docsmith.generate("r", "v", &items(), &stub)?;
    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.generated, 0);
    assert_eq!(stub.calls(), 0);
    Ok(())
}

#[test]
fn force_regenerates_without_duplicating_entries() -> Result<()> {
    let dir = TempDir::new()?;
    Docsmith::new(dir.path()).generate("r", "v", &items(), &Stub::new())?;

    let forced = Docsmith::new(dir.path()).with_force(true);
    let stub = Stub::new();
    let summary = forced.generate("r", "v", &items(), &stub)?;
    assert_eq!(summary.generated, 4);
    assert_eq!(stub.calls(), 4);
    assert_eq!(forced.store().load_index("r", "v")?.len(), 4);
    Ok(())
}

#[test]
fn failure_aborts_and_resume_picks_up() -> Result<()> {
    let dir = TempDir::new()?;
    let docsmith = Docsmith::new(dir.path());

    let err = docsmith
        .generate("r", "v", &items(), &Stub::failing_on(2))
        .unwrap_err();
    assert!(matches!(err, DocsmithError::CommandFailed { .. }));
    assert_eq!(docsmith.store().load_index("r", "v")?.len(), 2);

    let stub = Stub::new();
    let summary = docsmith.generate("r", "v", &items(), &stub)?;
    assert_eq!(
        summary,
        RunSummary {
            generated: 2,
            skipped: 2
        }
    );
    let ids: Vec<String> = docsmith
        .store()
        .load_index("r", "v")?
        .entries()
        .iter()
        .map(|e| e.id.clone())
        .collect();
    let expected: Vec<String> = items().into_iter().map(|i| i.item_id).collect();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn prompts_use_configured_language() -> Result<()> {
    let dir = TempDir::new()?;
    let stub = Stub::new();
    Docsmith::new(dir.path())
        .with_language("Chinese")
        .generate("r", "v", &items()[..1], &stub)?;
    assert!(stub.prompts.borrow()[0].contains("documentation in Chinese."));
    Ok(())
}

#[test]
fn dry_run_lines_are_tab_separated() {
    let item = &items()[2];
    assert_eq!(
        dry_run_line("v1-abc", item),
        "v1-abc\texample.com/p\tmethod\tp\tfunc (t *T) C() error"
    );
}
