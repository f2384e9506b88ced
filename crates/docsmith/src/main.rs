//! Command-line front end for docsmith.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use libdocsmith::{CommandGenerator, DEFAULT_LANGUAGE, DEFAULT_OUTPUT, Docsmith, dry_run_line};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments.
struct Cli {
    /// Repository to document - a local directory or a GitHub source (URL, git@ or owner/repo)
    repo: String,

    /// Git ref to check out (tag, branch or commit)
    #[arg(long = "ref")]
    git_ref: Option<String>,

    /// Directory generated documents are written under
    #[arg(long, default_value = DEFAULT_OUTPUT, env = "DOCSMITH_OUTPUT")]
    output: PathBuf,

    /// Command that turns a prompt on stdin into documentation on stdout
    #[arg(long, default_value = "claude", env = "DOCSMITH_GENERATOR_CMD")]
    generator_cmd: String,

    /// Timeout for each external command in seconds (0 disables)
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Regenerate documents even if they exist
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Parse and list APIs without generating documents
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Maximum number of APIs to process (0 = no limit)
    #[arg(long, default_value_t = 0)]
    max_items: usize,

    /// Model name recorded in generated documents
    #[arg(long, env = "DOCSMITH_MODEL")]
    model: Option<String>,

    /// Language the documentation is requested in
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,
}

/// Install the stderr log subscriber, honouring `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docsmith=info,libdocsmith=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the repository, extract its API and either list or generate documents.
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let docsmith = Docsmith::new(&cli.output)
        .with_force(cli.force)
        .with_max_items(Some(cli.max_items))
        .with_ref(cli.git_ref.clone())
        .with_timeout(timeout)
        .with_model(cli.model.clone())
        .with_language(cli.language.as_str());

    let checkout = docsmith.checkout(&cli.repo)?;
    let items = docsmith.collect(&checkout.path)?;

    if cli.dry_run {
        for item in &items {
            println!("{}", dry_run_line(&checkout.version, item));
        }
        return Ok(());
    }

    let generator = CommandGenerator::from_command_line(&cli.generator_cmd)?.with_timeout(timeout);
    let summary = docsmith.generate(&checkout.repo_slug, &checkout.version, &items, &generator)?;
    info!(
        generated = summary.generated,
        skipped = summary.skipped,
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
