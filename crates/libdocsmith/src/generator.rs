//! Prompt construction and the description-generation collaborator.

use std::{path::Path, time::Duration};

use crate::{
    error::{DocsmithError, Result},
    exec,
    item::{ApiItem, ItemKind},
};

/// Produces documentation prose for a prompt.
pub trait Generator {
    /// Tag recorded as the `generator` of each document.
    fn name(&self) -> &str;

    /// Generate text for `prompt`. Called once per item; failures are not retried.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// A [`Generator`] that pipes the prompt into an external command and reads the reply from its
/// stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Program followed by its arguments.
    command: Vec<String>,
    /// Tag derived from the program name.
    name: String,
    /// Per-invocation time limit.
    timeout: Option<Duration>,
}

impl CommandGenerator {
    /// Build a generator from a shell-style command line such as `claude -p --model x`.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let command = shell_words::split(command_line)
            .map_err(|e| DocsmithError::InvalidCommand(e.to_string()))?;
        Self::new(command)
    }

    /// Build a generator from an already split command.
    pub fn new(command: Vec<String>) -> Result<Self> {
        let program = command.first().ok_or(DocsmithError::EmptyCommand)?;
        let name = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());
        Ok(Self {
            command,
            name,
            timeout: None,
        })
    }

    /// Limit each invocation to `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The split command.
    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Generator for CommandGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(DocsmithError::EmptyCommand)?;
        let output = exec::run(program, args, None, Some(prompt), self.timeout)?;
        Ok(output.trim().to_string())
    }
}

/// Build the generation prompt for `item`, asking for prose in `language`.
pub fn build_prompt(item: &ApiItem, language: &str) -> String {
    let header = format!(
        "You are an expert Go API documentation writer. \
         Generate concise, high-quality Markdown documentation in {language}. \
         Focus on what the API does, parameters/returns, and usage notes. \
         Do not invent behavior that is not implied by the signature or name. \
         Keep it readable and structured.\n"
    );

    let mut lines = vec![
        format!("Package: {}", item.package),
        format!("Import: {}", item.import_path),
        format!("Kind: {}", item.kind),
        format!("Name: {}", item.name),
        format!("Signature: {}", item.signature),
    ];
    let optional = [
        ("Receiver", &item.receiver),
        ("Params", &item.params),
        ("Returns", &item.returns),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {value}"));
        }
    }
    if item.kind == ItemKind::Type {
        if let Some(kind) = item.type_kind {
            lines.push(format!("TypeKind: {kind}"));
        }
        if !item.fields.is_empty() {
            lines.push(format!("Fields:\n{}", item.fields.join("\n")));
        }
        if !item.methods.is_empty() {
            lines.push(format!("Methods:\n{}", item.methods.join("\n")));
        }
    }
    if let Some(description) = item.source_description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("ExistingDescription: {description}"));
    }

    let instructions = "\nPlease output Markdown with these sections when applicable:\n\
                        - Summary\n\
                        - Parameters\n\
                        - Returns\n\
                        - Notes\n";

    format!("{header}{}{instructions}", lines.join("\n"))
}
