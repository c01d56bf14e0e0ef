pub mod ambient;
pub mod ast;
pub mod config;
pub mod error;
pub mod generator;
pub mod lower;
pub mod output;
pub mod parser;
pub mod resolve;
pub mod validate;
pub mod vtl;

use tracing::debug;

pub use config::Ts2VtlConfig;
pub use error::{CliError, CliResult, Diagnostic, DiagnosticKind, Location, Position};
pub use generator::{Generator, GeneratorOptions};
pub use lower::Target;
pub use validate::{validate_file, ValidationError};

// ── Core API ───────────────────────────────────────────────────────

/// The result of transpiling one source file.
#[derive(Debug, Clone)]
pub struct TranspileResult {
    /// One template per exported function, in declaration order.
    pub files: Vec<vtl::File>,
    /// Syntax errors and lowering diagnostics. When non-empty, `files`
    /// must not be used.
    pub diagnostics: Vec<Diagnostic>,
}

impl TranspileResult {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Print every template as `(function name, template text)`.
    pub fn render(&self, options: &GeneratorOptions) -> Vec<(String, String)> {
        let generator = Generator::new(options.clone());
        self.files
            .iter()
            .map(|file| (file.name.clone(), generator.generate(file)))
            .collect()
    }
}

/// Parse, resolve and lower a TypeScript source into VTL templates.
///
/// A syntax error stops at the parser and is returned as the only
/// diagnostic; lowering problems are collected across all functions.
pub fn transpile_source(path: &str, text: &str, target: Target) -> TranspileResult {
    let source = ast::SourceFile::new(path, text);
    let mut module = match parser::parse(&source) {
        Ok(module) => module,
        Err(diagnostic) => {
            return TranspileResult {
                files: Vec::new(),
                diagnostics: vec![diagnostic],
            }
        }
    };
    resolve::resolve_module(&mut module);

    let (files, diagnostics) = lower::transpile(&module, &source, target);
    debug!(
        path,
        ?target,
        functions = files.len(),
        diagnostics = diagnostics.len(),
        "transpiled source"
    );
    TranspileResult { files, diagnostics }
}

#[cfg(test)]
mod tests;
