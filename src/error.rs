use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A 0-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of input
    pub offset: usize,
}

/// Where a diagnostic points: a file and the offending region (begin..end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    /// Start of the offending region
    pub begin: Position,
    /// End of the offending region (exclusive)
    pub end: Position,
}

/// The kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The source text could not be parsed.
    SyntaxError,
    /// A construct that is recognized but has no VTL translation.
    UnsupportedSyntax,
    /// A construct that is not handled yet.
    NotImplementedSyntax,
    /// A name that does not fit the VTL identifier grammar.
    InvalidIdentifier,
    /// Destructuring, modifiers, missing bodies, bad `Range` bounds.
    StructuralError,
}

impl DiagnosticKind {
    /// Machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "syntax-error",
            DiagnosticKind::UnsupportedSyntax => "unsupported-syntax",
            DiagnosticKind::NotImplementedSyntax => "not-implemented-syntax",
            DiagnosticKind::InvalidIdentifier => "invalid-identifier",
            DiagnosticKind::StructuralError => "structural-error",
        }
    }
}

/// A problem found while parsing or lowering. Diagnostics never abort a pass;
/// any diagnostic marks the generated templates of that source as unusable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn syntax_error(message: String, location: Location) -> Self {
        Diagnostic::new(DiagnosticKind::SyntaxError, message).at(location)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{}:{}:{}: {} ({})",
                loc.file,
                loc.begin.line + 1,
                loc.begin.column + 1,
                self.message,
                self.code()
            ),
            None => write!(f, "{} ({})", self.message, self.code()),
        }
    }
}

/// Failures of the command line tool itself (not of the translated source).
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Diagnostics serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The outDir and outFile options cannot be specified at once")]
    ConflictingOutputs,

    #[error("The outDir option instead of the outFile one must be specified for multiple source files")]
    MultipleSourcesForOutFile,

    #[error("The outDir option instead of the outFile one must be specified because {count} functions are defined in {path}")]
    MultipleFunctionsForOutFile { path: String, count: usize },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
