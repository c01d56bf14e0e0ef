use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ts2vtl_rust::ambient::is_helper_module;
use ts2vtl_rust::output::{base_dir, plan_outputs, write_template};
use ts2vtl_rust::{
    transpile_source, validate_file, CliError, CliResult, Diagnostic, GeneratorOptions, Target,
    TranspileResult, Ts2VtlConfig,
};

/// Transpile TypeScript template functions into VTL mapping templates.
#[derive(Parser, Debug)]
#[command(name = "ts2vtl", version)]
struct Cli {
    /// Source files; standard input when omitted.
    files: Vec<PathBuf>,

    /// Service the templates are written for.
    #[arg(short, long, value_enum)]
    target: Option<Target>,

    /// Output to a single file.
    #[arg(long)]
    out_file: Option<PathBuf>,

    /// Output templates to the directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Text of one indentation level.
    #[arg(long)]
    indent: Option<String>,

    /// Do not indent directive bodies.
    #[arg(long, conflicts_with = "indent")]
    no_indent: bool,

    /// Omit the function banner comment.
    #[arg(long)]
    strip_comments: bool,

    /// How diagnostics are reported.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Re-check every generated template tree.
    #[arg(long)]
    validate: bool,

    /// Configuration file (default: ts2vtl.yaml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose mode.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Where templates go.
enum Destination {
    Stdout,
    File(PathBuf),
    Dir(PathBuf),
}

struct Settings {
    target: Target,
    generator: GeneratorOptions,
    destination: Destination,
    validate: bool,
    format: Format,
}

struct Source {
    path: String,
    text: String,
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: {}", err);
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

/// Returns whether every source transpiled cleanly.
fn run(cli: Cli) -> CliResult<bool> {
    let cwd = std::env::current_dir().map_err(|e| CliError::io(".", e))?;
    let config = Ts2VtlConfig::discover(cli.config.as_deref(), &cwd)?;
    let settings = settings(&cli, config)?;

    let sources = read_sources(&cli.files)?;
    if sources.len() > 1 && matches!(settings.destination, Destination::File(_)) {
        return Err(CliError::MultipleSourcesForOutFile);
    }

    let results: Vec<TranspileResult> = sources
        .par_iter()
        .map(|source| transpile_source(&source.path, &source.text, settings.target))
        .collect();

    let base = base_dir(sources.iter().map(|s| Path::new(&s.path)));
    let mut succeeded = true;
    let mut reported: Vec<&Diagnostic> = Vec::new();

    for (source, result) in sources.iter().zip(&results) {
        if !result.is_ok() {
            succeeded = false;
            match settings.format {
                Format::Text => print_diagnostics(&source.text, &result.diagnostics),
                Format::Json => reported.extend(&result.diagnostics),
            }
            continue;
        }

        if settings.validate && !validate_templates(source, result) {
            succeeded = false;
            continue;
        }

        emit(&settings, &base, source, result)?;
    }

    if settings.format == Format::Json {
        eprintln!("{}", serde_json::to_string_pretty(&reported)?);
    }

    Ok(succeeded)
}

/// Merge command line flags over the config file.
fn settings(cli: &Cli, config: Ts2VtlConfig) -> CliResult<Settings> {
    let mut generator = config.generator;
    if let Some(indent) = &cli.indent {
        generator.indent_enabled = true;
        generator.indent_text = indent.clone();
    }
    if cli.no_indent {
        generator.indent_enabled = false;
    }
    generator.strip_comments |= cli.strip_comments;

    let destination = match (&cli.out_file, &cli.out_dir) {
        (Some(_), Some(_)) => return Err(CliError::ConflictingOutputs),
        (Some(file), None) => Destination::File(file.clone()),
        (None, Some(dir)) => Destination::Dir(dir.clone()),
        (None, None) => match config.out_dir {
            Some(dir) => Destination::Dir(dir),
            None => Destination::Stdout,
        },
    };

    Ok(Settings {
        target: cli.target.unwrap_or(config.target),
        generator,
        destination,
        validate: cli.validate || config.validate,
        format: cli.format,
    })
}

fn read_sources(files: &[PathBuf]) -> CliResult<Vec<Source>> {
    if files.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| CliError::io("<stdin>", e))?;
        return Ok(vec![Source {
            path: "<stdin>".to_string(),
            text,
        }]);
    }

    let mut sources = Vec::new();
    for file in files {
        let path = file.to_string_lossy().into_owned();
        if is_helper_module(&path) {
            warn!(path = %path, "skipping helper library source");
            continue;
        }
        let text = std::fs::read_to_string(file).map_err(|e| CliError::io(file, e))?;
        sources.push(Source { path, text });
    }
    Ok(sources)
}

fn validate_templates(source: &Source, result: &TranspileResult) -> bool {
    let mut valid = true;
    for file in &result.files {
        for err in validate_file(file) {
            valid = false;
            eprintln!(
                "{}: {}: {} [{}] ({})",
                source.path,
                file.name,
                err.message,
                err.path.join(" > "),
                err.code
            );
        }
    }
    valid
}

fn emit(settings: &Settings, base: &Path, source: &Source, result: &TranspileResult) -> CliResult<()> {
    let templates = result.render(&settings.generator);
    match &settings.destination {
        Destination::Stdout => {
            for (_, template) in &templates {
                println!("{}", template);
            }
        }
        Destination::File(path) => match templates.as_slice() {
            [] => warn!(path = %source.path, "no functions to write"),
            [(_, template)] => write_template(path, template)?,
            _ => {
                return Err(CliError::MultipleFunctionsForOutFile {
                    path: source.path.clone(),
                    count: templates.len(),
                })
            }
        },
        Destination::Dir(dir) => {
            let names: Vec<&str> = templates.iter().map(|(name, _)| name.as_str()).collect();
            let paths = plan_outputs(dir, base, Path::new(&source.path), &names);
            for (path, (_, template)) in paths.iter().zip(&templates) {
                write_template(path, template)?;
            }
        }
    }
    debug!(path = %source.path, templates = templates.len(), "emitted source");
    Ok(())
}

/// Print each diagnostic with the offending source line underlined.
fn print_diagnostics(text: &str, diagnostics: &[Diagnostic]) {
    let lines: Vec<&str> = text.lines().collect();

    for diagnostic in diagnostics {
        let location = match &diagnostic.location {
            Some(location) => location,
            None => {
                eprintln!("ERROR: {} ({})", diagnostic.message, diagnostic.code());
                eprintln!();
                continue;
            }
        };
        let line_text = lines.get(location.begin.line).copied().unwrap_or("");
        let line_len = line_text.chars().count();

        eprintln!("ERROR AT {}:{}:", location.file, location.begin.line + 1);
        eprintln!("{}", line_text);

        let start_col = location.begin.column;
        let end_col = if location.begin.line == location.end.line
            && location.end.column > location.begin.column
        {
            location.end.column
        } else if start_col < line_len {
            // Spans multiple lines: underline to end of line
            line_len
        } else {
            start_col + 1
        };

        let mut underline = " ".repeat(start_col);
        underline.push('^');
        if end_col > start_col + 1 {
            underline.push_str(&"_".repeat(end_col - start_col - 1));
        }

        eprintln!("{}", underline);
        eprintln!("{} ({})", diagnostic.message, diagnostic.code());
        eprintln!();
    }
}
