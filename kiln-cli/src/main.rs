use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use kiln_checker::{
    CheckError, CheckOptions, Diagnostic, FileResolver, ModuleResolver, SourceSpan,
};
use kiln_support::{cli_error, display_path};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "kiln",
    version,
    about = "Type-check lowered kiln modules.",
    long_about = "Check lowered JSON trees of files carrying the \"use kiln\" directive. \
Directories are searched recursively for .json files; files without the directive are skipped."
)]
struct CheckCli {
    /// Lowered files or directories to check (defaults to current directory).
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Check a module again every time it is imported.
    #[arg(long)]
    no_module_cache: bool,

    /// Report `do ... while` loops as forbidden.
    #[arg(long)]
    forbid_do_while: bool,

    /// Only print diagnostics, no summary.
    #[arg(short, long)]
    quiet: bool,
}

impl CheckCli {
    fn options(&self) -> CheckOptions {
        CheckOptions {
            allow_do_while: !self.forbid_do_while,
            cache_modules: !self.no_module_cache,
        }
    }
}

/// Everything found while checking the requested files.
#[derive(Default)]
struct Outcome {
    checked: usize,
    skipped: usize,
    diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    failures: Vec<(PathBuf, CheckError)>,
}

impl Outcome {
    fn problem_count(&self) -> usize {
        self.diagnostics.values().map(Vec::len).sum::<usize>() + self.failures.len()
    }
}

#[derive(Serialize)]
struct JsonReport {
    checked: usize,
    skipped: usize,
    files: Vec<JsonFile>,
    errors: Vec<JsonError>,
}

#[derive(Serialize)]
struct JsonFile {
    path: String,
    diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
struct JsonDiagnostic {
    #[serde(flatten)]
    diagnostic: Diagnostic,
    message: String,
}

#[derive(Serialize)]
struct JsonError {
    path: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<SourceSpan>,
}

fn main() -> Result<()> {
    let mut raw: Vec<OsString> = env::args_os().collect();
    if raw.get(1).map(|arg| arg == "check").unwrap_or(false) {
        raw.remove(1);
    }
    let cli = CheckCli::parse_from(raw);
    run_check(&cli)
}

fn run_check(cli: &CheckCli) -> Result<()> {
    let cwd = env::current_dir().map_err(|error| anyhow!(cli_error("cwd", error)))?;
    let inputs = if cli.inputs.is_empty() {
        vec![cwd.clone()]
    } else {
        cli.inputs.clone()
    };

    let mut targets = BTreeSet::new();
    for input in &inputs {
        collect_json_files(input, &mut targets)?;
    }

    let options = cli.options();
    let mut resolver = FileResolver::new();
    let mut outcome = Outcome::default();
    for path in &targets {
        match resolver.resolve(path, options) {
            Ok(Some(report)) => {
                outcome.checked += 1;
                for (file, diagnostics) in report.diagnostics {
                    outcome.diagnostics.entry(file).or_insert(diagnostics);
                }
            }
            Ok(None) => outcome.skipped += 1,
            Err(error) => outcome.failures.push((path.clone(), error)),
        }
    }

    match cli.format {
        Format::Text => print_text(&outcome, &cwd, cli.quiet),
        Format::Json => print_json(&outcome, &cwd)?,
    }

    let problems = outcome.problem_count();
    if problems > 0 {
        bail!(cli_error("check", format!("{problems} problem(s) found")));
    }
    Ok(())
}

fn collect_json_files(path: &PathBuf, targets: &mut BTreeSet<PathBuf>) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| cli_error("metadata", format!("cannot access {}", path.display())))?;

    if metadata.is_dir() {
        let mut child_paths = Vec::new();
        for entry in fs::read_dir(path)
            .with_context(|| cli_error("read_dir", format!("cannot read {}", path.display())))?
        {
            let entry = entry.with_context(|| {
                cli_error("read_dir", format!("cannot read entry in {}", path.display()))
            })?;
            child_paths.push(entry.path());
        }
        child_paths.sort();
        for child in child_paths {
            collect_json_files(&child, targets)?;
        }
    } else if metadata.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json")
    {
        targets.insert(path.clone());
    }

    Ok(())
}

fn print_text(outcome: &Outcome, cwd: &Path, quiet: bool) {
    for (path, diagnostics) in &outcome.diagnostics {
        if diagnostics.is_empty() {
            continue;
        }
        let display = display_path(path, cwd);
        let source = source_lines(path);
        for diagnostic in diagnostics {
            print_diagnostic(&display, &source, diagnostic);
        }
    }
    for (path, error) in &outcome.failures {
        eprintln!("  - error: {error}");
        if let Some(span) = error.span().filter(SourceSpan::is_known) {
            eprintln!("     --> {}:{}:{}", display_path(path, cwd), span.line, span.column);
        }
    }
    if !quiet {
        println!(
            "checked {} file(s), skipped {}, {} problem(s)",
            outcome.checked,
            outcome.skipped,
            outcome.problem_count()
        );
    }
}

fn print_json(outcome: &Outcome, cwd: &Path) -> Result<()> {
    let report = JsonReport {
        checked: outcome.checked,
        skipped: outcome.skipped,
        files: outcome
            .diagnostics
            .iter()
            .map(|(path, diagnostics)| JsonFile {
                path: display_path(path, cwd),
                diagnostics: diagnostics
                    .iter()
                    .map(|diagnostic| JsonDiagnostic {
                        message: diagnostic.message(),
                        diagnostic: diagnostic.clone(),
                    })
                    .collect(),
            })
            .collect(),
        errors: outcome
            .failures
            .iter()
            .map(|(path, error)| JsonError {
                path: display_path(path, cwd),
                message: error.to_string(),
                span: error.span(),
            })
            .collect(),
    };
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| anyhow!(cli_error("json", error)))?;
    println!("{rendered}");
    Ok(())
}

/// Lines of the script a lowered file was produced from, when it sits next to
/// it as `<stem>.js`.
fn source_lines(lowered: &Path) -> Vec<String> {
    fs::read_to_string(lowered.with_extension("js"))
        .map(|contents| contents.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn print_diagnostic(display: &str, lines: &[String], diagnostic: &Diagnostic) {
    eprintln!("  - error[{}]: {}", diagnostic.code, diagnostic.message());
    let span = diagnostic.span;
    if !span.is_known() {
        eprintln!("     --> {display}");
        return;
    }
    eprintln!("     --> {}:{}:{}", display, span.line, span.column);

    if let Some(raw_line) = lines.get(span.line.saturating_sub(1)) {
        let display_line = raw_line.replace('\t', "    ");
        eprintln!("      {}", display_line);

        let mut caret_line = String::from("      ");
        for (index, ch) in raw_line.chars().enumerate() {
            if index + 1 >= span.column {
                break;
            }
            match ch {
                '\t' => caret_line.push_str("    "),
                _ => caret_line.push(' '),
            }
        }

        let width = display_line.chars().count();
        let highlight_len = if span.end_line == span.line {
            span.end_column
                .saturating_sub(span.column)
                .saturating_add(1)
        } else {
            width.saturating_sub(span.column.saturating_sub(1).min(width))
        };
        caret_line.push_str(&"^".repeat(highlight_len.max(1)));
        eprintln!("{}", caret_line);
    }
}
