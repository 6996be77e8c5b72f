use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

fn escape_single_quotes(input: &str) -> Cow<'_, str> {
    if input.contains('\'') {
        Cow::Owned(input.replace('\'', "\\'"))
    } else {
        Cow::Borrowed(input)
    }
}

fn format_operation_error(
    scope: &str,
    operation: &str,
    target: Option<&str>,
    error: impl fmt::Display,
) -> String {
    match target {
        Some(target) => {
            let escaped = escape_single_quotes(target);
            format!("{scope}.{operation}('{}') failed: {error}", escaped)
        }
        None => format!("{scope}.{operation} failed: {error}"),
    }
}

pub fn module_error(operation: &str, path: &Path, error: impl fmt::Display) -> String {
    let display = path.display().to_string();
    format_operation_error("kiln.module", operation, Some(&display), error)
}

pub fn cli_error(operation: &str, error: impl fmt::Display) -> String {
    format_operation_error("kiln.cli", operation, None, error)
}

/// Returns true when `specifier` names a file relative to the importing module.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Joins the importing file's directory with a relative import specifier.
///
/// Bare specifiers (`"lodash"`, `"node:fs"`) are not type-checked modules and
/// resolve to `None`.
pub fn resolve_specifier(importer: &Path, specifier: &str) -> Option<PathBuf> {
    if !is_relative_specifier(specifier) {
        return None;
    }
    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    Some(base.join(specifier).clean())
}

/// Candidate files holding the lowered tree for a resolved module path, in
/// lookup order.
pub fn lowered_candidates(resolved: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![resolved.to_path_buf()];
    let mut appended = resolved.as_os_str().to_owned();
    appended.push(".json");
    candidates.push(PathBuf::from(appended));
    if resolved.extension().is_some() {
        candidates.push(resolved.with_extension("json"));
    }
    candidates.dedup();
    candidates
}

/// Renders `path` relative to `base` when possible.
pub fn display_path(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
