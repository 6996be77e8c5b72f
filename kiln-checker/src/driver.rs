use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::ast::Module;
use crate::diagnostics::Diagnostic;
use crate::errors::CheckError;
use crate::modules::{FileResolver, ModuleResolver};
use crate::typechecker::TypeChecker;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// When false, `do ... while` loops are reported as forbidden.
    pub allow_do_while: bool,
    /// Reuse the report of a module imported more than once.
    pub cache_modules: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            allow_do_while: true,
            cache_modules: true,
        }
    }
}

/// Result of checking one file.
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub path: PathBuf,
    pub exports: HashMap<String, Type>,
    /// Exported names whose declarations failed to type.
    pub unresolved_exports: BTreeSet<String>,
    /// Diagnostics for this file and every file it imported, keyed by path.
    /// Always holds an entry for `path`.
    pub diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
}

impl ModuleReport {
    pub fn own_diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics
            .get(&self.path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostic_count() == 0
    }
}

#[derive(Debug, Clone)]
pub enum FileStatus {
    Checked(ModuleReport),
    /// The file lacks the entry directive.
    NotAnalyzable,
}

/// Checks an already-loaded module as if it lived at `path`.
pub fn check_file(
    module: &Module,
    path: &Path,
    resolver: &mut dyn ModuleResolver,
    options: CheckOptions,
) -> Result<ModuleReport, CheckError> {
    let mut checker = TypeChecker::new(path, resolver, options);
    checker.check_module(module)?;
    Ok(checker.finish())
}

/// Loads and checks the lowered file at `path` together with its imports.
pub fn check_path(path: &Path, options: CheckOptions) -> Result<FileStatus, CheckError> {
    let mut resolver = FileResolver::new();
    Ok(match resolver.resolve(path, options)? {
        Some(report) => FileStatus::Checked(report),
        None => FileStatus::NotAnalyzable,
    })
}
