use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use kiln_support::{lowered_candidates, module_error};
use path_clean::PathClean;

use crate::ast::Module;
use crate::driver::{check_file, CheckOptions, ModuleReport};
use crate::errors::CheckError;
use crate::source::load_module;

/// Supplies the reports of imported modules.
pub trait ModuleResolver {
    /// `Ok(None)` means the module is not type-checked and its imports are
    /// taken as `Unknown`.
    fn resolve(
        &mut self,
        path: &Path,
        options: CheckOptions,
    ) -> Result<Option<ModuleReport>, CheckError>;
}

enum Located {
    Override(PathBuf),
    File(PathBuf),
}

/// Resolves imports from lowered JSON files on disk, with optional in-memory
/// overrides.
#[derive(Default)]
pub struct FileResolver {
    overrides: HashMap<PathBuf, Module>,
    cache: HashMap<PathBuf, Option<ModuleReport>>,
    in_progress: Vec<PathBuf>,
}

impl FileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `module` for imports resolving to `path`.
    pub fn with_override(mut self, path: impl Into<PathBuf>, module: Module) -> Self {
        self.overrides.insert(path.into().clean(), module);
        self
    }

    fn locate(&self, path: &Path) -> Result<Located, CheckError> {
        let candidates = lowered_candidates(path);
        if let Some(key) = candidates
            .iter()
            .map(|candidate| candidate.clean())
            .find(|candidate| self.overrides.contains_key(candidate))
        {
            return Ok(Located::Override(key));
        }
        candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(Located::File)
            .ok_or_else(|| CheckError::Load {
                path: path.to_path_buf(),
                message: module_error("resolve", path, "no lowered module found"),
            })
    }
}

impl ModuleResolver for FileResolver {
    fn resolve(
        &mut self,
        path: &Path,
        options: CheckOptions,
    ) -> Result<Option<ModuleReport>, CheckError> {
        let located = self.locate(path)?;
        let (display, key) = match &located {
            Located::Override(key) => (key.clone(), key.clone()),
            Located::File(file) => {
                let key = fs::canonicalize(file).map_err(|error| CheckError::Load {
                    path: file.clone(),
                    message: module_error("canonicalize", file, error),
                })?;
                (file.clone(), key)
            }
        };

        if options.cache_modules {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached.clone());
            }
        }
        if self.in_progress.contains(&key) {
            return Err(CheckError::CyclicImport { path: display });
        }

        let module = match located {
            Located::Override(key) => self.overrides.get(&key).cloned().unwrap_or_default(),
            Located::File(file) => load_module(&file).map_err(|error| CheckError::Load {
                path: file.clone(),
                message: format!("{error:#}"),
            })?,
        };
        if !module.is_analyzable() {
            if options.cache_modules {
                self.cache.insert(key, None);
            }
            return Ok(None);
        }

        self.in_progress.push(key.clone());
        let outcome = check_file(&module, &display, self, options);
        self.in_progress.pop();
        let report = outcome?;
        if options.cache_modules {
            self.cache.insert(key, Some(report.clone()));
        }
        Ok(Some(report))
    }
}
