use std::path::PathBuf;

use thiserror::Error;

use crate::ast::SourceSpan;
use crate::types::Type;

/// Conditions that abort checking of a whole file.
///
/// Recoverable problems never travel through this type; they are collected as
/// [`crate::Diagnostic`] values instead.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("'{name}' is already declared in this scope")]
    Redeclared { name: String, span: SourceSpan },
    #[error("'{keyword}' expects {expected} argument(s), found {received}")]
    KeywordArity {
        keyword: String,
        expected: &'static str,
        received: usize,
        span: SourceSpan,
    },
    #[error("destructuring patterns are not supported")]
    UnsupportedPattern { span: SourceSpan },
    #[error("'{name}' must be initialized where it is declared")]
    MissingInitializer { name: String, span: SourceSpan },
    #[error("module '{module}' has no export named '{name}'")]
    MissingExport {
        module: String,
        name: String,
        span: SourceSpan,
    },
    #[error("function expects {expected} argument(s), found {received}")]
    CallArity {
        expected: usize,
        received: usize,
        span: SourceSpan,
    },
    #[error("import cycle through '{}'", path.display())]
    CyclicImport { path: PathBuf },
    #[error("{message}")]
    Load { path: PathBuf, message: String },
}

impl CheckError {
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            CheckError::Redeclared { span, .. }
            | CheckError::KeywordArity { span, .. }
            | CheckError::UnsupportedPattern { span }
            | CheckError::MissingInitializer { span, .. }
            | CheckError::MissingExport { span, .. }
            | CheckError::CallArity { span, .. } => Some(*span),
            CheckError::CyclicImport { .. } | CheckError::Load { .. } => None,
        }
    }
}

/// Marker for an expression whose failure has already been recorded as a
/// diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

/// Outcome of typing one expression.
pub type Typed = Result<Type, Reported>;

pub(crate) fn typed(ty: Type) -> Typed {
    if ty.is_error() {
        Err(Reported)
    } else {
        Ok(ty)
    }
}
