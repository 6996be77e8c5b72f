mod expressions;
mod functions;
mod keywords;
mod matching;
mod statements;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use crate::ast::{Expression, Module, SourceSpan, Statement};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticMetadata, Diagnostics};
use crate::driver::{CheckOptions, ModuleReport};
use crate::errors::{typed, CheckError, Typed};
use crate::modules::ModuleResolver;
use crate::scope::SymbolTable;
use crate::types::Type;

/// Type-constructor keywords recognized before scope lookup.
pub(crate) const KEYWORDS: [&str; 6] = ["struct", "variant", "array", "tuple", "fn", "cond"];
pub(crate) const JS_KEYWORD: &str = "js";
pub(crate) const TYPE_KEYWORD: &str = "Type";

pub(crate) fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(&name) || name == JS_KEYWORD || name == TYPE_KEYWORD
}

/// Checks one lowered file.
///
/// Recoverable problems are collected as diagnostics; the `Err` side of every
/// checking method aborts the file.
pub struct TypeChecker<'r> {
    path: PathBuf,
    scope: SymbolTable,
    diagnostics: Diagnostics,
    exports: HashMap<String, Type>,
    unresolved_exports: BTreeSet<String>,
    imported: BTreeMap<PathBuf, Vec<Diagnostic>>,
    resolver: &'r mut dyn ModuleResolver,
    options: CheckOptions,
}

impl<'r> TypeChecker<'r> {
    pub fn new(
        path: impl Into<PathBuf>,
        resolver: &'r mut dyn ModuleResolver,
        options: CheckOptions,
    ) -> Self {
        Self {
            path: path.into(),
            scope: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            exports: HashMap::new(),
            unresolved_exports: BTreeSet::new(),
            imported: BTreeMap::new(),
            resolver,
            options,
        }
    }

    pub fn check_module(&mut self, module: &Module) -> Result<(), CheckError> {
        self.check_statements(&module.body)
    }

    pub fn check_statement(&mut self, statement: &Statement) -> Result<(), CheckError> {
        self.check_statement_inner(statement)
    }

    /// Types a single expression against the current file scope.
    pub fn check_expression(&mut self, expression: &Expression) -> Result<Typed, CheckError> {
        let ty = self.expression(expression)?;
        Ok(typed(ty))
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.scope.lookup(name)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn finish(self) -> ModuleReport {
        let mut diagnostics = self.imported;
        diagnostics.insert(self.path.clone(), self.diagnostics.into_entries());
        ModuleReport {
            path: self.path,
            exports: self.exports,
            unresolved_exports: self.unresolved_exports,
            diagnostics,
        }
    }

    fn report(&mut self, code: DiagnosticCode, metadata: DiagnosticMetadata, span: SourceSpan) {
        self.diagnostics.push(code, metadata, span);
    }

    fn report_with_remark(
        &mut self,
        code: DiagnosticCode,
        metadata: DiagnosticMetadata,
        span: SourceSpan,
        remark: impl Into<String>,
    ) {
        self.diagnostics
            .push_with_remark(code, metadata, span, remark);
    }

    fn report_mismatch(
        &mut self,
        code: DiagnosticCode,
        expected: &Type,
        received: &Type,
        span: SourceSpan,
    ) {
        self.report(
            code,
            DiagnosticMetadata::Mismatch {
                expected: expected.describe(),
                received: received.describe(),
            },
            span,
        );
    }

    /// Reports a reserved identifier used as a binding name. Returns `true`
    /// when the binding must be skipped.
    fn reject_reserved_binding(&mut self, name: &str, span: SourceSpan) -> bool {
        if is_reserved(name) {
            self.report_with_remark(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::name(name),
                span,
                "reserved names cannot be declared",
            );
            true
        } else {
            false
        }
    }
}

/// Strips refinements so a `cond` value behaves like its base type.
pub(crate) fn underlying(ty: &Type) -> &Type {
    match ty {
        Type::Cond(cond) => underlying(&cond.base),
        other => other,
    }
}

/// Assignment and argument compatibility.
///
/// Exact equality, except that an `Unknown` target takes anything and a
/// `Deferred` side is not judged. `Deferred` stands for the unresolved result
/// of a generic call, so nothing can be said about it either way.
pub(crate) fn accepts(expected: &Type, received: &Type) -> bool {
    matches!(expected, Type::Unknown)
        || matches!(expected, Type::Deferred)
        || matches!(received, Type::Deferred)
        || received.equals(expected)
}

/// Whether `ty` may be used where the primitive `wanted` is required.
pub(crate) fn is_like(ty: &Type, wanted: &Type) -> bool {
    let ty = underlying(ty);
    matches!(ty, Type::Unknown) || ty.equals(wanted)
}
