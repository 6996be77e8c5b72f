use kiln_support::resolve_specifier;

use crate::ast::{
    Block, DeclarationKind, ExportNamedDeclaration, ForInit, ForStatement, FunctionDeclaration,
    Identifier, ImportDeclaration, Pattern, ReturnStatement, SourceSpan, Statement,
    SwitchStatement, TryStatement, VariableDeclaration, WhileStatement,
};
use crate::diagnostics::{DiagnosticCode, DiagnosticMetadata};
use crate::errors::CheckError;
use crate::types::Type;

use super::functions::FunctionContext;
use super::TypeChecker;

impl<'r> TypeChecker<'r> {
    pub(super) fn check_statements(&mut self, statements: &[Statement]) -> Result<(), CheckError> {
        for statement in statements {
            self.check_statement_inner(statement)?;
        }
        Ok(())
    }

    pub(super) fn check_statement_inner(
        &mut self,
        statement: &Statement,
    ) -> Result<(), CheckError> {
        match statement {
            Statement::Expression(statement) => {
                self.expression(&statement.expression)?;
                Ok(())
            }
            Statement::Block(block) => self.scoped_block(block),
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => Ok(()),
            Statement::Variable(declaration) => self.variable_declaration(declaration),
            Statement::Function(function) => self.function_declaration(function),
            Statement::Return(statement) => self.return_statement(statement),
            Statement::If(statement) => {
                let test = self.expression(&statement.test)?;
                self.require_condition(&test, statement.test.span);
                self.check_statement_inner(&statement.consequent)?;
                if let Some(alternate) = &statement.alternate {
                    self.check_statement_inner(alternate)?;
                }
                Ok(())
            }
            Statement::While(statement) => self.loop_statement(statement, false),
            Statement::DoWhile(statement) => self.loop_statement(statement, true),
            Statement::For(statement) => self.for_statement(statement),
            Statement::Switch(statement) => self.switch_statement(statement),
            Statement::Try(statement) => self.try_statement(statement),
            Statement::Import(import) => self.import_declaration(import),
            Statement::Export(export) => self.export_declaration(export),
            Statement::ExportDefault(statement) => {
                self.report(
                    DiagnosticCode::Forbidden,
                    DiagnosticMetadata::construct("default export"),
                    statement.span,
                );
                Ok(())
            }
            Statement::ExportAll(statement) => {
                self.report(
                    DiagnosticCode::Forbidden,
                    DiagnosticMetadata::construct("export *"),
                    statement.span,
                );
                Ok(())
            }
        }
    }

    fn scoped_block(&mut self, block: &Block) -> Result<(), CheckError> {
        self.scope.push_block();
        self.check_statements(&block.body)?;
        self.scope.pop();
        Ok(())
    }

    fn variable_declaration(
        &mut self,
        declaration: &VariableDeclaration,
    ) -> Result<(), CheckError> {
        for declarator in &declaration.declarations {
            let Some(identifier) = declarator.id.as_identifier() else {
                return Err(CheckError::UnsupportedPattern {
                    span: declarator.id.span(),
                });
            };
            let Some(init) = &declarator.init else {
                return Err(CheckError::MissingInitializer {
                    name: identifier.name.clone(),
                    span: identifier.span,
                });
            };
            let ty = self.expression(init)?;
            if self.reject_reserved_binding(&identifier.name, identifier.span) {
                continue;
            }
            match declaration.kind {
                DeclarationKind::Const => {
                    self.scope
                        .set_const(&identifier.name, ty, identifier.span)?
                }
                DeclarationKind::Let => self.scope.set(&identifier.name, ty, identifier.span)?,
            }
        }
        Ok(())
    }

    /// Declarations are not hoisted. Inside its own body the function is
    /// visible with `Unknown` parameters and return, and the inferred type is
    /// bound once the body is checked.
    fn function_declaration(&mut self, function: &FunctionDeclaration) -> Result<(), CheckError> {
        let name = &function.id;
        if self.reject_reserved_binding(&name.name, name.span) {
            self.function(function.parts(), FunctionContext::Free)?;
            return Ok(());
        }
        let provisional =
            Type::function(vec![Type::Unknown; function.params.len()], Type::Unknown);
        self.scope.push_block();
        self.scope.set_const(&name.name, provisional, name.span)?;
        let checked = self.function(function.parts(), FunctionContext::Free);
        self.scope.pop();
        let ty = checked?;
        self.scope.set(&name.name, ty, name.span)
    }

    fn return_statement(&mut self, statement: &ReturnStatement) -> Result<(), CheckError> {
        if !self.scope.in_function() {
            if let Some(argument) = &statement.argument {
                self.expression(argument)?;
            }
            self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct("return outside a function"),
                statement.span,
            );
            return Ok(());
        }
        let Some(argument) = &statement.argument else {
            self.report_with_remark(
                DiagnosticCode::MissingExpected,
                DiagnosticMetadata::construct("return value"),
                statement.span,
                "bare return",
            );
            // counts as a return so the function is not reported again
            self.record_return(&Type::Error, statement.span);
            return Ok(());
        };
        let ty = self.expression(argument)?;
        self.record_return(&ty, argument.span);
        Ok(())
    }

    fn loop_statement(
        &mut self,
        statement: &WhileStatement,
        do_while: bool,
    ) -> Result<(), CheckError> {
        if do_while && !self.options.allow_do_while {
            self.report(
                DiagnosticCode::Forbidden,
                DiagnosticMetadata::construct("do-while loop"),
                statement.span,
            );
        }
        if do_while {
            self.check_statement_inner(&statement.body)?;
        }
        let test = self.expression(&statement.test)?;
        self.require_condition(&test, statement.test.span);
        if !do_while {
            self.check_statement_inner(&statement.body)?;
        }
        Ok(())
    }

    fn for_statement(&mut self, statement: &ForStatement) -> Result<(), CheckError> {
        self.scope.push_block();
        match &statement.init {
            Some(ForInit::Declaration(declaration)) => self.variable_declaration(declaration)?,
            Some(ForInit::Expression(expression)) => {
                self.expression(expression)?;
            }
            None => {}
        }
        if let Some(test) = &statement.test {
            let ty = self.expression(test)?;
            self.require_condition(&ty, test.span);
        }
        if let Some(update) = &statement.update {
            self.expression(update)?;
        }
        self.check_statement_inner(&statement.body)?;
        self.scope.pop();
        Ok(())
    }

    fn switch_statement(&mut self, statement: &SwitchStatement) -> Result<(), CheckError> {
        self.expression(&statement.discriminant)?;
        self.scope.push_block();
        for case in &statement.cases {
            if let Some(test) = &case.test {
                self.expression(test)?;
            }
            self.check_statements(&case.consequent)?;
        }
        self.scope.pop();
        Ok(())
    }

    fn try_statement(&mut self, statement: &TryStatement) -> Result<(), CheckError> {
        self.scoped_block(&statement.block)?;
        if let Some(handler) = &statement.handler {
            self.scope.push_block();
            match &handler.param {
                Some(Pattern::Identifier(identifier)) => {
                    if !self.reject_reserved_binding(&identifier.name, identifier.span) {
                        self.scope
                            .set(&identifier.name, Type::Unknown, identifier.span)?;
                    }
                }
                Some(pattern) => self.report(
                    DiagnosticCode::Unimplemented,
                    DiagnosticMetadata::construct("destructured catch parameter"),
                    pattern.span(),
                ),
                None => {}
            }
            self.check_statements(&handler.body.body)?;
            self.scope.pop();
        }
        if let Some(finalizer) = &statement.finalizer {
            self.scoped_block(finalizer)?;
        }
        Ok(())
    }

    /// Imports bind constants. Bare specifiers and files without the entry
    /// directive bind their names as `Unknown`.
    fn import_declaration(&mut self, import: &ImportDeclaration) -> Result<(), CheckError> {
        let resolved = match resolve_specifier(&self.path, &import.source) {
            Some(path) => self.resolver.resolve(&path, self.options)?,
            None => None,
        };
        let Some(report) = resolved else {
            for specifier in &import.specifiers {
                self.bind_import(&specifier.local, Type::Unknown)?;
            }
            return Ok(());
        };
        for (path, diagnostics) in &report.diagnostics {
            self.imported.insert(path.clone(), diagnostics.clone());
        }
        for specifier in &import.specifiers {
            let name = &specifier.imported.name;
            let ty = match report.exports.get(name) {
                Some(ty) => ty.clone(),
                None if report.unresolved_exports.contains(name) => Type::Error,
                None => {
                    return Err(CheckError::MissingExport {
                        module: import.source.clone(),
                        name: name.clone(),
                        span: specifier_span(&specifier.imported, import.span),
                    })
                }
            };
            self.bind_import(&specifier.local, ty)?;
        }
        Ok(())
    }

    fn bind_import(&mut self, local: &Identifier, ty: Type) -> Result<(), CheckError> {
        if self.reject_reserved_binding(&local.name, local.span) {
            return Ok(());
        }
        self.scope.set_const(&local.name, ty, local.span)
    }

    fn export_declaration(&mut self, export: &ExportNamedDeclaration) -> Result<(), CheckError> {
        if let Some(source) = &export.source {
            self.report(
                DiagnosticCode::Forbidden,
                DiagnosticMetadata::construct(format!("re-export from '{source}'")),
                export.span,
            );
            return Ok(());
        }
        if let Some(declaration) = &export.declaration {
            self.check_statement_inner(declaration)?;
            let names: Vec<&Identifier> = match declaration.as_ref() {
                Statement::Variable(variable) => variable
                    .declarations
                    .iter()
                    .filter_map(|declarator| declarator.id.as_identifier())
                    .collect(),
                Statement::Function(function) => vec![&function.id],
                _ => {
                    self.report(
                        DiagnosticCode::Forbidden,
                        DiagnosticMetadata::construct("export of this declaration"),
                        export.span,
                    );
                    Vec::new()
                }
            };
            for identifier in names {
                let ty = self.scope.lookup(&identifier.name).unwrap_or(Type::Error);
                self.export(&identifier.name, ty, identifier.span);
            }
        }
        for specifier in &export.specifiers {
            match self.scope.lookup(&specifier.local.name) {
                Some(ty) => self.export(&specifier.exported.name, ty, specifier.exported.span),
                None => self.report(
                    DiagnosticCode::UndefinedVariable,
                    DiagnosticMetadata::name(&specifier.local.name),
                    specifier.local.span,
                ),
            }
        }
        Ok(())
    }

    /// Error-typed bindings are recorded as unresolved rather than exported.
    fn export(&mut self, name: &str, ty: Type, span: SourceSpan) {
        if self.exports.contains_key(name) || self.unresolved_exports.contains(name) {
            self.report(
                DiagnosticCode::RedeclaredExport,
                DiagnosticMetadata::name(name),
                span,
            );
            return;
        }
        if ty.is_error() {
            self.unresolved_exports.insert(name.to_string());
        } else {
            self.exports.insert(name.to_string(), ty);
        }
    }
}

fn specifier_span(identifier: &Identifier, fallback: SourceSpan) -> SourceSpan {
    if identifier.span.is_known() {
        identifier.span
    } else {
        fallback
    }
}
