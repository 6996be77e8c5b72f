use crate::ast::{FunctionBodyRef, FunctionParts, Identifier, SourceSpan};
use crate::diagnostics::{DiagnosticCode, DiagnosticMetadata};
use crate::errors::CheckError;
use crate::scope::{ReturnCheck, ReturnContract};
use crate::types::{FnType, Type};

use super::TypeChecker;

/// What a function literal is checked against.
#[derive(Debug, Clone, Copy)]
pub(super) enum FunctionContext<'a> {
    /// Parameters are `Unknown`, the return type is inferred.
    Free,
    /// Passed into a slot of this type: parameters come from the slot, the
    /// return type is still inferred.
    Argument(&'a FnType),
    /// Implements this type via `fn(...).from`: every return must be a
    /// subtype of the declared return type.
    Implementation(&'a FnType),
}

impl<'r> TypeChecker<'r> {
    pub(super) fn function(
        &mut self,
        parts: FunctionParts<'_>,
        context: FunctionContext<'_>,
    ) -> Result<Type, CheckError> {
        let names = parts
            .params
            .iter()
            .map(|param| {
                param
                    .as_identifier()
                    .ok_or_else(|| CheckError::UnsupportedPattern { span: param.span() })
            })
            .collect::<Result<Vec<&Identifier>, _>>()?;

        let signature = match context {
            FunctionContext::Free => None,
            FunctionContext::Argument(signature) | FunctionContext::Implementation(signature) => {
                Some(signature)
            }
        };
        let params = match signature {
            Some(signature) if signature.params.len() == names.len() => signature.params.clone(),
            _ => vec![Type::Unknown; names.len()],
        };

        let contract = match context {
            FunctionContext::Implementation(signature) => {
                if signature.params.len() != names.len() {
                    self.report_with_remark(
                        DiagnosticCode::ArgCountMismatch,
                        DiagnosticMetadata::Count {
                            expected: signature.params.len(),
                            received: names.len(),
                        },
                        parts.span,
                        "implementation parameters",
                    );
                }
                if parts.is_async {
                    self.report(
                        DiagnosticCode::AsyncMismatch,
                        DiagnosticMetadata::construct("async function implementing a fn type"),
                        parts.span,
                    );
                }
                ReturnContract::Expected((*signature.returns).clone())
            }
            _ => ReturnContract::Inferred(None),
        };

        self.scope.push_function(contract, parts.is_async);
        for (identifier, ty) in names.iter().zip(&params) {
            if self.reject_reserved_binding(&identifier.name, identifier.span) {
                continue;
            }
            self.scope.set(&identifier.name, ty.clone(), identifier.span)?;
        }
        match parts.body {
            FunctionBodyRef::Block(block) => self.check_statements(&block.body)?,
            FunctionBodyRef::Expression(expression) => {
                let ty = self.expression(expression)?;
                self.record_return(&ty, expression.span);
            }
        }

        let returns = match self.scope.pop() {
            Some(outcome) => {
                if !outcome.saw_return {
                    self.report_with_remark(
                        DiagnosticCode::MissingExpected,
                        DiagnosticMetadata::construct("return value"),
                        parts.span,
                        "every function must return a value",
                    );
                }
                outcome.return_type().cloned().unwrap_or(Type::Unknown)
            }
            None => Type::Unknown,
        };
        Ok(Type::function(params, returns))
    }

    pub(super) fn record_return(&mut self, ty: &Type, span: SourceSpan) {
        match self.scope.record_return(ty) {
            ReturnCheck::Accepted => {}
            ReturnCheck::Mismatch { expected, received } => {
                self.report_mismatch(DiagnosticCode::ReturnTypeMismatch, &expected, &received, span)
            }
            ReturnCheck::OutsideFunction => self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct("return outside a function"),
                span,
            ),
        }
    }
}
