use crate::ast::{Expression, ExpressionKind, ObjectMember, Property, SourceSpan};
use crate::diagnostics::{DiagnosticCode, DiagnosticMetadata};
use crate::errors::CheckError;
use crate::types::{is_tag_name, FnType, Type, WILDCARD_TAG};

use super::functions::FunctionContext;
use super::{accepts, underlying, TypeChecker};

impl<'r> TypeChecker<'r> {
    /// `variant.when(value, { Tag: handler, _: handler })`.
    ///
    /// Handlers are functions or `[Type, fn]` pairs asserting the payload
    /// type. Without a wildcard every tag must be handled. The first handler's
    /// return type is the contract the others must be subtypes of.
    pub(super) fn variant_when(
        &mut self,
        arguments: &[Expression],
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let [value, handlers] = arguments else {
            return Err(CheckError::KeywordArity {
                keyword: "variant.when".to_string(),
                expected: "2",
                received: arguments.len(),
                span,
            });
        };
        let scrutinee = self.expression(value)?;
        let ExpressionKind::Object(object) = &handlers.kind else {
            self.expression(handlers)?;
            self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct("variant.when expects an object literal of handlers"),
                handlers.span,
            );
            return Ok(Type::Error);
        };
        let options = match underlying(&scrutinee) {
            Type::Variant(options) => Some(options.clone()),
            _ => None,
        };

        let mut covered: Vec<String> = Vec::new();
        let mut wildcard = false;
        let mut returns: Vec<(Type, SourceSpan)> = Vec::new();
        for member in &object.properties {
            let property = match member {
                ObjectMember::Property(property) => property,
                ObjectMember::SpreadElement(spread) => {
                    self.expression(&spread.argument)?;
                    self.report(
                        DiagnosticCode::NotAllowedHere,
                        DiagnosticMetadata::construct("spread in match handlers"),
                        spread.span,
                    );
                    continue;
                }
            };
            let Some(tag) = property.key_name() else {
                if property.computed {
                    self.expression(&property.key)?;
                }
                self.expression(&property.value)?;
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct("computed handler key"),
                    property.key.span,
                );
                continue;
            };

            let is_wildcard = tag == WILDCARD_TAG;
            let payload = if is_wildcard {
                None
            } else {
                match &options {
                    Some(options) => {
                        let payload = options.get(&tag).cloned();
                        if payload.is_none() {
                            self.report_with_remark(
                                DiagnosticCode::VariantTagName,
                                DiagnosticMetadata::name(&tag),
                                property.key.span,
                                format!("not a tag of {}", scrutinee.describe()),
                            );
                        }
                        payload
                    }
                    None => {
                        if !is_tag_name(&tag) {
                            self.report_with_remark(
                                DiagnosticCode::VariantTagName,
                                DiagnosticMetadata::name(&tag),
                                property.key.span,
                                "tags start with an uppercase letter",
                            );
                        }
                        None
                    }
                }
            };
            if is_wildcard {
                wildcard = true;
            } else {
                covered.push(tag);
            }

            let bare_allowed = options.is_some() || is_wildcard || scrutinee.is_error();
            if let Some(returned) = self.match_handler(property, payload.as_ref(), bare_allowed)? {
                returns.push((returned, property.value.span));
            }
        }

        if !scrutinee.is_error() && !wildcard {
            let missing: Vec<String> = match &options {
                Some(options) => options
                    .names()
                    .filter(|tag| !covered.iter().any(|handled| handled.as_str() == *tag))
                    .map(str::to_string)
                    .collect(),
                None => vec![WILDCARD_TAG.to_string()],
            };
            if !missing.is_empty() {
                self.report(
                    DiagnosticCode::NonExhaustiveMatch,
                    DiagnosticMetadata::Tags { tags: missing },
                    span,
                );
            }
        }

        let mut handled = returns.into_iter().filter(|(ty, _)| !ty.is_error());
        let Some((contract, _)) = handled.next() else {
            return Ok(if scrutinee.is_error() {
                Type::Error
            } else {
                Type::Unknown
            });
        };
        for (returned, handler_span) in handled {
            if !returned.sub(&contract) {
                self.report_mismatch(
                    DiagnosticCode::ReturnTypeMismatch,
                    &contract,
                    &returned,
                    handler_span,
                );
            }
        }
        Ok(contract)
    }

    /// Checks one handler and returns its return type, or `None` when the
    /// handler is malformed.
    fn match_handler(
        &mut self,
        property: &Property,
        payload: Option<&Type>,
        bare_allowed: bool,
    ) -> Result<Option<Type>, CheckError> {
        let handler = &property.value;
        match &handler.kind {
            ExpressionKind::Array(pair) => {
                let [asserted, function] = pair.elements.as_slice() else {
                    self.expression(handler)?;
                    self.report(
                        DiagnosticCode::NotAllowedHere,
                        DiagnosticMetadata::construct("handler pairs are [Type, fn]"),
                        handler.span,
                    );
                    return Ok(None);
                };
                let asserted_ty = self.resolve_type_expression(asserted)?;
                if let Some(payload) = payload {
                    if !asserted_ty.is_error() && !accepts(payload, &asserted_ty) {
                        self.report(
                            DiagnosticCode::ArgTypeMismatch,
                            DiagnosticMetadata::Argument {
                                index: 0,
                                expected: payload.describe(),
                                received: asserted_ty.describe(),
                            },
                            asserted.span,
                        );
                    }
                }
                let param = if asserted_ty.is_error() {
                    Type::Unknown
                } else {
                    asserted_ty
                };
                self.handler_returns(function, param).map(Some)
            }
            _ if bare_allowed => {
                let param = payload.cloned().unwrap_or(Type::Unknown);
                self.handler_returns(handler, param).map(Some)
            }
            _ => {
                self.handler_returns(handler, Type::Unknown)?;
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(
                        "handler must assert its payload type as [Type, fn]",
                    ),
                    handler.span,
                );
                Ok(None)
            }
        }
    }

    /// Checks a handler against the payload it receives and returns what the
    /// handler returns.
    fn handler_returns(&mut self, handler: &Expression, param: Type) -> Result<Type, CheckError> {
        let ExpressionKind::Function(function) = &handler.kind else {
            let handler_ty = self.expression(handler)?;
            return Ok(match underlying(&handler_ty) {
                Type::Fn(signature) => {
                    self.handler_signature(signature, &param, handler.span);
                    (*signature.returns).clone()
                }
                Type::Error => Type::Error,
                Type::Unknown | Type::Deferred => Type::Unknown,
                other => {
                    self.report_mismatch(
                        DiagnosticCode::ArgTypeMismatch,
                        &Type::function(vec![param], Type::Unknown),
                        other,
                        handler.span,
                    );
                    Type::Error
                }
            });
        };
        let parts = function.parts(handler.span);
        if parts.params.len() != 1 {
            self.report_handler_arity(parts.params.len(), handler.span);
        }
        let signature = FnType {
            params: vec![param],
            returns: Box::new(Type::Unknown),
        };
        match self.function(parts, FunctionContext::Argument(&signature))? {
            Type::Fn(checked) => Ok(*checked.returns),
            other => Ok(other),
        }
    }

    /// A handler bound elsewhere takes exactly the payload's type.
    fn handler_signature(&mut self, signature: &FnType, payload: &Type, span: SourceSpan) {
        let [param] = signature.params.as_slice() else {
            self.report_handler_arity(signature.params.len(), span);
            return;
        };
        if matches!(payload, Type::Unknown) || payload.is_error() {
            return;
        }
        if !accepts(param, payload) {
            self.report(
                DiagnosticCode::ArgTypeMismatch,
                DiagnosticMetadata::Argument {
                    index: 0,
                    expected: payload.describe(),
                    received: param.describe(),
                },
                span,
            );
        }
    }

    fn report_handler_arity(&mut self, received: usize, span: SourceSpan) {
        self.report_with_remark(
            DiagnosticCode::ArgCountMismatch,
            DiagnosticMetadata::Count {
                expected: 1,
                received,
            },
            span,
            "match handlers take one parameter",
        );
    }
}
