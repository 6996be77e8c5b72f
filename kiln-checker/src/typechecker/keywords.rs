use crate::ast::{Expression, ExpressionKind, ObjectExpression, ObjectMember, SourceSpan};
use crate::diagnostics::{DiagnosticCode, DiagnosticMetadata};
use crate::errors::CheckError;
use crate::types::{is_tag_name, Fields, FnType, Predicate, ShapeError, Type};

use super::functions::FunctionContext;
use super::{is_like, TypeChecker};

fn keyword_arity(keyword: &str) -> &'static str {
    match keyword {
        "tuple" => "at least 1",
        "fn" | "cond" => "2",
        _ => "1",
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

impl<'r> TypeChecker<'r> {
    /// `struct`, `variant`, `array`, `tuple`, `fn` and `cond` calls.
    ///
    /// Wrong arity aborts the file. Otherwise every argument is checked even
    /// when an earlier one failed, and the call yields a type-value.
    pub(super) fn keyword_call(
        &mut self,
        keyword: &str,
        arguments: &[Expression],
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let denoted = match (keyword, arguments) {
            ("struct", [shape]) => match self.shape_entries(shape, keyword, false)? {
                Some(entries) => self.build_shape(Type::structure(entries), shape.span),
                None => Type::Error,
            },
            ("variant", [options]) => match self.shape_entries(options, keyword, true)? {
                Some(entries) => self.build_shape(Type::variant(entries), options.span),
                None => Type::Error,
            },
            ("array", [contains]) => {
                let contains = self.resolve_type_expression(contains)?;
                if contains.is_error() {
                    Type::Error
                } else {
                    Type::array(contains)
                }
            }
            ("tuple", fields) if !fields.is_empty() => {
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    resolved.push(self.resolve_type_expression(field)?);
                }
                if resolved.iter().any(Type::is_error) {
                    Type::Error
                } else {
                    Type::tuple(resolved)
                }
            }
            ("fn", [params, returns]) => self.fn_keyword(params, returns)?,
            ("cond", [base, predicate]) => self.cond_keyword(base, predicate)?,
            _ => {
                return Err(CheckError::KeywordArity {
                    keyword: keyword.to_string(),
                    expected: keyword_arity(keyword),
                    received: arguments.len(),
                    span,
                })
            }
        };
        Ok(if denoted.is_error() {
            Type::Error
        } else {
            Type::type_value(denoted)
        })
    }

    /// `js(fn)` or `js(Type, fn)`: host code the checker does not look into.
    pub(super) fn js_call(
        &mut self,
        arguments: &[Expression],
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        match arguments {
            [_body] => Ok(Type::Unknown),
            [annotation, _body] => self.resolve_type_expression(annotation),
            _ => Err(CheckError::KeywordArity {
                keyword: super::JS_KEYWORD.to_string(),
                expected: "1 or 2",
                received: arguments.len(),
                span,
            }),
        }
    }

    /// Types `expression` and returns the type it denotes.
    pub(super) fn resolve_type_expression(
        &mut self,
        expression: &Expression,
    ) -> Result<Type, CheckError> {
        let ty = self.expression(expression)?;
        Ok(match ty {
            Type::Type(denoted) => *denoted,
            Type::Error => Type::Error,
            Type::Unknown => Type::Unknown,
            other => {
                self.report(
                    DiagnosticCode::NotAType,
                    DiagnosticMetadata::Mismatch {
                        expected: "Type".to_string(),
                        received: other.describe(),
                    },
                    expression.span,
                );
                Type::Error
            }
        })
    }

    fn build_shape(&mut self, shape: Result<Type, ShapeError>, span: SourceSpan) -> Type {
        match shape {
            Ok(ty) => ty,
            Err(error) => {
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(error.to_string()),
                    span,
                );
                Type::Error
            }
        }
    }

    /// Resolves an object literal of `name: TypeExpression` entries. `None`
    /// when any entry failed.
    fn shape_entries(
        &mut self,
        shape: &Expression,
        keyword: &str,
        tags: bool,
    ) -> Result<Option<Vec<(String, Type)>>, CheckError> {
        let ExpressionKind::Object(object) = &shape.kind else {
            self.expression(shape)?;
            self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct(format!("{keyword} expects an object literal")),
                shape.span,
            );
            return Ok(None);
        };
        let mut entries: Vec<(String, Type)> = Vec::new();
        let mut failed = false;
        for member in &object.properties {
            let property = match member {
                ObjectMember::Property(property) => property,
                ObjectMember::SpreadElement(spread) => {
                    self.expression(&spread.argument)?;
                    self.report(
                        DiagnosticCode::NotAllowedHere,
                        DiagnosticMetadata::construct(format!("spread in {keyword} shape")),
                        spread.span,
                    );
                    failed = true;
                    continue;
                }
            };
            if property.computed {
                self.expression(&property.key)?;
            }
            let ty = self.resolve_type_expression(&property.value)?;
            failed |= ty.is_error();
            let Some(name) = property.key_name() else {
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(format!("computed key in {keyword} shape")),
                    property.key.span,
                );
                failed = true;
                continue;
            };
            if tags && !is_tag_name(&name) {
                self.report_with_remark(
                    DiagnosticCode::VariantTagName,
                    DiagnosticMetadata::name(&name),
                    property.key.span,
                    "tags start with an uppercase letter",
                );
                failed = true;
                continue;
            }
            entries.push((name, ty));
        }
        Ok(if failed { None } else { Some(entries) })
    }

    fn fn_keyword(
        &mut self,
        params: &Expression,
        returns: &Expression,
    ) -> Result<Type, CheckError> {
        let ExpressionKind::Array(list) = &params.kind else {
            self.expression(params)?;
            self.resolve_type_expression(returns)?;
            self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct("fn expects an array literal of parameter types"),
                params.span,
            );
            return Ok(Type::Error);
        };
        let mut resolved = Vec::with_capacity(list.elements.len());
        for param in &list.elements {
            resolved.push(self.resolve_type_expression(param)?);
        }
        let returns = self.resolve_type_expression(returns)?;
        if returns.is_error() || resolved.iter().any(Type::is_error) {
            return Ok(Type::Error);
        }
        Ok(Type::function(resolved, returns))
    }

    /// The predicate is typed with its parameter bound to the base type and
    /// must return `Bool`. It is never evaluated.
    fn cond_keyword(
        &mut self,
        base: &Expression,
        predicate: &Expression,
    ) -> Result<Type, CheckError> {
        let base_ty = self.resolve_type_expression(base)?;
        let ExpressionKind::Function(function) = &predicate.kind else {
            self.expression(predicate)?;
            self.report(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::construct("cond expects an inline predicate function"),
                predicate.span,
            );
            return Ok(Type::Error);
        };
        let param = if base_ty.is_error() {
            Type::Unknown
        } else {
            base_ty.clone()
        };
        let signature = FnType {
            params: vec![param],
            returns: Box::new(Type::Bool),
        };
        let checked = self.function(
            function.parts(predicate.span),
            FunctionContext::Argument(&signature),
        )?;
        if let Type::Fn(checked) = &checked {
            let returns = checked.returns.as_ref();
            if !returns.is_error() && !is_like(returns, &Type::Bool) {
                self.report_mismatch(
                    DiagnosticCode::ReturnTypeMismatch,
                    &Type::Bool,
                    returns,
                    predicate.span,
                );
                return Ok(Type::Error);
            }
        }
        if base_ty.is_error() {
            return Ok(Type::Error);
        }
        Ok(Type::cond(base_ty, Predicate::opaque()))
    }

    /// Method call on a type-value, dispatched on the kind it denotes.
    pub(super) fn type_method(
        &mut self,
        denoted: &Type,
        method: &str,
        arguments: &[Expression],
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let allowed = match method {
            "from" => !matches!(denoted, Type::Cond(_) | Type::Type(_) | Type::Deferred),
            "conform" => !matches!(denoted, Type::Variant(_) | Type::Fn(_) | Type::Type(_)),
            "valid" => matches!(denoted, Type::Struct(_) | Type::Tuple(_) | Type::Unknown),
            "sub" | "eq" => !matches!(denoted, Type::Deferred),
            "has" => matches!(denoted, Type::Struct(_) | Type::Unknown),
            _ => false,
        };
        if !allowed {
            for argument in arguments {
                self.expression(argument)?;
            }
            self.report(
                DiagnosticCode::InvalidTypeMethod,
                DiagnosticMetadata::Method {
                    method: method.to_string(),
                    on: denoted.kind_name().to_string(),
                },
                span,
            );
            return Ok(Type::Error);
        }
        let [argument] = arguments else {
            for argument in arguments {
                self.expression(argument)?;
            }
            self.report_with_remark(
                DiagnosticCode::ArgCountMismatch,
                DiagnosticMetadata::Count {
                    expected: 1,
                    received: arguments.len(),
                },
                span,
                format!("'{method}' takes one argument"),
            );
            return Ok(Type::Error);
        };
        match method {
            "from" => {
                self.conform_shape(denoted, argument, "")?;
                Ok(denoted.clone())
            }
            "conform" => {
                self.expression(argument)?;
                Ok(denoted.conform_result())
            }
            "valid" => {
                self.expression(argument)?;
                Ok(Type::Bool)
            }
            "sub" | "eq" => {
                self.resolve_type_expression(argument)?;
                Ok(Type::Bool)
            }
            _ => {
                self.expression(argument)?;
                self.report(
                    DiagnosticCode::Unimplemented,
                    DiagnosticMetadata::Method {
                        method: method.to_string(),
                        on: denoted.kind_name().to_string(),
                    },
                    span,
                );
                Ok(Type::Error)
            }
        }
    }

    /// Literal-directed check behind `T.from(value)`. Object and array
    /// literals are walked so mismatches name the offending field or position.
    fn conform_shape(
        &mut self,
        target: &Type,
        value: &Expression,
        path: &str,
    ) -> Result<(), CheckError> {
        match (target, &value.kind) {
            (Type::Struct(fields), ExpressionKind::Object(object)) => {
                self.struct_from(fields, object, value.span, path)
            }
            (Type::Variant(options), ExpressionKind::Object(object)) => {
                self.variant_from(target, options, object, value.span, path)
            }
            (Type::Array(contains), ExpressionKind::Array(list)) => {
                for (index, element) in list.elements.iter().enumerate() {
                    self.conform_shape(contains, element, &index_path(path, index))?;
                }
                Ok(())
            }
            (Type::Tuple(fields), ExpressionKind::Array(list)) => {
                if list.elements.len() != fields.len() {
                    for element in &list.elements {
                        self.expression(element)?;
                    }
                    self.shape_mismatch(
                        path,
                        target.describe(),
                        format!("{} elements", list.elements.len()),
                        value.span,
                    );
                    return Ok(());
                }
                for (index, (field, element)) in fields.iter().zip(&list.elements).enumerate() {
                    self.conform_shape(field, element, &index_path(path, index))?;
                }
                Ok(())
            }
            (Type::Fn(signature), ExpressionKind::Function(function)) => {
                self.function(
                    function.parts(value.span),
                    FunctionContext::Implementation(signature),
                )?;
                Ok(())
            }
            _ => {
                let received = self.expression(value)?;
                if !received.is_error()
                    && !matches!(target, Type::Deferred)
                    && !received.sub(target)
                {
                    self.shape_mismatch(path, target.describe(), received.describe(), value.span);
                }
                Ok(())
            }
        }
    }

    fn struct_from(
        &mut self,
        fields: &Fields,
        object: &ObjectExpression,
        span: SourceSpan,
        path: &str,
    ) -> Result<(), CheckError> {
        let mut seen: Vec<String> = Vec::new();
        for member in &object.properties {
            let property = match member {
                ObjectMember::Property(property) => property,
                ObjectMember::SpreadElement(spread) => {
                    self.expression(&spread.argument)?;
                    self.report(
                        DiagnosticCode::NotAllowedHere,
                        DiagnosticMetadata::construct("spread in a from value"),
                        spread.span,
                    );
                    continue;
                }
            };
            let Some(name) = property.key_name() else {
                if property.computed {
                    self.expression(&property.key)?;
                }
                self.expression(&property.value)?;
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct("computed key in a from value"),
                    property.key.span,
                );
                continue;
            };
            let field_path = join_path(path, &name);
            match fields.get(&name) {
                Some(expected) => self.conform_shape(expected, &property.value, &field_path)?,
                None => {
                    let received = self.expression(&property.value)?;
                    self.shape_mismatch(
                        &field_path,
                        "no such field".to_string(),
                        received.describe(),
                        property.key.span,
                    );
                }
            }
            seen.push(name);
        }
        for (name, expected) in fields.iter() {
            if !seen.iter().any(|present| present == name) {
                self.shape_mismatch(
                    &join_path(path, name),
                    expected.describe(),
                    "missing".to_string(),
                    span,
                );
            }
        }
        Ok(())
    }

    /// A variant instance literal is a one-key object `{Tag: payload}`.
    fn variant_from(
        &mut self,
        target: &Type,
        options: &Fields,
        object: &ObjectExpression,
        span: SourceSpan,
        path: &str,
    ) -> Result<(), CheckError> {
        let single = match object.properties.as_slice() {
            [ObjectMember::Property(property)] => property.key_name().map(|tag| (tag, property)),
            _ => None,
        };
        let Some((tag, property)) = single else {
            let received = self.object_literal(object, span)?;
            self.shape_mismatch(path, target.describe(), received.describe(), span);
            return Ok(());
        };
        match options.get(&tag) {
            Some(payload) => self.conform_shape(payload, &property.value, &join_path(path, &tag)),
            None => {
                self.expression(&property.value)?;
                let known = options.names().collect::<Vec<_>>().join(", ");
                self.shape_mismatch(
                    &join_path(path, &tag),
                    format!("one of {known}"),
                    format!("tag {tag}"),
                    property.key.span,
                );
                Ok(())
            }
        }
    }

    fn shape_mismatch(&mut self, path: &str, expected: String, received: String, span: SourceSpan) {
        self.report(
            DiagnosticCode::FromTypeMismatch,
            DiagnosticMetadata::Shape {
                path: path.to_string(),
                expected,
                received,
            },
            span,
        );
    }
}
