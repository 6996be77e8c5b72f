use crate::ast::{
    ArrayExpression, AssignmentExpression, AwaitExpression, BinaryOperator, CallExpression,
    ConditionalExpression, Expression, ExpressionKind, LiteralValue, LogicalExpression,
    LogicalOperator, MemberExpression, ObjectExpression, ObjectMember, SourceSpan,
    UnaryExpression, UnaryOperator, UpdateExpression, UpdateOperator,
};
use crate::diagnostics::{DiagnosticCode, DiagnosticMetadata};
use crate::errors::CheckError;
use crate::types::Type;

use super::functions::FunctionContext;
use super::{
    accepts, is_like, is_reserved, underlying, TypeChecker, JS_KEYWORD, KEYWORDS, TYPE_KEYWORD,
};

/// Where an assignment writes to; picks the mismatch code.
enum TargetKind {
    Variable,
    Field(String),
    Element,
}

struct Target {
    ty: Type,
    kind: TargetKind,
}

impl<'r> TypeChecker<'r> {
    pub(super) fn expression(&mut self, expression: &Expression) -> Result<Type, CheckError> {
        self.expression_with(expression, None)
    }

    /// Types `expression`; `expected` lets function literals take their
    /// parameter types from the slot they are passed into.
    pub(super) fn expression_with(
        &mut self,
        expression: &Expression,
        expected: Option<&Type>,
    ) -> Result<Type, CheckError> {
        let span = expression.span;
        match &expression.kind {
            ExpressionKind::Identifier(identifier) => Ok(self.identifier(&identifier.name, span)),
            ExpressionKind::Literal(literal) => Ok(literal_type(&literal.value)),
            ExpressionKind::TemplateLiteral(template) => {
                for part in &template.expressions {
                    self.expression(part)?;
                }
                Ok(Type::Str)
            }
            ExpressionKind::Array(array) => self.array_literal(array),
            ExpressionKind::Object(object) => self.object_literal(object, span),
            ExpressionKind::Function(function) => {
                let context = match expected.map(underlying) {
                    Some(Type::Fn(signature)) => FunctionContext::Argument(signature),
                    _ => FunctionContext::Free,
                };
                self.function(function.parts(span), context)
            }
            ExpressionKind::Spread(spread) => {
                self.expression(&spread.argument)?;
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct("spread"),
                    span,
                );
                Ok(Type::Error)
            }
            ExpressionKind::Unary(unary) => self.unary(unary),
            ExpressionKind::Update(update) => self.update(update, span),
            ExpressionKind::Binary(binary) => {
                let left = self.expression(&binary.left)?;
                let right = self.expression(&binary.right)?;
                Ok(self.binary_result(binary.operator, &left, &right, span))
            }
            ExpressionKind::Logical(logical) => self.logical(logical, span),
            ExpressionKind::Assignment(assignment) => self.assignment(assignment, span),
            ExpressionKind::Conditional(conditional) => self.conditional(conditional, span),
            ExpressionKind::Call(call) => self.call(call, span),
            ExpressionKind::Member(member) => {
                let object = self.expression(&member.object)?;
                self.member_type(&object, member, span)
            }
            ExpressionKind::Sequence(sequence) => {
                let mut last = Type::Unknown;
                for item in &sequence.expressions {
                    last = self.expression(item)?;
                }
                Ok(last)
            }
            ExpressionKind::Await(await_expression) => {
                self.await_expression(await_expression, span)
            }
        }
    }

    fn identifier(&mut self, name: &str, span: SourceSpan) -> Type {
        if name == TYPE_KEYWORD {
            return Type::type_value(Type::type_value(Type::Unknown));
        }
        if is_reserved(name) {
            self.report_with_remark(
                DiagnosticCode::NotAllowedHere,
                DiagnosticMetadata::name(name),
                span,
                "type keywords can only be called",
            );
            return Type::Error;
        }
        match self.scope.lookup(name) {
            Some(ty) => ty,
            None => {
                self.report(
                    DiagnosticCode::UndefinedVariable,
                    DiagnosticMetadata::name(name),
                    span,
                );
                Type::Error
            }
        }
    }

    fn array_literal(&mut self, array: &ArrayExpression) -> Result<Type, CheckError> {
        let mut element: Option<Type> = None;
        let mut failed = false;
        for item in &array.elements {
            let ty = match &item.kind {
                ExpressionKind::Spread(spread) => {
                    let spread_ty = self.expression(&spread.argument)?;
                    match underlying(&spread_ty) {
                        Type::Array(contains) => (**contains).clone(),
                        Type::Unknown => Type::Unknown,
                        Type::Error => Type::Error,
                        other => {
                            self.report(
                                DiagnosticCode::ContainedTypeMismatch,
                                DiagnosticMetadata::Mismatch {
                                    expected: "array".to_string(),
                                    received: other.describe(),
                                },
                                item.span,
                            );
                            Type::Error
                        }
                    }
                }
                _ => self.expression(item)?,
            };
            if ty.is_error() {
                failed = true;
                continue;
            }
            match &element {
                None => element = Some(ty),
                Some(existing) => {
                    if !accepts(existing, &ty) {
                        self.report_mismatch(
                            DiagnosticCode::ContainedTypeMismatch,
                            existing,
                            &ty,
                            item.span,
                        );
                    }
                }
            }
        }
        Ok(match element {
            Some(contains) => Type::array(contains),
            None if failed => Type::Error,
            None => Type::array(Type::Unknown),
        })
    }

    pub(super) fn object_literal(
        &mut self,
        object: &ObjectExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let mut fields: Vec<(String, Type)> = Vec::new();
        let mut failed = false;
        for member in &object.properties {
            match member {
                ObjectMember::Property(property) => {
                    let Some(name) = property.key_name() else {
                        if property.computed {
                            self.expression(&property.key)?;
                        }
                        self.expression(&property.value)?;
                        self.report(
                            DiagnosticCode::NotAllowedHere,
                            DiagnosticMetadata::construct("computed key"),
                            property.key.span,
                        );
                        failed = true;
                        continue;
                    };
                    let ty = self.expression(&property.value)?;
                    failed |= ty.is_error();
                    insert_field(&mut fields, name, ty);
                }
                ObjectMember::SpreadElement(spread) => {
                    let ty = self.expression(&spread.argument)?;
                    match underlying(&ty) {
                        Type::Struct(spread_fields) => {
                            for (name, field) in spread_fields.iter() {
                                insert_field(&mut fields, name.to_string(), field.clone());
                            }
                        }
                        Type::Error => failed = true,
                        other => {
                            self.report(
                                DiagnosticCode::NotAllowedHere,
                                DiagnosticMetadata::construct(format!(
                                    "spread of {}",
                                    other.describe()
                                )),
                                spread.span,
                            );
                            failed = true;
                        }
                    }
                }
            }
        }
        if failed {
            return Ok(Type::Error);
        }
        match Type::structure(fields) {
            Ok(ty) => Ok(ty),
            Err(error) => {
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(error.to_string()),
                    span,
                );
                Ok(Type::Error)
            }
        }
    }

    fn unary(&mut self, unary: &UnaryExpression) -> Result<Type, CheckError> {
        self.expression(&unary.argument)?;
        Ok(match unary.operator {
            UnaryOperator::Not => Type::Bool,
            UnaryOperator::Negative | UnaryOperator::Positive | UnaryOperator::BitNot => Type::Num,
            UnaryOperator::TypeOf => Type::Str,
        })
    }

    fn update(&mut self, update: &UpdateExpression, span: SourceSpan) -> Result<Type, CheckError> {
        let target = self.assignment_target(&update.argument)?;
        if !target.ty.is_error() && !is_like(&target.ty, &Type::Num) {
            let operator = match update.operator {
                UpdateOperator::Increment => "++",
                UpdateOperator::Decrement => "--",
            };
            self.report(
                DiagnosticCode::OperatorTypeMismatch,
                DiagnosticMetadata::Operator {
                    operator: operator.to_string(),
                    expected: Type::Num.describe(),
                    received: target.ty.describe(),
                },
                span,
            );
        }
        Ok(Type::Num)
    }

    pub(super) fn binary_result(
        &mut self,
        operator: BinaryOperator,
        left: &Type,
        right: &Type,
        span: SourceSpan,
    ) -> Type {
        let symbol = operator.symbol();
        match operator {
            BinaryOperator::StrictEqual | BinaryOperator::StrictNotEqual => {
                self.require_operands(symbol, &Type::Bool, left, right, span);
                Type::Bool
            }
            BinaryOperator::Less
            | BinaryOperator::LessEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterEqual => {
                self.require_operands(symbol, &Type::Num, left, right, span);
                Type::Bool
            }
            BinaryOperator::Add => self.addition(left, right, span),
            _ => {
                self.require_operands(symbol, &Type::Num, left, right, span);
                Type::Num
            }
        }
    }

    fn require_operands(
        &mut self,
        operator: &str,
        wanted: &Type,
        left: &Type,
        right: &Type,
        span: SourceSpan,
    ) {
        let offending = [left, right]
            .into_iter()
            .find(|ty| !ty.is_error() && !is_like(ty, wanted));
        if let Some(received) = offending {
            self.report(
                DiagnosticCode::OperatorTypeMismatch,
                DiagnosticMetadata::Operator {
                    operator: operator.to_string(),
                    expected: wanted.describe(),
                    received: received.describe(),
                },
                span,
            );
        }
    }

    /// `+` adds numbers or concatenates strings. Mixed operands coerce to
    /// `Str` after the mismatch is reported.
    fn addition(&mut self, left: &Type, right: &Type, span: SourceSpan) -> Type {
        if left.is_error() || right.is_error() {
            let other = if left.is_error() { right } else { left };
            return match underlying(other) {
                Type::Num => Type::Num,
                Type::Str => Type::Str,
                _ => Type::Error,
            };
        }
        match (underlying(left), underlying(right)) {
            (Type::Num, Type::Num) | (Type::Num, Type::Unknown) | (Type::Unknown, Type::Num) => {
                Type::Num
            }
            (Type::Str, Type::Str) | (Type::Str, Type::Unknown) | (Type::Unknown, Type::Str) => {
                Type::Str
            }
            (Type::Unknown, Type::Unknown) => Type::Unknown,
            _ => {
                self.report(
                    DiagnosticCode::BinaryTypeMismatch,
                    DiagnosticMetadata::Operands {
                        operator: BinaryOperator::Add.symbol().to_string(),
                        left: left.describe(),
                        right: right.describe(),
                    },
                    span,
                );
                Type::Str
            }
        }
    }

    fn logical(
        &mut self,
        logical: &LogicalExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let left = self.expression(&logical.left)?;
        let right = self.expression(&logical.right)?;
        match logical.operator {
            LogicalOperator::NullishCoalesce => {
                self.report(
                    DiagnosticCode::Forbidden,
                    DiagnosticMetadata::construct("'??' operator"),
                    span,
                );
                Ok(Type::Error)
            }
            LogicalOperator::And | LogicalOperator::Or => {
                self.require_operands(logical.operator.symbol(), &Type::Bool, &left, &right, span);
                Ok(Type::Bool)
            }
        }
    }

    fn assignment_target(&mut self, target: &Expression) -> Result<Target, CheckError> {
        match &target.kind {
            ExpressionKind::Identifier(identifier) => {
                let name = identifier.name.as_str();
                if is_reserved(name) {
                    self.report_with_remark(
                        DiagnosticCode::NotAllowedHere,
                        DiagnosticMetadata::name(name),
                        target.span,
                        "reserved names cannot be assigned",
                    );
                    return Ok(Target {
                        ty: Type::Error,
                        kind: TargetKind::Variable,
                    });
                }
                let ty = self.identifier(name, target.span);
                if !ty.is_error() && self.scope.is_const(name) {
                    self.report_with_remark(
                        DiagnosticCode::Forbidden,
                        DiagnosticMetadata::name(name),
                        target.span,
                        "constants cannot be reassigned",
                    );
                    return Ok(Target {
                        ty: Type::Error,
                        kind: TargetKind::Variable,
                    });
                }
                Ok(Target {
                    ty,
                    kind: TargetKind::Variable,
                })
            }
            ExpressionKind::Member(member) => {
                let object = self.expression(&member.object)?;
                let kind = match (underlying(&object), member.property_name()) {
                    (Type::Struct(_), Some(field)) => TargetKind::Field(field.to_string()),
                    _ => TargetKind::Element,
                };
                let ty = self.member_type(&object, member, target.span)?;
                Ok(Target { ty, kind })
            }
            _ => {
                self.expression(target)?;
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct("assignment target"),
                    target.span,
                );
                Ok(Target {
                    ty: Type::Error,
                    kind: TargetKind::Element,
                })
            }
        }
    }

    fn assignment(
        &mut self,
        assignment: &AssignmentExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let target = self.assignment_target(&assignment.left)?;
        let value = self.expression_with(&assignment.right, Some(&target.ty))?;
        let value = match assignment.operator.binary() {
            Some(operator) => self.binary_result(operator, &target.ty, &value, span),
            None => value,
        };
        if target.ty.is_error() {
            return Ok(value);
        }
        if value.is_error() {
            return Ok(target.ty);
        }
        if !accepts(&target.ty, &value) {
            match target.kind {
                TargetKind::Variable => self.report_mismatch(
                    DiagnosticCode::AssignmentTypeMismatch,
                    &target.ty,
                    &value,
                    span,
                ),
                TargetKind::Field(field) => self.report(
                    DiagnosticCode::KeyTypeMismatch,
                    DiagnosticMetadata::FieldMismatch {
                        field,
                        expected: target.ty.describe(),
                        received: value.describe(),
                    },
                    span,
                ),
                TargetKind::Element => self.report_mismatch(
                    DiagnosticCode::ContainedTypeMismatch,
                    &target.ty,
                    &value,
                    span,
                ),
            }
        }
        Ok(target.ty)
    }

    pub(super) fn require_condition(&mut self, test: &Type, span: SourceSpan) {
        if !test.is_error() && !is_like(test, &Type::Bool) {
            self.report_mismatch(DiagnosticCode::ConditionTypeMismatch, &Type::Bool, test, span);
        }
    }

    /// Ternaries resolve to the alternate's type even when the branches differ.
    fn conditional(
        &mut self,
        conditional: &ConditionalExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let test = self.expression(&conditional.test)?;
        self.require_condition(&test, conditional.test.span);
        let consequent = self.expression(&conditional.consequent)?;
        let alternate = self.expression(&conditional.alternate)?;
        if consequent.is_error() {
            return Ok(alternate);
        }
        if alternate.is_error() {
            return Ok(consequent);
        }
        if !consequent.equals(&alternate) {
            self.report_mismatch(
                DiagnosticCode::TernaryTypeMismatch,
                &consequent,
                &alternate,
                span,
            );
        }
        Ok(alternate)
    }

    fn await_expression(
        &mut self,
        await_expression: &AwaitExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        if !self.scope.in_async_function() {
            self.report(
                DiagnosticCode::AsyncMismatch,
                DiagnosticMetadata::construct("await outside an async function"),
                span,
            );
        }
        self.expression(&await_expression.argument)
    }

    pub(super) fn member_type(
        &mut self,
        object: &Type,
        member: &MemberExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let target = underlying(object);
        let Some(name) = member.property_name() else {
            return self.computed_member(target, member, span);
        };
        let ty = match target {
            Type::Error => Type::Error,
            Type::Unknown => Type::Unknown,
            Type::Struct(fields) => match fields.get(name) {
                Some(field) => field.clone(),
                None => {
                    self.invalid_field(name, target, span);
                    Type::Error
                }
            },
            Type::Variant(_) => {
                self.forbid_variant_access(span);
                Type::Error
            }
            Type::Type(_) => {
                self.report_with_remark(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::Method {
                        method: name.to_string(),
                        on: target.describe(),
                    },
                    span,
                    "type methods must be called",
                );
                Type::Error
            }
            other => match builtin_member(other, name) {
                Some(ty) => ty,
                None => {
                    self.invalid_field(name, target, span);
                    Type::Error
                }
            },
        };
        Ok(ty)
    }

    fn computed_member(
        &mut self,
        target: &Type,
        member: &MemberExpression,
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        if let Type::Tuple(fields) = target {
            if let Some(index) = literal_index(&member.property) {
                return Ok(match fields.get(index) {
                    Some(field) => field.clone(),
                    None => {
                        self.invalid_field(&index.to_string(), target, span);
                        Type::Error
                    }
                });
            }
            let index = self.expression(&member.property)?;
            if !index.is_error() {
                self.report_with_remark(
                    DiagnosticCode::IndexTypeMismatch,
                    DiagnosticMetadata::Mismatch {
                        expected: "numeric literal".to_string(),
                        received: index.describe(),
                    },
                    member.property.span,
                    "tuples are indexed by literal positions",
                );
            }
            return Ok(Type::Error);
        }

        let index = self.expression(&member.property)?;
        let ty = match target {
            Type::Error => Type::Error,
            Type::Unknown => Type::Unknown,
            Type::Array(contains) => {
                self.require_index(&index, member.property.span);
                (**contains).clone()
            }
            Type::Str => {
                self.require_index(&index, member.property.span);
                Type::Str
            }
            Type::Struct(_) => {
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct("computed field access"),
                    span,
                );
                Type::Error
            }
            Type::Variant(_) => {
                self.forbid_variant_access(span);
                Type::Error
            }
            other => {
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(format!("indexing {}", other.describe())),
                    span,
                );
                Type::Error
            }
        };
        Ok(ty)
    }

    fn require_index(&mut self, index: &Type, span: SourceSpan) {
        if !index.is_error() && !is_like(index, &Type::Num) {
            self.report_mismatch(DiagnosticCode::IndexTypeMismatch, &Type::Num, index, span);
        }
    }

    fn invalid_field(&mut self, field: &str, on: &Type, span: SourceSpan) {
        self.report(
            DiagnosticCode::InvalidField,
            DiagnosticMetadata::Field {
                field: field.to_string(),
                on: on.describe(),
            },
            span,
        );
    }

    fn forbid_variant_access(&mut self, span: SourceSpan) {
        self.report_with_remark(
            DiagnosticCode::Forbidden,
            DiagnosticMetadata::construct("variant field access"),
            span,
            "read variants with variant.when",
        );
    }

    fn call(&mut self, call: &CallExpression, span: SourceSpan) -> Result<Type, CheckError> {
        if let Some(name) = call.callee.as_identifier() {
            if name == JS_KEYWORD {
                return self.js_call(&call.arguments, span);
            }
            if KEYWORDS.contains(&name) {
                return self.keyword_call(name, &call.arguments, span);
            }
        }
        if let ExpressionKind::Member(member) = &call.callee.kind {
            if member.object.as_identifier() == Some("variant")
                && member.property_name() == Some("when")
            {
                return self.variant_when(&call.arguments, span);
            }
            let object = self.expression(&member.object)?;
            if let (Type::Type(denoted), Some(method)) = (&object, member.property_name()) {
                return self.type_method(denoted, method, &call.arguments, span);
            }
            let callee = self.member_type(&object, member, call.callee.span)?;
            return self.apply(&callee, &call.arguments, span);
        }
        let callee = self.expression(&call.callee)?;
        self.apply(&callee, &call.arguments, span)
    }

    /// Ordinary function application.
    ///
    /// A wrong argument count aborts the file. A `Type`-valued return is a
    /// generic application and yields a deferred type-value.
    pub(super) fn apply(
        &mut self,
        callee: &Type,
        arguments: &[Expression],
        span: SourceSpan,
    ) -> Result<Type, CheckError> {
        let signature = match underlying(callee) {
            Type::Fn(signature) => signature,
            Type::Error | Type::Unknown => {
                for argument in arguments {
                    self.expression(argument)?;
                }
                return Ok(if callee.is_error() {
                    Type::Error
                } else {
                    Type::Unknown
                });
            }
            other => {
                for argument in arguments {
                    self.expression(argument)?;
                }
                self.report(
                    DiagnosticCode::NotAllowedHere,
                    DiagnosticMetadata::construct(format!("call of {}", other.describe())),
                    span,
                );
                return Ok(Type::Error);
            }
        };
        if arguments.len() != signature.params.len() {
            return Err(CheckError::CallArity {
                expected: signature.params.len(),
                received: arguments.len(),
                span,
            });
        }
        for (index, (argument, expected)) in arguments.iter().zip(&signature.params).enumerate() {
            if matches!(argument.kind, ExpressionKind::Spread(_)) {
                self.expression(argument)?;
                continue;
            }
            let received = self.expression_with(argument, Some(expected))?;
            if received.is_error() || expected.is_error() {
                continue;
            }
            if !accepts(expected, &received) {
                self.report(
                    DiagnosticCode::ArgTypeMismatch,
                    DiagnosticMetadata::Argument {
                        index,
                        expected: expected.describe(),
                        received: received.describe(),
                    },
                    argument.span,
                );
            }
        }
        Ok(match signature.returns.as_ref() {
            Type::Type(_) => Type::type_value(Type::Deferred),
            returns => returns.clone(),
        })
    }
}

fn literal_type(value: &LiteralValue) -> Type {
    match value {
        LiteralValue::Null => Type::Null,
        LiteralValue::Boolean(_) => Type::Bool,
        LiteralValue::Number(_) | LiteralValue::BigInt { .. } => Type::Num,
        LiteralValue::String(_) => Type::Str,
    }
}

/// Later keys replace earlier ones, as in an object literal.
fn insert_field(fields: &mut Vec<(String, Type)>, name: String, ty: Type) {
    match fields.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = ty,
        None => fields.push((name, ty)),
    }
}

fn literal_index(expression: &Expression) -> Option<usize> {
    match &expression.kind {
        ExpressionKind::Literal(literal) => match literal.value {
            LiteralValue::Number(value) if value >= 0.0 && value.fract() == 0.0 => {
                Some(value as usize)
            }
            _ => None,
        },
        _ => None,
    }
}

fn builtin_member(target: &Type, name: &str) -> Option<Type> {
    let to_str = || Type::function(Vec::new(), Type::Str);
    match (target, name) {
        (Type::Array(_), "length") | (Type::Str, "length") => Some(Type::Num),
        (Type::Array(contains), "includes") => {
            Some(Type::function(vec![(**contains).clone()], Type::Bool))
        }
        (Type::Array(_), "toString") | (Type::Num, "toString") => Some(to_str()),
        (Type::Num, "toFixed") => Some(Type::function(vec![Type::Num], Type::Str)),
        (Type::Str, "includes") => Some(Type::function(vec![Type::Str], Type::Bool)),
        (Type::Str, "slice") => Some(Type::function(vec![Type::Num, Type::Num], Type::Str)),
        (Type::Str, "toUpperCase") | (Type::Str, "toLowerCase") | (Type::Str, "trim") => {
            Some(to_str())
        }
        (Type::Str, "split") => Some(Type::function(
            vec![Type::Str],
            Type::array(Type::Str),
        )),
        _ => None,
    }
}
