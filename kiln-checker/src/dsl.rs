//! Builders for lowered trees.
//!
//! Nodes are created without positions; wrap an expression in [`at`] when a
//! test needs to assert on one.

use crate::ast::{
    ArrayExpression, AssignmentExpression, AssignmentOperator, AwaitExpression, BinaryExpression,
    BinaryOperator, Block, CallExpression, CatchClause, ConditionalExpression, DeclarationKind,
    ExportNamedDeclaration, ExportSpecifier, Expression, ExpressionKind, ExpressionStatement,
    ForInit, ForStatement, FunctionBody, FunctionDeclaration, FunctionExpression, Identifier,
    IfStatement, ImportDeclaration, ImportSpecifier, LiteralExpression, LiteralValue,
    LogicalExpression, LogicalOperator, MemberExpression, Module, ObjectExpression, ObjectMember,
    Pattern, Property, ReturnStatement, SequenceExpression, SourceSpan, SpreadElement, Statement,
    SwitchCase, SwitchStatement, TemplateLiteral, TryStatement, UnaryExpression, UnaryOperator,
    VariableDeclaration, VariableDeclarator, WhileStatement,
};
use crate::types::Type;

fn expr(kind: ExpressionKind) -> Expression {
    Expression::new(kind, SourceSpan::default())
}

fn identifier(name: &str) -> Identifier {
    Identifier {
        name: name.to_string(),
        span: SourceSpan::default(),
    }
}

fn literal(value: LiteralValue) -> Expression {
    expr(ExpressionKind::Literal(LiteralExpression { value }))
}

fn params(names: &[&str]) -> Vec<Pattern> {
    names
        .iter()
        .map(|name| Pattern::Identifier(identifier(name)))
        .collect()
}

/// Places `expression` at `line:column`.
pub fn at(mut expression: Expression, line: usize, column: usize) -> Expression {
    expression.span = SourceSpan::single_point(line, column);
    expression
}

pub fn module(body: Vec<Statement>) -> Module {
    Module::new(body)
}

pub fn num(value: f64) -> Expression {
    literal(LiteralValue::Number(value))
}

pub fn text(value: &str) -> Expression {
    literal(LiteralValue::String(value.to_string()))
}

pub fn boolean(value: bool) -> Expression {
    literal(LiteralValue::Boolean(value))
}

pub fn null() -> Expression {
    literal(LiteralValue::Null)
}

pub fn ident(name: &str) -> Expression {
    expr(ExpressionKind::Identifier(identifier(name)))
}

pub fn template(expressions: Vec<Expression>) -> Expression {
    expr(ExpressionKind::TemplateLiteral(TemplateLiteral {
        quasis: vec![String::new(); expressions.len() + 1],
        expressions,
    }))
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    expr(ExpressionKind::Call(CallExpression {
        callee: Box::new(callee),
        arguments,
    }))
}

pub fn member(object: Expression, property: &str) -> Expression {
    expr(ExpressionKind::Member(MemberExpression {
        object: Box::new(object),
        property: Box::new(ident(property)),
        computed: false,
    }))
}

pub fn index(object: Expression, property: Expression) -> Expression {
    expr(ExpressionKind::Member(MemberExpression {
        object: Box::new(object),
        property: Box::new(property),
        computed: true,
    }))
}

/// `object.name(arguments...)`.
pub fn method(object: Expression, name: &str, arguments: Vec<Expression>) -> Expression {
    call(member(object, name), arguments)
}

pub fn object(entries: Vec<(&str, Expression)>) -> Expression {
    expr(ExpressionKind::Object(ObjectExpression {
        properties: entries
            .into_iter()
            .map(|(key, value)| {
                ObjectMember::Property(Property {
                    key: ident(key),
                    value,
                    computed: false,
                    span: SourceSpan::default(),
                })
            })
            .collect(),
    }))
}

/// Object literal made of explicit members, for spreads.
pub fn object_members(properties: Vec<ObjectMember>) -> Expression {
    expr(ExpressionKind::Object(ObjectExpression { properties }))
}

pub fn property(key: &str, value: Expression) -> ObjectMember {
    ObjectMember::Property(Property {
        key: ident(key),
        value,
        computed: false,
        span: SourceSpan::default(),
    })
}

pub fn spread_member(argument: Expression) -> ObjectMember {
    ObjectMember::SpreadElement(SpreadElement {
        argument: Box::new(argument),
        span: SourceSpan::default(),
    })
}

pub fn spread(argument: Expression) -> Expression {
    expr(ExpressionKind::Spread(SpreadElement {
        argument: Box::new(argument),
        span: SourceSpan::default(),
    }))
}

pub fn array(elements: Vec<Expression>) -> Expression {
    expr(ExpressionKind::Array(ArrayExpression { elements }))
}

pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    expr(ExpressionKind::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

pub fn logical(left: Expression, operator: LogicalOperator, right: Expression) -> Expression {
    expr(ExpressionKind::Logical(LogicalExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

pub fn unary(operator: UnaryOperator, argument: Expression) -> Expression {
    expr(ExpressionKind::Unary(UnaryExpression {
        operator,
        argument: Box::new(argument),
    }))
}

pub fn assign(target: Expression, value: Expression) -> Expression {
    assign_op(target, AssignmentOperator::Assign, value)
}

pub fn assign_op(
    target: Expression,
    operator: AssignmentOperator,
    value: Expression,
) -> Expression {
    expr(ExpressionKind::Assignment(AssignmentExpression {
        operator,
        left: Box::new(target),
        right: Box::new(value),
    }))
}

pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    expr(ExpressionKind::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    }))
}

pub fn await_(argument: Expression) -> Expression {
    expr(ExpressionKind::Await(AwaitExpression {
        argument: Box::new(argument),
    }))
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    expr(ExpressionKind::Sequence(SequenceExpression { expressions }))
}

fn function_expression(names: &[&str], body: FunctionBody, is_async: bool) -> Expression {
    expr(ExpressionKind::Function(FunctionExpression {
        id: None,
        params: params(names),
        body,
        is_async,
        arrow: true,
    }))
}

/// `(names) => body`.
pub fn arrow(names: &[&str], body: Expression) -> Expression {
    function_expression(names, FunctionBody::Expression(Box::new(body)), false)
}

pub fn arrow_block(names: &[&str], body: Vec<Statement>) -> Expression {
    function_expression(names, FunctionBody::Block(block_of(body)), false)
}

pub fn async_arrow(names: &[&str], body: Vec<Statement>) -> Expression {
    function_expression(names, FunctionBody::Block(block_of(body)), true)
}

fn block_of(body: Vec<Statement>) -> Block {
    Block {
        body,
        span: SourceSpan::default(),
    }
}

fn declaration(kind: DeclarationKind, name: &str, init: Expression) -> VariableDeclaration {
    VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator {
            id: Pattern::Identifier(identifier(name)),
            init: Some(init),
            span: SourceSpan::default(),
        }],
        span: SourceSpan::default(),
    }
}

pub fn let_(name: &str, init: Expression) -> Statement {
    Statement::Variable(declaration(DeclarationKind::Let, name, init))
}

pub fn const_(name: &str, init: Expression) -> Statement {
    Statement::Variable(declaration(DeclarationKind::Const, name, init))
}

pub fn function(name: &str, names: &[&str], body: Vec<Statement>) -> Statement {
    Statement::Function(FunctionDeclaration {
        id: identifier(name),
        params: params(names),
        body: block_of(body),
        is_async: false,
        span: SourceSpan::default(),
    })
}

pub fn expr_stmt(expression: Expression) -> Statement {
    Statement::Expression(ExpressionStatement { expression })
}

pub fn ret(argument: Expression) -> Statement {
    Statement::Return(ReturnStatement {
        argument: Some(argument),
        span: SourceSpan::default(),
    })
}

pub fn ret_empty() -> Statement {
    Statement::Return(ReturnStatement {
        argument: None,
        span: SourceSpan::default(),
    })
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(block_of(body))
}

pub fn if_(
    test: Expression,
    consequent: Vec<Statement>,
    alternate: Option<Vec<Statement>>,
) -> Statement {
    Statement::If(IfStatement {
        test,
        consequent: Box::new(block(consequent)),
        alternate: alternate.map(|body| Box::new(block(body))),
        span: SourceSpan::default(),
    })
}

pub fn while_(test: Expression, body: Vec<Statement>) -> Statement {
    Statement::While(WhileStatement {
        test,
        body: Box::new(block(body)),
        span: SourceSpan::default(),
    })
}

pub fn do_while(body: Vec<Statement>, test: Expression) -> Statement {
    Statement::DoWhile(WhileStatement {
        test,
        body: Box::new(block(body)),
        span: SourceSpan::default(),
    })
}

/// `for (let name = init; test; update) { body }`.
pub fn for_(
    name: &str,
    init: Expression,
    test: Expression,
    update: Expression,
    body: Vec<Statement>,
) -> Statement {
    Statement::For(ForStatement {
        init: Some(ForInit::Declaration(declaration(
            DeclarationKind::Let,
            name,
            init,
        ))),
        test: Some(test),
        update: Some(update),
        body: Box::new(block(body)),
        span: SourceSpan::default(),
    })
}

/// Each case is `(test, consequent)`; a `None` test is `default`.
pub fn switch_(
    discriminant: Expression,
    cases: Vec<(Option<Expression>, Vec<Statement>)>,
) -> Statement {
    Statement::Switch(SwitchStatement {
        discriminant,
        cases: cases
            .into_iter()
            .map(|(test, consequent)| SwitchCase {
                test,
                consequent,
                span: SourceSpan::default(),
            })
            .collect(),
        span: SourceSpan::default(),
    })
}

pub fn try_(body: Vec<Statement>, param: Option<&str>, handler: Vec<Statement>) -> Statement {
    Statement::Try(TryStatement {
        block: block_of(body),
        handler: Some(CatchClause {
            param: param.map(|name| Pattern::Identifier(identifier(name))),
            body: block_of(handler),
            span: SourceSpan::default(),
        }),
        finalizer: None,
        span: SourceSpan::default(),
    })
}

/// `import { names } from source`.
pub fn import(source: &str, names: &[&str]) -> Statement {
    import_as(
        source,
        &names.iter().map(|name| (*name, *name)).collect::<Vec<_>>(),
    )
}

/// `import { imported as local } from source`.
pub fn import_as(source: &str, names: &[(&str, &str)]) -> Statement {
    Statement::Import(ImportDeclaration {
        source: source.to_string(),
        specifiers: names
            .iter()
            .map(|(imported, local)| ImportSpecifier {
                imported: identifier(imported),
                local: identifier(local),
            })
            .collect(),
        span: SourceSpan::default(),
    })
}

/// `export { names }`.
pub fn export_names(names: &[&str]) -> Statement {
    Statement::Export(ExportNamedDeclaration {
        declaration: None,
        specifiers: names
            .iter()
            .map(|name| ExportSpecifier {
                local: identifier(name),
                exported: identifier(name),
            })
            .collect(),
        source: None,
        span: SourceSpan::default(),
    })
}

/// `export const name = init`.
pub fn export_const(name: &str, init: Expression) -> Statement {
    Statement::Export(ExportNamedDeclaration {
        declaration: Some(Box::new(const_(name, init))),
        specifiers: Vec::new(),
        source: None,
        span: SourceSpan::default(),
    })
}

pub fn struct_type(fields: Vec<(&str, Type)>) -> Type {
    Type::structure(owned(fields)).unwrap_or(Type::Error)
}

pub fn variant_type(options: Vec<(&str, Type)>) -> Type {
    Type::variant(owned(options)).unwrap_or(Type::Error)
}

pub fn array_type(contains: Type) -> Type {
    Type::array(contains)
}

pub fn tuple_type(fields: Vec<Type>) -> Type {
    Type::tuple(fields)
}

pub fn fn_type(params: Vec<Type>, returns: Type) -> Type {
    Type::function(params, returns)
}

fn owned(entries: Vec<(&str, Type)>) -> Vec<(String, Type)> {
    entries
        .into_iter()
        .map(|(name, ty)| (name.to_string(), ty))
        .collect()
}
