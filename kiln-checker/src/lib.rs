mod ast;
mod diagnostics;
mod driver;
mod errors;
mod modules;
mod scope;
mod source;
mod typechecker;
mod types;

pub mod dsl;

pub use crate::ast::{
    format_number, ArrayExpression, AssignmentExpression, AssignmentOperator, AwaitExpression,
    BinaryExpression, BinaryOperator, Block, CallExpression, CatchClause, ConditionalExpression,
    DeclarationKind, ExportNamedDeclaration, ExportSpecifier, Expression, ExpressionKind,
    ExpressionStatement, ForInit, ForStatement, FunctionBody, FunctionBodyRef,
    FunctionDeclaration, FunctionExpression, FunctionParts, Identifier, IfStatement,
    ImportDeclaration, ImportSpecifier, LiteralExpression, LiteralValue, LogicalExpression,
    LogicalOperator, MemberExpression, Module, ObjectExpression, ObjectMember, Pattern, Property,
    ReturnStatement, SequenceExpression, SourceSpan, SpanOnly, SpreadElement, Statement,
    SwitchCase, SwitchStatement, TemplateLiteral, TryStatement, UnaryExpression, UnaryOperator,
    UpdateExpression, UpdateOperator, VariableDeclaration, VariableDeclarator, WhileStatement,
    ENTRY_DIRECTIVE,
};
pub use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticMetadata, Diagnostics};
pub use crate::driver::{check_file, check_path, CheckOptions, FileStatus, ModuleReport};
pub use crate::errors::{CheckError, Reported, Typed};
pub use crate::modules::{FileResolver, ModuleResolver};
pub use crate::scope::{FunctionOutcome, ReturnCheck, ReturnContract, SymbolTable};
pub use crate::source::{load_module, parse_module};
pub use crate::typechecker::TypeChecker;
pub use crate::types::{
    is_tag_name, select_handler, CondType, Fields, FnType, Predicate, ShapeError, Type, NONE_TAG,
    SOME_TAG, WILDCARD_TAG,
};
