use serde::{Deserialize, Serialize};

/// Directive a lowered file must carry to be type-checked.
pub const ENTRY_DIRECTIVE: &str = "use kiln";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn single_point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub body: Vec<Statement>,
}

impl Module {
    pub fn new(body: Vec<Statement>) -> Self {
        Self {
            directives: vec![ENTRY_DIRECTIVE.to_string()],
            body,
        }
    }

    pub fn is_analyzable(&self) -> bool {
        self.directives
            .iter()
            .any(|directive| directive == ENTRY_DIRECTIVE)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    #[serde(rename = "ExpressionStatement")]
    Expression(ExpressionStatement),
    #[serde(rename = "BlockStatement")]
    Block(Block),
    #[serde(rename = "EmptyStatement")]
    Empty(SpanOnly),
    #[serde(rename = "VariableDeclaration")]
    Variable(VariableDeclaration),
    #[serde(rename = "FunctionDeclaration")]
    Function(FunctionDeclaration),
    #[serde(rename = "ReturnStatement")]
    Return(ReturnStatement),
    #[serde(rename = "IfStatement")]
    If(IfStatement),
    #[serde(rename = "WhileStatement")]
    While(WhileStatement),
    #[serde(rename = "DoWhileStatement")]
    DoWhile(WhileStatement),
    #[serde(rename = "ForStatement")]
    For(ForStatement),
    #[serde(rename = "BreakStatement")]
    Break(SpanOnly),
    #[serde(rename = "ContinueStatement")]
    Continue(SpanOnly),
    #[serde(rename = "SwitchStatement")]
    Switch(SwitchStatement),
    #[serde(rename = "TryStatement")]
    Try(TryStatement),
    #[serde(rename = "ImportDeclaration")]
    Import(ImportDeclaration),
    #[serde(rename = "ExportNamedDeclaration")]
    Export(ExportNamedDeclaration),
    #[serde(rename = "ExportDefaultDeclaration")]
    ExportDefault(SpanOnly),
    #[serde(rename = "ExportAllDeclaration")]
    ExportAll(SpanOnly),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    pub body: Vec<Statement>,
    #[serde(default)]
    pub span: SourceSpan,
}

/// Nodes the checker only needs a location for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpanOnly {
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Let,
    Const,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclarator>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclarator {
    pub id: Pattern,
    #[serde(default)]
    pub init: Option<Expression>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDeclaration {
    pub id: Identifier,
    #[serde(default)]
    pub params: Vec<Pattern>,
    pub body: Block,
    #[serde(rename = "async", default)]
    pub is_async: bool,
    #[serde(default)]
    pub span: SourceSpan,
}

impl FunctionDeclaration {
    pub fn parts(&self) -> FunctionParts<'_> {
        FunctionParts {
            params: &self.params,
            body: FunctionBodyRef::Block(&self.body),
            is_async: self.is_async,
            span: self.span,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnStatement {
    #[serde(default)]
    pub argument: Option<Expression>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    #[serde(default)]
    pub alternate: Option<Box<Statement>>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForStatement {
    #[serde(default)]
    pub init: Option<ForInit>,
    #[serde(default)]
    pub test: Option<Expression>,
    #[serde(default)]
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForInit {
    Declaration(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    #[serde(default)]
    pub cases: Vec<SwitchCase>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Expression>,
    #[serde(default)]
    pub consequent: Vec<Statement>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TryStatement {
    pub block: Block,
    #[serde(default)]
    pub handler: Option<CatchClause>,
    #[serde(default)]
    pub finalizer: Option<Block>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatchClause {
    #[serde(default)]
    pub param: Option<Pattern>,
    pub body: Block,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportDeclaration {
    pub source: String,
    #[serde(default)]
    pub specifiers: Vec<ImportSpecifier>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSpecifier {
    pub imported: Identifier,
    pub local: Identifier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportNamedDeclaration {
    #[serde(default)]
    pub declaration: Option<Box<Statement>>,
    #[serde(default)]
    pub specifiers: Vec<ExportSpecifier>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSpecifier {
    pub local: Identifier,
    pub exported: Identifier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    Identifier(Identifier),
    ObjectPattern(SpanOnly),
    ArrayPattern(SpanOnly),
}

impl Pattern {
    pub fn span(&self) -> SourceSpan {
        match self {
            Pattern::Identifier(identifier) => identifier.span,
            Pattern::ObjectPattern(pattern) | Pattern::ArrayPattern(pattern) => pattern.span,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Pattern::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expression {
    #[serde(default)]
    pub span: SourceSpan,
    #[serde(flatten)]
    pub kind: ExpressionKind,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: SourceSpan) -> Self {
        Self { span, kind }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(identifier) => Some(&identifier.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ExpressionKind {
    Identifier(Identifier),
    Literal(LiteralExpression),
    TemplateLiteral(TemplateLiteral),
    #[serde(rename = "ArrayExpression")]
    Array(ArrayExpression),
    #[serde(rename = "ObjectExpression")]
    Object(ObjectExpression),
    #[serde(rename = "FunctionExpression")]
    Function(FunctionExpression),
    #[serde(rename = "SpreadElement")]
    Spread(SpreadElement),
    #[serde(rename = "UnaryExpression")]
    Unary(UnaryExpression),
    #[serde(rename = "UpdateExpression")]
    Update(UpdateExpression),
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryExpression),
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalExpression),
    #[serde(rename = "AssignmentExpression")]
    Assignment(AssignmentExpression),
    #[serde(rename = "ConditionalExpression")]
    Conditional(ConditionalExpression),
    #[serde(rename = "CallExpression")]
    Call(CallExpression),
    #[serde(rename = "MemberExpression")]
    Member(MemberExpression),
    #[serde(rename = "SequenceExpression")]
    Sequence(SequenceExpression),
    #[serde(rename = "AwaitExpression")]
    Await(AwaitExpression),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiteralExpression {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    BigInt { bigint: String },
    String(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateLiteral {
    #[serde(default)]
    pub quasis: Vec<String>,
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrayExpression {
    #[serde(default)]
    pub elements: Vec<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectExpression {
    #[serde(default)]
    pub properties: Vec<ObjectMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectMember {
    Property(Property),
    SpreadElement(SpreadElement),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub key: Expression,
    pub value: Expression,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub span: SourceSpan,
}

impl Property {
    /// Static name of the key, if it has one.
    pub fn key_name(&self) -> Option<String> {
        if self.computed {
            return None;
        }
        match &self.key.kind {
            ExpressionKind::Identifier(identifier) => Some(identifier.name.clone()),
            ExpressionKind::Literal(literal) => match &literal.value {
                LiteralValue::String(value) => Some(value.clone()),
                LiteralValue::Number(value) => Some(format_number(*value)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpreadElement {
    pub argument: Box<Expression>,
    #[serde(default)]
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionExpression {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
    #[serde(rename = "async", default)]
    pub is_async: bool,
    #[serde(default)]
    pub arrow: bool,
}

impl FunctionExpression {
    pub fn parts(&self, span: SourceSpan) -> FunctionParts<'_> {
        let body = match &self.body {
            FunctionBody::Block(block) => FunctionBodyRef::Block(block),
            FunctionBody::Expression(expression) => FunctionBodyRef::Expression(expression),
        };
        FunctionParts {
            params: &self.params,
            body,
            is_async: self.is_async,
            span,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FunctionBody {
    Block(Block),
    Expression(Box<Expression>),
}

/// Borrowed view shared by function declarations and function expressions.
#[derive(Debug, Clone, Copy)]
pub struct FunctionParts<'a> {
    pub params: &'a [Pattern],
    pub body: FunctionBodyRef<'a>,
    pub is_async: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy)]
pub enum FunctionBodyRef<'a> {
    Block(&'a Block),
    Expression(&'a Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Negative,
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    TypeOf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub argument: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub argument: Box<Expression>,
    #[serde(default)]
    pub prefix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "===")]
    StrictEqual,
    #[serde(rename = "!==")]
    StrictNotEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Remainder,
    #[serde(rename = "**")]
    Exponent,
    #[serde(rename = "<<")]
    ShiftLeft,
    #[serde(rename = ">>")]
    ShiftRight,
    #[serde(rename = ">>>")]
    UnsignedShiftRight,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    NullishCoalesce,
}

impl LogicalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::NullishCoalesce => "??",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Subtract,
    #[serde(rename = "*=")]
    Multiply,
    #[serde(rename = "/=")]
    Divide,
    #[serde(rename = "%=")]
    Remainder,
    #[serde(rename = "**=")]
    Exponent,
}

impl AssignmentOperator {
    /// Binary operator applied by a compound assignment.
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::Add => Some(BinaryOperator::Add),
            AssignmentOperator::Subtract => Some(BinaryOperator::Subtract),
            AssignmentOperator::Multiply => Some(BinaryOperator::Multiply),
            AssignmentOperator::Divide => Some(BinaryOperator::Divide),
            AssignmentOperator::Remainder => Some(BinaryOperator::Remainder),
            AssignmentOperator::Exponent => Some(BinaryOperator::Exponent),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentExpression {
    pub operator: AssignmentOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Box<Expression>,
    #[serde(default)]
    pub computed: bool,
}

impl MemberExpression {
    /// Property name for `object.name` accesses; `None` for `object[expr]`.
    pub fn property_name(&self) -> Option<&str> {
        if self.computed {
            None
        } else {
            self.property.as_identifier()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
}

/// Renders a numeric literal the way it is written as a property key.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
