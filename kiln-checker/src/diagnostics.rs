use std::fmt;

use serde::Serialize;

use crate::ast::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    UndefinedVariable,
    AssignmentTypeMismatch,
    KeyTypeMismatch,
    ContainedTypeMismatch,
    BinaryTypeMismatch,
    OperatorTypeMismatch,
    ConditionTypeMismatch,
    TernaryTypeMismatch,
    ArgCountMismatch,
    ArgTypeMismatch,
    InvalidField,
    IndexTypeMismatch,
    InvalidTypeMethod,
    VariantTagName,
    NotAllowedHere,
    Forbidden,
    Unimplemented,
    MissingExpected,
    AsyncMismatch,
    ReturnTypeMismatch,
    FromTypeMismatch,
    NonExhaustiveMatch,
    RedeclaredExport,
    NotAType,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UndefinedVariable => "UNDEFINED_VARIABLE",
            DiagnosticCode::AssignmentTypeMismatch => "ASSIGNMENT_TYPE_MISMATCH",
            DiagnosticCode::KeyTypeMismatch => "KEY_TYPE_MISMATCH",
            DiagnosticCode::ContainedTypeMismatch => "CONTAINED_TYPE_MISMATCH",
            DiagnosticCode::BinaryTypeMismatch => "BINARY_TYPE_MISMATCH",
            DiagnosticCode::OperatorTypeMismatch => "OPERATOR_TYPE_MISMATCH",
            DiagnosticCode::ConditionTypeMismatch => "CONDITION_TYPE_MISMATCH",
            DiagnosticCode::TernaryTypeMismatch => "TERNARY_TYPE_MISMATCH",
            DiagnosticCode::ArgCountMismatch => "ARG_COUNT_MISMATCH",
            DiagnosticCode::ArgTypeMismatch => "ARG_TYPE_MISMATCH",
            DiagnosticCode::InvalidField => "INVALID_FIELD",
            DiagnosticCode::IndexTypeMismatch => "INDEX_TYPE_MISMATCH",
            DiagnosticCode::InvalidTypeMethod => "INVALID_TYPE_METHOD",
            DiagnosticCode::VariantTagName => "VARIANT_TAG_NAME",
            DiagnosticCode::NotAllowedHere => "NOT_ALLOWED_HERE",
            DiagnosticCode::Forbidden => "FORBIDDEN",
            DiagnosticCode::Unimplemented => "UNIMPLEMENTED",
            DiagnosticCode::MissingExpected => "MISSING_EXPECTED",
            DiagnosticCode::AsyncMismatch => "ASYNC_MISMATCH",
            DiagnosticCode::ReturnTypeMismatch => "RETURN_TYPE_MISMATCH",
            DiagnosticCode::FromTypeMismatch => "FROM_TYPE_MISMATCH",
            DiagnosticCode::NonExhaustiveMatch => "NON_EXHAUSTIVE_MATCH",
            DiagnosticCode::RedeclaredExport => "REDECLARED_EXPORT",
            DiagnosticCode::NotAType => "NOT_A_TYPE",
        }
    }

    fn title(self) -> &'static str {
        match self {
            DiagnosticCode::UndefinedVariable => "undefined variable",
            DiagnosticCode::AssignmentTypeMismatch => "assignment type mismatch",
            DiagnosticCode::KeyTypeMismatch => "field type mismatch",
            DiagnosticCode::ContainedTypeMismatch => "contained type mismatch",
            DiagnosticCode::BinaryTypeMismatch => "operand types differ",
            DiagnosticCode::OperatorTypeMismatch => "operator type mismatch",
            DiagnosticCode::ConditionTypeMismatch => "condition must be Bool",
            DiagnosticCode::TernaryTypeMismatch => "ternary branches differ",
            DiagnosticCode::ArgCountMismatch => "wrong number of arguments",
            DiagnosticCode::ArgTypeMismatch => "argument type mismatch",
            DiagnosticCode::InvalidField => "invalid field",
            DiagnosticCode::IndexTypeMismatch => "index type mismatch",
            DiagnosticCode::InvalidTypeMethod => "invalid type method",
            DiagnosticCode::VariantTagName => "invalid variant tag",
            DiagnosticCode::NotAllowedHere => "not allowed here",
            DiagnosticCode::Forbidden => "forbidden",
            DiagnosticCode::Unimplemented => "unimplemented",
            DiagnosticCode::MissingExpected => "missing expected value",
            DiagnosticCode::AsyncMismatch => "async mismatch",
            DiagnosticCode::ReturnTypeMismatch => "return type mismatch",
            DiagnosticCode::FromTypeMismatch => "value does not match type",
            DiagnosticCode::NonExhaustiveMatch => "non-exhaustive match",
            DiagnosticCode::RedeclaredExport => "export declared twice",
            DiagnosticCode::NotAType => "expected a type",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code-specific payload. Types are carried in their rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticMetadata {
    Name {
        name: String,
    },
    Mismatch {
        expected: String,
        received: String,
    },
    Operator {
        operator: String,
        expected: String,
        received: String,
    },
    Operands {
        operator: String,
        left: String,
        right: String,
    },
    Argument {
        index: usize,
        expected: String,
        received: String,
    },
    Count {
        expected: usize,
        received: usize,
    },
    Field {
        field: String,
        on: String,
    },
    FieldMismatch {
        field: String,
        expected: String,
        received: String,
    },
    Method {
        method: String,
        on: String,
    },
    Shape {
        path: String,
        expected: String,
        received: String,
    },
    Tags {
        tags: Vec<String>,
    },
    Construct {
        construct: String,
    },
}

impl DiagnosticMetadata {
    pub fn name(name: impl Into<String>) -> Self {
        DiagnosticMetadata::Name { name: name.into() }
    }

    pub fn construct(construct: impl Into<String>) -> Self {
        DiagnosticMetadata::Construct {
            construct: construct.into(),
        }
    }

    fn detail(&self) -> String {
        match self {
            DiagnosticMetadata::Name { name } => format!("'{name}'"),
            DiagnosticMetadata::Mismatch { expected, received } => {
                format!("expected {expected}, received {received}")
            }
            DiagnosticMetadata::Operator {
                operator,
                expected,
                received,
            } => format!("'{operator}' expects {expected}, received {received}"),
            DiagnosticMetadata::Operands {
                operator,
                left,
                right,
            } => format!("'{operator}' applied to {left} and {right}"),
            DiagnosticMetadata::Argument {
                index,
                expected,
                received,
            } => format!("argument {index} expected {expected}, received {received}"),
            DiagnosticMetadata::Count { expected, received } => {
                format!("expected {expected}, received {received}")
            }
            DiagnosticMetadata::Field { field, on } => format!("'{field}' on {on}"),
            DiagnosticMetadata::FieldMismatch {
                field,
                expected,
                received,
            } => format!("field '{field}' expected {expected}, received {received}"),
            DiagnosticMetadata::Method { method, on } => format!("'{method}' on {on}"),
            DiagnosticMetadata::Shape {
                path,
                expected,
                received,
            } => {
                let at = if path.is_empty() { "value" } else { path };
                format!("at {at}: expected {expected}, received {received}")
            }
            DiagnosticMetadata::Tags { tags } => format!("missing {}", tags.join(", ")),
            DiagnosticMetadata::Construct { construct } => construct.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub metadata: DiagnosticMetadata,
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        let mut message = format!("{}: {}", self.code.title(), self.metadata.detail());
        if let Some(remark) = &self.remark {
            message.push_str(" (");
            message.push_str(remark);
            message.push(')');
        }
        message
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, code: DiagnosticCode, metadata: DiagnosticMetadata, span: SourceSpan) {
        self.entries.push(Diagnostic {
            code,
            metadata,
            span,
            remark: None,
        });
    }

    pub fn push_with_remark<S: Into<String>>(
        &mut self,
        code: DiagnosticCode,
        metadata: DiagnosticMetadata,
        span: SourceSpan,
        remark: S,
    ) {
        self.entries.push(Diagnostic {
            code,
            metadata,
            span,
            remark: Some(remark.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
