use std::fmt;
use std::rc::Rc;

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

/// Tag of the wildcard arm in a variant match.
pub const WILDCARD_TAG: &str = "_";
/// Tags of the variant returned by `conform`.
pub const SOME_TAG: &str = "Some";
pub const NONE_TAG: &str = "None";

#[derive(Debug, Clone)]
pub enum Type {
    /// Top type: every value and every type is a subtype of it.
    Unknown,
    Null,
    Bool,
    Num,
    Str,
    Fn(FnType),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Struct(Fields),
    Variant(Fields),
    Cond(CondType),
    /// A type-value. Its own type is always `Type`; the box holds the type it
    /// denotes so method calls can dispatch on the underlying kind.
    Type(Box<Type>),
    /// Shape not statically known, e.g. the result of a generic application.
    Deferred,
    /// Sentinel for a locally failed check. Never compared.
    Error,
}

#[derive(Debug, Clone)]
pub struct FnType {
    pub params: Vec<Type>,
    pub returns: Box<Type>,
}

#[derive(Debug, Clone)]
pub struct CondType {
    pub base: Box<Type>,
    pub predicate: Predicate,
}

/// Ordered name-to-type map used for struct fields and variant options.
///
/// The name set is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Type)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("duplicate name '{0}'")]
    Duplicate(String),
    #[error("variant tag '{0}' must start with an uppercase letter")]
    TagName(String),
}

impl Fields {
    pub fn new(entries: Vec<(String, Type)>) -> Result<Self, ShapeError> {
        for (index, (name, _)) in entries.iter().enumerate() {
            if entries[..index].iter().any(|(seen, _)| seen == name) {
                return Err(ShapeError::Duplicate(name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.entries.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn same_names(&self, other: &Fields) -> bool {
        self.len() == other.len() && self.names().all(|name| other.contains(name))
    }

    fn describe(&self) -> String {
        let joined = self
            .entries
            .iter()
            .map(|(name, ty)| format!("{name}: {}", ty.describe()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{joined}}}")
    }
}

/// Refinement predicate of a `cond` type. Compared by identity only.
#[derive(Clone)]
pub struct Predicate(Rc<PredicateKind>);

enum PredicateKind {
    /// Written in the checked program; cannot run during analysis.
    Opaque,
    Host(Box<dyn Fn(&JsonValue) -> bool>),
}

impl Predicate {
    pub fn opaque() -> Self {
        Self(Rc::new(PredicateKind::Opaque))
    }

    pub fn host(check: impl Fn(&JsonValue) -> bool + 'static) -> Self {
        Self(Rc::new(PredicateKind::Host(Box::new(check))))
    }

    pub fn same(&self, other: &Predicate) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Opaque predicates never vouch for a value.
    pub fn check(&self, value: &JsonValue) -> bool {
        match self.0.as_ref() {
            PredicateKind::Opaque => false,
            PredicateKind::Host(check) => check(value),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            PredicateKind::Opaque => write!(f, "Predicate::Opaque({:p})", Rc::as_ptr(&self.0)),
            PredicateKind::Host(_) => write!(f, "Predicate::Host({:p})", Rc::as_ptr(&self.0)),
        }
    }
}

pub fn is_tag_name(name: &str) -> bool {
    name.chars()
        .next()
        .map(|first| first.is_ascii_uppercase())
        .unwrap_or(false)
}

impl Type {
    pub fn function(params: Vec<Type>, returns: Type) -> Self {
        Type::Fn(FnType {
            params,
            returns: Box::new(returns),
        })
    }

    pub fn array(contains: Type) -> Self {
        Type::Array(Box::new(contains))
    }

    pub fn tuple(fields: Vec<Type>) -> Self {
        Type::Tuple(fields)
    }

    pub fn structure(fields: Vec<(String, Type)>) -> Result<Self, ShapeError> {
        Fields::new(fields).map(Type::Struct)
    }

    pub fn variant(options: Vec<(String, Type)>) -> Result<Self, ShapeError> {
        if let Some((tag, _)) = options.iter().find(|(tag, _)| !is_tag_name(tag)) {
            return Err(ShapeError::TagName(tag.clone()));
        }
        Fields::new(options).map(Type::Variant)
    }

    pub fn cond(base: Type, predicate: Predicate) -> Self {
        Type::Cond(CondType {
            base: Box::new(base),
            predicate,
        })
    }

    pub fn type_value(denoted: Type) -> Self {
        Type::Type(Box::new(denoted))
    }

    /// Result type of `T.conform(v)`: `variant({Some: T, None: Null})`.
    pub fn conform_result(&self) -> Type {
        Type::Variant(Fields {
            entries: vec![
                (SOME_TAG.to_string(), self.clone()),
                (NONE_TAG.to_string(), Type::Null),
            ],
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_type_value(&self) -> bool {
        matches!(self, Type::Type(_))
    }

    /// Short name of the structural kind, as used by type-method dispatch.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::Unknown => "unknown",
            Type::Null => "null",
            Type::Bool => "bool",
            Type::Num => "num",
            Type::Str => "str",
            Type::Fn(_) => "fn",
            Type::Array(_) => "array",
            Type::Tuple(_) => "tuple",
            Type::Struct(_) => "struct",
            Type::Variant(_) => "variant",
            Type::Cond(_) => "cond",
            Type::Type(_) => "type",
            Type::Deferred => "deferred",
            Type::Error => "error",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Type::Unknown => "Unknown".to_string(),
            Type::Null => "Null".to_string(),
            Type::Bool => "Bool".to_string(),
            Type::Num => "Num".to_string(),
            Type::Str => "Str".to_string(),
            Type::Fn(function) => {
                let params = function
                    .params
                    .iter()
                    .map(|param| param.describe())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fn([{params}], {})", function.returns.describe())
            }
            Type::Array(contains) => format!("array({})", contains.describe()),
            Type::Tuple(fields) => {
                let joined = fields
                    .iter()
                    .map(|field| field.describe())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("tuple({joined})")
            }
            Type::Struct(fields) => format!("struct({})", fields.describe()),
            Type::Variant(options) => format!("variant({})", options.describe()),
            Type::Cond(cond) => format!("cond({})", cond.base.describe()),
            Type::Type(_) => "Type".to_string(),
            Type::Deferred => "Deferred".to_string(),
            Type::Error => "Error".to_string(),
        }
    }

    /// Exact structural equality.
    ///
    /// Field order is irrelevant. `cond` types are equal only to themselves.
    /// `Deferred` and `Error` are never equal to anything; callers short-circuit
    /// `Error` before comparing.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => false,
            (Type::Deferred, _) | (_, Type::Deferred) => false,
            (Type::Unknown, Type::Unknown)
            | (Type::Null, Type::Null)
            | (Type::Bool, Type::Bool)
            | (Type::Num, Type::Num)
            | (Type::Str, Type::Str) => true,
            (Type::Fn(left), Type::Fn(right)) => {
                left.params.len() == right.params.len()
                    && left
                        .params
                        .iter()
                        .zip(&right.params)
                        .all(|(a, b)| a.equals(b))
                    && left.returns.equals(&right.returns)
            }
            (Type::Array(left), Type::Array(right)) => left.equals(right),
            (Type::Tuple(left), Type::Tuple(right)) => {
                left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.equals(b))
            }
            (Type::Struct(left), Type::Struct(right))
            | (Type::Variant(left), Type::Variant(right)) => {
                left.same_names(right)
                    && left.iter().all(|(name, ty)| {
                        right
                            .get(name)
                            .map(|other| ty.equals(other))
                            .unwrap_or(false)
                    })
            }
            (Type::Cond(left), Type::Cond(right)) => left.predicate.same(&right.predicate),
            (Type::Type(_), Type::Type(_)) => true,
            _ => false,
        }
    }

    /// Structural subtyping: `self` can stand where `other` is expected.
    ///
    /// Structs use width and depth subtyping, arrays and tuples are covariant,
    /// variants may not add options, functions are contravariant in their
    /// parameters and covariant in their return type.
    pub fn sub(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => false,
            (_, Type::Unknown) => true,
            (Type::Deferred, _) | (_, Type::Deferred) => false,
            (Type::Null, Type::Null)
            | (Type::Bool, Type::Bool)
            | (Type::Num, Type::Num)
            | (Type::Str, Type::Str) => true,
            (Type::Fn(narrow), Type::Fn(wide)) => {
                narrow.params.len() == wide.params.len()
                    && wide
                        .params
                        .iter()
                        .zip(&narrow.params)
                        .all(|(expected, accepted)| expected.sub(accepted))
                    && narrow.returns.sub(&wide.returns)
            }
            (Type::Array(narrow), Type::Array(wide)) => narrow.sub(wide),
            (Type::Tuple(narrow), Type::Tuple(wide)) => {
                narrow.len() == wide.len() && narrow.iter().zip(wide).all(|(a, b)| a.sub(b))
            }
            (Type::Struct(narrow), Type::Struct(wide)) => wide.iter().all(|(name, wide_ty)| {
                narrow
                    .get(name)
                    .map(|narrow_ty| narrow_ty.sub(wide_ty))
                    .unwrap_or(false)
            }),
            (Type::Variant(narrow), Type::Variant(wide)) => {
                narrow.iter().all(|(tag, narrow_ty)| {
                    wide.get(tag)
                        .map(|wide_ty| narrow_ty.sub(wide_ty))
                        .unwrap_or(false)
                })
            }
            (Type::Cond(narrow), Type::Cond(wide)) => narrow.predicate.same(&wide.predicate),
            (Type::Cond(narrow), wide) => narrow.base.sub(wide),
            (Type::Type(_), Type::Type(_)) => true,
            _ => false,
        }
    }

    /// Runtime instance check against the host value model.
    ///
    /// Variant instances are one-key objects `{Tag: payload}`. Function and
    /// type values have no JSON form and are never valid.
    pub fn valid(&self, value: &JsonValue) -> bool {
        match self {
            Type::Unknown => true,
            Type::Null => value.is_null(),
            Type::Bool => value.is_boolean(),
            Type::Num => value.is_number(),
            Type::Str => value.is_string(),
            Type::Fn(_) | Type::Type(_) | Type::Deferred | Type::Error => false,
            Type::Array(contains) => value
                .as_array()
                .map(|items| items.iter().all(|item| contains.valid(item)))
                .unwrap_or(false),
            Type::Tuple(fields) => value
                .as_array()
                .map(|items| {
                    items.len() == fields.len()
                        && fields.iter().zip(items).all(|(ty, item)| ty.valid(item))
                })
                .unwrap_or(false),
            Type::Struct(fields) => value
                .as_object()
                .map(|object| {
                    object.len() == fields.len()
                        && fields.iter().all(|(name, ty)| {
                            object.get(name).map(|item| ty.valid(item)).unwrap_or(false)
                        })
                })
                .unwrap_or(false),
            Type::Variant(options) => match single_entry(value) {
                Some((tag, payload)) => options
                    .get(tag)
                    .map(|ty| ty.valid(payload))
                    .unwrap_or(false),
                None => false,
            },
            Type::Cond(cond) => cond.base.valid(value) && cond.predicate.check(value),
        }
    }

    /// Runtime side of `conform`: wraps `value` as `{Some: value}` when valid,
    /// `{None: null}` otherwise.
    pub fn conform_value(&self, value: &JsonValue) -> JsonValue {
        let mut wrapped = JsonMap::new();
        if self.valid(value) {
            wrapped.insert(SOME_TAG.to_string(), value.clone());
        } else {
            wrapped.insert(NONE_TAG.to_string(), JsonValue::Null);
        }
        JsonValue::Object(wrapped)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn single_entry(value: &JsonValue) -> Option<(&str, &JsonValue)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object
        .iter()
        .next()
        .map(|(tag, payload)| (tag.as_str(), payload))
}

/// Picks the match handler for a variant instance: the handler named by the
/// instance's sole key, else the wildcard.
pub fn select_handler<'a, H>(value: &JsonValue, handlers: &'a [(String, H)]) -> Option<&'a H> {
    let by_tag = single_entry(value).and_then(|(tag, _)| {
        handlers
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, handler)| handler)
    });
    by_tag.or_else(|| {
        handlers
            .iter()
            .find(|(name, _)| name == WILDCARD_TAG)
            .map(|(_, handler)| handler)
    })
}
