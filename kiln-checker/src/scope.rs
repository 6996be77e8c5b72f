use std::collections::{HashMap, HashSet};

use crate::ast::SourceSpan;
use crate::errors::CheckError;
use crate::types::Type;

/// Names bound as type-values beneath every file.
const PRELUDE: [&str; 5] = ["Num", "Str", "Bool", "Null", "Unknown"];

#[derive(Debug, Clone)]
pub enum ReturnContract {
    /// Set by the first `return`; later returns must match it exactly.
    Inferred(Option<Type>),
    /// Every `return` must be a subtype of this.
    Expected(Type),
}

#[derive(Debug, Clone)]
pub enum ReturnCheck {
    Accepted,
    Mismatch { expected: Type, received: Type },
    OutsideFunction,
}

#[derive(Debug, Clone)]
pub struct FunctionOutcome {
    pub contract: ReturnContract,
    pub saw_return: bool,
}

impl FunctionOutcome {
    pub fn return_type(&self) -> Option<&Type> {
        match &self.contract {
            ReturnContract::Inferred(inferred) => inferred.as_ref(),
            ReturnContract::Expected(expected) => Some(expected),
        }
    }
}

#[derive(Debug, Clone)]
struct FunctionFrame {
    contract: ReturnContract,
    is_async: bool,
    saw_return: bool,
}

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Type>,
    constants: HashSet<String>,
    function: Option<FunctionFrame>,
}

/// Lexical environment for one file, kept as a stack of scopes.
///
/// The bottom scope is the prelude, the one above it the file scope. Both
/// outlive every push/pop pair issued by the checker.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut prelude = Scope::default();
        for name in PRELUDE {
            let denoted = match name {
                "Num" => Type::Num,
                "Str" => Type::Str,
                "Bool" => Type::Bool,
                "Null" => Type::Null,
                _ => Type::Unknown,
            };
            prelude
                .values
                .insert(name.to_string(), Type::type_value(denoted));
            prelude.constants.insert(name.to_string());
        }
        Self {
            scopes: vec![prelude, Scope::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_block(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn push_function(&mut self, contract: ReturnContract, is_async: bool) {
        self.scopes.push(Scope {
            function: Some(FunctionFrame {
                contract,
                is_async,
                saw_return: false,
            }),
            ..Scope::default()
        });
    }

    /// Leaves the innermost scope, returning its return-type outcome when it
    /// was a function scope.
    pub fn pop(&mut self) -> Option<FunctionOutcome> {
        if self.scopes.len() <= 2 {
            return None;
        }
        let scope = self.scopes.pop()?;
        scope.function.map(|frame| FunctionOutcome {
            contract: frame.contract,
            saw_return: frame.saw_return,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.values.get(name).cloned())
    }

    pub fn is_const(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.values.contains_key(name))
            .map(|scope| scope.constants.contains(name))
            .unwrap_or(false)
    }

    pub fn declared_here(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|scope| scope.values.contains_key(name))
            .unwrap_or(false)
    }

    /// Binds `name` in the innermost scope. Rebinding within the same scope
    /// aborts the file; shadowing an outer binding is fine.
    pub fn set(&mut self, name: &str, ty: Type, span: SourceSpan) -> Result<(), CheckError> {
        self.declare(name, ty, false, span)
    }

    pub fn set_const(&mut self, name: &str, ty: Type, span: SourceSpan) -> Result<(), CheckError> {
        self.declare(name, ty, true, span)
    }

    fn declare(
        &mut self,
        name: &str,
        ty: Type,
        constant: bool,
        span: SourceSpan,
    ) -> Result<(), CheckError> {
        if self.declared_here(name) {
            return Err(CheckError::Redeclared {
                name: name.to_string(),
                span,
            });
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.to_string(), ty);
            if constant {
                scope.constants.insert(name.to_string());
            }
        }
        Ok(())
    }

    pub fn in_function(&self) -> bool {
        self.innermost_function().is_some()
    }

    pub fn in_async_function(&self) -> bool {
        self.innermost_function()
            .map(|frame| frame.is_async)
            .unwrap_or(false)
    }

    /// Return contract of the innermost function, if any.
    pub fn return_contract(&self) -> Option<&ReturnContract> {
        self.innermost_function().map(|frame| &frame.contract)
    }

    /// Checks a `return` value against the innermost function's contract.
    ///
    /// The error sentinel is absorbed: it neither sets nor violates the
    /// contract.
    pub fn record_return(&mut self, ty: &Type) -> ReturnCheck {
        let Some(frame) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.function.as_mut())
        else {
            return ReturnCheck::OutsideFunction;
        };
        frame.saw_return = true;
        if ty.is_error() {
            return ReturnCheck::Accepted;
        }
        match &mut frame.contract {
            ReturnContract::Inferred(inferred @ None) => {
                *inferred = Some(ty.clone());
                ReturnCheck::Accepted
            }
            ReturnContract::Inferred(Some(existing)) => {
                if matches!(ty, Type::Unknown) || existing.equals(ty) {
                    ReturnCheck::Accepted
                } else if matches!(existing, Type::Unknown) {
                    *existing = ty.clone();
                    ReturnCheck::Accepted
                } else {
                    ReturnCheck::Mismatch {
                        expected: existing.clone(),
                        received: ty.clone(),
                    }
                }
            }
            ReturnContract::Expected(expected) => {
                if ty.sub(expected) {
                    ReturnCheck::Accepted
                } else {
                    ReturnCheck::Mismatch {
                        expected: expected.clone(),
                        received: ty.clone(),
                    }
                }
            }
        }
    }

    fn innermost_function(&self) -> Option<&FunctionFrame> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.function.as_ref())
    }
}
