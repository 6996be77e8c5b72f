use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kiln_support::module_error;

use crate::ast::Module;

/// Parses one lowered JSON document.
pub fn parse_module(source: &str) -> serde_json::Result<Module> {
    serde_json::from_str(source)
}

pub fn load_module(path: &Path) -> Result<Module> {
    let contents = fs::read_to_string(path)
        .with_context(|| module_error("read", path, "file could not be read"))?;
    parse_module(&contents).with_context(|| module_error("parse", path, "invalid lowered tree"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExpressionKind, LiteralValue, Statement};

    #[test]
    fn parses_estree_shaped_documents() {
        let module = parse_module(
            r#"{
              "directives": ["use kiln"],
              "body": [
                {
                  "type": "VariableDeclaration",
                  "kind": "const",
                  "declarations": [{
                    "id": { "type": "Identifier", "name": "count" },
                    "init": {
                      "type": "Literal",
                      "value": 3,
                      "span": { "line": 1, "column": 15, "end_line": 1, "end_column": 15 }
                    }
                  }]
                }
              ]
            }"#,
        )
        .unwrap();
        assert!(module.is_analyzable());
        let Statement::Variable(declaration) = &module.body[0] else {
            panic!("expected a variable declaration");
        };
        let init = declaration.declarations[0].init.as_ref().unwrap();
        assert_eq!(init.span.column, 15);
        let ExpressionKind::Literal(literal) = &init.kind else {
            panic!("expected a literal initializer");
        };
        assert!(matches!(literal.value, LiteralValue::Number(value) if value == 3.0));
    }

    #[test]
    fn documents_without_directive_are_not_analyzable() {
        let module = parse_module(r#"{ "body": [] }"#).unwrap();
        assert!(!module.is_analyzable());
    }

    #[test]
    fn arrow_bodies_may_be_blocks_or_expressions() {
        let module = parse_module(
            r#"{
              "directives": ["use kiln"],
              "body": [
                { "type": "ExpressionStatement", "expression": {
                    "type": "FunctionExpression", "arrow": true, "params": [],
                    "body": { "type": "Literal", "value": null } } },
                { "type": "ExpressionStatement", "expression": {
                    "type": "FunctionExpression", "params": [],
                    "body": { "type": "BlockStatement", "body": [] } } }
              ]
            }"#,
        )
        .unwrap();
        assert_eq!(module.body.len(), 2);
    }
}
