use std::path::Path;

use kiln_checker::dsl::*;
use kiln_checker::{
    check_file, parse_module, BinaryOperator, CheckError, CheckOptions, DiagnosticCode,
    FileResolver, ModuleReport, Statement, TypeChecker, Type,
};

fn check(body: Vec<Statement>) -> ModuleReport {
    let mut resolver = FileResolver::new();
    check_file(
        &module(body),
        Path::new("statements.json"),
        &mut resolver,
        CheckOptions::default(),
    )
    .expect("file should be checked")
}

fn codes(report: &ModuleReport) -> Vec<DiagnosticCode> {
    report.own_diagnostics().iter().map(|d| d.code).collect()
}

#[test]
fn blocks_introduce_scopes() {
    let report = check(vec![
        let_("outer", num(1.0)),
        block(vec![let_("outer", text("shadow")), let_("inner", num(2.0))]),
        expr_stmt(ident("inner")),
        expr_stmt(assign(ident("outer"), num(3.0))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::UndefinedVariable]);
}

#[test]
fn function_declarations_are_not_hoisted() {
    let report = check(vec![
        function("first", &[], vec![ret(call(ident("second"), vec![]))]),
        function("second", &[], vec![ret(num(1.0))]),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::UndefinedVariable]);
}

#[test]
fn functions_can_call_themselves() {
    let report = check(vec![
        function(
            "fact",
            &["n"],
            vec![
                if_(
                    binary(ident("n"), BinaryOperator::Less, num(1.0)),
                    vec![ret(num(1.0))],
                    None,
                ),
                ret(binary(
                    ident("n"),
                    BinaryOperator::Multiply,
                    call(
                        ident("fact"),
                        vec![binary(ident("n"), BinaryOperator::Subtract, num(1.0))],
                    ),
                )),
            ],
        ),
        function("spin", &["n"], vec![ret(call(ident("spin"), vec![ident("n")]))]),
        let_("six", call(ident("fact"), vec![num(3.0)])),
        expr_stmt(assign(ident("six"), text("six"))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::AssignmentTypeMismatch]);
}

#[test]
fn functions_cannot_reassign_themselves() {
    let report = check(vec![function(
        "once",
        &[],
        vec![expr_stmt(assign(ident("once"), num(1.0))), ret(num(1.0))],
    )]);
    assert_eq!(codes(&report), vec![DiagnosticCode::Forbidden]);
}

#[test]
fn functions_must_return_a_value() {
    let report = check(vec![
        function("nothing", &[], vec![]),
        function("bare", &[], vec![ret_empty()]),
    ]);
    assert_eq!(
        codes(&report),
        vec![DiagnosticCode::MissingExpected, DiagnosticCode::MissingExpected]
    );
}

#[test]
fn return_outside_function_is_rejected() {
    let report = check(vec![ret(num(1.0))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::NotAllowedHere]);
}

#[test]
fn inferred_return_type_flows_to_callers() {
    let report = check(vec![
        const_("answer", arrow(&[], num(42.0))),
        let_("value", call(ident("answer"), vec![])),
        expr_stmt(assign(ident("value"), text("forty-two"))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::AssignmentTypeMismatch]);
}

#[test]
fn returns_must_agree_within_a_function() {
    let report = check(vec![function(
        "pick",
        &["flag"],
        vec![
            if_(ident("flag"), vec![ret(num(1.0))], None),
            ret(text("one")),
        ],
    )]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ReturnTypeMismatch]);
}

#[test]
fn for_loop_bindings_stay_in_the_loop() {
    let report = check(vec![
        for_(
            "i",
            num(0.0),
            binary(ident("i"), BinaryOperator::Less, num(3.0)),
            assign(ident("i"), binary(ident("i"), BinaryOperator::Add, num(1.0))),
            vec![expr_stmt(ident("i"))],
        ),
        expr_stmt(ident("i")),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::UndefinedVariable]);
}

#[test]
fn loop_conditions_must_be_boolean() {
    let report = check(vec![
        while_(boolean(true), vec![]),
        while_(text("forever"), vec![]),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ConditionTypeMismatch]);
}

#[test]
fn switch_cases_are_checked() {
    let report = check(vec![switch_(
        num(1.0),
        vec![
            (Some(num(1.0)), vec![let_("hit", num(1.0))]),
            (None, vec![expr_stmt(ident("unknown_case"))]),
        ],
    )]);
    assert_eq!(codes(&report), vec![DiagnosticCode::UndefinedVariable]);
}

#[test]
fn catch_parameter_is_unknown() {
    let report = check(vec![try_(
        vec![let_("risky", num(1.0))],
        Some("error"),
        vec![expr_stmt(member(ident("error"), "message"))],
    )]);
    assert!(report.is_clean(), "{:?}", report.own_diagnostics());
}

#[test]
fn check_expression_exposes_the_type() {
    let mut resolver = FileResolver::new();
    let mut checker = TypeChecker::new("inline.json", &mut resolver, CheckOptions::default());
    checker
        .check_statement(&const_("base", num(2.0)))
        .unwrap();
    let typed = checker
        .check_expression(&binary(ident("base"), BinaryOperator::Multiply, num(3.0)))
        .unwrap();
    assert_eq!(typed, Ok(Type::Num));
    let failed = checker.check_expression(&ident("nowhere")).unwrap();
    assert!(failed.is_err());
    assert_eq!(checker.diagnostics().len(), 1);
    assert_eq!(checker.lookup("Num"), Some(Type::type_value(Type::Num)));
}

#[test]
fn destructuring_parameters_abort_the_file() {
    let module = parse_module(
        r#"{
          "directives": ["use kiln"],
          "body": [{
            "type": "ExpressionStatement",
            "expression": {
              "type": "FunctionExpression",
              "arrow": true,
              "params": [{ "type": "ObjectPattern", "span": { "line": 1, "column": 2, "end_line": 1, "end_column": 8 } }],
              "body": { "type": "Literal", "value": 1 }
            }
          }]
        }"#,
    )
    .unwrap();
    let mut resolver = FileResolver::new();
    let error = check_file(
        &module,
        Path::new("patterns.json"),
        &mut resolver,
        CheckOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, CheckError::UnsupportedPattern { .. }));
    assert_eq!(error.span().map(|span| span.column), Some(2));
}

#[test]
fn checks_a_parsed_document_end_to_end() {
    let module = parse_module(
        r#"{
          "directives": ["use kiln"],
          "body": [
            {
              "type": "VariableDeclaration",
              "kind": "let",
              "declarations": [{
                "id": { "type": "Identifier", "name": "total" },
                "init": { "type": "Literal", "value": 0 }
              }]
            },
            {
              "type": "ExpressionStatement",
              "expression": {
                "type": "AssignmentExpression",
                "operator": "+=",
                "left": { "type": "Identifier", "name": "total" },
                "right": { "type": "Literal", "value": "x" },
                "span": { "line": 2, "column": 1, "end_line": 2, "end_column": 11 }
              }
            }
          ]
        }"#,
    )
    .unwrap();
    let mut resolver = FileResolver::new();
    let report = check_file(
        &module,
        Path::new("parsed.json"),
        &mut resolver,
        CheckOptions::default(),
    )
    .unwrap();
    let diagnostic = &report.own_diagnostics()[0];
    assert_eq!(diagnostic.code, DiagnosticCode::BinaryTypeMismatch);
    assert_eq!(diagnostic.span.line, 2);
}
