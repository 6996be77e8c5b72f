use std::path::Path;

use kiln_checker::dsl::*;
use kiln_checker::{
    check_file, BinaryOperator, CheckError, CheckOptions, DeclarationKind, DiagnosticCode,
    DiagnosticMetadata, FileResolver, Identifier, LogicalOperator, ModuleReport, Pattern,
    SourceSpan, Statement, Type, TypeChecker, VariableDeclaration, VariableDeclarator,
};

fn check_with(body: Vec<Statement>, options: CheckOptions) -> Result<ModuleReport, CheckError> {
    let mut resolver = FileResolver::new();
    check_file(&module(body), Path::new("main.json"), &mut resolver, options)
}

fn check(body: Vec<Statement>) -> ModuleReport {
    check_with(body, CheckOptions::default()).expect("file should be checked")
}

fn codes(report: &ModuleReport) -> Vec<DiagnosticCode> {
    report.own_diagnostics().iter().map(|d| d.code).collect()
}

fn point_type() -> Statement {
    const_(
        "Point",
        call(ident("struct"), vec![object(vec![("x", ident("Num"))])]),
    )
}

fn point_value() -> Statement {
    const_(
        "p",
        method(ident("Point"), "from", vec![object(vec![("x", num(1.0))])]),
    )
}

#[test]
fn accepts_well_typed_program() {
    let report = check(vec![
        point_type(),
        point_value(),
        let_("total", binary(member(ident("p"), "x"), BinaryOperator::Add, num(2.0))),
        expr_stmt(assign(ident("total"), num(5.0))),
        let_("label", template(vec![ident("total")])),
    ]);
    assert!(
        report.is_clean(),
        "expected no diagnostics, found {:?}",
        report.own_diagnostics()
    );
}

#[test]
fn rejects_reassignment_with_other_type() {
    let report = check(vec![
        let_("count", num(1.0)),
        expr_stmt(assign(ident("count"), text("one"))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::AssignmentTypeMismatch]);
}

#[test]
fn rejects_assignment_to_constant() {
    let report = check(vec![
        const_("limit", num(1.0)),
        expr_stmt(assign(ident("limit"), num(2.0))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::Forbidden]);
}

#[test]
fn reports_undefined_variable_at_its_position() {
    let report = check(vec![expr_stmt(at(ident("missing"), 3, 5))]);
    let diagnostic = &report.own_diagnostics()[0];
    assert_eq!(diagnostic.code, DiagnosticCode::UndefinedVariable);
    assert_eq!(diagnostic.span, SourceSpan::single_point(3, 5));
    assert_eq!(diagnostic.metadata, DiagnosticMetadata::name("missing"));
    assert!(
        diagnostic.message().contains("'missing'"),
        "unexpected message {}",
        diagnostic.message()
    );
}

#[test]
fn failed_expressions_do_not_cascade() {
    let report = check(vec![
        let_("broken", ident("nowhere")),
        expr_stmt(binary(ident("broken"), BinaryOperator::Add, num(1.0))),
        expr_stmt(member(ident("broken"), "field")),
        expr_stmt(call(ident("broken"), vec![num(1.0)])),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::UndefinedVariable]);
}

#[test]
fn rejects_mixed_addition() {
    let report = check(vec![expr_stmt(binary(num(1.0), BinaryOperator::Add, text("a")))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::BinaryTypeMismatch]);
}

#[test]
fn rejects_non_numeric_comparison() {
    let report = check(vec![expr_stmt(binary(num(1.0), BinaryOperator::Less, text("a")))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::OperatorTypeMismatch]);
}

#[test]
fn rejects_non_boolean_condition() {
    let report = check(vec![if_(num(1.0), vec![], None)]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ConditionTypeMismatch]);
}

#[test]
fn rejects_ternary_with_differing_branches() {
    let report = check(vec![expr_stmt(conditional(
        boolean(true),
        num(1.0),
        text("a"),
    ))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::TernaryTypeMismatch]);
}

#[test]
fn rejects_heterogeneous_arrays() {
    let report = check(vec![expr_stmt(array(vec![num(1.0), text("a")]))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ContainedTypeMismatch]);
}

#[test]
fn rejects_nullish_coalescing() {
    let report = check(vec![expr_stmt(logical(
        null(),
        LogicalOperator::NullishCoalesce,
        num(1.0),
    ))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::Forbidden]);
}

#[test]
fn struct_fields_keep_their_types() {
    let report = check(vec![
        point_type(),
        point_value(),
        expr_stmt(assign(member(ident("p"), "x"), text("far"))),
        expr_stmt(member(ident("p"), "y")),
    ]);
    assert_eq!(
        codes(&report),
        vec![DiagnosticCode::KeyTypeMismatch, DiagnosticCode::InvalidField]
    );
}

#[test]
fn from_reports_the_offending_field() {
    let report = check(vec![
        point_type(),
        expr_stmt(method(
            ident("Point"),
            "from",
            vec![object(vec![("x", text("one"))])],
        )),
    ]);
    assert_eq!(
        report.own_diagnostics()[0].metadata,
        DiagnosticMetadata::Shape {
            path: "x".to_string(),
            expected: "Num".to_string(),
            received: "Str".to_string(),
        }
    );
}

#[test]
fn from_reports_missing_fields() {
    let report = check(vec![
        point_type(),
        expr_stmt(method(ident("Point"), "from", vec![object(vec![])])),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::FromTypeMismatch]);
}

#[test]
fn tuples_are_indexed_by_literal_positions() {
    let mut resolver = FileResolver::new();
    let mut checker = TypeChecker::new("main.json", &mut resolver, CheckOptions::default());
    for statement in [
        const_("Pair", call(ident("tuple"), vec![ident("Num"), ident("Str")])),
        const_(
            "pair",
            method(ident("Pair"), "from", vec![array(vec![num(1.0), text("one")])]),
        ),
        let_("position", num(0.0)),
    ] {
        checker.check_statement(&statement).unwrap();
    }

    let first = checker.check_expression(&index(ident("pair"), num(0.0))).unwrap();
    let second = checker.check_expression(&index(ident("pair"), num(1.0))).unwrap();
    assert_eq!(first, Ok(Type::Num));
    assert_eq!(second, Ok(Type::Str));
    assert!(checker.diagnostics().is_empty());

    let past_end = checker.check_expression(&index(ident("pair"), num(2.0))).unwrap();
    let computed = checker
        .check_expression(&index(ident("pair"), ident("position")))
        .unwrap();
    assert!(past_end.is_err());
    assert!(computed.is_err());
    let codes: Vec<_> = checker.diagnostics().entries().iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::InvalidField, DiagnosticCode::IndexTypeMismatch]
    );
}

#[test]
fn rejects_non_numeric_index() {
    let report = check(vec![
        const_("items", array(vec![num(1.0), num(2.0)])),
        expr_stmt(index(ident("items"), text("first"))),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::IndexTypeMismatch]);
}

#[test]
fn typed_functions_check_their_arguments() {
    let report = check(vec![
        const_(
            "double",
            method(
                call(ident("fn"), vec![array(vec![ident("Num")]), ident("Num")]),
                "from",
                vec![arrow(&["n"], binary(ident("n"), BinaryOperator::Multiply, num(2.0)))],
            ),
        ),
        expr_stmt(call(ident("double"), vec![num(2.0)])),
        expr_stmt(call(ident("double"), vec![text("2")])),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ArgTypeMismatch]);
}

#[test]
fn implementation_must_honor_declared_return() {
    let report = check(vec![const_(
        "stringify",
        method(
            call(ident("fn"), vec![array(vec![ident("Num")]), ident("Str")]),
            "from",
            vec![arrow(&["n"], ident("n"))],
        ),
    )]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ReturnTypeMismatch]);
}

#[test]
fn wrong_call_arity_aborts_the_file() {
    let error = check_with(
        vec![
            const_("identity", arrow(&["value"], ident("value"))),
            expr_stmt(call(ident("identity"), vec![num(1.0), num(2.0)])),
        ],
        CheckOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        CheckError::CallArity {
            expected: 1,
            received: 2,
            ..
        }
    ));
}

#[test]
fn keyword_arity_aborts_the_file() {
    let error = check_with(
        vec![expr_stmt(call(ident("array"), vec![]))],
        CheckOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, CheckError::KeywordArity { ref keyword, .. } if keyword == "array"));
}

#[test]
fn redeclaration_aborts_the_file() {
    let error = check_with(
        vec![let_("value", num(1.0)), let_("value", num(2.0))],
        CheckOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, CheckError::Redeclared { ref name, .. } if name == "value"));
}

#[test]
fn declarations_require_an_initializer() {
    let declaration = Statement::Variable(VariableDeclaration {
        kind: DeclarationKind::Let,
        declarations: vec![VariableDeclarator {
            id: Pattern::Identifier(Identifier {
                name: "later".to_string(),
                span: SourceSpan::single_point(1, 5),
            }),
            init: None,
            span: SourceSpan::default(),
        }],
        span: SourceSpan::default(),
    });
    let error = check_with(vec![declaration], CheckOptions::default()).unwrap_err();
    assert!(matches!(error, CheckError::MissingInitializer { ref name, .. } if name == "later"));
    assert_eq!(error.span(), Some(SourceSpan::single_point(1, 5)));
}

#[test]
fn reserved_names_cannot_be_bound_or_read() {
    let report = check(vec![
        let_("struct", num(1.0)),
        expr_stmt(ident("variant")),
    ]);
    assert_eq!(
        codes(&report),
        vec![DiagnosticCode::NotAllowedHere, DiagnosticCode::NotAllowedHere]
    );
}

#[test]
fn type_methods_depend_on_the_kind() {
    let report = check(vec![
        expr_stmt(method(ident("Num"), "valid", vec![num(1.0)])),
        point_type(),
        expr_stmt(method(ident("Point"), "has", vec![text("x")])),
    ]);
    assert_eq!(
        codes(&report),
        vec![DiagnosticCode::InvalidTypeMethod, DiagnosticCode::Unimplemented]
    );
}

#[test]
fn type_methods_take_one_argument() {
    let report = check(vec![
        point_type(),
        expr_stmt(method(ident("Point"), "sub", vec![])),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ArgCountMismatch]);
}

#[test]
fn values_are_not_types() {
    let report = check(vec![
        const_("three", num(3.0)),
        expr_stmt(call(ident("array"), vec![ident("three")])),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::NotAType]);
}

#[test]
fn variant_tags_must_be_capitalized() {
    let report = check(vec![expr_stmt(call(
        ident("variant"),
        vec![object(vec![("lower", ident("Num"))])],
    ))]);
    assert_eq!(codes(&report), vec![DiagnosticCode::VariantTagName]);
}

#[test]
fn await_requires_async_function() {
    let report = check(vec![
        expr_stmt(await_(num(1.0))),
        const_(
            "load",
            async_arrow(&["source"], vec![ret(await_(ident("source")))]),
        ),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::AsyncMismatch]);
}

#[test]
fn cond_predicates_must_return_bool() {
    let report = check(vec![
        const_(
            "Positive",
            call(
                ident("cond"),
                vec![
                    ident("Num"),
                    arrow(&["n"], binary(ident("n"), BinaryOperator::Greater, num(0.0))),
                ],
            ),
        ),
        expr_stmt(call(
            ident("cond"),
            vec![ident("Num"), arrow(&["n"], ident("n"))],
        )),
    ]);
    assert_eq!(codes(&report), vec![DiagnosticCode::ReturnTypeMismatch]);
}

#[test]
fn unannotated_parameters_are_unknown() {
    let report = check(vec![function(
        "increment",
        &["value"],
        vec![ret(binary(ident("value"), BinaryOperator::Add, num(1.0)))],
    )]);
    assert!(report.is_clean(), "{:?}", report.own_diagnostics());
}

#[test]
fn do_while_can_be_forbidden() {
    let body = || vec![do_while(vec![], boolean(false))];
    assert!(check(body()).is_clean());
    let strict = CheckOptions {
        allow_do_while: false,
        ..CheckOptions::default()
    };
    let report = check_with(body(), strict).unwrap();
    assert_eq!(codes(&report), vec![DiagnosticCode::Forbidden]);
}
