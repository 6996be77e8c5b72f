use kiln_checker::dsl::{array_type, fn_type, struct_type, tuple_type, variant_type};
use kiln_checker::{select_handler, Predicate, ShapeError, Type};
use serde_json::json;

fn point() -> Type {
    struct_type(vec![("x", Type::Num), ("y", Type::Num)])
}

#[test]
fn struct_equality_ignores_field_order() {
    let reordered = struct_type(vec![("y", Type::Num), ("x", Type::Num)]);
    assert!(point().equals(&reordered));
    assert!(!point().equals(&struct_type(vec![("x", Type::Num)])));
}

#[test]
fn equality_and_subtyping_are_distinct() {
    let wide = struct_type(vec![("x", Type::Num)]);
    assert!(point().sub(&wide), "extra fields are allowed by sub");
    assert!(!point().equals(&wide), "but not by eq");
    assert!(!wide.sub(&point()));
}

#[test]
fn struct_subtyping_is_deep() {
    let outer = |inner: Type| struct_type(vec![("inner", inner)]);
    assert!(outer(point()).sub(&outer(struct_type(vec![("x", Type::Num)]))));
    assert!(!outer(struct_type(vec![("x", Type::Str)])).sub(&outer(point())));
}

#[test]
fn everything_is_a_subtype_of_unknown() {
    for ty in [
        Type::Num,
        Type::Null,
        point(),
        array_type(Type::Str),
        fn_type(vec![Type::Num], Type::Bool),
    ] {
        assert!(ty.sub(&Type::Unknown), "{ty} should be a subtype of Unknown");
    }
    assert!(!Type::Unknown.sub(&Type::Num));
}

#[test]
fn function_parameters_are_contravariant() {
    let takes_wide = fn_type(vec![struct_type(vec![("x", Type::Num)])], Type::Num);
    let takes_point = fn_type(vec![point()], Type::Num);
    assert!(takes_wide.sub(&takes_point));
    assert!(!takes_point.sub(&takes_wide));
}

#[test]
fn function_returns_are_covariant() {
    let returns_point = fn_type(vec![], point());
    let returns_wide = fn_type(vec![], struct_type(vec![("x", Type::Num)]));
    assert!(returns_point.sub(&returns_wide));
    assert!(!returns_wide.sub(&returns_point));
    assert!(!fn_type(vec![Type::Num], Type::Num).sub(&fn_type(vec![], Type::Num)));
}

#[test]
fn variants_may_drop_but_not_add_options() {
    let small = variant_type(vec![("Ok", Type::Num)]);
    let large = variant_type(vec![("Ok", Type::Num), ("Err", Type::Str)]);
    assert!(small.sub(&large));
    assert!(!large.sub(&small));
}

#[test]
fn tuples_compare_positionally() {
    let pair = tuple_type(vec![Type::Num, Type::Str]);
    assert!(pair.equals(&tuple_type(vec![Type::Num, Type::Str])));
    assert!(!pair.equals(&tuple_type(vec![Type::Str, Type::Num])));
    assert!(!pair.sub(&tuple_type(vec![Type::Num])));
}

#[test]
fn cond_types_compare_by_predicate_identity() {
    let positive = Predicate::host(|value| value.as_f64().map(|n| n > 0.0).unwrap_or(false));
    let first = Type::cond(Type::Num, positive.clone());
    let same = Type::cond(Type::Num, positive);
    let other = Type::cond(Type::Num, Predicate::host(|_| true));
    assert!(first.equals(&same));
    assert!(!first.equals(&other));
    assert!(first.sub(&Type::Num), "a refinement is a subtype of its base");
    assert!(!Type::Num.sub(&first));
}

#[test]
fn sentinels_never_compare() {
    assert!(!Type::Error.equals(&Type::Error));
    assert!(!Type::Error.sub(&Type::Unknown));
    assert!(!Type::Deferred.equals(&Type::Deferred));
    assert!(!Type::Deferred.sub(&Type::Num));
}

#[test]
fn shapes_reject_duplicates_and_bad_tags() {
    assert_eq!(
        Type::structure(vec![("a".into(), Type::Num), ("a".into(), Type::Str)]).unwrap_err(),
        ShapeError::Duplicate("a".to_string())
    );
    assert_eq!(
        Type::variant(vec![("some".into(), Type::Num)]).unwrap_err(),
        ShapeError::TagName("some".to_string())
    );
}

#[test]
fn valid_checks_runtime_values() {
    assert!(point().valid(&json!({"x": 1, "y": 2})));
    assert!(!point().valid(&json!({"x": 1})));
    assert!(!point().valid(&json!({"x": 1, "y": 2, "z": 3})));
    assert!(!point().valid(&json!({"x": "1", "y": 2})));

    let pair = tuple_type(vec![Type::Num, Type::Str]);
    assert!(pair.valid(&json!([1, "a"])));
    assert!(!pair.valid(&json!([1, "a", 2])));

    let result = variant_type(vec![("Ok", Type::Num), ("Err", Type::Str)]);
    assert!(result.valid(&json!({"Ok": 3})));
    assert!(!result.valid(&json!({"Ok": "3"})));
    assert!(!result.valid(&json!({"Ok": 3, "Err": "x"})));
    assert!(!fn_type(vec![], Type::Num).valid(&json!(null)));
}

#[test]
fn cond_validity_runs_host_predicates() {
    let positive = Type::cond(
        Type::Num,
        Predicate::host(|value| value.as_f64().map(|n| n > 0.0).unwrap_or(false)),
    );
    assert!(positive.valid(&json!(4)));
    assert!(!positive.valid(&json!(-4)));
    assert!(!positive.valid(&json!("4")));
    assert!(!Type::cond(Type::Num, Predicate::opaque()).valid(&json!(4)));
}

#[test]
fn conform_wraps_values_in_an_option() {
    assert_eq!(point().conform_value(&json!({"x": 1, "y": 2})), json!({"Some": {"x": 1, "y": 2}}));
    assert_eq!(point().conform_value(&json!(7)), json!({"None": null}));
    let expected = variant_type(vec![("Some", point()), ("None", Type::Null)]);
    assert!(point().conform_result().equals(&expected));
}

#[test]
fn handlers_are_selected_by_tag_then_wildcard() {
    let handlers = vec![
        ("Ok".to_string(), "ok"),
        ("_".to_string(), "fallback"),
    ];
    assert_eq!(select_handler(&json!({"Ok": 1}), &handlers), Some(&"ok"));
    assert_eq!(select_handler(&json!({"Err": 1}), &handlers), Some(&"fallback"));
    assert_eq!(select_handler(&json!({"Err": 1}), &handlers[..1]), None);
}

#[test]
fn types_render_readably() {
    assert_eq!(point().to_string(), "struct({x: Num, y: Num})");
    assert_eq!(
        fn_type(vec![Type::Num], array_type(Type::Str)).to_string(),
        "fn([Num], array(Str))"
    );
    assert_eq!(Type::type_value(Type::Num).to_string(), "Type");
}
