//! Property-based tests for the structural type relations.
//!
//! Types are generated with proptest and the relations are checked against
//! the laws callers rely on: reflexivity, symmetry of equality, equality
//! implying mutual subtyping, and `valid` accepting values built from the
//! type itself.

use std::collections::BTreeMap;

use kiln_checker::dsl::{binary, num, text};
use kiln_checker::{
    BinaryOperator, CheckOptions, Expression, FileResolver, Type, TypeChecker,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn leaf_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Unknown),
        Just(Type::Null),
        Just(Type::Bool),
        Just(Type::Num),
        Just(Type::Str),
    ]
}

fn fields(map: BTreeMap<String, Type>) -> Vec<(String, Type)> {
    map.into_iter().collect()
}

/// Types that have a JSON form: no functions.
fn data_type() -> impl Strategy<Value = Type> {
    leaf_type().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::array),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Type::tuple),
            prop::collection::btree_map("[a-d]", inner.clone(), 1..4).prop_map(|map| {
                Type::structure(fields(map)).expect("generated names are unique")
            }),
            prop::collection::btree_map("[A-D]", inner, 1..4).prop_map(|map| {
                Type::variant(fields(map)).expect("generated tags are unique and capitalized")
            }),
        ]
    })
}

fn any_type() -> impl Strategy<Value = Type> {
    data_type().prop_recursive(2, 16, 3, |inner| {
        (prop::collection::vec(inner.clone(), 0..3), inner)
            .prop_map(|(params, returns)| Type::function(params, returns))
    })
}

/// Builds a value `ty` accepts.
fn sample(ty: &Type) -> Value {
    match ty {
        Type::Null | Type::Unknown => Value::Null,
        Type::Bool => json!(true),
        Type::Num => json!(1),
        Type::Str => json!("text"),
        Type::Array(contains) => json!([sample(contains)]),
        Type::Tuple(items) => Value::Array(items.iter().map(sample).collect()),
        Type::Struct(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.to_string(), sample(field)))
                .collect::<Map<_, _>>(),
        ),
        Type::Variant(options) => {
            let (tag, payload) = options.iter().next().expect("variants have an option");
            let mut object = Map::new();
            object.insert(tag.to_string(), sample(payload));
            Value::Object(object)
        }
        other => panic!("no sample for {other}"),
    }
}

fn check_expression(expression: &Expression) -> (Result<Type, kiln_checker::Reported>, usize) {
    let mut resolver = FileResolver::new();
    let mut checker = TypeChecker::new("property.json", &mut resolver, CheckOptions::default());
    let typed = checker
        .check_expression(expression)
        .expect("expression should not abort the file");
    let count = checker.diagnostics().len();
    (typed, count)
}

proptest! {
    #[test]
    fn equality_is_reflexive(ty in any_type()) {
        prop_assert!(ty.equals(&ty.clone()), "{} should equal itself", ty);
    }

    #[test]
    fn subtyping_is_reflexive(ty in any_type()) {
        prop_assert!(ty.sub(&ty), "{} should be a subtype of itself", ty);
    }

    #[test]
    fn equality_is_symmetric(left in any_type(), right in any_type()) {
        prop_assert_eq!(left.equals(&right), right.equals(&left));
    }

    #[test]
    fn equality_implies_mutual_subtyping(left in any_type(), right in any_type()) {
        if left.equals(&right) {
            prop_assert!(left.sub(&right) && right.sub(&left));
        }
    }

    #[test]
    fn unknown_is_the_top_type(ty in any_type()) {
        prop_assert!(ty.sub(&Type::Unknown));
    }

    #[test]
    fn adding_a_field_narrows_a_struct(
        map in prop::collection::btree_map("[a-d]", data_type(), 1..4),
        extra in data_type(),
    ) {
        let narrow = Type::structure(fields(map.clone())).expect("unique names");
        let mut widened = map;
        widened.insert("zz".to_string(), extra);
        let wider_value = Type::structure(fields(widened)).expect("unique names");
        prop_assert!(wider_value.sub(&narrow));
        prop_assert!(!narrow.sub(&wider_value));
        prop_assert!(!narrow.equals(&wider_value));
    }

    #[test]
    fn sampled_values_are_valid(ty in data_type()) {
        let value = sample(&ty);
        prop_assert!(ty.valid(&value), "{} should accept {}", ty, value);
        prop_assert_eq!(
            ty.conform_value(&value),
            json!({ "Some": value.clone() })
        );
    }

    #[test]
    fn numeric_sums_are_numbers(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..8)) {
        let mut iter = values.into_iter();
        let first = num(iter.next().unwrap_or_default());
        let sum = iter.fold(first, |acc, value| binary(acc, BinaryOperator::Add, num(value)));
        let (typed, diagnostics) = check_expression(&sum);
        prop_assert_eq!(typed, Ok(Type::Num));
        prop_assert_eq!(diagnostics, 0);
    }

    #[test]
    fn string_concatenation_stays_a_string(parts in prop::collection::vec("[a-z]{0,6}", 1..6)) {
        let mut iter = parts.iter();
        let first = text(iter.next().map(String::as_str).unwrap_or(""));
        let joined = iter.fold(first, |acc, part| binary(acc, BinaryOperator::Add, text(part)));
        let (typed, diagnostics) = check_expression(&joined);
        prop_assert_eq!(typed, Ok(Type::Str));
        prop_assert_eq!(diagnostics, 0);
    }
}
