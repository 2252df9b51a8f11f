//! Behavioural properties of the matcher engine
//!
//! Fixtures: Bob and his two children, Alice and Brian.

use dm_core::{compare, ops, DiffCategory, Pattern};
use serde_json::{json, Value};

fn bob() -> Value {
    json!({
        "id": 10,
        "name": "Bob",
        "age": 41,
        "children": [
            {"id": 23, "name": "Alice", "age": 20, "children": null},
            {"id": 21, "name": "Brian", "age": 18, "children": null}
        ]
    })
}

fn child(name: &str, age: i64) -> Pattern {
    Pattern::partial([
        ("id", ops::not_zero()),
        ("name", Pattern::from(name)),
        ("age", Pattern::from(age)),
    ])
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literal_match_is_structural_equality() {
    let samples = vec![
        json!(null),
        json!(true),
        json!(41),
        json!(-3),
        json!(2.5),
        json!("Bob"),
        json!([1, "a", null]),
        json!({"a": {"b": [1, 2]}}),
        bob(),
    ];

    for actual in &samples {
        for expected in &samples {
            let result = compare(actual, &Pattern::literal(expected.clone()));
            assert_eq!(
                result.matched(),
                actual == expected,
                "{} vs {}:\n{}",
                actual,
                expected,
                result
            );
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_partial_record_example() {
    let actual = json!({"id": 7, "name": "Bob", "age": 41});
    let pattern = Pattern::partial([
        ("name", Pattern::from("Bob")),
        ("age", ops::between(40, 45)),
    ]);
    assert!(compare(&actual, &pattern).matched());
}

#[test]
fn test_partial_record_ignores_added_fields() {
    let pattern = Pattern::partial([
        ("name", Pattern::from("Bob")),
        ("age", ops::between(40, 45)),
    ]);
    let mut actual = json!({"id": 7, "name": "Bob", "age": 41});
    assert!(compare(&actual, &pattern).matched());

    for (key, value) in [
        ("nickname", json!("Bobby")),
        ("children", json!([])),
        ("meta", json!({"x": 1})),
    ] {
        actual[key] = value;
        assert!(compare(&actual, &pattern).matched());
    }
}

#[test]
fn test_nested_person_pattern() {
    let pattern = Pattern::partial([
        ("id", ops::not_zero()),
        ("name", Pattern::from("Bob")),
        ("age", ops::between(40, 45)),
        (
            "children",
            ops::bag([child("Alice", 20), child("Brian", 18)]),
        ),
    ]);
    let result = compare(&bob(), &pattern);
    assert!(result.matched(), "{}", result);
}

#[test]
fn test_all_mismatches_reported() {
    let pattern = Pattern::record([
        ("id", ops::zero()),
        ("name", Pattern::from("Robert")),
        ("age", ops::between(50, 60)),
        (
            "children",
            Pattern::seq([child("Alice", 21), child("Brian", 18)]),
        ),
    ]);
    let result = compare(&bob(), &pattern);
    let report = result.report(None);

    for path in [
        "DATA.id",
        "DATA.name",
        "DATA.age",
        "DATA.children[0].age",
    ] {
        assert!(report.contains(path), "{} missing from:\n{}", path, report);
    }
    assert_eq!(result.failures().len(), 4);
}

// ============================================================================
// Bags
// ============================================================================

#[test]
fn test_bag_example() {
    let actual = json!([{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]);
    let pattern = ops::bag([
        Pattern::partial([("v", Pattern::from("y")), ("id", ops::not_zero())]),
        Pattern::partial([("v", Pattern::from("x")), ("id", ops::not_zero())]),
    ]);
    assert!(compare(&actual, &pattern).matched());
}

#[test]
fn test_bag_is_permutation_invariant() {
    let actual = json!(["a", 2]);
    let p_a = || ops::isa(dm_core::Kind::String);
    let p_b = || ops::gt(1);

    let forward = compare(&actual, &ops::bag([p_a(), p_b()]));
    let backward = compare(&actual, &ops::bag([p_b(), p_a()]));
    assert!(forward.matched());
    assert_eq!(forward.matched(), backward.matched());

    let swapped = json!([2, "a"]);
    assert!(compare(&swapped, &ops::bag([p_a(), p_b()])).matched());
}

#[test]
fn test_ordered_sequence_is_not_permutation_invariant() {
    let pattern = Pattern::seq([Pattern::from("a"), ops::gt(1)]);
    assert!(compare(&json!(["a", 2]), &pattern).matched());
    assert!(!compare(&json!([2, "a"]), &pattern).matched());
}

#[test]
fn test_bag_failure_is_single_aggregate() {
    let actual = json!([1, 2, 3]);
    let result = compare(&actual, &ops::bag([1, 2, 4]));
    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].category, Some(DiffCategory::Bag));
    let message = failures[0].message.clone().unwrap_or_default();
    assert!(message.contains("missing: 4"), "{}", message);
    assert!(message.contains("extra: 3"), "{}", message);
}

// ============================================================================
// Catch
// ============================================================================

#[test]
fn test_catch_captures_matching_values() {
    let pattern = Pattern::partial([
        ("id", ops::catch("bob_id", ops::not_zero())),
        ("age", ops::catch("bob_age", ops::between(40, 45))),
    ]);
    let result = compare(&bob(), &pattern);
    assert!(result.matched());

    let id: Option<i64> = result.captures.get("bob_id").unwrap();
    let age: Option<u8> = result.captures.get("bob_age").unwrap();
    assert_eq!(id, Some(10));
    assert_eq!(age, Some(41));
}

#[test]
fn test_catch_untouched_when_operator_fails() {
    let pattern = Pattern::partial([
        ("age", ops::catch("age", ops::between(50, 60))),
        ("id", ops::catch("id", ops::not_zero())),
    ]);
    let result = compare(&bob(), &pattern);
    assert!(!result.matched());
    assert!(!result.captures.contains("age"));
    // Sibling catches still see their own successful match
    assert_eq!(result.captures.value("id"), Some(&json!(10)));
}
