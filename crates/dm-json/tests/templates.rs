//! Template parsing against real comparisons

use dm_core::{compare, ops, DiffCategory};
use dm_json::{json, parse, sub_json_of, super_json_of, Params, TemplateErrorKind};
use serde_json::{json as value, Value};

fn bob() -> Value {
    value!({
        "id": 10,
        "name": "Bob",
        "age": 41,
        "children": [
            {"id": 23, "name": "Alice", "age": 20, "children": null},
            {"id": 21, "name": "Brian", "age": 18, "children": null}
        ]
    })
}

const FAMILY: &str = r#"
    {
        "id":       $^NotZero, // simple operator
        "name":     "Bob",
        "age":      $1,        // could be "$1" or $BobAge
        "children": [
            {
                "id":       $^NotZero,
                "name":     "Alice",
                "age":      20,
                "children": null,
            },
            {
                "id":       $^NotZero,
                "name":     "Brian",
                "age":      18,
                "children": null,
            }
        ]
    }"#;

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_family_template_matches() {
    let pattern = json(FAMILY, &Params::new().with(ops::between(40, 45))).unwrap();
    let result = compare(&bob(), &pattern);
    assert!(result.matched(), "{}", result);
}

#[test]
fn test_family_template_reports_placeholder_mismatch() {
    let pattern = json(FAMILY, &Params::new().with(ops::between(50, 60))).unwrap();
    let result = compare(&bob(), &pattern);
    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, "DATA.age");
    assert_eq!(failures[0].category, Some(DiffCategory::Operator));
}

#[test]
fn test_named_placeholder() {
    let template = r#"{"name": "Bob", "age": $BobAge, "id": NotZero, "children": Len(2)}"#;
    let params = Params::new().with_named("BobAge", ops::between(40, 45));
    assert!(compare(&bob(), &json(template, &params).unwrap()).matched());
}

#[test]
fn test_super_json_of_ignores_extra_keys() {
    let template = r#"{"name": "Bob", "children": Bag(SuperMapOf({"name": "Brian"}), SuperMapOf({"name": "Alice"}))}"#;
    let pattern = super_json_of(template, &Params::new()).unwrap();
    let result = compare(&bob(), &pattern);
    assert!(result.matched(), "{}", result);

    // The same template in strict mode misses id, age and children
    let strict = json(r#"{"name": "Bob"}"#, &Params::new()).unwrap();
    let result = compare(&bob(), &strict);
    assert!(!result.matched());
    assert!(result
        .failures()
        .iter()
        .all(|node| node.category == Some(DiffCategory::Extra)));
}

#[test]
fn test_sub_json_of_allows_missing_keys() {
    let template = r#"{"id": Gt(0), "name": HasPrefix("B"), "age": Gte(18), "email": Re("@")}"#;
    let pattern = sub_json_of(template, &Params::new()).unwrap();
    let actual = value!({"id": 3, "name": "Brian"});
    assert!(compare(&actual, &pattern).matched());

    let actual = value!({"id": 3, "name": "Brian", "nickname": "B"});
    assert!(!compare(&actual, &pattern).matched());
}

#[test]
fn test_operators_with_nested_arguments() {
    let template = r#"
    {
        "tags":  All(Len(Gte(1)), ArrayEach(Isa("string"))),
        "score": Any(Nil, Between(0, 10, "[)")),
        "kind":  None("admin", "root"),
        "meta":  ContainsKey("v"),
    }"#;
    let pattern = parse(template, &Params::new()).unwrap();

    let ok = value!({"tags": ["a", "b"], "score": 9.5, "kind": "user", "meta": {"v": 1}});
    let result = compare(&ok, &pattern);
    assert!(result.matched(), "{}", result);

    let bad = value!({"tags": [], "score": 10, "kind": "root", "meta": {}});
    let report = compare(&bad, &pattern).report(None);
    for path in ["len(DATA.tags)", "DATA.score", "DATA.kind", "DATA.meta"] {
        assert!(report.contains(path), "{} missing from:\n{}", path, report);
    }
}

#[test]
fn test_catch_in_template() {
    let template = r#"{"id": Catch("bob_id", NotZero), "name": "Bob", "age": Ignore, "children": Ignore}"#;
    let result = compare(&bob(), &json(template, &Params::new()).unwrap());
    assert!(result.matched());
    assert_eq!(result.captures.get::<u64>("bob_id").unwrap(), Some(10));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_comma_is_located() {
    let params = Params::new().with(ops::not_zero());
    let err = parse(r#"{"id": $1 "name":"Bob"}"#, &params).unwrap_err();
    assert_eq!((err.line, err.column), (1, 11));
    assert!(matches!(err.kind, TemplateErrorKind::ExpectedSeparator { .. }));
    assert!(err.to_string().ends_with("at line 1, column 11"), "{}", err);

    // Same location when $1 is not bound at all
    let err = parse(r#"{"id": $1 "name":"Bob"}"#, &Params::new()).unwrap_err();
    assert_eq!((err.line, err.column), (1, 11));
    assert!(matches!(err.kind, TemplateErrorKind::ExpectedSeparator { .. }));
}

#[test]
fn test_deeply_nested_template_is_an_error() {
    let err = parse(&"[".repeat(200_000), &Params::new()).unwrap_err();
    assert!(matches!(err.kind, TemplateErrorKind::TooDeep { .. }));
    assert_eq!(err.line, 1);
}

#[test]
fn test_missing_comma_in_multiline_template() {
    let broken = FAMILY.replacen(r#""Bob","#, r#""Bob""#, 1);
    let err = json(&broken, &Params::new().with(ops::between(40, 45))).unwrap_err();
    // `"age"` on the line after `"name": "Bob"`
    assert_eq!((err.line, err.column), (5, 9));
}

#[test]
fn test_undefined_placeholder() {
    let err = parse(r#"[$1, $2]"#, &Params::new().with(1)).unwrap_err();
    assert!(matches!(err.kind, TemplateErrorKind::UnknownPlaceholder(ref name) if name == "2"));
    assert_eq!(err.column, 6);

    let err = parse(r#"{"a": "$missing"}"#, &Params::new()).unwrap_err();
    assert!(matches!(err.kind, TemplateErrorKind::UnknownPlaceholder(ref name) if name == "missing"));
    assert_eq!(err.column, 8);
}

#[test]
fn test_operator_errors_are_located() {
    let err = parse("[1,\n  Between(1)]", &Params::new()).unwrap_err();
    assert!(matches!(err.kind, TemplateErrorKind::Operator(_)));
    assert_eq!((err.line, err.column), (2, 3));

    let err = parse(r#"{"x": Re("(")}"#, &Params::new()).unwrap_err();
    assert!(matches!(err.kind, TemplateErrorKind::Operator(_)));
    assert_eq!(err.column, 7);
}
