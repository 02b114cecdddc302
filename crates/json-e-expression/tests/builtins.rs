//! Builtin library, exercised through full expression evaluation.

use json_e_expression::{evaluate, Context, ContextBuilder, Error};
use serde_json::{json, Value};

fn check(expression: &str, expected: Value) {
    check_with(expression, expected, json!({}));
}

fn check_with(expression: &str, expected: Value, data: Value) {
    let ctx = Context::from_json(data).unwrap();
    let result = evaluate(expression, &ctx)
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", expression, e))
        .to_json()
        .unwrap();
    assert_eq!(result, expected, "expression: {}", expression);
}

fn builtin_message(expression: &str) -> String {
    match evaluate(expression, &Context::builtins()) {
        Err(Error::Builtin(message)) => message,
        Err(other) => panic!("expected a builtin error for {}, got {}", expression, other),
        Ok(value) => panic!("expected a builtin error for {}, got {:?}", expression, value),
    }
}

#[test]
fn test_math() {
    check("typeof(sin(1))", json!("number"));
    check("typeof(cos(1))", json!("number"));
    check("pow(2, 3)", json!(8));
    check("sqrt(16)", json!(4));
    check("ceil(1.2) + floor(1.8)", json!(3));
    check("abs(-3)", json!(3));
    check("round(2.5)", json!(3));
    check("max(1, 7, 3)", json!(7));
    check("min(4, -1)", json!(-1));
    check("random() < 1", json!(true));
}

#[test]
fn test_range() {
    check("range(1, 5)", json!([1, 2, 3, 4]));
    check("range(0, 10, 3)", json!([0, 3, 6, 9]));
    check("range(5, 1, -2)", json!([5, 3]));
    check("range(3, 3)", json!([]));
    assert!(builtin_message("range(1, 5, 0)").contains("range"));
    assert!(builtin_message("range(1.5, 3)").contains("argument 1 to be integer"));
}

#[test]
fn test_range_with_large_bounds() {
    check("len(range(0, 9000000000000000000, 4000000000000000000))", json!(3));
    check(
        "len(range(9000000000000000000, -9000000000000000000, -9000000000000000000))",
        json!(2),
    );
    check("range(0, 9000000000000000000, 4000000000000000000)[1] > 0", json!(true));
}

#[test]
fn test_generated_length_cap() {
    assert_eq!(
        builtin_message("range(0, 1000000000000000)"),
        "invalid arguments to builtin: range: result of 1000000000000000 items exceeds the limit of 16777216"
    );
    assert!(builtin_message("range(0, 16777217)").contains("exceeds the limit"));
    assert!(builtin_message("padLeft('a', 1000000000000)").contains("exceeds the limit"));
    assert!(builtin_message("padRight('a', 1000000000000, 'xy')").contains("exceeds the limit"));
}

#[test]
fn test_optional_arguments_are_bounded() {
    check("substring('abc', 1)", json!("bc"));
    check("substring('abc', 1, 2)", json!("b"));
    assert_eq!(
        builtin_message("substring('abc', 1, 2, 3, 4)"),
        "invalid arguments to builtin: substring: expected at most 3 arguments, found 5"
    );
    assert!(builtin_message("padLeft('a', 3, 'x', 'y')").contains("expected at most 3"));
    assert!(builtin_message("slice([1], 0, 1, 2)").contains("expected at most 3"));
    assert!(builtin_message("range(0, 3, 1, 1)").contains("expected at most 3"));
    assert!(builtin_message("fromNow('1 day', '2020-01-01', 'x')").contains("expected at most 2"));
    assert!(builtin_message("toArray(1, 2)").contains("expected at most 1"));
    assert!(builtin_message("substring('abc')").contains("expected at least 2 arguments, found 1"));
}

#[test]
fn test_strings() {
    check("uppercase('abc') + lowercase('DEF')", json!("ABCdef"));
    check("len('héllo')", json!(5));
    check("strip('  x  ') + '|' + lstrip('  y') + rstrip('z  ')", json!("x|yz"));
    check("replace('hello world', 'world', 'json-e')", json!("hello json-e"));
    check("replaceFirst('a-a-a', 'a', 'b')", json!("b-a-a"));
    check("substring('hello', 1, 3)", json!("el"));
    check("substring('hello', 2)", json!("llo"));
    check("split('a,b,c', ',')", json!(["a", "b", "c"]));
    check("split('ab', '')", json!(["a", "b"]));
    check("join([1, 2, 3], '-')", json!("1-2-3"));
    check("startsWith('json-e', 'json') && endsWith('json-e', '-e')", json!(true));
    check("includes('template', 'mpl')", json!(true));
    check("padLeft('7', 3, '0')", json!("007"));
    check("padRight('ab', 4)", json!("ab  "));
    check("str(1.5) + str(true) + str(null)", json!("1.5truenull"));
    check("number(' 42 ') + number('0x10')", json!(58));
}

#[test]
fn test_regex() {
    check("match('hello world', 'w.r.')", json!("worl"));
    check("match('hello', '[0-9]+')", json!(null));
    check("matchAll('a1b22c333', '[0-9]+')", json!(["1", "22", "333"]));
    check("test('abc123', '^[a-z]+[0-9]+$')", json!(true));
    check("test('abc', '^[0-9]')", json!(false));
    assert!(builtin_message("test('abc', '(')").contains("invalid regular expression"));
}

#[test]
fn test_arrays() {
    check("flatten([[1, 2], [3], 4])", json!([1, 2, 3, 4]));
    check("flatten([[1, [2]]])", json!([1, [2]]));
    check("reverse([1, 2, 3])", json!([3, 2, 1]));
    check("sort([3, 1, 2])", json!([1, 2, 3]));
    check("sort(['b', 'a'])", json!(["a", "b"]));
    check("slice([1, 2, 3, 4], 1, 3)", json!([2, 3]));
    check("slice([1, 2, 3, 4], -2)", json!([3, 4]));
    check("map([1, 2, 3], x => x * 10)", json!([10, 20, 30]));
    check("filter(range(0, 6), x => x % 2 == 0)", json!([0, 2, 4]));
    check("reduce([1, 2, 3], (acc, x) => acc + x, 10)", json!(16));
    check("some([1, 5], x => x > 4)", json!(true));
    check("every([1, 5], x => x > 4)", json!(false));
    check("find([1, 5, 9], x => x > 4)", json!(5));
    check("findIndex([1, 5, 9], x => x > 100)", json!(-1));
    check_with(
        "map(sortBy(people, p => p.age), p => p.name)",
        json!(["ann", "bob"]),
        json!({"people": [{"name": "bob", "age": 40}, {"name": "ann", "age": 20}]}),
    );
}

#[test]
fn test_objects() {
    check_with("keys(o)", json!(["a", "b"]), json!({"o": {"a": 1, "b": 2}}));
    check_with("values(o)", json!([1, 2]), json!({"o": {"a": 1, "b": 2}}));
    check_with(
        "entries(o)",
        json!([{"key": "a", "value": 1}]),
        json!({"o": {"a": 1}}),
    );
    check_with("hasKey(o, 'a') && !hasKey(o, 'z')", json!(true), json!({"o": {"a": 1}}));
    check("merge({a: 1, b: 1}, {b: 2}, {c: 3})", json!({"a": 1, "b": 2, "c": 3}));
}

#[test]
fn test_type_conversions() {
    check("boolean(0)", json!(false));
    check("boolean('x')", json!(true));
    check("boolean([])", json!(false));
    check("json({a: [1, null]})", json!(r#"{"a":[1,null]}"#));
    check("parseJSON('{\"a\": 1}').a", json!(1));
    check("toArray(1)", json!([1]));
    check("toArray([1])", json!([1]));
    check("toArray(null)", json!([]));
    check("toArray()", json!([]));
    check("typeof(min)", json!("function"));
    check("typeof({})", json!("object"));
    check_with("defined('x') && !defined('y')", json!(true), json!({"x": null}));
}

#[test]
fn test_time() {
    let ctx = ContextBuilder::new().now("2017-01-19T16:27:20.974Z").build();
    let result = evaluate("fromNow('1 hour')", &ctx).unwrap().to_json().unwrap();
    assert_eq!(result, json!("2017-01-19T17:27:20.974Z"));

    check(
        "fromNow('-1 day', '2020-03-01T00:00:00Z')",
        json!("2020-02-29T00:00:00.000Z"),
    );
    check("parseTime('1970-01-01T00:00:02Z')", json!(2000));
    check("formatDate('2021-12-31T23:59:58Z', 'dd.MM.yyyy')", json!("31.12.2021"));
    check("typeof(now())", json!("string"));
}

#[test]
fn test_argument_errors() {
    assert_eq!(
        builtin_message("pow(2)"),
        "invalid arguments to builtin: pow: expected at least 2 arguments, found 1"
    );
    assert_eq!(
        builtin_message("sin('x')"),
        "invalid arguments to builtin: sin: argument 1 to be number found string"
    );
    assert_eq!(
        builtin_message("sqrt(1, 2)"),
        "invalid arguments to builtin: sqrt: expected at most 1 arguments, found 2"
    );
    assert!(builtin_message("max()").contains("expected at least 1 arguments"));
    assert!(builtin_message("map([1], 1)").contains("argument 2 to be function"));
    assert!(builtin_message("json(x => x)").contains("argument 1"));
    assert!(builtin_message("number('abc')").contains("cannot convert"));
}

#[test]
fn test_builtin_error_display() {
    let err = evaluate("pow(2)", &Context::builtins()).unwrap_err();
    assert!(err.to_string().starts_with("BuiltinError: "));
}
