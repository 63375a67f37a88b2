//! Dotted-path inline value syntax (`a.b=1,a.c=2`).
//!
//! Commas separate assignments and dots separate path segments; both can
//! be escaped with a backslash.

use serde_json::{Map, Value};

use crate::error::ValueError;

/// Apply a `--set` style expression onto `target`.
///
/// With `coerce`, scalar values are parsed as bool/int/float/null before
/// falling back to string; without it every value stays a string.
pub fn apply(target: &mut Map<String, Value>, input: &str, coerce: bool) -> Result<(), ValueError> {
    for assignment in split_escaped(input, ',') {
        if assignment.is_empty() {
            continue;
        }
        let (raw_path, raw_value) = assignment
            .split_once('=')
            .ok_or_else(|| ValueError::SetSyntax(format!("missing '=' in {assignment:?}")))?;

        let path = split_escaped(raw_path, '.');
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(ValueError::SetSyntax(format!(
                "empty path segment in {raw_path:?}"
            )));
        }

        let value = if coerce {
            coerce_scalar(raw_value)
        } else {
            Value::String(raw_value.to_string())
        };
        insert_path(target, &path, value);
    }
    Ok(())
}

/// Set a single dotted path to an explicit value.
pub fn apply_value(
    target: &mut Map<String, Value>,
    raw_path: &str,
    value: Value,
) -> Result<(), ValueError> {
    let path = split_escaped(raw_path, '.');
    if path.iter().any(|segment| segment.is_empty()) {
        return Err(ValueError::SetSyntax(format!(
            "empty path segment in {raw_path:?}"
        )));
    }
    insert_path(target, &path, value);
    Ok(())
}

fn insert_path(target: &mut Map<String, Value>, path: &[String], value: Value) {
    let (head, rest) = match path {
        [head, rest @ ..] => (head, rest),
        [] => return,
    };
    if rest.is_empty() {
        target.insert(head.clone(), value);
        return;
    }
    let child = target
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        // Scalar collision: the deeper path wins.
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        insert_path(map, rest, value);
    }
}

fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

fn split_escaped(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == separator => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            }
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str, coerce: bool) -> Value {
        let mut map = Map::new();
        apply(&mut map, input, coerce).unwrap();
        Value::Object(map)
    }

    #[test]
    fn nested_paths() {
        let v = parse("a.b=1,a.c=2", true);
        assert_eq!(v["a"]["b"], 1);
        assert_eq!(v["a"]["c"], 2);
    }

    #[test]
    fn coercion() {
        let v = parse("i=42,f=1.5,t=true,n=null,s=hello", true);
        assert_eq!(v["i"], 42);
        assert_eq!(v["f"], 1.5);
        assert_eq!(v["t"], true);
        assert_eq!(v["n"], Value::Null);
        assert_eq!(v["s"], "hello");
    }

    #[test]
    fn string_mode_never_coerces() {
        let v = parse("port=8080", false);
        assert_eq!(v["port"], "8080");
    }

    #[test]
    fn escaped_separators() {
        let v = parse(r"msg=a\,b", false);
        assert_eq!(v["msg"], "a,b");
        let v = parse(r"dotted\.key=1", true);
        assert_eq!(v["dotted.key"], 1);
    }

    #[test]
    fn later_assignment_wins() {
        let v = parse("a=1,a=2", true);
        assert_eq!(v["a"], 2);
    }

    #[test]
    fn missing_equals_is_an_error() {
        let mut map = Map::new();
        assert!(apply(&mut map, "oops", true).is_err());
    }
}
