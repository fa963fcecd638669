//! Generic walks over `serde_json::Value` trees.
//!
//! Drift comparison, font/color flattening and score extraction all reduce
//! to the same operation: descend through objects, stop at some predicate,
//! and key what was found by its dotted path. That walk lives here once.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Join a dotted path segment.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Path of an array element.
pub fn index(prefix: &str, i: usize) -> String {
    format!("{}[{}]", prefix, i)
}

/// Depth-first walk over objects. `visit` is called for every node below
/// the root with its dotted path; returning `false` stops descent into
/// that node. Arrays are not descended.
pub fn walk<F>(value: &Value, visit: &mut F)
where
    F: FnMut(&str, &Value) -> bool,
{
    walk_inner(value, "", visit);
}

fn walk_inner<F>(value: &Value, prefix: &str, visit: &mut F)
where
    F: FnMut(&str, &Value) -> bool,
{
    if let Value::Object(map) = value {
        for (key, child) in map {
            let path = join(prefix, key);
            if visit(&path, child) {
                walk_inner(child, &path, visit);
            }
        }
    }
}

/// Flatten every non-object node accepted by `keep` into a path-keyed map.
///
/// Empty objects are treated as leaves so that a section emptied out is
/// still visible as a path.
pub fn flatten_leaves<P>(value: &Value, keep: P) -> BTreeMap<String, Value>
where
    P: Fn(&str, &Value) -> bool,
{
    let mut out = BTreeMap::new();
    walk(value, &mut |path, node| {
        let is_leaf = match node {
            Value::Object(map) => map.is_empty(),
            _ => true,
        };
        if is_leaf && keep(path, node) {
            out.insert(path.to_string(), node.clone());
        }
        !is_leaf
    });
    out
}

/// Every key path in the tree, containers included.
pub fn key_paths(value: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk(value, &mut |path, _| {
        out.insert(path.to_string());
        true
    });
    out
}

/// Nesting depth counting both objects and arrays. Scalars are depth 0.
pub fn max_depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(max_depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(max_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Last segment of a dotted path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Collect every string leaf in the tree, arrays included.
pub fn strings(value: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    collect_strings(value, &mut out);
    out
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s.as_str()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_leaves_with_predicate() {
        let value = json!({
            "fonts": { "title": { "face": "Arial", "size": 28 }, "body": { "size": 12 } },
            "empty": {}
        });
        let all = flatten_leaves(&value, |_, _| true);
        assert_eq!(all.len(), 4);
        assert_eq!(all["fonts.title.face"], json!("Arial"));
        assert_eq!(all["empty"], json!({}));

        let numbers = flatten_leaves(&value, |_, v| v.is_number());
        assert_eq!(numbers.keys().collect::<Vec<_>>(), vec!["fonts.body.size", "fonts.title.size"]);
    }

    #[test]
    fn test_key_paths_include_containers() {
        let value = json!({ "a": { "b": 1, "c": [1, 2] } });
        let paths = key_paths(&value);
        assert!(paths.contains("a"));
        assert!(paths.contains("a.b"));
        assert!(paths.contains("a.c"));
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(max_depth(&json!(1)), 0);
        assert_eq!(max_depth(&json!({ "a": [ { "b": 1 } ] })), 3);
    }

    #[test]
    fn test_strings_collects_nested() {
        let value = json!({ "a": ["x", { "b": "y" }], "c": 3 });
        assert_eq!(strings(&value), vec!["x", "y"]);
    }
}
