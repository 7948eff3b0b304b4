//! Path evaluation over decoded JSON values.
//!
//! A decoded response body is represented directly as [`serde_json::Value`]:
//! it is already the tagged null/bool/number/string/array/object variant
//! this module operates on, so no parallel type is introduced.
//!
//! Path grammar, applied segment by segment split on `.`:
//!
//! - `field` — map-key access; fails if the current value is not an object
//!   or the key is absent.
//! - `field[i]` — field access followed by a numeric index; negative `i`
//!   counts from the end; out-of-range indices fail.
//! - `field[*]` — field access followed by a wildcard; evaluates the
//!   remainder of the path on every array element, concatenating successful
//!   results. If the wildcard is the last segment, the array itself is
//!   returned. Nested wildcards flatten one level.
//! - A leading `[...]` is permitted, treated as if prefixed by `.`.
//! - An empty path yields "not found".

use serde_json::Value;

/// Resolve `path` against `root`.
///
/// Returns `(value, found)`. This never panics: every failure mode —
/// missing field, non-object access, out-of-range index, wildcard over a
/// non-array — collapses to `found = false`.
#[must_use]
pub fn evaluate(root: &Value, path: &str) -> (Option<Value>, bool) {
    let segments = parse_segments(path);
    if segments.is_empty() {
        return (None, false);
    }
    match resolve(root, &segments) {
        Some((value, _)) => (Some(value), true),
        None => (None, false),
    }
}

/// Apply the §4.1 default-or-omit projection rule: "not found" or `null` at
/// the path yields `default` if given, otherwise the field is omitted.
#[must_use]
pub fn project_one(root: &Value, path: &str, default: Option<&Value>) -> Option<Value> {
    let (value, found) = evaluate(root, path);
    match (found, value) {
        (true, Some(v)) if !v.is_null() => Some(v),
        _ => default.cloned(),
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Field(String),
    Index(String, i64),
    Wildcard(String),
}

fn parse_segments(path: &str) -> Vec<Segment> {
    let normalised = if let Some(rest) = path.strip_prefix('[') {
        format!(".[{rest}")
    } else {
        path.to_string()
    };
    normalised
        .split('.')
        .filter(|s| !s.is_empty())
        .filter_map(parse_one_segment)
        .collect()
}

fn parse_one_segment(raw: &str) -> Option<Segment> {
    let Some(bracket) = raw.find('[') else {
        return Some(Segment::Field(raw.to_string()));
    };
    if !raw.ends_with(']') {
        return Some(Segment::Field(raw.to_string()));
    }
    let field = raw.get(..bracket)?.to_string();
    let inner = raw.get(bracket + 1..raw.len().saturating_sub(1))?;
    if inner == "*" {
        Some(Segment::Wildcard(field))
    } else {
        inner
            .parse::<i64>()
            .ok()
            .map(|idx| Segment::Index(field, idx))
    }
}

/// Resolve `segments` against `value`, returning the resolved value plus
/// whether it was produced by a wildcard (directly, or by a remainder chain
/// that itself bottomed out in one) — callers one level up use this flag to
/// decide whether to splice the result into their own concatenation
/// ("nested wildcards flatten one level") or keep it nested as a single
/// array-valued element.
fn resolve(value: &Value, segments: &[Segment]) -> Option<(Value, bool)> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some((value.clone(), false));
    };
    match segment {
        Segment::Field(name) => {
            let next = field(value, name)?;
            resolve(next, rest)
        }
        Segment::Index(name, idx) => {
            let base = field_or_self(value, name)?;
            let next = index(base, *idx)?;
            resolve(next, rest)
        }
        Segment::Wildcard(name) => {
            let base = field_or_self(value, name)?;
            let arr = base.as_array()?;
            if rest.is_empty() {
                return Some((Value::Array(arr.clone()), true));
            }
            let mut out = Vec::new();
            for element in arr {
                if let Some((resolved, from_wildcard)) = resolve(element, rest) {
                    match resolved {
                        Value::Array(inner) if from_wildcard => out.extend(inner),
                        other => out.push(other),
                    }
                }
            }
            Some((Value::Array(out), true))
        }
    }
}

/// Resolve `name` against `value`, or — when `name` is empty, which happens
/// for a bracket segment immediately following another bracket or the
/// leading `[...]` — return `value` itself.
fn field_or_self<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    if name.is_empty() {
        Some(value)
    } else {
        field(value, name)
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.as_object()?.get(name)
}

fn index(value: &Value, idx: i64) -> Option<&Value> {
    let arr = value.as_array()?;
    let len = i64::try_from(arr.len()).ok()?;
    let resolved = if idx < 0 { len + idx } else { idx };
    if resolved < 0 || resolved >= len {
        return None;
    }
    let resolved = usize::try_from(resolved).ok()?;
    arr.get(resolved)
}
