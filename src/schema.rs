//! `$ref` resolution and schema summarization.
//!
//! Schemas are summarized to a compact tag (`string`, `object`, `array<T>`,
//! a component name, or a composition keyword) plus an array flag. Nothing
//! here fails: a reference that cannot be followed degrades to its trailing
//! name segment, anything unrecognised degrades to `string`.

use serde_yaml::{Mapping, Value};
use tracing::debug;

const COMPONENTS_PREFIX: &str = "#/components/";
const DEFAULT_TYPE: &str = "string";
const COMPOSITION_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// Follows a `#/components/...` reference inside `components`.
///
/// Returns `None` for external or root-pointer references, for paths that do
/// not exist, and for targets that are not a non-empty mapping. Callers treat
/// `None` as "no additional information".
pub fn resolve_ref<'a>(reference: &str, components: &'a Mapping) -> Option<&'a Mapping> {
    let rest = reference.strip_prefix(COMPONENTS_PREFIX)?;
    let mut segments = rest.split('/');
    let mut cur = components.get(segments.next()?)?;
    for segment in segments {
        cur = cur.get(segment)?;
    }
    cur.as_mapping().filter(|map| !map.is_empty())
}

/// Summarizes a schema node into `(type_tag, is_array)`.
pub fn schema_info(schema: &Value, components: &Mapping) -> (String, bool) {
    let mut chain = Vec::new();
    summarize_value(schema, components, &mut chain)
}

fn summarize_value(schema: &Value, components: &Mapping, chain: &mut Vec<String>) -> (String, bool) {
    match schema.as_mapping() {
        Some(map) if !map.is_empty() => summarize_map(map, components, chain),
        _ => default_info(),
    }
}

fn summarize_map(schema: &Mapping, components: &Mapping, chain: &mut Vec<String>) -> (String, bool) {
    if let Some(reference) = schema.get("$ref") {
        let reference = reference.as_str().unwrap_or_default();
        return summarize_ref(reference, components, chain);
    }

    for keyword in COMPOSITION_KEYWORDS {
        if schema.contains_key(keyword) {
            return (keyword.to_string(), false);
        }
    }

    match declared_type(schema) {
        Some("array") => {
            let items = schema.get("items").unwrap_or(&Value::Null);
            let (item_type, _) = summarize_value(items, components, chain);
            (format!("array<{item_type}>"), true)
        }
        Some(other) => (other.to_string(), false),
        None if has_properties(schema) => ("object".to_string(), false),
        None => default_info(),
    }
}

fn summarize_ref(reference: &str, components: &Mapping, chain: &mut Vec<String>) -> (String, bool) {
    let ref_name = reference.rsplit('/').next().unwrap_or_default();

    // A reference already open on this chain would recurse forever.
    if !chain.iter().any(|open| open == reference) {
        if let Some(resolved) = resolve_ref(reference, components) {
            chain.push(reference.to_string());
            let info = summarize_map(resolved, components, chain);
            chain.pop();
            return info;
        }
        debug!(reference, "unresolved schema reference");
    } else {
        debug!(reference, "cyclic schema reference");
    }

    if ref_name.is_empty() {
        return default_info();
    }
    (ref_name.to_string(), false)
}

/// The declared `type`. A list form such as `[integer, "null"]` yields its
/// first non-null entry.
fn declared_type(schema: &Mapping) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) if !t.is_empty() => Some(t.as_str()),
        Value::Sequence(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| !t.is_empty() && *t != "null"),
        _ => None,
    }
}

fn has_properties(schema: &Mapping) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_mapping)
        .is_some_and(|props| !props.is_empty())
}

fn default_info() -> (String, bool) {
    (DEFAULT_TYPE.to_string(), false)
}
