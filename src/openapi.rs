use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::command_tree::{CommandTree, Operation, ParamDef, RequestBodyDef, Resource, TREE_VERSION};
use crate::extras::{add_alerting_extras, add_query_range_extras};
use crate::naming::{operation_name, resource_name, safe_kebab};
use crate::ordered::OrderedMap;
use crate::schema::{resolve_ref, schema_info};

pub const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

const JSON_CONTENT_TYPE: &str = "application/json";
const DEFAULT_LOCATION: &str = "query";

#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub base_url: String,
}

/// Compiles a parsed OpenAPI document into the command tree.
///
/// Never fails: missing `paths`/`components` count as empty, malformed path
/// items and operations are skipped, unresolvable references degrade to
/// defaults.
pub fn build_command_tree(doc: &Value, config: &CompileConfig) -> CommandTree {
    let empty = Mapping::new();
    let components = doc
        .get("components")
        .and_then(Value::as_mapping)
        .unwrap_or(&empty);

    let mut resources: OrderedMap<String, Vec<Operation>> = OrderedMap::new();

    if let Some(paths) = doc.get("paths").and_then(Value::as_mapping) {
        for (path_value, path_item) in paths {
            let Some(path) = path_value.as_str() else {
                debug!(?path_value, "skipping non-string path key");
                continue;
            };
            let Some(path_map) = path_item.as_mapping() else {
                debug!(path, "skipping path item that is not a mapping");
                continue;
            };

            for method in HTTP_METHODS {
                let op_map = match path_map.get(method) {
                    None => continue,
                    Some(Value::Null) => &empty,
                    Some(Value::Mapping(op)) => op,
                    Some(_) => {
                        debug!(path, method, "skipping operation that is not a mapping");
                        continue;
                    }
                };
                let (resource, op) = build_operation(path, method, path_map, op_map, components);
                resources.entry_or_default(resource).push(op);
            }
        }
    }

    add_query_range_extras(&mut resources);
    add_alerting_extras(&mut resources);

    assemble_tree(resources, config)
}

fn build_operation(
    path: &str,
    method: &str,
    path_item: &Mapping,
    op: &Mapping,
    components: &Mapping,
) -> (String, Operation) {
    let tags: Vec<String> = op
        .get("tags")
        .and_then(Value::as_sequence)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let resource = resource_name(path, &tags);
    let op_id = op.get("operationId").and_then(Value::as_str);

    let operation = Operation {
        name: operation_name(op_id, method, path),
        method: method.to_uppercase(),
        path: path.to_string(),
        summary: string_field(op, "summary"),
        description: string_field(op, "description"),
        tags: tags.iter().map(|t| safe_kebab(t)).collect(),
        deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
        params: build_params(path_item.get("parameters"), op.get("parameters"), components),
        request_body: request_body_info(op, components),
    };
    (resource, operation)
}

fn string_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Merges path-item and operation parameters and assigns flags.
///
/// Parameters are keyed by `(name, in)`; an operation entry replaces a
/// path-item entry with the same key but keeps its position. Flags are unique
/// within the result: header flags carry a `header-` prefix, and a flag that
/// is already taken is qualified as `{location}-{base}`.
pub fn build_params(
    path_params: Option<&Value>,
    op_params: Option<&Value>,
    components: &Mapping,
) -> Vec<ParamDef> {
    let mut merged: OrderedMap<(String, String), &Mapping> = OrderedMap::new();
    for list in [path_params, op_params] {
        for raw in list.and_then(Value::as_sequence).into_iter().flatten() {
            let Some(param) = resolve_param(raw, components) else {
                continue;
            };
            let name = string_field(param, "name").unwrap_or_default();
            let location = string_field(param, "in").unwrap_or_else(|| DEFAULT_LOCATION.to_string());
            merged.insert((name, location), param);
        }
    }

    let mut used_flags: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(merged.len());
    for ((name, location), param) in merged {
        let base_flag = safe_kebab(&name);
        if base_flag.is_empty() {
            debug!(name = %name, location = %location, "skipping parameter without a usable name");
            continue;
        }

        let required = param.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema = param.get("schema").unwrap_or(&Value::Null);
        let (schema_type, is_array) = schema_info(schema, components);

        let mut flag = if location == "header" {
            format!("header-{base_flag}")
        } else {
            base_flag.clone()
        };
        if used_flags.contains(&flag) {
            flag = format!("{location}-{base_flag}");
        }
        let mut suffix = 2;
        let qualified = flag.clone();
        while used_flags.contains(&flag) {
            flag = format!("{qualified}-{suffix}");
            suffix += 1;
        }
        used_flags.insert(flag.clone());

        out.push(ParamDef {
            name: format!("{location}__{base_flag}"),
            param_name: name,
            flag,
            location,
            required,
            schema_type,
            is_array,
        });
    }
    out
}

fn resolve_param<'a>(param: &'a Value, components: &'a Mapping) -> Option<&'a Mapping> {
    let map = param.as_mapping()?;
    let Some(reference) = map.get("$ref") else {
        return Some(map);
    };
    let reference = reference.as_str().unwrap_or_default();
    let resolved = resolve_ref(reference, components);
    if resolved.is_none() {
        debug!(reference, "skipping unresolved parameter reference");
    }
    resolved
}

/// Summarizes an operation's request body, preferring `application/json`
/// over the first declared content type.
pub fn request_body_info(op: &Mapping, components: &Mapping) -> Option<RequestBodyDef> {
    let mut body = op.get("requestBody")?.as_mapping()?;
    if let Some(reference) = body.get("$ref") {
        let reference = reference.as_str().unwrap_or_default();
        body = match resolve_ref(reference, components) {
            Some(resolved) => resolved,
            None => {
                debug!(reference, "dropping unresolved request body reference");
                return None;
            }
        };
    }

    let content = body.get("content")?.as_mapping()?;
    let content_type = if content.contains_key(JSON_CONTENT_TYPE) {
        JSON_CONTENT_TYPE
    } else {
        content.iter().next()?.0.as_str()?
    };
    let schema = content
        .get(content_type)
        .and_then(|media| media.get("schema"))
        .unwrap_or(&Value::Null);
    let (schema_type, _) = schema_info(schema, components);

    Some(RequestBodyDef {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        content_type: content_type.to_string(),
        schema_type,
    })
}

/// Renumbers repeated operation names, then sorts operations and resources
/// by name.
pub fn assemble_tree(
    resources: OrderedMap<String, Vec<Operation>>,
    config: &CompileConfig,
) -> CommandTree {
    let mut out: Vec<Resource> = resources
        .into_iter()
        .map(|(name, mut ops)| {
            dedupe_op_names(&name, &mut ops);
            ops.sort_by(|a, b| a.name.cmp(&b.name));
            Resource { name, ops }
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));

    let op_count: usize = out.iter().map(|res| res.ops.len()).sum();
    info!(resources = out.len(), operations = op_count, "compiled command tree");

    CommandTree {
        version: TREE_VERSION,
        base_url: config.base_url.clone(),
        resources: out,
    }
}

/// The second occurrence of `list` becomes `list-2`, the third `list-3`.
/// A suffix already in use is skipped.
fn dedupe_op_names(resource: &str, ops: &mut [Operation]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for op in ops.iter_mut() {
        let Some(count) = seen.get(&op.name).copied() else {
            seen.insert(op.name.clone(), 1);
            continue;
        };
        let mut n = count + 1;
        let mut renamed = format!("{}-{n}", op.name);
        while seen.contains_key(&renamed) {
            n += 1;
            renamed = format!("{}-{n}", op.name);
        }
        debug!(resource, from = %op.name, to = %renamed, "renumbered duplicate operation");
        seen.insert(op.name.clone(), n);
        seen.insert(renamed.clone(), 1);
        op.name = renamed;
    }
}
