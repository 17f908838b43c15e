//! End-to-end tests for compiling OpenAPI documents into command trees.

use proptest::prelude::*;
use signoz_cli::command_tree::{CommandTree, parse_command_tree};
use signoz_cli::openapi::{CompileConfig, build_command_tree};
use signoz_cli::source::parse_document;
use std::collections::HashSet;

const EXTRAS_RESOURCES: [&str; 6] = ["alerts", "channels", "logs", "metrics", "rules", "traces"];

fn compile(raw: &str, base_url: &str) -> CommandTree {
    let doc = parse_document(raw.as_bytes()).unwrap();
    build_command_tree(
        &doc,
        &CompileConfig {
            base_url: base_url.to_string(),
        },
    )
}

fn assert_sorted_and_unique(tree: &CommandTree) {
    let names: Vec<_> = tree.resources.iter().map(|r| r.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(names, sorted);

    for res in &tree.resources {
        let ops: Vec<_> = res.ops.iter().map(|o| o.name.as_str()).collect();
        let mut sorted = ops.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ops, sorted, "ops of {}", res.name);

        for op in &res.ops {
            let flags: HashSet<_> = op.params.iter().map(|p| p.flag.as_str()).collect();
            assert_eq!(flags.len(), op.params.len(), "flags of {} {}", res.name, op.name);
            for param in op.params.iter().filter(|p| p.location == "header") {
                assert!(param.flag.starts_with("header-"));
            }
        }
    }
}

#[test]
fn empty_document_yields_only_extras() {
    let tree = compile("paths: {}\ncomponents: {}\n", "http://localhost:3301");
    let names: Vec<_> = tree.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, EXTRAS_RESOURCES);
    assert_eq!(tree.version, 1);

    let counts: Vec<_> = tree.resources.iter().map(|r| r.ops.len()).collect();
    assert_eq!(counts, vec![2, 4, 1, 1, 5, 1]);
    assert_sorted_and_unique(&tree);
}

#[test]
fn missing_sections_are_treated_as_empty() {
    for raw in ["{}", "openapi: 3.0.0", "paths: []\ncomponents: 7\n"] {
        let tree = compile(raw, "http://x");
        assert_eq!(tree.resources.len(), EXTRAS_RESOURCES.len(), "{raw}");
    }
}

#[test]
fn empty_document_matches_embedded_tree() {
    let tree = compile("paths: {}\ncomponents: {}\n", "http://localhost:3301");
    assert_eq!(
        tree.to_json().unwrap(),
        include_str!("../schemas/command_tree.json")
    );
}

#[test]
fn fixture_matches_golden_output() {
    let tree = compile(
        include_str!("fixtures/openapi.yml"),
        "https://signoz.example.com",
    );
    let golden = include_str!("fixtures/command_tree.json");
    assert_eq!(tree, parse_command_tree(golden).unwrap());
    assert_eq!(tree.to_json().unwrap(), golden);
}

#[test]
fn fixture_details() {
    let tree = compile(
        include_str!("fixtures/openapi.yml"),
        "https://signoz.example.com",
    );
    assert_sorted_and_unique(&tree);
    assert_eq!(tree.base_url, "https://signoz.example.com");
    assert!(tree.resources.iter().all(|r| r.name != "broken"));

    let sessions = tree
        .find_op("user-sessions", "get-api-v2-user-sessions-id")
        .unwrap();
    let flags: Vec<_> = sessions.params.iter().map(|p| p.flag.as_str()).collect();
    assert_eq!(flags, vec!["id", "query-id", "header-x-request-id"]);

    let fields = tree.find_op("logs", "get-api-v1-logs-fields").unwrap();
    assert_eq!(fields.params[0].schema_type, "array<oneOf>");
    assert!(fields.params[0].is_array);
    assert_eq!(fields.tags, vec!["logs"]);

    let upload = tree.find_op("logs", "post-api-v1-logs-fields").unwrap();
    let body = upload.request_body.as_ref().unwrap();
    assert_eq!(body.content_type, "text/plain");
    assert!(!body.required);

    let delete = tree.find_op("dashboards", "delete-dashboard").unwrap();
    assert!(delete.deprecated);
    assert_eq!(delete.params[0].param_name, "uuid");

    let from_doc = tree.find_op("channels", "list-channels").unwrap();
    assert_eq!(from_doc.description.as_deref(), Some("Channels from the document."));
    let synthetic = tree.find_op("channels", "list-channels-2").unwrap();
    assert_eq!(synthetic.path, "/api/v1/channels");
}

#[test]
fn unresolvable_body_ref_uses_trailing_name() {
    let tree = compile(
        r#"
paths:
  /api/v1/pipelines:
    post:
      requestBody:
        content:
          application/json:
            schema: {$ref: '#/components/schemas/PostablePipelines'}
"#,
        "http://x",
    );
    let op = tree
        .find_op("pipelines", "post-api-v1-pipelines")
        .unwrap();
    let body = op.request_body.as_ref().unwrap();
    assert_eq!(body.schema_type, "PostablePipelines");
}

#[test]
fn output_is_stable_across_runs() {
    let raw = include_str!("fixtures/openapi.yml");
    let first = compile(raw, "http://x").to_json().unwrap();
    let second = compile(raw, "http://x").to_json().unwrap();
    assert_eq!(first, second);
}

fn arb_document() -> impl Strategy<Value = String> {
    let segment = prop::sample::select(vec![
        "rules", "alerts", "channels", "savedViews", "logs", "user_sessions", "{id}", "v1",
    ]);
    let op_id = prop::option::of(prop::sample::select(vec![
        "list", "listRules", "get_rule", "queryRange", "list-2",
    ]));
    let method = prop::sample::select(vec!["get", "post", "put", "delete"]);
    let param = prop::sample::select(vec!["id", "ID", "x_id", "xId", "limit"]);
    let location = prop::sample::select(vec!["path", "query", "header", "cookie"]);
    let tag = prop::option::of(prop::sample::select(vec!["rules", "channels", "SavedViews"]));
    let entry = (
        prop::collection::vec(segment, 1..4),
        method,
        op_id,
        tag,
        prop::collection::vec((param, location), 0..5),
    );
    prop::collection::vec(entry, 0..12).prop_map(|entries| {
        let mut out = String::from("paths:\n");
        for (idx, (segments, method, op_id, tag, params)) in entries.into_iter().enumerate() {
            out.push_str(&format!("  /p{idx}/{}:\n    {method}:\n", segments.join("/")));
            if let Some(op_id) = op_id {
                out.push_str(&format!("      operationId: {op_id}\n"));
            }
            if let Some(tag) = tag {
                out.push_str(&format!("      tags: [{tag}]\n"));
            }
            out.push_str("      parameters:\n");
            for (name, location) in params {
                out.push_str(&format!("        - {{name: {name}, in: {location}}}\n"));
            }
            if out.ends_with("parameters:\n") {
                out.push_str("        []\n");
            }
        }
        out
    })
}

proptest! {
    #[test]
    fn generated_documents_keep_tree_invariants(raw in arb_document()) {
        let tree = compile(&raw, "http://x");
        assert_sorted_and_unique(&tree);
        for name in EXTRAS_RESOURCES {
            prop_assert!(tree.resources.iter().any(|r| r.name == name));
        }
    }
}
