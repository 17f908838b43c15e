//! Hand-authored operations the upstream document does not declare.
//!
//! Both batches append to their resource bucket, creating it when the
//! document walk did not.

use crate::command_tree::{Operation, ParamDef, RequestBodyDef};
use crate::naming::safe_kebab;
use crate::ordered::OrderedMap;

pub const QUERY_RANGE_RESOURCES: [&str; 3] = ["logs", "traces", "metrics"];
pub const QUERY_RANGE_PATH: &str = "/api/v5/query_range";
pub const QUERY_RANGE_SCHEMA: &str = "QueryRangeRequest";

const JSON: &str = "application/json";
const DOCUMENTED: &str = "documented in SigNoz alerting docs";
const UNDOCUMENTED: &str = "undocumented; verify against your SigNoz version";

pub fn add_query_range_extras(resources: &mut OrderedMap<String, Vec<Operation>>) {
    for res in QUERY_RANGE_RESOURCES {
        let op = Operation {
            name: "query-range".to_string(),
            method: "POST".to_string(),
            path: QUERY_RANGE_PATH.to_string(),
            summary: Some(format!("Query range for {res}")),
            description: Some("SigNoz query_range API".to_string()),
            tags: vec![res.to_string()],
            deprecated: false,
            params: Vec::new(),
            request_body: Some(json_body(QUERY_RANGE_SCHEMA)),
        };
        resources.entry_or_default(res.to_string()).push(op);
    }
}

pub fn add_alerting_extras(resources: &mut OrderedMap<String, Vec<Operation>>) {
    let channels = [
        Extra::new("list-channels", "GET", "/api/v1/channels", "List notification channels"),
        Extra::new("create-channel", "POST", "/api/v1/channels", "Create notification channel").body(),
        Extra::new("update-channel", "PUT", "/api/v1/channels/{id}", "Update notification channel")
            .id()
            .body(),
        Extra::new("delete-channel", "DELETE", "/api/v1/channels/{id}", "Delete notification channel").id(),
    ];
    let rules = [
        Extra::new("list-rules", "GET", "/api/v1/rules", "List alert rules"),
        Extra::new("get-rule", "GET", "/api/v1/rules/{id}", "Get alert rule").id(),
        Extra::new("create-rule", "POST", "/api/v1/rules", "Create alert rule").body(),
        Extra::new("update-rule", "PUT", "/api/v1/rules/{id}", "Update alert rule")
            .id()
            .body(),
        Extra::new("delete-rule", "DELETE", "/api/v1/rules/{id}", "Delete alert rule").id(),
    ];
    let alerts = [
        Extra::new("list-alerts", "GET", "/api/v1/alerts", "List alerts"),
        Extra::new("get-alert", "GET", "/api/v1/alerts/{id}", "Get alert").id(),
    ];

    extend(resources, "channels", DOCUMENTED, &channels);
    extend(resources, "rules", UNDOCUMENTED, &rules);
    extend(resources, "alerts", UNDOCUMENTED, &alerts);
}

struct Extra {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    summary: &'static str,
    id_param: bool,
    body: bool,
}

impl Extra {
    fn new(
        name: &'static str,
        method: &'static str,
        path: &'static str,
        summary: &'static str,
    ) -> Self {
        Self {
            name,
            method,
            path,
            summary,
            id_param: false,
            body: false,
        }
    }

    fn id(mut self) -> Self {
        self.id_param = true;
        self
    }

    fn body(mut self) -> Self {
        self.body = true;
        self
    }

    fn to_operation(&self, resource: &str, note: &str) -> Operation {
        let params = if self.id_param {
            vec![path_param("id")]
        } else {
            Vec::new()
        };
        Operation {
            name: self.name.to_string(),
            method: self.method.to_string(),
            path: self.path.to_string(),
            summary: Some(self.summary.to_string()),
            description: Some(format!("{} ({note}).", self.summary)),
            tags: vec![resource.to_string()],
            deprecated: false,
            params,
            request_body: self.body.then(|| json_body("object")),
        }
    }
}

fn extend(
    resources: &mut OrderedMap<String, Vec<Operation>>,
    resource: &str,
    note: &str,
    extras: &[Extra],
) {
    resources
        .entry_or_default(resource.to_string())
        .extend(extras.iter().map(|extra| extra.to_operation(resource, note)));
}

fn path_param(name: &str) -> ParamDef {
    let flag = safe_kebab(name);
    ParamDef {
        param_name: name.to_string(),
        name: format!("path__{flag}"),
        flag,
        location: "path".to_string(),
        required: true,
        schema_type: "string".to_string(),
        is_array: false,
    }
}

fn json_body(schema_type: &str) -> RequestBodyDef {
    RequestBodyDef {
        required: true,
        content_type: JSON.to_string(),
        schema_type: schema_type.to_string(),
    }
}
