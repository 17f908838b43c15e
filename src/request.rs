//! Turning parsed command-line arguments into an HTTP request for one
//! operation of the command tree.

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use urlencoding::encode;

use crate::command_tree::{Operation, ParamDef};
use crate::http::Body;

pub const BODY_ARG: &str = "body";

/// Long flags owned by the root command, clap itself, or `--body`.
pub const RESERVED_FLAGS: [&str; 9] = [
    BODY_ARG, "base-url", "api-key", "token", "header", "timeout", "pretty", "raw", "help",
];

pub struct RequestParts {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

/// Subcommand for one operation: a `--{flag}` per parameter, plus `--body`
/// when the operation accepts a request body.
pub fn build_op_command(op: &Operation) -> Command {
    let mut cmd = Command::new(op.name.clone())
        .about(op.summary.clone().unwrap_or_else(|| op.path.clone()));
    if op.deprecated {
        cmd = cmd.before_help("deprecated");
    }
    for (param, flag) in op.params.iter().zip(cli_flags(op)) {
        cmd = cmd.arg(build_param_arg(param, flag));
    }
    if let Some(body) = &op.request_body {
        cmd = cmd.arg(
            Arg::new(BODY_ARG)
                .long(BODY_ARG)
                .value_name("JSON|@file|@-")
                .help(format!("Request body ({}, {})", body.content_type, body.schema_type)),
        );
    }
    cmd
}

/// Command-line flag for each parameter of `op`, in parameter order. A flag
/// that clashes with a reserved name becomes `{location}-{flag}`; the wire
/// name stays `param_name`.
pub fn cli_flags(op: &Operation) -> Vec<String> {
    let taken: HashSet<&str> = op.params.iter().map(|p| p.flag.as_str()).collect();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(op.params.len());
    for param in &op.params {
        let mut flag = param.flag.clone();
        if RESERVED_FLAGS.contains(&flag.as_str()) {
            let qualified = format!("{}-{}", param.location, param.flag);
            flag = qualified.clone();
            let mut suffix = 2;
            while RESERVED_FLAGS.contains(&flag.as_str())
                || taken.contains(flag.as_str())
                || assigned.contains(&flag)
            {
                flag = format!("{qualified}-{suffix}");
                suffix += 1;
            }
        }
        assigned.insert(flag.clone());
        out.push(flag);
    }
    out
}

fn build_param_arg(param: &ParamDef, flag: String) -> Arg {
    let mut arg = Arg::new(flag.clone())
        .long(flag)
        .value_name(param.schema_type.clone())
        .help(format!("{} parameter {}", param.location, param.param_name));
    if param.is_array {
        arg = arg.action(ArgAction::Append);
    }
    arg
}

/// Fills path placeholders and collects query and header pairs, keyed by the
/// parameter names the API expects.
pub fn build_request_parts(op: &Operation, matches: &ArgMatches) -> Result<RequestParts> {
    let mut path = op.path.clone();
    let mut query = Vec::new();
    let mut headers = Vec::new();

    for (param, flag) in op.params.iter().zip(cli_flags(op)) {
        let values: Option<Vec<String>> = if param.is_array {
            matches
                .get_many::<String>(&flag)
                .map(|vals| vals.cloned().collect())
        } else {
            matches.get_one::<String>(&flag).map(|v| vec![v.clone()])
        };

        let Some(mut values) = values else {
            if param.required {
                return Err(anyhow!("missing required argument --{flag}"));
            }
            continue;
        };

        if param.is_array && values.len() == 1 && values[0].trim_start().starts_with('[') {
            values = parse_json_list(&values[0])?;
        }

        match param.location.as_str() {
            "path" => {
                let value = values
                    .first()
                    .ok_or_else(|| anyhow!("missing value for --{flag}"))?;
                path = path.replace(&format!("{{{}}}", param.param_name), &encode(value));
            }
            "query" => {
                for value in values {
                    query.push((param.param_name.clone(), value));
                }
            }
            "header" => {
                for value in values {
                    headers.push((param.param_name.clone(), value));
                }
            }
            _ => {}
        }
    }

    Ok(RequestParts {
        path,
        query,
        headers,
    })
}

/// Reads `--body` for operations that accept one. JSON content types are
/// parsed, anything else is sent as text.
pub fn build_body(op: &Operation, matches: &ArgMatches) -> Result<(Option<Body>, Option<String>)> {
    let Some(body_def) = &op.request_body else {
        return Ok((None, None));
    };
    let content_type = Some(body_def.content_type.clone());

    let Some(value) = matches.get_one::<String>(BODY_ARG) else {
        if body_def.required {
            return Err(anyhow!("missing required --body"));
        }
        return Ok((None, content_type));
    };

    let raw = read_body_input(value)?;
    if body_def.content_type.contains("json") {
        let parsed: Value = serde_json::from_str(&raw).context("invalid JSON body")?;
        return Ok((Some(Body::Json(parsed)), content_type));
    }
    Ok((Some(Body::Text(raw)), content_type))
}

/// `@-` or `-` reads stdin, `@path` reads a file, anything else is literal.
pub fn read_body_input(value: &str) -> Result<String> {
    if value == "@-" || value == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read body from stdin")?;
        return Ok(buf);
    }
    if let Some(path) = value.strip_prefix('@') {
        return fs::read_to_string(path).with_context(|| format!("read body file {path}"));
    }
    Ok(value.to_string())
}

pub fn parse_json_list(raw: &str) -> Result<Vec<String>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON list")?;
    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow!("expected JSON array"))?;
    Ok(items
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

pub fn parse_key_values<'a>(
    values: impl IntoIterator<Item = &'a String>,
    split: fn(&str) -> Option<(&str, &str)>,
) -> Vec<(String, String)> {
    values
        .into_iter()
        .filter_map(|raw| split(raw))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `NAME:VALUE`, falling back to `NAME=VALUE`.
pub fn split_header(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .or_else(|| value.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
}

/// `KEY=VALUE`, falling back to `KEY:VALUE`.
pub fn split_query(value: &str) -> Option<(&str, &str)> {
    value
        .split_once('=')
        .or_else(|| value.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_tree::RequestBodyDef;

    fn param(name: &str, flag: &str, location: &str, required: bool, is_array: bool) -> ParamDef {
        ParamDef {
            param_name: name.to_string(),
            name: format!("{location}__{flag}"),
            flag: flag.to_string(),
            location: location.to_string(),
            required,
            schema_type: "string".to_string(),
            is_array,
        }
    }

    fn operation(params: Vec<ParamDef>, request_body: Option<RequestBodyDef>) -> Operation {
        Operation {
            name: "get-rule".to_string(),
            method: "GET".to_string(),
            path: "/api/v1/rules/{ruleId}".to_string(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            params,
            request_body,
        }
    }

    fn matches(op: &Operation, args: &[&str]) -> ArgMatches {
        let mut argv = vec![op.name.as_str()];
        argv.extend_from_slice(args);
        build_op_command(op).try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn path_query_and_header_params() {
        let op = operation(
            vec![
                param("ruleId", "rule-id", "path", true, false),
                param("labels", "labels", "query", false, true),
                param("X-Org", "header-x-org", "header", false, false),
            ],
            None,
        );
        let m = matches(
            &op,
            &["--rule-id", "a/b", "--labels", "x", "--labels", "y", "--header-x-org", "acme"],
        );
        let parts = build_request_parts(&op, &m).unwrap();
        assert_eq!(parts.path, "/api/v1/rules/a%2Fb");
        assert_eq!(
            parts.query,
            vec![
                ("labels".to_string(), "x".to_string()),
                ("labels".to_string(), "y".to_string()),
            ]
        );
        assert_eq!(parts.headers, vec![("X-Org".to_string(), "acme".to_string())]);
    }

    #[test]
    fn json_list_expands_array_param() {
        let op = operation(vec![param("ids", "ids", "query", false, true)], None);
        let m = matches(&op, &["--ids", "[1, \"two\", true]"]);
        let parts = build_request_parts(&op, &m).unwrap();
        let values: Vec<_> = parts.query.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["1", "two", "true"]);
    }

    #[test]
    fn missing_required_param_is_an_error() {
        let op = operation(vec![param("ruleId", "rule-id", "path", true, false)], None);
        let m = matches(&op, &[]);
        let err = build_request_parts(&op, &m).err().unwrap();
        assert_eq!(err.to_string(), "missing required argument --rule-id");
    }

    #[test]
    fn body_handling() {
        let body = RequestBodyDef {
            required: true,
            content_type: "application/json".to_string(),
            schema_type: "object".to_string(),
        };
        let op = operation(Vec::new(), Some(body));

        let m = matches(&op, &["--body", "{\"name\": \"cpu\"}"]);
        let (parsed, ct) = build_body(&op, &m).unwrap();
        assert_eq!(parsed, Some(Body::Json(serde_json::json!({"name": "cpu"}))));
        assert_eq!(ct.as_deref(), Some("application/json"));

        let m = matches(&op, &[]);
        let err = build_body(&op, &m).err().unwrap();
        assert_eq!(err.to_string(), "missing required --body");

        let m = matches(&op, &["--body", "{not json"]);
        assert!(build_body(&op, &m).is_err());
    }

    #[test]
    fn text_body_is_sent_verbatim() {
        let body = RequestBodyDef {
            required: false,
            content_type: "text/plain".to_string(),
            schema_type: "string".to_string(),
        };
        let op = operation(Vec::new(), Some(body));
        let m = matches(&op, &["--body", "hello"]);
        let (parsed, _) = build_body(&op, &m).unwrap();
        assert_eq!(parsed, Some(Body::Text("hello".to_string())));
    }

    #[test]
    fn no_body_for_operations_without_one() {
        let op = operation(Vec::new(), None);
        let m = matches(&op, &[]);
        assert_eq!(build_body(&op, &m).unwrap(), (None, None));
    }

    #[test]
    fn key_value_splitting() {
        assert_eq!(split_header("X-Org: acme"), Some(("X-Org", "acme")));
        assert_eq!(split_header("limit=10"), Some(("limit", "10")));
        assert_eq!(split_header("nothing"), None);
        assert_eq!(split_query("start=2024-01-01T00:00"), Some(("start", "2024-01-01T00:00")));

        let raw = vec!["a=1".to_string(), "bad".to_string(), "b:2".to_string()];
        assert_eq!(
            parse_key_values(&raw, split_query),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn reserved_flags_are_location_qualified() {
        let body = RequestBodyDef {
            required: true,
            content_type: "application/json".to_string(),
            schema_type: "object".to_string(),
        };
        let op = operation(
            vec![
                param("body", "body", "query", false, false),
                param("token", "token", "path", true, false),
                param("help", "help", "query", false, false),
                param("query-help", "query-help", "query", false, false),
            ],
            Some(body),
        );
        assert_eq!(
            cli_flags(&op),
            vec!["query-body", "path-token", "query-help-2", "query-help"]
        );

        let m = matches(
            &op,
            &["--query-body", "q", "--path-token", "t", "--body", "{}"],
        );
        let parts = build_request_parts(&op, &m).unwrap();
        assert_eq!(parts.query, vec![("body".to_string(), "q".to_string())]);
        let (parsed, _) = build_body(&op, &m).unwrap();
        assert_eq!(parsed, Some(Body::Json(serde_json::json!({}))));
    }

    #[test]
    fn missing_reserved_param_reports_cli_flag() {
        let op = operation(vec![param("token", "token", "path", true, false)], None);
        let m = matches(&op, &[]);
        let err = build_request_parts(&op, &m).err().unwrap();
        assert_eq!(err.to_string(), "missing required argument --path-token");
    }

    #[test]
    fn literal_body_input() {
        assert_eq!(read_body_input("{}").unwrap(), "{}");
        assert!(read_body_input("@/definitely/not/here.json").is_err());
    }
}
