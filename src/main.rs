use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::{Value, json};
use signoz_cli::command_tree::{self, CommandTree};
use signoz_cli::http::{Body, HttpClient, ResponseData};
use signoz_cli::request::{
    BODY_ARG, build_body, build_op_command, build_request_parts, cli_flags, parse_key_values,
    read_body_input, split_header, split_query,
};
use std::{env, io::Write};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct Connection {
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<u64>,
}

impl Connection {
    fn from_matches(tree: &CommandTree, matches: &ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>("base-url")
            .cloned()
            .or_else(|| env::var("SIGNOZ_API_URL").ok())
            .unwrap_or_else(|| tree.base_url.clone());
        let api_key = matches
            .get_one::<String>("api-key")
            .cloned()
            .or_else(|| env::var("SIGNOZ_API_KEY").ok());
        let token = matches
            .get_one::<String>("token")
            .cloned()
            .or_else(|| env::var("SIGNOZ_TOKEN").ok());
        let headers = matches
            .get_many::<String>("header")
            .map(|values| parse_key_values(values, split_header))
            .unwrap_or_default();
        let timeout = matches
            .get_one::<String>("timeout")
            .map(|v| v.parse::<u64>().context("invalid --timeout"))
            .transpose()?;
        Ok(Self {
            base_url,
            api_key,
            token,
            headers,
            timeout,
        })
    }

    fn client(self, extra_headers: Vec<(String, String)>) -> Result<HttpClient> {
        let mut headers = self.headers;
        headers.extend(extra_headers);
        HttpClient::new(self.base_url, self.api_key, self.token, headers, self.timeout)
    }
}

fn run() -> Result<()> {
    let tree = command_tree::load_command_tree()?;
    let cli = build_cli(&tree);
    let matches = cli.get_matches();

    if let Some(matches) = matches.subcommand_matches("list") {
        return handle_list(&tree, matches);
    }
    if let Some(matches) = matches.subcommand_matches("describe") {
        return handle_describe(&tree, matches);
    }
    if let Some(matches) = matches.subcommand_matches("tree") {
        return handle_tree(&tree, matches);
    }
    if let Some(api_matches) = matches.subcommand_matches("api") {
        return handle_api(&tree, &matches, api_matches);
    }

    let (res_name, res_matches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("resource required"))?;
    let (op_name, op_matches) = res_matches
        .subcommand()
        .ok_or_else(|| anyhow!("operation required"))?;

    let op = tree
        .find_op(res_name, op_name)
        .ok_or_else(|| anyhow!("unknown command {res_name} {op_name}"))?;

    let parts = build_request_parts(op, op_matches)?;
    let (body, content_type) = build_body(op, op_matches)?;

    let client = Connection::from_matches(&tree, &matches)?.client(parts.headers)?;
    let method = op.method.parse().context("invalid http method")?;
    let response = client.execute(method, &parts.path, &parts.query, body, content_type.as_deref())?;

    finish(&matches, response)
}

fn build_cli(tree: &CommandTree) -> Command {
    let mut cmd = Command::new("signoz")
        .about("SigNoz CLI (OpenAPI-powered)")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .global(true)
                .help("SigNoz API base URL (SIGNOZ_API_URL)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .global(true)
                .help("SigNoz API key (SIGNOZ_API_KEY)"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .global(true)
                .help("SigNoz bearer token (SIGNOZ_TOKEN)"),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .value_name("NAME:VALUE")
                .global(true)
                .action(ArgAction::Append)
                .help("Extra header (repeatable)"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .global(true)
                .help("HTTP timeout in seconds"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Return status + headers + body"),
        );

    cmd = cmd.subcommand(
        Command::new("list")
            .about("List resources and operations")
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("describe")
            .about("Describe a specific operation")
            .arg(Arg::new("resource").required(true))
            .arg(Arg::new("op").required(true))
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("tree")
            .about("Show full command tree")
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("api")
            .about("Call any API endpoint")
            .arg(Arg::new("method").required(true))
            .arg(Arg::new("path").required(true))
            .arg(
                Arg::new("query")
                    .long("query")
                    .action(ArgAction::Append)
                    .value_name("KEY=VALUE")
                    .help("Query param (repeatable)"),
            )
            .arg(
                Arg::new(BODY_ARG)
                    .long(BODY_ARG)
                    .value_name("JSON|@file|@-")
                    .help("JSON request body"),
            ),
    );

    for resource in &tree.resources {
        let mut res_cmd = Command::new(resource.name.clone())
            .about(resource.name.clone())
            .subcommand_required(true)
            .arg_required_else_help(true);
        for op in &resource.ops {
            res_cmd = res_cmd.subcommand(build_op_command(op));
        }
        cmd = cmd.subcommand(res_cmd);
    }

    cmd
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Emit machine-readable JSON")
}

fn handle_list(tree: &CommandTree, matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("json") {
        let out: Vec<Value> = tree
            .resources
            .iter()
            .map(|res| {
                let ops: Vec<&str> = res.ops.iter().map(|op| op.name.as_str()).collect();
                json!({"resource": res.name, "ops": ops})
            })
            .collect();
        return write_stdout_line(&serde_json::to_string_pretty(&out)?);
    }

    for res in &tree.resources {
        write_stdout_line(&res.name)?;
        for op in &res.ops {
            write_stdout_line(&format!("  {}", op.name))?;
        }
    }
    Ok(())
}

fn handle_describe(tree: &CommandTree, matches: &ArgMatches) -> Result<()> {
    let resource = matches
        .get_one::<String>("resource")
        .ok_or_else(|| anyhow!("resource required"))?;
    let op_name = matches
        .get_one::<String>("op")
        .ok_or_else(|| anyhow!("operation required"))?;

    let op = tree
        .find_op(resource, op_name)
        .ok_or_else(|| anyhow!("unknown command {resource} {op_name}"))?;

    if matches.get_flag("json") {
        return write_stdout_line(&serde_json::to_string_pretty(op)?);
    }

    write_stdout_line(&format!("{resource} {}", op.name))?;
    write_stdout_line(&format!("  method: {}", op.method))?;
    write_stdout_line(&format!("  path: {}", op.path))?;
    if let Some(summary) = &op.summary {
        write_stdout_line(&format!("  summary: {summary}"))?;
    }
    if let Some(description) = &op.description {
        write_stdout_line(&format!("  description: {}", description.trim()))?;
    }
    if op.deprecated {
        write_stdout_line("  deprecated: true")?;
    }
    if !op.params.is_empty() {
        write_stdout_line("  params:")?;
        for (param, flag) in op.params.iter().zip(cli_flags(op)) {
            write_stdout_line(&format!(
                "    --{flag}  {} ({}, required: {})",
                param.schema_type, param.location, param.required
            ))?;
        }
    }
    if let Some(body) = &op.request_body {
        write_stdout_line(&format!(
            "  body: {} ({}, required: {})",
            body.schema_type, body.content_type, body.required
        ))?;
    }
    Ok(())
}

fn handle_tree(tree: &CommandTree, matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("json") {
        return write_stdout_line(&tree.to_json()?);
    }
    for res in &tree.resources {
        write_stdout_line(&res.name)?;
        for op in &res.ops {
            write_stdout_line(&format!("  {} {} {}", op.name, op.method, op.path))?;
        }
    }
    Ok(())
}

fn handle_api(tree: &CommandTree, root: &ArgMatches, matches: &ArgMatches) -> Result<()> {
    let method = matches
        .get_one::<String>("method")
        .ok_or_else(|| anyhow!("method required"))?;
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow!("path required"))?;

    let query = matches
        .get_many::<String>("query")
        .map(|values| parse_key_values(values, split_query))
        .unwrap_or_default();
    let body = matches
        .get_one::<String>(BODY_ARG)
        .map(|raw| -> Result<Body> {
            let raw = read_body_input(raw)?;
            Ok(Body::Json(serde_json::from_str(&raw).context("invalid JSON body")?))
        })
        .transpose()?;
    let content_type = body.as_ref().map(|_| "application/json");

    let client = Connection::from_matches(tree, root)?.client(Vec::new())?;
    let method = method
        .to_ascii_uppercase()
        .parse()
        .context("invalid http method")?;
    let response = client.execute(method, path, &query, body, content_type)?;

    finish(root, response)
}

fn finish(matches: &ArgMatches, response: ResponseData) -> Result<()> {
    let status = response.status;
    let output = if matches.get_flag("raw") {
        json!({
            "status": response.status,
            "headers": response.headers,
            "body": response.body,
        })
    } else {
        response.body
    };

    if matches.get_flag("pretty") {
        write_stdout_line(&serde_json::to_string_pretty(&output)?)?;
    } else {
        write_stdout_line(&serde_json::to_string(&output)?)?;
    }

    if status >= 400 {
        return Err(anyhow!("http {status}"));
    }
    Ok(())
}

fn write_stdout_line(line: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(line.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
