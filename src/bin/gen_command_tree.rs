use anyhow::{Context, Result};
use clap::{Arg, Command};
use signoz_cli::openapi::{CompileConfig, build_command_tree};
use signoz_cli::source::{parse_document, read_source, write_output};
use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_OPENAPI: &str = "schemas/openapi.yml";
const DEFAULT_OUT: &str = "schemas/command_tree.json";
const DEFAULT_BASE_URL: &str = "http://localhost:3301";

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

fn run() -> Result<()> {
    let default_base_url =
        env::var("SIGNOZ_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let matches = Command::new("gen_command_tree")
        .about("Generate CLI command tree from OpenAPI")
        .arg(
            Arg::new("openapi")
                .long("openapi")
                .value_name("PATH|URL")
                .default_value(DEFAULT_OPENAPI),
        )
        .arg(Arg::new("out").long("out").value_name("PATH").default_value(DEFAULT_OUT))
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .default_value(default_base_url),
        )
        .get_matches();

    let openapi = matches
        .get_one::<String>("openapi")
        .context("openapi path missing")?;
    let out_path = matches.get_one::<String>("out").context("out path missing")?;
    let base_url = matches
        .get_one::<String>("base-url")
        .context("base url missing")?;

    let raw = read_source(openapi)?;
    let doc = parse_document(&raw)?;
    let config = CompileConfig {
        base_url: base_url.clone(),
    };
    let tree = build_command_tree(&doc, &config);
    write_output(out_path, tree.to_json()?.as_bytes())?;
    println!("{out_path}");
    Ok(())
}
