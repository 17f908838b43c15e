use anyhow::{Context, Result};
use clap::{Arg, Command};
use signoz_cli::source::{read_source, write_output};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "https://raw.githubusercontent.com/SigNoz/signoz/main/docs/api/openapi.yml";
const DEFAULT_OUT: &str = "schemas/openapi.yml";

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
    let default_url = env::var("SIGNOZ_OPENAPI_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());

    let matches = Command::new("fetch_openapi")
        .about("Fetch SigNoz OpenAPI spec")
        .arg(Arg::new("url").long("url").value_name("URL|PATH").default_value(default_url))
        .arg(Arg::new("out").long("out").value_name("PATH").default_value(DEFAULT_OUT))
        .get_matches();

    let url = matches.get_one::<String>("url").context("url missing")?;
    let out_path = matches.get_one::<String>("out").context("out path missing")?;

    let data = read_source(url)?;
    info!(bytes = data.len(), url = %url, "fetched openapi");
    write_output(out_path, &data)?;
    println!("{out_path}");
    Ok(())
}
