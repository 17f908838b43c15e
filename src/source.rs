//! Reading the source document and writing generated files.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const USER_AGENT: &str = "signoz-cli";

/// Reads `url_or_path` from disk when such a file exists, otherwise fetches
/// it over HTTP.
pub fn read_source(url_or_path: &str) -> Result<Vec<u8>> {
    if Path::new(url_or_path).exists() {
        debug!(path = url_or_path, "reading openapi from file");
        return fs::read(url_or_path).with_context(|| format!("read openapi {url_or_path}"));
    }

    debug!(url = url_or_path, "fetching openapi");
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("build http client")?;
    let resp = client
        .get(url_or_path)
        .send()
        .with_context(|| format!("fetch {url_or_path}"))?
        .error_for_status()
        .with_context(|| format!("fetch {url_or_path}"))?;
    let bytes = resp.bytes().context("read response body")?;
    Ok(bytes.to_vec())
}

/// Parses a YAML or JSON document.
pub fn parse_document(raw: &[u8]) -> Result<Value> {
    serde_yaml::from_slice(raw).context("parse openapi document")
}

/// Writes `contents`, creating missing parent directories first.
pub fn write_output(path: &str, contents: &[u8]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {path}"))
}
