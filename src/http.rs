use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::source::USER_AGENT;

const API_KEY_HEADER: &str = "signoz-api-key";

pub struct HttpClient {
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
    headers: Vec<(String, String)>,
    client: Client,
}

pub struct ResponseData {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl HttpClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        token: Option<String>,
        headers: Vec<(String, String)>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("build http client")?;
        Ok(Self {
            base_url,
            api_key,
            token,
            headers,
            client,
        })
    }

    pub fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Body>,
        content_type: Option<&str>,
    ) -> Result<ResponseData> {
        let url = build_url(&self.base_url, path, query)?;
        debug!(%method, %url, "sending request");

        let mut req = self
            .client
            .request(method, url)
            .headers(self.auth_headers()?);

        if let Some(ct) = content_type {
            req = req.header(CONTENT_TYPE, ct);
        }

        if let Some(body) = body {
            req = match body {
                Body::Json(value) => req.json(&value),
                Body::Text(value) => req.body(value),
            };
        }

        let resp = req.send().context("send request")?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        let text = resp.text().context("read response body")?;
        let body = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        Ok(ResponseData {
            status,
            headers,
            body,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            headers.insert(
                HeaderName::from_static(API_KEY_HEADER),
                HeaderValue::from_str(key).context("invalid api key header")?,
            );
        }
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer(token)).context("invalid token header")?,
            );
        }
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).context("invalid header name")?;
            let value = HeaderValue::from_str(value).context("invalid header value")?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

fn bearer(token: &str) -> String {
    if token.to_ascii_lowercase().starts_with("bearer ") {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

fn build_url(base: &str, path: &str, query: &[(String, String)]) -> Result<reqwest::Url> {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = reqwest::Url::parse(&format!("{base}/{path}")).context("invalid url")?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}
