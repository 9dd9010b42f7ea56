//! File and URL readers: `{{file:path}}`, `{{url raw=true:https://...}}`

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

use super::operand;
use crate::directive::{Directive, DirectiveOutput, Environment, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// `{{file:path}}`
pub struct FileReader;

#[async_trait]
impl Directive for FileReader {
    fn name(&self) -> &str {
        "file"
    }

    fn description(&self) -> &str {
        "Text of a local file: {{file:~/notes.txt}}"
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let path = operand(token).ok_or_else(|| DirectiveError::malformed("file", "missing path"))?;
        let path = expand_home(path);
        debug!(path = %path.display(), "FileReader::apply: called");

        let meta = tokio::fs::metadata(&path).await?;
        let limit = scope.env.network().max_body_bytes;
        if meta.len() > limit as u64 {
            return Err(DirectiveError::unavailable(format!(
                "{} is larger than {limit} bytes",
                path.display()
            )));
        }
        let bytes = tokio::fs::read(&path).await?;
        Ok(DirectiveOutput::text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Fetch `url` as text, enforcing the network switch and size limit
pub(crate) async fn fetch_text(env: &Environment, url: &str) -> Result<String, DirectiveError> {
    let network = env.network();
    if !network.enabled {
        return Err(DirectiveError::unavailable("network access is disabled"));
    }
    debug!(%url, "fetch_text: called");

    let response = env.http().get(url).send().await?.error_for_status()?;
    if let Some(len) = response.content_length()
        && len > network.max_body_bytes as u64
    {
        return Err(DirectiveError::unavailable(format!("{url} is larger than {} bytes", network.max_body_bytes)));
    }

    let body = response.text().await?;
    if body.len() > network.max_body_bytes {
        return Err(DirectiveError::unavailable(format!("{url} is larger than {} bytes", network.max_body_bytes)));
    }
    info!(%url, len = body.len(), "Fetched URL");
    Ok(body)
}

/// Fetch `url` and parse the body as JSON
pub(crate) async fn fetch_json(env: &Environment, url: &str) -> Result<Value, DirectiveError> {
    let body = fetch_text(env, url).await?;
    serde_json::from_str(&body).map_err(|e| DirectiveError::unavailable(format!("{url} did not return JSON: {e}")))
}

/// `{{url:https://...}}`
pub struct UrlReader;

#[async_trait]
impl Directive for UrlReader {
    fn name(&self) -> &str {
        "url"
    }

    fn description(&self) -> &str {
        "Visible text of a web page as Markdown, or its HTML with raw=true"
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let url = operand(token).ok_or_else(|| DirectiveError::malformed("url", "missing URL"))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DirectiveError::malformed("url", format!("not an http(s) URL: {url}")));
        }
        let raw = token.args.flag("raw");
        debug!(%url, %raw, "UrlReader::apply: called");

        let body = fetch_text(scope.env, url).await?;
        let text = if raw {
            body
        } else {
            html2md::rewrite_html(&body, false).trim().to_string()
        };
        Ok(DirectiveOutput::text(text))
    }
}
