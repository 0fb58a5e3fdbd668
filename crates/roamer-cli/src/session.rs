//! Stdio tool server.
//!
//! One JSON request per input line, one JSON response per output line. The
//! explorer is owned by the loop and requests are handled strictly in order.

use crate::error::CliResult;
use roamer::{tool_specs, DeviceDriver, DeviceFixture, Explorer, ExplorerConfig, MockDriver, ERROR_PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Request name answered with the tool specs instead of a tool call
pub const LIST_TOOLS: &str = "list_tools";

/// One request line
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolRequest {
    /// Tool name
    pub name: String,
    /// Flat argument object
    #[serde(default)]
    pub arguments: Value,
}

/// Text block inside a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    /// Always `text`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Tool payload
    pub text: String,
}

/// One response line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResponse {
    /// Content blocks
    pub content: Vec<TextContent>,
}

impl ToolResponse {
    /// Single text block
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: text.into(),
            }],
        }
    }
}

/// Build an explorer over a fixture, with an optional config file
pub fn open_explorer(
    fixture: &Path,
    config: Option<&Path>,
) -> CliResult<Explorer<MockDriver>> {
    let fixture = DeviceFixture::load(fixture)?;
    let config = match config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    debug!(screens = fixture.screens.len(), "fixture loaded");
    Ok(Explorer::new(MockDriver::new(fixture), config))
}

/// Answer one request line
pub async fn respond<D: DeviceDriver>(explorer: &mut Explorer<D>, line: &str) -> CliResult<Value> {
    let response = match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) if request.name == LIST_TOOLS => json!({ "tools": tool_specs() }),
        Ok(request) => {
            let text = explorer.call(&request.name, &request.arguments).await;
            serde_json::to_value(ToolResponse::text(text))?
        }
        Err(e) => serde_json::to_value(ToolResponse::text(format!(
            "{ERROR_PREFIX}Invalid request: {e}"
        )))?,
    };
    Ok(response)
}

/// Serve requests until the reader is exhausted; returns the number answered
pub async fn serve<D, R, W>(explorer: &mut Explorer<D>, reader: R, mut writer: W) -> CliResult<usize>
where
    D: DeviceDriver,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut served = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = respond(explorer, line).await?;
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
        served += 1;
    }
    info!(served, "input closed");
    Ok(served)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use roamer::{MockElement, MockScreen};

    fn explorer() -> Explorer<MockDriver> {
        let fixture = DeviceFixture::new(vec![MockScreen::new(
            "home",
            vec![
                MockElement::text("Home").clickable(),
                MockElement::text("Search").clickable(),
            ],
        )]);
        Explorer::new(MockDriver::new(fixture), ExplorerConfig::instant())
    }

    fn responses(output: &[u8]) -> Vec<Value> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serves_each_line_in_order() {
        let mut explorer = explorer();
        let input = concat!(
            r#"{"name":"inspect_screen","arguments":{}}"#,
            "\n\n",
            r#"{"name":"gesture","arguments":{"type":"tap","target":"Search"}}"#,
            "\n",
        );
        let mut output = Vec::new();
        let served = serve(&mut explorer, input.as_bytes(), &mut output).await.unwrap();
        assert_eq!(served, 2);

        let responses = responses(&output);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["content"][0]["type"], "text");
        let snapshot: Value =
            serde_json::from_str(responses[0]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(snapshot["current_page"], "Home");
        assert!(explorer.session().page("Home").unwrap().element("Search").unwrap().tested);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let mut explorer = explorer();
        let response = respond(&mut explorer, r#"{"name":"list_tools"}"#).await.unwrap();
        assert_eq!(response["tools"].as_array().unwrap().len(), 7);
        assert_eq!(response["tools"][0]["name"], "inspect_screen");
    }

    #[tokio::test]
    async fn test_missing_arguments_default_to_empty() {
        let mut explorer = explorer();
        let response = respond(&mut explorer, r#"{"name":"analyze_gaps"}"#).await.unwrap();
        let text = response["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("No current page to analyze"));
    }

    #[tokio::test]
    async fn test_malformed_line_is_error_payload() {
        let mut explorer = explorer();
        let response = respond(&mut explorer, "not json").await.unwrap();
        let text = response["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: Invalid request"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_payload() {
        let mut explorer = explorer();
        let response = respond(&mut explorer, r#"{"name":"fly"}"#).await.unwrap();
        assert_eq!(response["content"][0]["text"], "Error: Unknown tool: fly");
    }
}
