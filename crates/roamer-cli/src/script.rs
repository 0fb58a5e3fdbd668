//! Scripted tool sessions

use crate::error::{CliError, CliResult};
use crate::output::is_error_payload;
use roamer::{DeviceDriver, Explorer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// A named sequence of tool calls
///
/// ```yaml
/// name: search smoke
/// steps:
///   - tool: inspect_screen
///   - tool: gesture
///     arguments: { type: tap, target: Search }
///   - tool: analyze_gaps
///     arguments: { scope: all }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Label for logs
    #[serde(default)]
    pub name: Option<String>,
    /// Calls in order
    pub steps: Vec<ScriptStep>,
}

/// One tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Tool name
    pub tool: String,
    /// Flat argument object; absent means `{}`
    #[serde(default)]
    pub arguments: Value,
}

impl Script {
    /// Parse a YAML script
    pub fn from_yaml_str(yaml: &str) -> CliResult<Self> {
        let script: Self = serde_yaml_ng::from_str(yaml)?;
        if script.steps.is_empty() {
            return Err(CliError::script("script defines no steps"));
        }
        Ok(script)
    }

    /// Load a YAML script file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// Payload produced by one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Tool that ran
    pub tool: String,
    /// Its text payload
    pub payload: String,
}

impl StepResult {
    /// Whether the payload reports an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        is_error_payload(&self.payload)
    }
}

/// Run every step in order; a failing step does not stop the script
pub async fn run_script<D: DeviceDriver>(
    explorer: &mut Explorer<D>,
    script: &Script,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(script.steps.len());
    for step in &script.steps {
        let payload = explorer.call(&step.tool, &step.arguments).await;
        results.push(StepResult {
            tool: step.tool.clone(),
            payload,
        });
    }
    let errors = results.iter().filter(|r| r.is_error()).count();
    info!(
        script = script.name.as_deref().unwrap_or("unnamed"),
        steps = results.len(),
        errors,
        "script finished"
    );
    results
}
