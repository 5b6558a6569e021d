use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::script::{ResolvedStep, Script};

/// HostScript is a script stored for a host
#[derive(Debug, Clone, Serialize)]
pub struct HostScript {
    pub id: i64,
    pub host_id: i64,
    #[serde(flatten)]
    pub script: Script,
    pub created_at: DateTime<Utc>,
}

/// Parameter values supplied by a caller, as JSON scalars
pub type ParamValues = HashMap<String, serde_json::Value>;

/// Convert JSON parameter values to the text substituted into commands.
/// Strings are used as-is; other values use their JSON form.
pub fn param_strings(params: &ParamValues) -> HashMap<String, String> {
    params
        .iter()
        .map(|(name, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), text)
        })
        .collect()
}

/// PreviewScriptRequest resolves a script without sending anything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewScriptRequest {
    #[serde(default)]
    pub params: ParamValues,
    #[serde(default)]
    pub wait_override_ms: Option<u64>,
}

/// RunScriptRequest pushes a script to a host over SSH
#[derive(Debug, Clone, Deserialize)]
pub struct RunScriptRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub params: ParamValues,
    #[serde(default)]
    pub wait_override_ms: Option<u64>,
}

pub fn wait_override(ms: Option<u64>) -> Option<Duration> {
    ms.map(Duration::from_millis)
}

/// PreviewStep is one resolved command in a preview
#[derive(Debug, Clone, Serialize)]
pub struct PreviewStep {
    pub step: usize,
    pub command: String,
    pub wait_before_ms: u64,
    pub wait_after_ms: u64,
}

impl From<ResolvedStep> for PreviewStep {
    fn from(step: ResolvedStep) -> Self {
        Self {
            step: step.step,
            command: step.command,
            wait_before_ms: step.wait_before.as_millis() as u64,
            wait_after_ms: step.wait_after.as_millis() as u64,
        }
    }
}

/// ScriptPreviewResponse lists the commands a run would send
#[derive(Debug, Clone, Serialize)]
pub struct ScriptPreviewResponse {
    pub host: String,
    pub script: String,
    pub steps: Vec<PreviewStep>,
}
