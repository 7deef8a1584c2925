//! Transport encoding
//!
//! The backend expects trigger and action `details` as a JSON-encoded string
//! embedded in the outer JSON body:
//!
//! ```json
//! { "type": "Date", "details": "{\"operator\":\"before\",\"value\":\"2024-01-01T10:00\"}" }
//! ```
//!
//! The in-memory model never sees that string. Encoding happens only in the
//! request bodies defined here; decoding of responses accepts `details` either
//! as a string or as a plain object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{ActionKind, FlowAction};
use crate::error::{EvflowError, EvflowResult};
use crate::flow::{Flow, FlowTemplate};
use crate::trigger::{FlowTrigger, TriggerKind};

/// Trigger as sent in create/update bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTrigger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: TriggerKind,

    /// JSON-encoded details object
    pub details: String,
}

/// Action as sent in create/update bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// JSON-encoded details object
    pub details: String,
}

/// Flow create/update body, triggers and actions included as a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFlow {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub multiple_runs: bool,

    pub triggers: Vec<WireTrigger>,

    pub actions: Vec<WireAction>,
}

impl WireTrigger {
    /// Encode a trigger; `include_id` keeps client-side ids so that recipient
    /// bindings in the same batch stay resolvable.
    pub fn encode(trigger: &FlowTrigger, include_id: bool) -> EvflowResult<Self> {
        Ok(Self {
            id: include_id.then(|| trigger.id.clone()),
            kind: trigger.details.kind(),
            details: serde_json::to_string(&trigger.details.to_value()?)?,
        })
    }
}

impl WireAction {
    pub fn encode(action: &FlowAction, include_id: bool) -> EvflowResult<Self> {
        Ok(Self {
            id: include_id.then(|| action.id.clone()),
            kind: action.details.kind(),
            details: serde_json::to_string(&action.details.to_value()?)?,
        })
    }
}

impl WireFlow {
    pub fn from_flow(flow: &Flow) -> EvflowResult<Self> {
        Self::build(
            &flow.name,
            &flow.description,
            flow.multiple_runs,
            &flow.triggers,
            &flow.actions,
        )
    }

    pub fn from_template(template: &FlowTemplate) -> EvflowResult<Self> {
        Self::build(
            &template.name,
            &template.description,
            template.multiple_runs,
            &template.triggers,
            &template.actions,
        )
    }

    fn build(
        name: &str,
        description: &str,
        multiple_runs: bool,
        triggers: &[FlowTrigger],
        actions: &[FlowAction],
    ) -> EvflowResult<Self> {
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            multiple_runs,
            triggers: triggers
                .iter()
                .map(|t| WireTrigger::encode(t, true))
                .collect::<EvflowResult<_>>()?,
            actions: actions
                .iter()
                .map(|a| WireAction::encode(a, true))
                .collect::<EvflowResult<_>>()?,
        })
    }
}

/// Unwrap a `details` value received from the backend.
///
/// Strings are parsed as JSON; `null` and the empty string become `{}`.
pub(crate) fn unwrap_details(value: Value) -> EvflowResult<Value> {
    match value {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Object(Default::default())),
        Value::String(s) => {
            let inner: Value = serde_json::from_str(&s)?;
            match inner {
                Value::Object(_) | Value::Null => unwrap_details(inner),
                other => Err(EvflowError::codec(format!(
                    "details must encode an object, got {}",
                    other
                ))),
            }
        }
        Value::Object(_) => Ok(value),
        other => Err(EvflowError::codec(format!(
            "details must be an object or a JSON string, got {}",
            other
        ))),
    }
}
