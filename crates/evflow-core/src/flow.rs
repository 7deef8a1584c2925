// evflow Core - Flow aggregate
//
// A flow pairs an unordered set of triggers with an unordered set of actions.
// Event flows belong to one event; templates live at the organization level
// and are copied into events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::action::{ActionDetails, FlowAction, Recipients};
use crate::error::{EvflowResult, ValidationError};
use crate::trigger::{registration_variables, FlowTrigger, TriggerVariables};

/// Audit fields maintained by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Automation rule bound to an event
///
/// Example:
/// ```yaml
/// name: welcome-mail
/// description: Greet every new attendee
/// multipleRuns: true
/// triggers:
///   - id: reg
///     type: Registration
/// actions:
///   - id: mail
///     type: SendEmail
///     details:
///       subject: Welcome!
///       body: See you there
///       recipients: trigger.reg.user.email
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Backend id; empty until the flow has been created
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub triggers: Vec<FlowTrigger>,

    #[serde(default)]
    pub actions: Vec<FlowAction>,

    /// Has unresolved or unsent runs
    #[serde(default)]
    pub still_pending: bool,

    /// May fire more than once
    #[serde(default)]
    pub multiple_runs: bool,

    #[serde(flatten)]
    pub audit: AuditInfo,
}

/// List-endpoint projection of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub still_pending: bool,

    #[serde(default)]
    pub multiple_runs: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Organization-level reusable flow, not bound to an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub triggers: Vec<FlowTrigger>,

    #[serde(default)]
    pub actions: Vec<FlowAction>,

    #[serde(default)]
    pub multiple_runs: bool,

    #[serde(flatten)]
    pub audit: AuditInfo,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a flow definition from a YAML or JSON file
    pub fn from_file(path: &Path) -> EvflowResult<Self> {
        load_definition(path)
    }

    /// Check the flow is complete enough to submit
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_definition(&self.name, &self.triggers, &self.actions)
    }

    pub fn registration_triggers(&self) -> impl Iterator<Item = &FlowTrigger> {
        self.triggers.iter().filter(|t| t.details.is_registration())
    }

    pub fn registration_trigger_count(&self) -> usize {
        self.registration_triggers().count()
    }

    /// Resolve a `RegisteredUser` binding to the registration trigger it names
    pub fn resolve_recipient_binding(&self, trigger_id: &str) -> Option<&FlowTrigger> {
        self.registration_triggers().find(|t| t.id == trigger_id)
    }

    /// Variables exposed to actions by this flow's registration triggers
    pub fn trigger_variables(&self) -> Vec<TriggerVariables> {
        registration_variables(&self.triggers)
    }

    pub fn trigger(&self, id: &str) -> Option<&FlowTrigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    pub fn action(&self, id: &str) -> Option<&FlowAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Insert or replace a trigger by id
    pub fn upsert_trigger(&mut self, trigger: FlowTrigger) {
        upsert(&mut self.triggers, trigger, |t| &t.id);
    }

    /// Insert or replace an action by id
    pub fn upsert_action(&mut self, action: FlowAction) {
        upsert(&mut self.actions, action, |a| &a.id);
    }

    pub fn remove_trigger(&mut self, id: &str) -> Option<FlowTrigger> {
        let pos = self.triggers.iter().position(|t| t.id == id)?;
        Some(self.triggers.remove(pos))
    }

    pub fn remove_action(&mut self, id: &str) -> Option<FlowAction> {
        let pos = self.actions.iter().position(|a| a.id == id)?;
        Some(self.actions.remove(pos))
    }

    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            still_pending: self.still_pending,
            multiple_runs: self.multiple_runs,
            updated_at: self.audit.updated_at,
        }
    }
}

impl FlowTemplate {
    pub fn from_file(path: &Path) -> EvflowResult<Self> {
        load_definition(path)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_definition(&self.name, &self.triggers, &self.actions)
    }

    pub fn trigger_variables(&self) -> Vec<TriggerVariables> {
        registration_variables(&self.triggers)
    }

    /// Copy this template into an unsaved event flow.
    ///
    /// Triggers and actions get fresh ids and recipient bindings are
    /// rewritten to the new trigger ids.
    pub fn instantiate(&self) -> Flow {
        let mut remap: HashMap<&str, String> = HashMap::new();

        let triggers = self
            .triggers
            .iter()
            .map(|t| {
                let copy = FlowTrigger::with_generated_id(t.details.clone());
                remap.insert(t.id.as_str(), copy.id.clone());
                copy
            })
            .collect();

        let actions = self
            .actions
            .iter()
            .map(|a| {
                let mut details = a.details.clone();
                if let ActionDetails::SendEmail(ref mut email) = details {
                    if let Recipients::RegisteredUser(ref mut id) = email.recipients {
                        if let Some(new_id) = remap.get(id.as_str()) {
                            *id = new_id.clone();
                        }
                    }
                }
                FlowAction::with_generated_id(details)
            })
            .collect();

        tracing::debug!(template = %self.name, "instantiated flow template");

        Flow {
            name: self.name.clone(),
            description: self.description.clone(),
            triggers,
            actions,
            multiple_runs: self.multiple_runs,
            ..Default::default()
        }
    }
}

fn validate_definition(
    name: &str,
    triggers: &[FlowTrigger],
    actions: &[FlowAction],
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if triggers.is_empty() {
        return Err(ValidationError::NoTriggers);
    }
    if actions.is_empty() {
        return Err(ValidationError::NoActions);
    }

    let registrations = triggers.iter().filter(|t| t.details.is_registration()).count();
    if registrations > 1 {
        return Err(ValidationError::DuplicateRegistration(registrations));
    }

    for trigger in triggers {
        trigger
            .details
            .validate()
            .map_err(|e| ValidationError::Trigger {
                kind: trigger.kind(),
                source: Box::new(e),
            })?;
    }

    for action in actions {
        action.details.validate().map_err(|e| ValidationError::Action {
            kind: action.kind(),
            source: Box::new(e),
        })?;

        if let Some(bound) = action.details.bound_trigger() {
            let resolves = triggers
                .iter()
                .any(|t| t.id == bound && t.details.is_registration());
            if !resolves {
                return Err(ValidationError::UnknownRegistrationTrigger(bound.to_string()));
            }
        }
    }

    Ok(())
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}

fn load_definition<T: serde::de::DeserializeOwned>(path: &Path) -> EvflowResult<T> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path.extension().map_or(false, |e| e == "json");
    let parsed = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    tracing::debug!("Loaded flow definition: {}", path.display());
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerDetails;

    const WELCOME: &str = r#"
name: welcome-mail
description: Greet every new attendee
multipleRuns: true
triggers:
  - id: reg
    type: Registration
actions:
  - id: mail
    type: SendEmail
    details:
      subject: Welcome!
      body: See you there
      recipients: trigger.reg.user.email
"#;

    #[test]
    fn test_parse_flow_yaml() {
        let flow: Flow = serde_yaml::from_str(WELCOME).unwrap();
        assert_eq!(flow.name, "welcome-mail");
        assert!(flow.multiple_runs);
        assert!(!flow.still_pending);
        assert_eq!(flow.registration_trigger_count(), 1);
        assert!(flow.validate().is_ok());
        assert_eq!(flow.resolve_recipient_binding("reg").map(|t| t.id.as_str()), Some("reg"));
    }

    #[test]
    fn test_parse_backend_flow_json() {
        let json = r#"{
            "id": "5b0a3f7e-8a51-4b8e-9d43-0d6b2f3c1a10",
            "name": "capacity",
            "description": "",
            "stillPending": true,
            "multipleRuns": false,
            "createdBy": "ana",
            "updatedAt": "2024-05-01T12:00:00Z",
            "triggers": [
                {"id": "t1", "type": "NumOfAttendees", "details": "{\"operator\":\"greater\",\"value\":90,\"valueType\":\"percentage\"}"}
            ],
            "actions": [
                {"id": "a1", "type": "ChangeStatus", "details": "{\"newStatus\":\"completed\"}"}
            ]
        }"#;
        let flow: Flow = serde_json::from_str(json).unwrap();
        assert!(flow.still_pending);
        assert_eq!(flow.audit.created_by.as_deref(), Some("ana"));
        assert!(flow.audit.updated_at.is_some());
        assert!(flow.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut flow: Flow = serde_yaml::from_str(WELCOME).unwrap();

        flow.name = " ".into();
        assert_eq!(flow.validate(), Err(ValidationError::MissingName));
        flow.name = "welcome-mail".into();

        flow.triggers.push(FlowTrigger::new("reg2", TriggerDetails::Registration));
        assert_eq!(flow.validate(), Err(ValidationError::DuplicateRegistration(2)));
        flow.remove_trigger("reg2");

        let actions = std::mem::take(&mut flow.actions);
        assert_eq!(flow.validate(), Err(ValidationError::NoActions));
        flow.actions = actions;

        flow.remove_trigger("reg");
        assert_eq!(flow.validate(), Err(ValidationError::NoTriggers));
    }

    #[test]
    fn test_dangling_recipient_binding() {
        let mut flow: Flow = serde_yaml::from_str(WELCOME).unwrap();
        flow.triggers = vec![FlowTrigger::new(
            "status",
            TriggerDetails::Status(crate::trigger::StatusDetails {
                status: crate::status::EventStatus::Active,
            }),
        )];
        assert_eq!(
            flow.validate(),
            Err(ValidationError::UnknownRegistrationTrigger("reg".into()))
        );
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut flow: Flow = serde_yaml::from_str(WELCOME).unwrap();
        flow.upsert_trigger(FlowTrigger::new("reg", TriggerDetails::Registration));
        assert_eq!(flow.triggers.len(), 1);
        flow.upsert_trigger(FlowTrigger::new(
            "later",
            TriggerDetails::Status(crate::trigger::StatusDetails {
                status: crate::status::EventStatus::Cancelled,
            }),
        ));
        assert_eq!(flow.triggers.len(), 2);
        assert!(flow.trigger("later").is_some());
    }

    #[test]
    fn test_instantiate_template_remaps_bindings() {
        let template: FlowTemplate = serde_yaml::from_str(WELCOME).unwrap();
        let flow = template.instantiate();

        assert!(flow.id.is_empty());
        assert_eq!(flow.triggers.len(), 1);
        let new_reg = &flow.triggers[0].id;
        assert_ne!(new_reg, "reg");
        assert_eq!(flow.actions[0].details.bound_trigger(), Some(new_reg.as_str()));
        assert!(flow.validate().is_ok());
    }
}
