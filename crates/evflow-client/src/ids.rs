//! Path id guard
//!
//! Every id that ends up in a request path must be a UUID. The check runs
//! before the URL is assembled, so a malformed id never reaches the network.

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Validate `value` as a UUID, naming `field` in the error
pub fn require_uuid(field: &'static str, value: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::InvalidId {
        field,
        value: value.to_string(),
    })
}

/// Where a flow lives: under an event, or as an organization template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowScope {
    Event { org_id: String, event_id: String },
    Template { org_id: String },
}

impl FlowScope {
    pub fn event(org_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self::Event {
            org_id: org_id.into(),
            event_id: event_id.into(),
        }
    }

    pub fn template(org_id: impl Into<String>) -> Self {
        Self::Template {
            org_id: org_id.into(),
        }
    }

    /// Collection path, e.g. `orgs/{org}/events/{event}/flows`
    pub fn collection_path(&self) -> ApiResult<String> {
        match self {
            Self::Event { org_id, event_id } => {
                let org = require_uuid("org id", org_id)?;
                let event = require_uuid("event id", event_id)?;
                Ok(format!("orgs/{}/events/{}/flows", org, event))
            }
            Self::Template { org_id } => {
                let org = require_uuid("org id", org_id)?;
                Ok(format!("orgs/{}/flowTemplates", org))
            }
        }
    }

    /// Path of one flow or template
    pub fn flow_path(&self, flow_id: &str) -> ApiResult<String> {
        let base = self.collection_path()?;
        let flow = require_uuid(self.flow_field(), flow_id)?;
        Ok(format!("{}/{}", base, flow))
    }

    /// Path of a flow's trigger or action collection
    pub fn child_collection_path(&self, flow_id: &str, child: ChildKind) -> ApiResult<String> {
        Ok(format!("{}/{}", self.flow_path(flow_id)?, child.segment()))
    }

    /// Path of one trigger or action
    pub fn child_path(&self, flow_id: &str, child: ChildKind, child_id: &str) -> ApiResult<String> {
        let base = self.child_collection_path(flow_id, child)?;
        let id = require_uuid(child.field(), child_id)?;
        Ok(format!("{}/{}", base, id))
    }

    fn flow_field(&self) -> &'static str {
        match self {
            Self::Event { .. } => "flow id",
            Self::Template { .. } => "template id",
        }
    }
}

/// Sub-resources of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Triggers,
    Actions,
}

impl ChildKind {
    fn segment(self) -> &'static str {
        match self {
            Self::Triggers => "triggers",
            Self::Actions => "actions",
        }
    }

    fn field(self) -> &'static str {
        match self {
            Self::Triggers => "trigger id",
            Self::Actions => "action id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
    const EVENT: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
    const FLOW: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    #[test]
    fn test_event_paths() {
        let scope = FlowScope::event(ORG, EVENT);
        assert_eq!(
            scope.collection_path().unwrap(),
            format!("orgs/{}/events/{}/flows", ORG, EVENT)
        );
        assert_eq!(
            scope.child_collection_path(FLOW, ChildKind::Triggers).unwrap(),
            format!("orgs/{}/events/{}/flows/{}/triggers", ORG, EVENT, FLOW)
        );
    }

    #[test]
    fn test_template_paths() {
        let scope = FlowScope::template(ORG);
        assert_eq!(
            scope.child_path(FLOW, ChildKind::Actions, EVENT).unwrap(),
            format!("orgs/{}/flowTemplates/{}/actions/{}", ORG, FLOW, EVENT)
        );
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        let err = FlowScope::event("acme", EVENT).collection_path().unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { field: "org id", .. }));

        let err = FlowScope::event(ORG, EVENT).flow_path("42").unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { field: "flow id", .. }));

        let err = FlowScope::template(ORG).flow_path("").unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { field: "template id", .. }));

        let err = FlowScope::event(ORG, EVENT)
            .child_path(FLOW, ChildKind::Triggers, "t1")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { field: "trigger id", .. }));
    }
}
