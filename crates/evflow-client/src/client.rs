//! Flow API client
//!
//! Thin async wrapper over the backend's flow, template, trigger and action
//! endpoints. Request bodies are encoded with `evflow_core::wire` (details
//! double-encoded); responses decode straight into the typed model.
//!
//! ## Authentication
//!
//! Every request carries `Authorization: Bearer <token>` from [`ClientConfig`].

use evflow_core::{
    ActionDetails, Flow, FlowAction, FlowSummary, FlowTemplate, FlowTrigger, TriggerDetails,
    WireAction, WireFlow, WireTrigger,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::ids::{ChildKind, FlowScope};

/// Client for the event flow REST API
#[derive(Debug, Clone)]
pub struct FlowApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl FlowApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let (base_url, token) = config.require()?;

        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", token);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::config(format!("Invalid API token: {}", e)))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Flows and templates
    // ========================================================================

    pub async fn list_flows(&self, scope: &FlowScope) -> ApiResult<Vec<FlowSummary>> {
        let path = scope.collection_path()?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn get_flow(&self, scope: &FlowScope, flow_id: &str) -> ApiResult<Flow> {
        let path = scope.flow_path(flow_id)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    /// Create a flow with its triggers and actions in one batch
    pub async fn create_flow(&self, scope: &FlowScope, flow: &Flow) -> ApiResult<Flow> {
        let path = scope.collection_path()?;
        let body = WireFlow::from_flow(flow)?;
        self.send(Method::POST, &path, Some(&body)).await
    }

    pub async fn update_flow(&self, scope: &FlowScope, flow_id: &str, flow: &Flow) -> ApiResult<Flow> {
        let path = scope.flow_path(flow_id)?;
        let body = WireFlow::from_flow(flow)?;
        self.send(Method::PUT, &path, Some(&body)).await
    }

    /// Delete a flow or, with a template scope, a template
    pub async fn delete_flow(&self, scope: &FlowScope, flow_id: &str) -> ApiResult<()> {
        let path = scope.flow_path(flow_id)?;
        self.send_empty(Method::DELETE, &path).await
    }

    pub async fn list_templates(&self, org_id: &str) -> ApiResult<Vec<FlowSummary>> {
        self.list_flows(&FlowScope::template(org_id)).await
    }

    pub async fn get_template(&self, org_id: &str, template_id: &str) -> ApiResult<FlowTemplate> {
        let path = FlowScope::template(org_id).flow_path(template_id)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_template(&self, org_id: &str, template: &FlowTemplate) -> ApiResult<FlowTemplate> {
        let path = FlowScope::template(org_id).collection_path()?;
        let body = WireFlow::from_template(template)?;
        self.send(Method::POST, &path, Some(&body)).await
    }

    pub async fn update_template(
        &self,
        org_id: &str,
        template_id: &str,
        template: &FlowTemplate,
    ) -> ApiResult<FlowTemplate> {
        let path = FlowScope::template(org_id).flow_path(template_id)?;
        let body = WireFlow::from_template(template)?;
        self.send(Method::PUT, &path, Some(&body)).await
    }

    /// Copy a template into an event as a new flow
    pub async fn instantiate_template(
        &self,
        org_id: &str,
        template_id: &str,
        event_id: &str,
    ) -> ApiResult<Flow> {
        let target = FlowScope::event(org_id, event_id);
        // Validate the target before any I/O.
        target.collection_path()?;
        let template = self.get_template(org_id, template_id).await?;
        self.create_flow(&target, &template.instantiate()).await
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    pub async fn list_triggers(&self, scope: &FlowScope, flow_id: &str) -> ApiResult<Vec<FlowTrigger>> {
        let path = scope.child_collection_path(flow_id, ChildKind::Triggers)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn get_trigger(&self, scope: &FlowScope, flow_id: &str, trigger_id: &str) -> ApiResult<FlowTrigger> {
        let path = scope.child_path(flow_id, ChildKind::Triggers, trigger_id)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_trigger(
        &self,
        scope: &FlowScope,
        flow_id: &str,
        details: &TriggerDetails,
    ) -> ApiResult<FlowTrigger> {
        let path = scope.child_collection_path(flow_id, ChildKind::Triggers)?;
        let body = WireTrigger::encode(&FlowTrigger::new("", details.clone()), false)?;
        self.send(Method::POST, &path, Some(&body)).await
    }

    pub async fn update_trigger(
        &self,
        scope: &FlowScope,
        flow_id: &str,
        trigger_id: &str,
        details: &TriggerDetails,
    ) -> ApiResult<FlowTrigger> {
        let path = scope.child_path(flow_id, ChildKind::Triggers, trigger_id)?;
        let body = WireTrigger::encode(&FlowTrigger::new(trigger_id, details.clone()), false)?;
        self.send(Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_trigger(&self, scope: &FlowScope, flow_id: &str, trigger_id: &str) -> ApiResult<()> {
        let path = scope.child_path(flow_id, ChildKind::Triggers, trigger_id)?;
        self.send_empty(Method::DELETE, &path).await
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub async fn list_actions(&self, scope: &FlowScope, flow_id: &str) -> ApiResult<Vec<FlowAction>> {
        let path = scope.child_collection_path(flow_id, ChildKind::Actions)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn get_action(&self, scope: &FlowScope, flow_id: &str, action_id: &str) -> ApiResult<FlowAction> {
        let path = scope.child_path(flow_id, ChildKind::Actions, action_id)?;
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_action(
        &self,
        scope: &FlowScope,
        flow_id: &str,
        details: &ActionDetails,
    ) -> ApiResult<FlowAction> {
        let path = scope.child_collection_path(flow_id, ChildKind::Actions)?;
        let body = WireAction::encode(&FlowAction::new("", details.clone()), false)?;
        self.send(Method::POST, &path, Some(&body)).await
    }

    pub async fn update_action(
        &self,
        scope: &FlowScope,
        flow_id: &str,
        action_id: &str,
        details: &ActionDetails,
    ) -> ApiResult<FlowAction> {
        let path = scope.child_path(flow_id, ChildKind::Actions, action_id)?;
        let body = WireAction::encode(&FlowAction::new(action_id, details.clone()), false)?;
        self.send(Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_action(&self, scope: &FlowScope, flow_id: &str, action_id: &str) -> ApiResult<()> {
        let path = scope.child_path(flow_id, ChildKind::Actions, action_id)?;
        self.send_empty(Method::DELETE, &path).await
    }

    // ========================================================================
    // Transport
    // ========================================================================

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.execute(method, path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_empty(&self, method: Method, path: &str) -> ApiResult<()> {
        self.execute(method, path, None::<&()>).await?;
        Ok(())
    }

    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(method = %method, url = %url, "Sending flow API request");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!(method = %method, url = %url, status = status.as_u16(), "Flow API request failed: {}", message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

/// Pull a human-readable message out of an error body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"name is required"}"#),
            "name is required"
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"error":"duplicate registration"}"#),
            "duplicate registration"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
    }

    #[test]
    fn test_client_requires_config() {
        assert!(matches!(
            FlowApiClient::new(&ClientConfig::default()),
            Err(ApiError::Config(_))
        ));
        let client = FlowApiClient::new(&ClientConfig::new("https://api.example.com/v1/", "t")).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }
}
