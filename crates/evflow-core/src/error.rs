// evflow Core - Error types
//
// `ValidationError` covers everything a draft or a flow can be refused for.
// `EvflowError` is the crate-level error wrapping validation, codec and
// serialization failures.

use thiserror::Error;

use crate::action::ActionKind;
use crate::trigger::TriggerKind;

/// Result alias used across evflow crates
pub type EvflowResult<T> = Result<T, EvflowError>;

/// Reasons a trigger, action or flow is not acceptable for submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no kind selected")]
    NoKindSelected,

    #[error("trigger kind {0} is not available in this flow")]
    KindUnavailable(TriggerKind),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),

    #[error("percentage value {0} exceeds 100")]
    PercentageOutOfRange(u32),

    #[error("invalid email address `{0}`")]
    InvalidAddress(String),

    #[error("a flow may contain at most one Registration trigger (found {0})")]
    DuplicateRegistration(usize),

    #[error("flow name is required")]
    MissingName,

    #[error("flow requires at least one trigger")]
    NoTriggers,

    #[error("flow requires at least one action")]
    NoActions,

    #[error("recipients reference unknown registration trigger `{0}`")]
    UnknownRegistrationTrigger(String),

    #[error("action {kind} is invalid: {source}")]
    Action {
        kind: ActionKind,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("trigger {kind} is invalid: {source}")]
    Trigger {
        kind: TriggerKind,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum EvflowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvflowError {
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Returns the validation error if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
