// evflow Core - Flow definition model for event automation
//
// Triggers and actions are tagged unions with typed payloads. Editors hold
// draft state and decide whether a trigger or action may be submitted. The
// wire module is the only place that knows about the backend's
// double-encoded `details` strings.

pub mod action;
pub mod editor;
pub mod error;
pub mod flow;
pub mod status;
pub mod trigger;
pub mod wire;

// Re-export core types
pub use action::{
    ActionDetails, ActionKind, ChangeDescriptionDetails, ChangeImageDetails, ChangeStatusDetails,
    ChangeTitleDetails, FlowAction, Recipients, SendEmailDetails, ShareFileDetails,
};
pub use editor::{
    ActionDraft, ActionEditor, EditorStep, KindOption, RecipientMode, TriggerDraft,
    TriggerEditor,
};
pub use error::{EvflowError, EvflowResult, ValidationError};
pub use flow::{AuditInfo, Flow, FlowSummary, FlowTemplate};
pub use status::EventStatus;
pub use trigger::{
    registration_variables, AttendeeOperator, DateDetails, DateOperator, DateReference,
    Direction, FlowTrigger, NumOfAttendeesDetails, RelativeDateDetails, StatusDetails, TimeUnit,
    TriggerDetails, TriggerKind, TriggerVariable, TriggerVariables, ValueType,
    REGISTRATION_VARIABLES,
};
pub use wire::{WireAction, WireFlow, WireTrigger};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
