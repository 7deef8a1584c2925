//! Draft editors for triggers and actions
//!
//! An editor holds in-memory draft state for one trigger or action while it
//! is being composed. It knows the sibling triggers of the owning flow, which
//! decides whether a `Registration` trigger may be added and which
//! registration variables an action can bind to. Dropping an editor discards
//! the draft.

mod action;
mod trigger;

pub use action::{
    ActionDraft, ActionEditor, ChangeStatusDraft, EditorStep, RecipientMode, SendEmailDraft,
    ShareFileDraft,
};
pub use trigger::{
    AttendeeDraft, DateDraft, KindOption, RelativeDateDraft, StatusDraft, TriggerDraft,
    TriggerEditor,
};
