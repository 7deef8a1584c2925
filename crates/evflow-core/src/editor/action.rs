use tracing::debug;

use crate::action::{
    ActionDetails, ActionKind, ChangeDescriptionDetails, ChangeImageDetails, ChangeStatusDetails,
    ChangeTitleDetails, FlowAction, Recipients, SendEmailDetails, ShareFileDetails,
};
use crate::error::ValidationError;
use crate::status::EventStatus;
use crate::trigger::{registration_variables, FlowTrigger, TriggerVariables};

/// Which phase of the two-step action dialog is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStep {
    ChooseKind,
    Configure,
}

/// How the recipients of a SendEmail action are chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipientMode {
    /// Comma-separated addresses typed by the user
    #[default]
    Manual,
    /// Every user registered to the event
    AllUsers,
    /// The user who just registered, via a sibling Registration trigger
    RegisteredUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendEmailDraft {
    pub subject: String,
    pub body: String,
    pub mode: RecipientMode,
    /// Raw address list, used in `Manual` mode
    pub addresses: String,
    /// Bound registration trigger, used in `RegisteredUser` mode
    pub bound_trigger: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeStatusDraft {
    pub new_status: Option<EventStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareFileDraft {
    pub file_url: Option<String>,
}

/// Partially filled action payload for the selected kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDraft {
    SendEmail(SendEmailDraft),
    ChangeStatus(ChangeStatusDraft),
    ShareFile(ShareFileDraft),
    ChangeImage(String),
    ChangeTitle(String),
    ChangeDescription(String),
}

impl ActionDraft {
    pub fn empty(kind: ActionKind) -> Self {
        match kind {
            ActionKind::SendEmail => Self::SendEmail(SendEmailDraft::default()),
            ActionKind::ChangeStatus => Self::ChangeStatus(ChangeStatusDraft::default()),
            ActionKind::ShareFile => Self::ShareFile(ShareFileDraft::default()),
            ActionKind::ChangeImage => Self::ChangeImage(String::new()),
            ActionKind::ChangeTitle => Self::ChangeTitle(String::new()),
            ActionKind::ChangeDescription => Self::ChangeDescription(String::new()),
        }
    }

    pub fn from_details(details: &ActionDetails) -> Self {
        match details {
            ActionDetails::SendEmail(d) => {
                let mut draft = SendEmailDraft {
                    subject: d.subject.clone(),
                    body: d.body.clone(),
                    ..Default::default()
                };
                match &d.recipients {
                    Recipients::Literal(addresses) => {
                        draft.mode = RecipientMode::Manual;
                        draft.addresses = addresses.join(", ");
                    }
                    Recipients::AllEventUsers => draft.mode = RecipientMode::AllUsers,
                    Recipients::RegisteredUser(id) => {
                        draft.mode = RecipientMode::RegisteredUser;
                        draft.bound_trigger = Some(id.clone());
                    }
                }
                Self::SendEmail(draft)
            }
            ActionDetails::ChangeStatus(d) => Self::ChangeStatus(ChangeStatusDraft {
                new_status: Some(d.new_status),
            }),
            ActionDetails::ShareFile(d) => Self::ShareFile(ShareFileDraft {
                file_url: d.file_url.clone(),
            }),
            ActionDetails::ChangeImage(d) => Self::ChangeImage(d.new_image.clone()),
            ActionDetails::ChangeTitle(d) => Self::ChangeTitle(d.new_title.clone()),
            ActionDetails::ChangeDescription(d) => Self::ChangeDescription(d.new_description.clone()),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SendEmail(_) => ActionKind::SendEmail,
            Self::ChangeStatus(_) => ActionKind::ChangeStatus,
            Self::ShareFile(_) => ActionKind::ShareFile,
            Self::ChangeImage(_) => ActionKind::ChangeImage,
            Self::ChangeTitle(_) => ActionKind::ChangeTitle,
            Self::ChangeDescription(_) => ActionKind::ChangeDescription,
        }
    }

    /// Build the payload; `registrations` are the bindable sibling triggers
    fn build(&self, registrations: &[TriggerVariables]) -> Result<ActionDetails, ValidationError> {
        let details = match self {
            Self::SendEmail(d) => {
                let recipients = match d.mode {
                    RecipientMode::Manual => Recipients::literal(&d.addresses),
                    RecipientMode::AllUsers => Recipients::AllEventUsers,
                    RecipientMode::RegisteredUser => {
                        let id = d
                            .bound_trigger
                            .clone()
                            .ok_or(ValidationError::MissingField("recipients.triggerId"))?;
                        if !registrations.iter().any(|r| r.trigger_id == id) {
                            return Err(ValidationError::UnknownRegistrationTrigger(id));
                        }
                        Recipients::RegisteredUser(id)
                    }
                };
                ActionDetails::SendEmail(SendEmailDetails {
                    subject: d.subject.clone(),
                    body: d.body.clone(),
                    recipients,
                })
            }
            Self::ChangeStatus(d) => ActionDetails::ChangeStatus(ChangeStatusDetails {
                new_status: d.new_status.ok_or(ValidationError::MissingField("newStatus"))?,
            }),
            Self::ShareFile(d) => ActionDetails::ShareFile(ShareFileDetails {
                file_url: d.file_url.clone().filter(|u| !u.trim().is_empty()),
            }),
            Self::ChangeImage(v) => ActionDetails::ChangeImage(ChangeImageDetails {
                new_image: v.clone(),
            }),
            Self::ChangeTitle(v) => ActionDetails::ChangeTitle(ChangeTitleDetails {
                new_title: v.clone(),
            }),
            Self::ChangeDescription(v) => {
                ActionDetails::ChangeDescription(ChangeDescriptionDetails {
                    new_description: v.clone(),
                })
            }
        };
        details.validate()?;
        Ok(details)
    }
}

/// Produces one valid action, aware of the flow's triggers
#[derive(Debug, Clone)]
pub struct ActionEditor {
    editing_id: Option<String>,
    step: EditorStep,
    draft: Option<ActionDraft>,
    registrations: Vec<TriggerVariables>,
}

impl ActionEditor {
    pub fn new(siblings: &[FlowTrigger]) -> Self {
        Self {
            editing_id: None,
            step: EditorStep::ChooseKind,
            draft: None,
            registrations: registration_variables(siblings),
        }
    }

    /// Editor pre-populated from `item`, opened on the configure step
    pub fn edit(item: &FlowAction, siblings: &[FlowTrigger]) -> Self {
        Self {
            editing_id: Some(item.id.clone()),
            step: EditorStep::Configure,
            draft: Some(ActionDraft::from_details(&item.details)),
            registrations: registration_variables(siblings),
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn step(&self) -> EditorStep {
        self.step
    }

    pub fn selected_kind(&self) -> Option<ActionKind> {
        self.draft.as_ref().map(ActionDraft::kind)
    }

    /// Variable sets of the sibling Registration triggers
    pub fn registration_variables(&self) -> &[TriggerVariables] {
        &self.registrations
    }

    /// Pick a kind and move on to configuration. Picking a different kind
    /// than before starts from an empty draft.
    pub fn choose_kind(&mut self, kind: ActionKind) {
        if self.selected_kind() != Some(kind) {
            debug!(kind = %kind, "action kind selected, details reset");
            self.draft = Some(ActionDraft::empty(kind));
        }
        self.step = EditorStep::Configure;
    }

    /// Return to kind selection, keeping the current kind and draft
    pub fn back(&mut self) {
        self.step = EditorStep::ChooseKind;
    }

    pub fn draft(&self) -> Option<&ActionDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ActionDraft> {
        self.draft.as_mut()
    }

    pub fn send_email_mut(&mut self) -> Option<&mut SendEmailDraft> {
        match self.draft.as_mut()? {
            ActionDraft::SendEmail(d) => Some(d),
            _ => None,
        }
    }

    /// Change the recipient mode of a SendEmail draft.
    ///
    /// Switching to `RegisteredUser` binds the only Registration trigger
    /// automatically; with several the caller must `bind_registration`.
    pub fn set_recipient_mode(&mut self, mode: RecipientMode) -> Result<(), ValidationError> {
        let only = match self.registrations.as_slice() {
            [single] => Some(single.trigger_id.clone()),
            _ => None,
        };
        let draft = self
            .send_email_mut()
            .ok_or(ValidationError::NoKindSelected)?;
        draft.mode = mode;
        if mode == RecipientMode::RegisteredUser && draft.bound_trigger.is_none() {
            draft.bound_trigger = only;
        }
        Ok(())
    }

    /// Bind the recipients to a specific Registration trigger
    pub fn bind_registration(&mut self, trigger_id: &str) -> Result<(), ValidationError> {
        if !self.registrations.iter().any(|r| r.trigger_id == trigger_id) {
            return Err(ValidationError::UnknownRegistrationTrigger(trigger_id.to_string()));
        }
        let draft = self
            .send_email_mut()
            .ok_or(ValidationError::NoKindSelected)?;
        draft.mode = RecipientMode::RegisteredUser;
        draft.bound_trigger = Some(trigger_id.to_string());
        Ok(())
    }

    pub fn validate(&self) -> Result<ActionDetails, ValidationError> {
        self.draft
            .as_ref()
            .ok_or(ValidationError::NoKindSelected)?
            .build(&self.registrations)
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn submit(self) -> Result<FlowAction, ValidationError> {
        let details = self.validate()?;
        let action = match self.editing_id {
            Some(id) => FlowAction::new(id, details),
            None => FlowAction::with_generated_id(details),
        };
        debug!(id = %action.id, kind = %action.kind(), "action submitted");
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerDetails;

    fn registration(id: &str) -> FlowTrigger {
        FlowTrigger::new(id, TriggerDetails::Registration)
    }

    fn fill_email(editor: &mut ActionEditor) {
        let d = editor.send_email_mut().unwrap();
        d.subject = "Welcome".into();
        d.body = "Thanks for registering".into();
    }

    #[test]
    fn test_two_phase_navigation() {
        let mut editor = ActionEditor::new(&[]);
        assert_eq!(editor.step(), EditorStep::ChooseKind);

        editor.choose_kind(ActionKind::ChangeTitle);
        assert_eq!(editor.step(), EditorStep::Configure);
        *editor.draft_mut().unwrap() = ActionDraft::ChangeTitle("New title".into());

        editor.back();
        assert_eq!(editor.step(), EditorStep::ChooseKind);
        assert_eq!(editor.selected_kind(), Some(ActionKind::ChangeTitle));

        editor.choose_kind(ActionKind::ChangeTitle);
        assert!(editor.can_submit());

        editor.back();
        editor.choose_kind(ActionKind::ChangeDescription);
        assert_eq!(editor.draft(), Some(&ActionDraft::ChangeDescription(String::new())));
        assert!(!editor.can_submit());
    }

    #[test]
    fn test_single_registration_auto_binds() {
        let siblings = vec![registration("t1")];
        let mut editor = ActionEditor::new(&siblings);
        editor.choose_kind(ActionKind::SendEmail);
        fill_email(&mut editor);
        editor.set_recipient_mode(RecipientMode::RegisteredUser).unwrap();

        let action = editor.submit().unwrap();
        let ActionDetails::SendEmail(details) = &action.details else {
            panic!("expected SendEmail");
        };
        assert_eq!(details.recipients.to_wire(), "trigger.t1.user.email");
    }

    #[test]
    fn test_several_registrations_require_a_choice() {
        let siblings = vec![registration("t1"), registration("t2")];
        let mut editor = ActionEditor::new(&siblings);
        assert_eq!(editor.registration_variables().len(), 2);

        editor.choose_kind(ActionKind::SendEmail);
        fill_email(&mut editor);
        editor.set_recipient_mode(RecipientMode::RegisteredUser).unwrap();
        assert_eq!(
            editor.validate(),
            Err(ValidationError::MissingField("recipients.triggerId"))
        );

        assert_eq!(
            editor.bind_registration("t9"),
            Err(ValidationError::UnknownRegistrationTrigger("t9".into()))
        );
        editor.bind_registration("t2").unwrap();
        let action = editor.submit().unwrap();
        assert_eq!(action.details.bound_trigger(), Some("t2"));
    }

    #[test]
    fn test_send_email_requirements() {
        let mut editor = ActionEditor::new(&[]);
        editor.choose_kind(ActionKind::SendEmail);
        editor.set_recipient_mode(RecipientMode::AllUsers).unwrap();
        assert_eq!(editor.validate(), Err(ValidationError::MissingField("subject")));

        fill_email(&mut editor);
        assert!(editor.can_submit());

        editor.set_recipient_mode(RecipientMode::Manual).unwrap();
        assert_eq!(editor.validate(), Err(ValidationError::MissingField("recipients")));
        editor.send_email_mut().unwrap().addresses = "ana@example.com, bo@example.com".into();
        assert!(editor.can_submit());
    }

    #[test]
    fn test_manual_addresses_are_never_bindings() {
        let mut editor = ActionEditor::new(&[]);
        editor.choose_kind(ActionKind::SendEmail);
        fill_email(&mut editor);

        editor.send_email_mut().unwrap().addresses = "trigger.ghost.user.email".into();
        assert_eq!(
            editor.validate(),
            Err(ValidationError::InvalidAddress("trigger.ghost.user.email".into()))
        );

        editor.send_email_mut().unwrap().addresses = "all.users".into();
        assert_eq!(
            editor.validate(),
            Err(ValidationError::InvalidAddress("all.users".into()))
        );
    }

    #[test]
    fn test_registered_user_mode_without_registration_trigger() {
        let mut editor = ActionEditor::new(&[]);
        editor.choose_kind(ActionKind::SendEmail);
        fill_email(&mut editor);
        editor.set_recipient_mode(RecipientMode::RegisteredUser).unwrap();
        assert!(!editor.can_submit());
    }

    #[test]
    fn test_single_field_kinds() {
        let mut editor = ActionEditor::new(&[]);
        editor.choose_kind(ActionKind::ChangeStatus);
        assert_eq!(editor.validate(), Err(ValidationError::MissingField("newStatus")));
        *editor.draft_mut().unwrap() = ActionDraft::ChangeStatus(ChangeStatusDraft {
            new_status: Some(EventStatus::Archived),
        });
        assert!(editor.can_submit());

        editor.choose_kind(ActionKind::ChangeImage);
        assert_eq!(editor.validate(), Err(ValidationError::MissingField("newImage")));

        editor.choose_kind(ActionKind::ShareFile);
        assert!(editor.can_submit());
    }

    #[test]
    fn test_recipient_mode_needs_send_email() {
        let mut editor = ActionEditor::new(&[]);
        editor.choose_kind(ActionKind::ChangeTitle);
        assert_eq!(
            editor.set_recipient_mode(RecipientMode::AllUsers),
            Err(ValidationError::NoKindSelected)
        );
    }

    #[test]
    fn test_edit_round_trip() {
        let siblings = vec![registration("t1")];
        let items = vec![
            FlowAction::new(
                "a1",
                ActionDetails::SendEmail(SendEmailDetails {
                    subject: "Hi".into(),
                    body: "Body".into(),
                    recipients: Recipients::RegisteredUser("t1".into()),
                }),
            ),
            FlowAction::new(
                "a2",
                ActionDetails::SendEmail(SendEmailDetails {
                    subject: "Hi".into(),
                    body: "Body".into(),
                    recipients: Recipients::Literal(vec!["a@x.io".into(), "b@x.io".into()]),
                }),
            ),
            FlowAction::new(
                "a3",
                ActionDetails::ChangeDescription(ChangeDescriptionDetails {
                    new_description: "Moved online".into(),
                }),
            ),
        ];

        for item in items {
            let editor = ActionEditor::edit(&item, &siblings);
            assert_eq!(editor.step(), EditorStep::Configure);
            assert_eq!(editor.submit().unwrap(), item);
        }
    }
}
