//! Flow Editing Integration Tests
//!
//! Builds flows the way the admin console does: one trigger or action at a
//! time through the editors, then validates the aggregate and encodes it for
//! the backend.

use evflow_core::{
    editor::AttendeeDraft,
    ActionEditor, ActionKind, AttendeeOperator, DateDetails, DateOperator, EventStatus, Flow,
    RecipientMode, TriggerEditor, TriggerKind, ValidationError, ValueType, WireFlow,
};

/// Add a trigger through the editor, as the dialog's onAdd callback would
fn add_trigger(flow: &mut Flow, configure: impl FnOnce(&mut TriggerEditor)) {
    let mut editor = TriggerEditor::new(&flow.triggers);
    configure(&mut editor);
    let trigger = editor.submit().expect("trigger should be submittable");
    flow.upsert_trigger(trigger);
}

fn welcome_flow() -> Flow {
    let mut flow = Flow::new("welcome");
    add_trigger(&mut flow, |e| e.select_kind(TriggerKind::Registration).unwrap());

    let mut editor = ActionEditor::new(&flow.triggers);
    editor.choose_kind(ActionKind::SendEmail);
    {
        let d = editor.send_email_mut().unwrap();
        d.subject = "Welcome aboard".into();
        d.body = "Doors open at 9".into();
    }
    editor.set_recipient_mode(RecipientMode::RegisteredUser).unwrap();
    flow.upsert_action(editor.submit().unwrap());
    flow
}

// ============================================================================
// Aggregate Tests
// ============================================================================

#[test]
fn test_flow_built_through_editors_validates() {
    let flow = welcome_flow();
    assert!(flow.validate().is_ok());
    assert_eq!(flow.trigger_variables().len(), 1);

    let reg_id = flow.triggers[0].id.clone();
    assert_eq!(flow.actions[0].details.bound_trigger(), Some(reg_id.as_str()));
}

#[test]
fn test_second_registration_blocked_by_editor() {
    let flow = welcome_flow();
    let mut editor = TriggerEditor::new(&flow.triggers);
    assert_eq!(
        editor.select_kind(TriggerKind::Registration),
        Err(ValidationError::KindUnavailable(TriggerKind::Registration))
    );
}

#[test]
fn test_editing_keeps_flow_unchanged() {
    let mut flow = welcome_flow();
    add_trigger(&mut flow, |e| {
        e.select_kind(TriggerKind::Date).unwrap();
        let d = e.date_mut().unwrap();
        d.operator = Some(DateOperator::On);
        d.value = Some(DateDetails::parse_value("2025-06-01T09:00").unwrap());
    });
    let before = flow.clone();

    for trigger in before.triggers.clone() {
        let edited = TriggerEditor::edit(&trigger, &flow.triggers).submit().unwrap();
        flow.upsert_trigger(edited);
    }
    for action in before.actions.clone() {
        let edited = ActionEditor::edit(&action, &flow.triggers).submit().unwrap();
        flow.upsert_action(edited);
    }

    assert_eq!(flow, before);
}

#[test]
fn test_removing_registration_leaves_dangling_binding() {
    let mut flow = welcome_flow();
    let reg_id = flow.triggers[0].id.clone();
    add_trigger(&mut flow, |e| {
        e.select_kind(TriggerKind::Status).unwrap();
        e.status_mut().unwrap().status = Some(EventStatus::Active);
    });
    flow.remove_trigger(&reg_id);

    assert_eq!(
        flow.validate(),
        Err(ValidationError::UnknownRegistrationTrigger(reg_id))
    );
}

#[test]
fn test_percentage_threshold_through_draft() {
    let mut editor = TriggerEditor::new(&[]);
    editor.select_kind(TriggerKind::NumOfAttendees).unwrap();
    if let Some(draft) = editor.attendees_mut() {
        *draft = AttendeeDraft {
            operator: Some(AttendeeOperator::Greater),
            value: Some(101),
            value_type: ValueType::Percentage,
        };
    }
    assert!(!editor.can_submit());
}

// ============================================================================
// Wire Tests
// ============================================================================

#[test]
fn test_wire_flow_batch() {
    let flow = welcome_flow();
    let wire = WireFlow::from_flow(&flow).unwrap();
    let body = serde_json::to_value(&wire).unwrap();

    assert_eq!(body["name"], "welcome");
    assert_eq!(body["triggers"][0]["type"], "Registration");
    assert_eq!(body["triggers"][0]["details"], "{}");

    let action_details: serde_json::Value =
        serde_json::from_str(body["actions"][0]["details"].as_str().unwrap()).unwrap();
    assert_eq!(
        action_details["recipients"],
        format!("trigger.{}.user.email", flow.triggers[0].id)
    );
}

#[test]
fn test_flow_yaml_round_trip() {
    let flow = welcome_flow();
    let yaml = serde_yaml::to_string(&flow).unwrap();
    let parsed: Flow = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, flow);
}
