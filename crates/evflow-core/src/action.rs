// evflow Core - Action definitions
//
// An action is the "then" half of a flow. As with triggers, every kind has a
// typed payload and the backend is the only thing that ever executes them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{EvflowError, EvflowResult, ValidationError};
use crate::status::EventStatus;
use crate::wire::unwrap_details;

const ALL_USERS: &str = "all.users";
const BINDING_PREFIX: &str = "trigger.";
const BINDING_SUFFIX: &str = ".user.email";

/// Action discriminant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SendEmail,
    ChangeStatus,
    ShareFile,
    ChangeImage,
    ChangeTitle,
    ChangeDescription,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        Self::SendEmail,
        Self::ChangeStatus,
        Self::ShareFile,
        Self::ChangeImage,
        Self::ChangeTitle,
        Self::ChangeDescription,
    ];
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendEmail => write!(f, "SendEmail"),
            Self::ChangeStatus => write!(f, "ChangeStatus"),
            Self::ShareFile => write!(f, "ShareFile"),
            Self::ChangeImage => write!(f, "ChangeImage"),
            Self::ChangeTitle => write!(f, "ChangeTitle"),
            Self::ChangeDescription => write!(f, "ChangeDescription"),
        }
    }
}

// ============================================================================
// Recipients
// ============================================================================

/// Who receives a `SendEmail` action.
///
/// On the wire this is a single string: a comma-separated address list,
/// `all.users`, or `trigger.<triggerId>.user.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Explicit addresses
    Literal(Vec<String>),
    /// Every user registered to the event
    AllEventUsers,
    /// The user who caused the referenced Registration trigger to fire
    RegisteredUser(String),
}

impl Recipients {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s == ALL_USERS {
            return Self::AllEventUsers;
        }
        if let Some(id) = s
            .strip_prefix(BINDING_PREFIX)
            .and_then(|rest| rest.strip_suffix(BINDING_SUFFIX))
        {
            if !id.is_empty() {
                return Self::RegisteredUser(id.to_string());
            }
        }
        Self::literal(s)
    }

    /// Comma-separated addresses, taken as written
    pub fn literal(s: &str) -> Self {
        Self::Literal(
            s.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn to_wire(&self) -> String {
        match self {
            Self::Literal(addresses) => addresses.join(","),
            Self::AllEventUsers => ALL_USERS.to_string(),
            Self::RegisteredUser(id) => format!("{}{}{}", BINDING_PREFIX, id, BINDING_SUFFIX),
        }
    }

    /// Trigger id this recipient set is bound to, if any
    pub fn bound_trigger(&self) -> Option<&str> {
        match self {
            Self::RegisteredUser(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Literal(addresses) => {
                if addresses.is_empty() {
                    return Err(ValidationError::MissingField("recipients"));
                }
                if let Some(bad) = addresses.iter().find(|a| !looks_like_address(a)) {
                    return Err(ValidationError::InvalidAddress(bad.clone()));
                }
                Ok(())
            }
            Self::AllEventUsers => Ok(()),
            Self::RegisteredUser(id) if id.is_empty() => {
                Err(ValidationError::MissingField("recipients.triggerId"))
            }
            Self::RegisteredUser(_) => Ok(()),
        }
    }
}

fn looks_like_address(addr: &str) -> bool {
    match addr.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !addr.contains(' '),
        None => false,
    }
}

impl Serialize for Recipients {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Recipients {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailDetails {
    pub subject: String,
    pub body: String,
    pub recipients: Recipients,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusDetails {
    pub new_status: EventStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareFileDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeImageDetails {
    pub new_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTitleDetails {
    pub new_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescriptionDetails {
    pub new_description: String,
}

/// Typed action payload, one variant per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDetails {
    SendEmail(SendEmailDetails),
    ChangeStatus(ChangeStatusDetails),
    ShareFile(ShareFileDetails),
    ChangeImage(ChangeImageDetails),
    ChangeTitle(ChangeTitleDetails),
    ChangeDescription(ChangeDescriptionDetails),
}

impl ActionDetails {
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

    /// Recipient binding of a SendEmail action
    pub fn bound_trigger(&self) -> Option<&str> {
        match self {
            Self::SendEmail(d) => d.recipients.bound_trigger(),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::SendEmail(d) => {
                require("subject", &d.subject)?;
                require("body", &d.body)?;
                d.recipients.validate()
            }
            Self::ChangeStatus(_) | Self::ShareFile(_) => Ok(()),
            Self::ChangeImage(d) => require("newImage", &d.new_image),
            Self::ChangeTitle(d) => require("newTitle", &d.new_title),
            Self::ChangeDescription(d) => require("newDescription", &d.new_description),
        }
    }

    pub fn to_value(&self) -> EvflowResult<Value> {
        let value = match self {
            Self::SendEmail(d) => serde_json::to_value(d)?,
            Self::ChangeStatus(d) => serde_json::to_value(d)?,
            Self::ShareFile(d) => serde_json::to_value(d)?,
            Self::ChangeImage(d) => serde_json::to_value(d)?,
            Self::ChangeTitle(d) => serde_json::to_value(d)?,
            Self::ChangeDescription(d) => serde_json::to_value(d)?,
        };
        Ok(value)
    }

    pub fn from_value(kind: ActionKind, details: Value) -> EvflowResult<Self> {
        let details = unwrap_details(details)?;
        let decoded = match kind {
            ActionKind::SendEmail => Self::SendEmail(serde_json::from_value(details)?),
            ActionKind::ChangeStatus => Self::ChangeStatus(serde_json::from_value(details)?),
            ActionKind::ShareFile => Self::ShareFile(serde_json::from_value(details)?),
            ActionKind::ChangeImage => Self::ChangeImage(serde_json::from_value(details)?),
            ActionKind::ChangeTitle => Self::ChangeTitle(serde_json::from_value(details)?),
            ActionKind::ChangeDescription => {
                Self::ChangeDescription(serde_json::from_value(details)?)
            }
        };
        Ok(decoded)
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

// ============================================================================
// Flow action
// ============================================================================

/// An action attached to a flow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ActionRecord")]
pub struct FlowAction {
    pub id: String,
    pub details: ActionDetails,
}

impl FlowAction {
    pub fn new(id: impl Into<String>, details: ActionDetails) -> Self {
        Self {
            id: id.into(),
            details,
        }
    }

    pub fn with_generated_id(details: ActionDetails) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), details)
    }

    pub fn kind(&self) -> ActionKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionRecord {
    #[serde(default)]
    id: String,

    #[serde(rename = "type")]
    kind: ActionKind,

    #[serde(default)]
    details: Value,
}

impl TryFrom<ActionRecord> for FlowAction {
    type Error = EvflowError;

    fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            details: ActionDetails::from_value(record.kind, record.details)?,
        })
    }
}

impl Serialize for FlowAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let details = self
            .details
            .to_value()
            .map_err(serde::ser::Error::custom)?;
        ActionRecord {
            id: self.id.clone(),
            kind: self.kind(),
            details,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recipients_parse() {
        assert_eq!(Recipients::parse("all.users"), Recipients::AllEventUsers);
        assert_eq!(
            Recipients::parse("trigger.t1.user.email"),
            Recipients::RegisteredUser("t1".into())
        );
        assert_eq!(
            Recipients::parse(" a@example.com, ,b@example.com "),
            Recipients::Literal(vec!["a@example.com".into(), "b@example.com".into()])
        );
        // Not a complete binding: treated as literal text
        assert_eq!(
            Recipients::parse("trigger..user.email"),
            Recipients::Literal(vec!["trigger..user.email".into()])
        );
    }

    #[test]
    fn test_recipients_wire_form() {
        assert_eq!(Recipients::RegisteredUser("t1".into()).to_wire(), "trigger.t1.user.email");
        assert_eq!(Recipients::AllEventUsers.to_wire(), "all.users");
        assert_eq!(
            Recipients::Literal(vec!["a@x.io".into(), "b@x.io".into()]).to_wire(),
            "a@x.io,b@x.io"
        );
    }

    #[test]
    fn test_literal_recipients_validation() {
        assert_eq!(
            Recipients::Literal(vec![]).validate(),
            Err(ValidationError::MissingField("recipients"))
        );
        assert_eq!(
            Recipients::Literal(vec!["ops@example.com".into(), "nobody".into()]).validate(),
            Err(ValidationError::InvalidAddress("nobody".into()))
        );
        assert!(Recipients::Literal(vec!["ops@example.com".into()]).validate().is_ok());
    }

    #[test]
    fn test_send_email_requires_subject_and_body() {
        let mut details = SendEmailDetails {
            subject: "".into(),
            body: "hello".into(),
            recipients: Recipients::AllEventUsers,
        };
        assert_eq!(
            ActionDetails::SendEmail(details.clone()).validate(),
            Err(ValidationError::MissingField("subject"))
        );

        details.subject = "Reminder".into();
        details.body = "   ".into();
        assert_eq!(
            ActionDetails::SendEmail(details.clone()).validate(),
            Err(ValidationError::MissingField("body"))
        );

        details.body = "See you soon".into();
        assert!(ActionDetails::SendEmail(details).validate().is_ok());
    }

    #[test]
    fn test_decode_double_encoded_action() {
        let record = json!({
            "id": "a1",
            "type": "ChangeTitle",
            "details": "{\"newTitle\":\"RustConf 2025\"}"
        });
        let action: FlowAction = serde_json::from_value(record).unwrap();
        assert_eq!(
            action.details,
            ActionDetails::ChangeTitle(ChangeTitleDetails {
                new_title: "RustConf 2025".into()
            })
        );
    }

    #[test]
    fn test_share_file_has_no_requirements() {
        let action: FlowAction =
            serde_json::from_value(json!({"id": "a2", "type": "ShareFile", "details": {}})).unwrap();
        assert!(action.details.validate().is_ok());
        assert_eq!(action.details.to_value().unwrap(), json!({}));
    }

    #[test]
    fn test_change_status_payload() {
        let details = ActionDetails::ChangeStatus(ChangeStatusDetails {
            new_status: EventStatus::Completed,
        });
        assert_eq!(details.to_value().unwrap(), json!({"newStatus": "completed"}));
    }

    #[test]
    fn test_flow_action_serializes_full_payload() {
        let action = FlowAction::new(
            "a1",
            ActionDetails::SendEmail(SendEmailDetails {
                subject: "Hi".into(),
                body: "See you".into(),
                recipients: Recipients::RegisteredUser("r1".into()),
            }),
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "type": "SendEmail",
                "details": {
                    "subject": "Hi",
                    "body": "See you",
                    "recipients": "trigger.r1.user.email"
                }
            })
        );
        let back: FlowAction = serde_json::from_value(value).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_manual_literal_keeps_reserved_words_as_addresses() {
        assert_eq!(
            Recipients::literal("all.users"),
            Recipients::Literal(vec!["all.users".into()])
        );
        assert_eq!(
            Recipients::literal(" a@x.io , trigger.t1.user.email "),
            Recipients::Literal(vec!["a@x.io".into(), "trigger.t1.user.email".into()])
        );
    }
}
