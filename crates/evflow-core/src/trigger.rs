// evflow Core - Trigger definitions
//
// A trigger is the "when" half of a flow. Each kind carries its own typed
// payload; the backend evaluates them, this crate only defines and validates
// them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::num::NonZeroU32;

use crate::error::{EvflowError, EvflowResult, ValidationError};
use crate::status::EventStatus;
use crate::wire::unwrap_details;

/// Variables a `Registration` trigger exposes to actions in the same flow
pub const REGISTRATION_VARIABLES: [&str; 3] = ["email", "name", "userId"];

/// Trigger discriminant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Date,
    RelativeDate,
    NumOfAttendees,
    Status,
    Registration,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 5] = [
        Self::Date,
        Self::RelativeDate,
        Self::NumOfAttendees,
        Self::Status,
        Self::Registration,
    ];
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "Date"),
            Self::RelativeDate => write!(f, "RelativeDate"),
            Self::NumOfAttendees => write!(f, "NumOfAttendees"),
            Self::Status => write!(f, "Status"),
            Self::Registration => write!(f, "Registration"),
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown trigger kind: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DateOperator {
    Before,
    After,
    On,
}

/// Event boundary a relative date is measured from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DateReference {
    EventStart,
    EventEnd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeOperator {
    Equals,
    Less,
    Greater,
}

/// Whether an attendee threshold is a head count or a share of capacity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Absolute,
    Percentage,
}

// ============================================================================
// Payloads
// ============================================================================

/// Fires relative to an absolute point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDetails {
    pub operator: DateOperator,

    #[serde(with = "local_datetime")]
    pub value: NaiveDateTime,
}

impl DateDetails {
    /// Parse a timestamp as entered in a date-time field
    pub fn parse_value(s: &str) -> EvflowResult<NaiveDateTime> {
        local_datetime::parse(s).map_err(EvflowError::codec)
    }
}

/// Fires at an offset from the event's start or end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDateDetails {
    pub reference: DateReference,
    pub direction: Direction,
    pub amount: NonZeroU32,
    pub unit: TimeUnit,
}

/// Fires when the attendee count crosses a threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawAttendeeDetails")]
pub struct NumOfAttendeesDetails {
    pub operator: AttendeeOperator,
    pub value: u32,
    pub value_type: ValueType,
}

/// Older payloads carry the percentage marker as `unit` or omit it entirely.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttendeeDetails {
    operator: AttendeeOperator,
    value: u32,
    #[serde(default)]
    value_type: Option<ValueType>,
    #[serde(default)]
    unit: Option<String>,
}

impl From<RawAttendeeDetails> for NumOfAttendeesDetails {
    fn from(raw: RawAttendeeDetails) -> Self {
        let value_type = raw.value_type.unwrap_or_else(|| match raw.unit.as_deref() {
            Some("percentage") | Some("percent") | Some("%") => ValueType::Percentage,
            _ => ValueType::Absolute,
        });
        Self {
            operator: raw.operator,
            value: raw.value,
            value_type,
        }
    }
}

/// Fires when the event enters a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub status: EventStatus,
}

/// Typed trigger payload, one variant per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDetails {
    Date(DateDetails),
    RelativeDate(RelativeDateDetails),
    NumOfAttendees(NumOfAttendeesDetails),
    Status(StatusDetails),
    Registration,
}

impl TriggerDetails {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Date(_) => TriggerKind::Date,
            Self::RelativeDate(_) => TriggerKind::RelativeDate,
            Self::NumOfAttendees(_) => TriggerKind::NumOfAttendees,
            Self::Status(_) => TriggerKind::Status,
            Self::Registration => TriggerKind::Registration,
        }
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration)
    }

    /// Check invariants the type system does not carry
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Self::NumOfAttendees(d) = self {
            if d.value_type == ValueType::Percentage && d.value > 100 {
                return Err(ValidationError::PercentageOutOfRange(d.value));
            }
        }
        Ok(())
    }

    /// Variables exposed to actions by a trigger with id `trigger_id`.
    /// Empty for every kind but `Registration`.
    pub fn variables(&self, trigger_id: &str) -> Vec<TriggerVariable> {
        if !self.is_registration() {
            return Vec::new();
        }
        REGISTRATION_VARIABLES
            .iter()
            .map(|name| TriggerVariable {
                name: name.to_string(),
                path: format!("trigger.{}.user.{}", trigger_id, name),
            })
            .collect()
    }

    /// Payload as a JSON object (without the kind tag)
    pub fn to_value(&self) -> EvflowResult<Value> {
        let value = match self {
            Self::Date(d) => serde_json::to_value(d)?,
            Self::RelativeDate(d) => serde_json::to_value(d)?,
            Self::NumOfAttendees(d) => serde_json::to_value(d)?,
            Self::Status(d) => serde_json::to_value(d)?,
            Self::Registration => Value::Object(Default::default()),
        };
        Ok(value)
    }

    /// Decode a payload for `kind`. `details` may be an object or a
    /// JSON-encoded string.
    pub fn from_value(kind: TriggerKind, details: Value) -> EvflowResult<Self> {
        let details = unwrap_details(details)?;
        let decoded = match kind {
            TriggerKind::Date => Self::Date(serde_json::from_value(details)?),
            TriggerKind::RelativeDate => Self::RelativeDate(serde_json::from_value(details)?),
            TriggerKind::NumOfAttendees => Self::NumOfAttendees(serde_json::from_value(details)?),
            TriggerKind::Status => Self::Status(serde_json::from_value(details)?),
            TriggerKind::Registration => Self::Registration,
        };
        Ok(decoded)
    }
}

// ============================================================================
// Flow trigger
// ============================================================================

/// A trigger attached to a flow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TriggerRecord")]
pub struct FlowTrigger {
    pub id: String,
    pub details: TriggerDetails,
}

impl FlowTrigger {
    pub fn new(id: impl Into<String>, details: TriggerDetails) -> Self {
        Self {
            id: id.into(),
            details,
        }
    }

    /// New trigger with a fresh client-side id
    pub fn with_generated_id(details: TriggerDetails) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), details)
    }

    pub fn kind(&self) -> TriggerKind {
        self.details.kind()
    }

    /// Variables this trigger exposes, labelled with `label`
    pub fn variables(&self, label: impl Into<String>) -> Option<TriggerVariables> {
        let variables = self.details.variables(&self.id);
        if variables.is_empty() {
            return None;
        }
        Some(TriggerVariables {
            trigger_id: self.id.clone(),
            label: label.into(),
            variables,
        })
    }
}

/// Serialized form: `{ id, type, details }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TriggerRecord {
    #[serde(default)]
    id: String,

    #[serde(rename = "type")]
    kind: TriggerKind,

    #[serde(default)]
    details: Value,
}

impl TryFrom<TriggerRecord> for FlowTrigger {
    type Error = EvflowError;

    fn try_from(record: TriggerRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            details: TriggerDetails::from_value(record.kind, record.details)?,
        })
    }
}

impl Serialize for FlowTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let details = self
            .details
            .to_value()
            .map_err(serde::ser::Error::custom)?;
        TriggerRecord {
            id: self.id.clone(),
            kind: self.kind(),
            details,
        }
        .serialize(serializer)
    }
}

/// A variable exposed by a trigger, e.g. `trigger.<id>.user.email`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerVariable {
    pub name: String,
    pub path: String,
}

/// Labelled variable set for one registration trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerVariables {
    pub trigger_id: String,
    pub label: String,
    pub variables: Vec<TriggerVariable>,
}

/// Variable sets for every registration trigger in `triggers`.
///
/// A lone registration trigger is labelled "Registration"; several are
/// numbered in list order.
pub fn registration_variables(triggers: &[FlowTrigger]) -> Vec<TriggerVariables> {
    let registrations: Vec<&FlowTrigger> = triggers
        .iter()
        .filter(|t| t.details.is_registration())
        .collect();
    let numbered = registrations.len() > 1;

    registrations
        .into_iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let label = if numbered {
                format!("Registration #{}", i + 1)
            } else {
                "Registration".to_string()
            };
            t.variables(label)
        })
        .collect()
}

/// Timestamps as entered in a `datetime-local` field.
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339 (converted
/// to UTC). Serializes without seconds when they are zero.
mod local_datetime {
    use chrono::{DateTime, NaiveDateTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const MINUTES: &str = "%Y-%m-%dT%H:%M";
    const SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(s: &str) -> Result<NaiveDateTime, String> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, MINUTES)
            .or_else(|_| NaiveDateTime::parse_from_str(s, SECONDS))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()))
            .map_err(|_| format!("invalid timestamp: {}", s))
    }

    pub fn format(value: &NaiveDateTime) -> String {
        if value.second() == 0 && value.nanosecond() == 0 {
            value.format(MINUTES).to_string()
        } else {
            value.format(SECONDS).to_string()
        }
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}
