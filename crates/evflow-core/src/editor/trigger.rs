use chrono::NaiveDateTime;
use std::num::NonZeroU32;
use tracing::debug;

use crate::error::ValidationError;
use crate::status::EventStatus;
use crate::trigger::{
    AttendeeOperator, DateDetails, DateOperator, DateReference, Direction, FlowTrigger,
    NumOfAttendeesDetails, RelativeDateDetails, StatusDetails, TimeUnit, TriggerDetails,
    TriggerKind, ValueType,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateDraft {
    pub operator: Option<DateOperator>,
    pub value: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativeDateDraft {
    pub reference: Option<DateReference>,
    pub direction: Option<Direction>,
    pub amount: Option<u32>,
    pub unit: Option<TimeUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendeeDraft {
    pub operator: Option<AttendeeOperator>,
    pub value: Option<u32>,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDraft {
    pub status: Option<EventStatus>,
}

/// Partially filled trigger payload for the selected kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDraft {
    Date(DateDraft),
    RelativeDate(RelativeDateDraft),
    NumOfAttendees(AttendeeDraft),
    Status(StatusDraft),
    Registration,
}

impl TriggerDraft {
    /// Empty draft for `kind`
    pub fn empty(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Date => Self::Date(DateDraft::default()),
            TriggerKind::RelativeDate => Self::RelativeDate(RelativeDateDraft::default()),
            TriggerKind::NumOfAttendees => Self::NumOfAttendees(AttendeeDraft::default()),
            TriggerKind::Status => Self::Status(StatusDraft::default()),
            TriggerKind::Registration => Self::Registration,
        }
    }

    /// Draft pre-populated from stored details
    pub fn from_details(details: &TriggerDetails) -> Self {
        match details {
            TriggerDetails::Date(d) => Self::Date(DateDraft {
                operator: Some(d.operator),
                value: Some(d.value),
            }),
            TriggerDetails::RelativeDate(d) => Self::RelativeDate(RelativeDateDraft {
                reference: Some(d.reference),
                direction: Some(d.direction),
                amount: Some(d.amount.get()),
                unit: Some(d.unit),
            }),
            TriggerDetails::NumOfAttendees(d) => Self::NumOfAttendees(AttendeeDraft {
                operator: Some(d.operator),
                value: Some(d.value),
                value_type: d.value_type,
            }),
            TriggerDetails::Status(d) => Self::Status(StatusDraft {
                status: Some(d.status),
            }),
            TriggerDetails::Registration => Self::Registration,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Date(_) => TriggerKind::Date,
            Self::RelativeDate(_) => TriggerKind::RelativeDate,
            Self::NumOfAttendees(_) => TriggerKind::NumOfAttendees,
            Self::Status(_) => TriggerKind::Status,
            Self::Registration => TriggerKind::Registration,
        }
    }

    /// Apply the per-kind required-field predicate and build the payload
    pub fn build(&self) -> Result<TriggerDetails, ValidationError> {
        let details = match self {
            Self::Date(d) => TriggerDetails::Date(DateDetails {
                operator: d.operator.ok_or(ValidationError::MissingField("operator"))?,
                value: d.value.ok_or(ValidationError::MissingField("value"))?,
            }),
            Self::RelativeDate(d) => {
                let reference = d.reference.ok_or(ValidationError::MissingField("reference"))?;
                let direction = d.direction.ok_or(ValidationError::MissingField("direction"))?;
                let amount = d.amount.ok_or(ValidationError::MissingField("amount"))?;
                let amount = NonZeroU32::new(amount).ok_or(ValidationError::NotPositive("amount"))?;
                let unit = d.unit.ok_or(ValidationError::MissingField("unit"))?;
                TriggerDetails::RelativeDate(RelativeDateDetails {
                    reference,
                    direction,
                    amount,
                    unit,
                })
            }
            Self::NumOfAttendees(d) => TriggerDetails::NumOfAttendees(NumOfAttendeesDetails {
                operator: d.operator.ok_or(ValidationError::MissingField("operator"))?,
                value: d.value.ok_or(ValidationError::MissingField("value"))?,
                value_type: d.value_type,
            }),
            Self::Status(d) => TriggerDetails::Status(StatusDetails {
                status: d.status.ok_or(ValidationError::MissingField("status"))?,
            }),
            Self::Registration => TriggerDetails::Registration,
        };
        details.validate()?;
        Ok(details)
    }
}

/// A trigger kind as offered in the kind selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindOption {
    pub kind: TriggerKind,
    pub enabled: bool,
}

/// Produces one valid trigger or refuses to submit
#[derive(Debug, Clone)]
pub struct TriggerEditor {
    editing_id: Option<String>,
    registration_taken: bool,
    draft: Option<TriggerDraft>,
}

impl TriggerEditor {
    /// Editor for a new trigger in a flow that already holds `siblings`
    pub fn new(siblings: &[FlowTrigger]) -> Self {
        Self {
            editing_id: None,
            registration_taken: siblings.iter().any(|t| t.details.is_registration()),
            draft: None,
        }
    }

    /// Editor pre-populated from `item`. `item` itself does not count
    /// against the single-registration rule.
    pub fn edit(item: &FlowTrigger, siblings: &[FlowTrigger]) -> Self {
        Self {
            editing_id: Some(item.id.clone()),
            registration_taken: siblings
                .iter()
                .any(|t| t.id != item.id && t.details.is_registration()),
            draft: Some(TriggerDraft::from_details(&item.details)),
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn is_kind_enabled(&self, kind: TriggerKind) -> bool {
        !(kind == TriggerKind::Registration && self.registration_taken)
    }

    pub fn kind_options(&self) -> Vec<KindOption> {
        TriggerKind::ALL
            .into_iter()
            .map(|kind| KindOption {
                kind,
                enabled: self.is_kind_enabled(kind),
            })
            .collect()
    }

    pub fn selected_kind(&self) -> Option<TriggerKind> {
        self.draft.as_ref().map(TriggerDraft::kind)
    }

    /// Select a kind. Changing kind discards every field entered so far.
    pub fn select_kind(&mut self, kind: TriggerKind) -> Result<(), ValidationError> {
        if !self.is_kind_enabled(kind) {
            return Err(ValidationError::KindUnavailable(kind));
        }
        if self.selected_kind() != Some(kind) {
            debug!(kind = %kind, "trigger kind selected, details reset");
            self.draft = Some(TriggerDraft::empty(kind));
        }
        Ok(())
    }

    pub fn draft(&self) -> Option<&TriggerDraft> {
        self.draft.as_ref()
    }

    pub fn date_mut(&mut self) -> Option<&mut DateDraft> {
        match self.draft.as_mut()? {
            TriggerDraft::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn relative_date_mut(&mut self) -> Option<&mut RelativeDateDraft> {
        match self.draft.as_mut()? {
            TriggerDraft::RelativeDate(d) => Some(d),
            _ => None,
        }
    }

    pub fn attendees_mut(&mut self) -> Option<&mut AttendeeDraft> {
        match self.draft.as_mut()? {
            TriggerDraft::NumOfAttendees(d) => Some(d),
            _ => None,
        }
    }

    pub fn status_mut(&mut self) -> Option<&mut StatusDraft> {
        match self.draft.as_mut()? {
            TriggerDraft::Status(d) => Some(d),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<TriggerDetails, ValidationError> {
        let draft = self.draft.as_ref().ok_or(ValidationError::NoKindSelected)?;
        if !self.is_kind_enabled(draft.kind()) {
            return Err(ValidationError::KindUnavailable(draft.kind()));
        }
        draft.build()
    }

    /// Whether the submit action is enabled
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    /// Finish editing; keeps the id of an edited trigger
    pub fn submit(self) -> Result<FlowTrigger, ValidationError> {
        let details = self.validate()?;
        let trigger = match self.editing_id {
            Some(id) => FlowTrigger::new(id, details),
            None => FlowTrigger::with_generated_id(details),
        };
        debug!(id = %trigger.id, kind = %trigger.kind(), "trigger submitted");
        Ok(trigger)
    }
}
