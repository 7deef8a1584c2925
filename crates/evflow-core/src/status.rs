// evflow Core - Event lifecycle status
//
// Shared by the `Status` trigger and the `ChangeStatus` action.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
    Archived,
    Draft,
}

impl EventStatus {
    pub const ALL: [EventStatus; 5] = [
        Self::Active,
        Self::Cancelled,
        Self::Completed,
        Self::Archived,
        Self::Draft,
    ];
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Completed => write!(f, "completed"),
            Self::Archived => write!(f, "archived"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            "draft" => Ok(Self::Draft),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}
