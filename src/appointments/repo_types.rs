use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a booking, mapped to the `appointment_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Canceled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        Self::Scheduled,
        Self::Confirmed,
        Self::Canceled,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Confirmed => "CONFIRMED",
            Self::Canceled => "CANCELED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Whether an appointment in this status holds its slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus;

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(UnknownStatus)
    }
}

/// Appointment joined with the owner's name and email.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: OffsetDateTime,
    pub service: String,
    pub barber: String,
    pub status: AppointmentStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub date: OffsetDateTime,
    pub service: String,
    pub barber: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_statuses() {
        assert_eq!("CANCELED".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Canceled));
        assert_eq!("COMPLETED".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Completed));
        assert_eq!("canceled".parse::<AppointmentStatus>(), Err(UnknownStatus));
        assert_eq!("DONE".parse::<AppointmentStatus>(), Err(UnknownStatus));
    }

    #[test]
    fn only_canceled_frees_the_slot() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.occupies_slot(), status != AppointmentStatus::Canceled);
        }
    }
}
