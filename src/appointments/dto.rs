use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::repo_types::{AppointmentRow, AppointmentStatus};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    /// Defaults to the caller. Booking for someone else requires `ADMIN`.
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime, example = "2025-01-10T10:00:00Z")]
    pub date: OffsetDateTime,
    #[schema(example = "haircut")]
    pub service: String,
    #[schema(example = "bob")]
    pub barber: String,
    /// Accepted for compatibility and ignored: new bookings are always `SCHEDULED`.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    /// Only this user's appointments. Omitting it requires `ADMIN`.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "CANCELED")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookedBy {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date: OffsetDateTime,
    pub service: String,
    pub barber: String,
    pub status: AppointmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    pub user: BookedBy,
}

impl From<AppointmentRow> for AppointmentDetails {
    fn from(r: AppointmentRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            service: r.service,
            barber: r.barber,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: BookedBy {
                name: r.user_name,
                email: r.user_email,
            },
        }
    }
}
