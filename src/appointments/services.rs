use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::AppointmentDetails;
use super::repo::{AppointmentRepository, SLOT_TAKEN};
use super::repo_types::{AppointmentStatus, NewAppointment};
use crate::error::{AppError, AppResult};

/// Booking rules: one active appointment per slot, status always starts at
/// `SCHEDULED`, and any known status may follow any other.
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl AppointmentService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        user_id: Uuid,
        date: OffsetDateTime,
        service: String,
        barber: String,
    ) -> AppResult<AppointmentDetails> {
        if service.trim().is_empty() {
            return Err(AppError::validation("service is required"));
        }
        if barber.trim().is_empty() {
            return Err(AppError::validation("barber is required"));
        }
        let date = to_micros(date)?;

        // Early exit only; the store re-checks atomically on insert.
        if let Some(existing) = self.appointments.find_active_in_slot(date, &barber).await? {
            warn!(existing_id = %existing.id, "slot already booked");
            return Err(AppError::conflict(SLOT_TAKEN));
        }

        let row = self
            .appointments
            .insert(NewAppointment {
                user_id,
                date,
                service,
                barber,
            })
            .await?;
        info!(appointment_id = %row.id, "appointment created");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<AppointmentDetails>> {
        let rows = self.appointments.list(user_id).await?;
        Ok(rows.into_iter().map(AppointmentDetails::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<AppointmentDetails> {
        self.appointments
            .find_by_id(id)
            .await?
            .map(AppointmentDetails::from)
            .ok_or_else(|| AppError::not_found("appointment not found"))
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: &str) -> AppResult<AppointmentDetails> {
        let status: AppointmentStatus = status
            .parse()
            .map_err(|_| AppError::validation("invalid status"))?;

        let row = self
            .appointments
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("appointment not found"))?;
        info!(appointment_id = %row.id, %status, "appointment status updated");
        Ok(row.into())
    }
}

/// Postgres `timestamptz` keeps microseconds; every store sees the same instant.
fn to_micros(date: OffsetDateTime) -> AppResult<OffsetDateTime> {
    date.replace_nanosecond(date.nanosecond() / 1_000 * 1_000)
        .map_err(|e| AppError::validation(format!("invalid date: {e}")))
}
