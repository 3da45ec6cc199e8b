use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{AppointmentRow, AppointmentStatus, NewAppointment};
use crate::error::{foreign_key_violation, unique_violation, AppError, AppResult};

pub const SLOT_TAKEN: &str = "time slot already booked";

/// Columns of an appointment joined with its owner, aliased to match
/// [`AppointmentRow`]. Expects the appointment as `a` and the user as `u`.
const JOINED_COLUMNS: &str = "a.id, a.user_id, a.date, a.service, a.barber, a.status, \
     a.created_at, a.updated_at, u.name AS user_name, u.email AS user_email";

/// Data access for appointments. Implementations must reject a second
/// non-canceled appointment for the same `(date, barber)` atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// A non-canceled appointment occupying the slot, if any.
    async fn find_active_in_slot(
        &self,
        date: OffsetDateTime,
        barber: &str,
    ) -> AppResult<Option<AppointmentRow>>;

    /// Insert with status `SCHEDULED`. Fails with `Conflict` when the slot is
    /// taken and `NotFound` when the owner does not exist.
    async fn insert(&self, appointment: NewAppointment) -> AppResult<AppointmentRow>;

    /// Ordered by date then id.
    async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<AppointmentRow>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AppointmentRow>>;

    /// `Ok(None)` when the id is unknown. Fails with `Conflict` when the change
    /// would put a second active appointment into a slot.
    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Option<AppointmentRow>>;
}

#[derive(Clone)]
pub struct PgAppointmentRepository {
    db: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if unique_violation(&e).is_some() {
        return AppError::conflict(SLOT_TAKEN);
    }
    if foreign_key_violation(&e).is_some() {
        return AppError::not_found("user not found");
    }
    AppError::from(e)
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn find_active_in_slot(
        &self,
        date: OffsetDateTime,
        barber: &str,
    ) -> AppResult<Option<AppointmentRow>> {
        let sql = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM appointments a JOIN users u ON u.id = a.user_id \
             WHERE a.date = $1 AND a.barber = $2 AND a.status <> 'CANCELED' \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(date)
            .bind(barber)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn insert(&self, appointment: NewAppointment) -> AppResult<AppointmentRow> {
        // The partial unique index on (date, barber) is the real guard here.
        let sql = format!(
            "WITH a AS ( \
                 INSERT INTO appointments (id, user_id, date, service, barber, status) \
                 VALUES ($1, $2, $3, $4, $5, 'SCHEDULED') \
                 RETURNING * \
             ) \
             SELECT {JOINED_COLUMNS} FROM a JOIN users u ON u.id = a.user_id"
        );
        sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(appointment.user_id)
            .bind(appointment.date)
            .bind(&appointment.service)
            .bind(&appointment.barber)
            .fetch_one(&self.db)
            .await
            .map_err(map_write_error)
    }

    async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<AppointmentRow>> {
        let sql = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM appointments a JOIN users u ON u.id = a.user_id \
             WHERE ($1::uuid IS NULL OR a.user_id = $1) \
             ORDER BY a.date ASC, a.id ASC"
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AppointmentRow>> {
        let sql = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM appointments a JOIN users u ON u.id = a.user_id \
             WHERE a.id = $1"
        );
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Option<AppointmentRow>> {
        let sql = format!(
            "WITH a AS ( \
                 UPDATE appointments SET status = $2, updated_at = now() \
                 WHERE id = $1 \
                 RETURNING * \
             ) \
             SELECT {JOINED_COLUMNS} FROM a JOIN users u ON u.id = a.user_id"
        );
        sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await
            .map_err(map_write_error)
    }
}
