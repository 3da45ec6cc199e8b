//! In-memory implementation of the repository traits.
//!
//! Every write takes the same lock for its check and its mutation, so the
//! email and slot uniqueness rules hold under concurrent callers exactly as
//! the Postgres constraints enforce them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::appointments::{
    repo::{AppointmentRepository, SLOT_TAKEN},
    repo_types::{AppointmentRow, AppointmentStatus, NewAppointment},
};
use crate::auth::{
    repo::{UserRepository, EMAIL_TAKEN},
    repo_types::{NewUser, Role, User},
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    appointments: HashMap<Uuid, AppointmentRow>,
}

impl Tables {
    fn slot_holder(
        &self,
        date: OffsetDateTime,
        barber: &str,
        except: Option<Uuid>,
    ) -> Option<&AppointmentRow> {
        self.appointments.values().find(|a| {
            a.date == date
                && a.barber == barber
                && a.status.occupies_slot()
                && Some(a.id) != except
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: Role::default(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn role_of(&self, id: Uuid) -> AppResult<Option<Role>> {
        Ok(self.lock()?.users.get(&id).map(|u| u.role))
    }

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>> {
        let mut tables = self.lock()?;
        Ok(tables.users.get_mut(&id).map(|u| {
            u.role = role;
            u.clone()
        }))
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn find_active_in_slot(
        &self,
        date: OffsetDateTime,
        barber: &str,
    ) -> AppResult<Option<AppointmentRow>> {
        Ok(self.lock()?.slot_holder(date, barber, None).cloned())
    }

    async fn insert(&self, appointment: NewAppointment) -> AppResult<AppointmentRow> {
        let mut tables = self.lock()?;
        let owner = tables
            .users
            .get(&appointment.user_id)
            .ok_or_else(|| AppError::not_found("user not found"))?;
        let (user_name, user_email) = (owner.name.clone(), owner.email.clone());

        if tables
            .slot_holder(appointment.date, &appointment.barber, None)
            .is_some()
        {
            return Err(AppError::conflict(SLOT_TAKEN));
        }

        let now = OffsetDateTime::now_utc();
        let row = AppointmentRow {
            id: Uuid::new_v4(),
            user_id: appointment.user_id,
            date: appointment.date,
            service: appointment.service,
            barber: appointment.barber,
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
            user_name,
            user_email,
        };
        tables.appointments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self, user_id: Option<Uuid>) -> AppResult<Vec<AppointmentRow>> {
        let tables = self.lock()?;
        let mut rows: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| user_id.map_or(true, |id| a.user_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AppointmentRow>> {
        Ok(self.lock()?.appointments.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Option<AppointmentRow>> {
        let mut tables = self.lock()?;
        let Some(current) = tables.appointments.get(&id) else {
            return Ok(None);
        };
        if status.occupies_slot()
            && tables
                .slot_holder(current.date, &current.barber, Some(id))
                .is_some()
        {
            return Err(AppError::conflict(SLOT_TAKEN));
        }

        let row = tables.appointments.get_mut(&id).map(|a| {
            a.status = status;
            a.updated_at = OffsetDateTime::now_utc();
            a.clone()
        });
        Ok(row)
    }
}
