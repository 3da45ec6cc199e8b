use std::sync::Arc;

use crate::appointments::{
    repo::{AppointmentRepository, PgAppointmentRepository},
    services::AppointmentService,
};
use crate::auth::{
    access::AccessControl,
    jwt::JwtKeys,
    repo::{PgUserRepository, UserRepository},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::db;
use crate::memory::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<AuthService>,
    pub access: Arc<AccessControl>,
    pub appointments: Arc<AppointmentService>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the services.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        let users = Arc::new(PgUserRepository::new(pool.clone())) as Arc<dyn UserRepository>;
        let appointments =
            Arc::new(PgAppointmentRepository::new(pool)) as Arc<dyn AppointmentRepository>;
        Ok(Self::from_parts(Arc::new(config), users, appointments))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        let auth = Arc::new(AuthService::new(users.clone(), keys));
        let access = Arc::new(AccessControl::new(auth.clone(), users.clone()));
        let appointments = Arc::new(AppointmentService::new(appointments));
        Self {
            config,
            users,
            auth,
            access,
            appointments,
        }
    }

    /// State backed by a fresh [`MemoryStore`]; no database required.
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(
            Arc::new(config),
            store.clone() as Arc<dyn UserRepository>,
            store as Arc<dyn AppointmentRepository>,
        )
    }
}
