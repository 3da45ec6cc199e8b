use std::sync::Arc;

use tracing::{debug, warn};

use super::dto::Identity;
use super::repo::UserRepository;
use super::repo_types::Role;
use super::services::AuthService;
use crate::error::{AppError, AppResult, AuthError};

/// Resolves bearer tokens to live users and checks roles against the store.
pub struct AccessControl {
    auth: Arc<AuthService>,
    users: Arc<dyn UserRepository>,
}

impl AccessControl {
    pub fn new(auth: Arc<AuthService>, users: Arc<dyn UserRepository>) -> Self {
        Self { auth, users }
    }

    /// Verifies the header and confirms the account still exists.
    pub async fn authenticate(&self, header: Option<&str>) -> AppResult<Identity> {
        let user_id = self.auth.verify_token(header)?;
        let user = self.users.find_by_id(user_id).await?.ok_or_else(|| {
            warn!(%user_id, "token for missing user");
            AuthError::UserNotFound
        })?;
        Ok(Identity::from(&user))
    }

    /// Role is read from the store on every check, so a role change applies
    /// without a new login.
    pub async fn authorize_role(&self, identity: &Identity, required: Role) -> AppResult<()> {
        if self.has_role(identity, required).await? {
            Ok(())
        } else {
            debug!(user_id = %identity.id, ?required, "role check failed");
            Err(AppError::Forbidden)
        }
    }

    pub async fn has_role(&self, identity: &Identity, role: Role) -> AppResult<bool> {
        let current = self
            .users
            .role_of(identity.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(current == role)
    }
}
