use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::dto::Identity;
use super::repo_types::Role;
use crate::error::{AppError, AuthError};
use crate::state::AppState;

/// Extracts and validates the bearer token, yielding the live identity.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::MalformedHeader)?),
            None => None,
        };
        let identity = state.access.authenticate(header).await?;
        Ok(AuthUser(identity))
    }
}

/// Like [`AuthUser`], but additionally requires the `ADMIN` role.
pub struct AdminUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        state.access.authorize_role(&identity, Role::Admin).await?;
        Ok(AdminUser(identity))
    }
}
