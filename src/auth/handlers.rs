use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    LoginRequest, LoginResponse, MessageResponse, ProfileResponse, PublicUser, RegisterRequest,
    UpdateRoleRequest,
};
use super::extractors::{AdminUser, AuthUser};
use super::services::Registration;
use crate::error::{AppError, AppResult, AuthError};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/:user_id/role", put(update_role))
        .route("/profile", get(profile))
        .route("/admin", get(admin))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = PublicUser),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    // Stored and looked up exactly as validated.
    let email = payload.email.trim().to_owned();
    // Empty fields are reported by the service as missing.
    if !email.is_empty() && !is_valid_email(&email) {
        warn!("invalid email");
        return Err(AppError::validation("invalid email"));
    }

    let user = state
        .auth
        .register(Registration {
            name: payload.name,
            email,
            phone: payload.phone,
            password: payload.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a bearer token valid for 24 hours.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    // Unknown email and wrong password look the same from outside.
    let result = state
        .auth
        .authenticate(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) | AppError::Unauthorized(AuthError::InvalidCredentials) => {
                AppError::from(AuthError::InvalidCredentials)
            }
            other => other,
        })?;
    Ok(Json(result))
}

/// Identity behind the presented token.
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
pub async fn profile(AuthUser(identity): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: identity })
}

/// Admin-only probe.
#[utoipa::path(
    get,
    path = "/api/admin",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller is an administrator", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn admin(AdminUser(identity): AdminUser) -> Json<MessageResponse> {
    info!(user_id = %identity.id, "admin access granted");
    Json(MessageResponse {
        message: "access granted to administrators".into(),
    })
}

/// Change a user's role.
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User to update")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = PublicUser),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "User not found")
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateRoleRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .update_role(user_id, payload.role)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    info!(admin_id = %admin.id, %user_id, role = ?user.role, "role updated");
    Ok(Json(PublicUser::from(user)))
}
