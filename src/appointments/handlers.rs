use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::dto::{
    AppointmentDetails, CreateAppointmentRequest, ListAppointmentsQuery, UpdateStatusRequest,
};
use crate::auth::{dto::Identity, extractors::AuthUser, repo_types::Role};
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/:appointment_id/status",
            put(update_appointment_status),
        )
}

/// Callers act on their own appointments; anything else needs `ADMIN`.
async fn require_self_or_admin(
    state: &AppState,
    caller: &Identity,
    owner: Uuid,
) -> AppResult<()> {
    if caller.id == owner {
        return Ok(());
    }
    state.access.authorize_role(caller, Role::Admin).await
}

/// Book a slot.
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = AppointmentDetails),
        (status = 400, description = "Invalid input or time slot already booked"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Booking for another user without ADMIN role")
    )
)]
#[instrument(skip(state, caller, payload))]
pub async fn create_appointment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(payload): ApiJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<AppointmentDetails>)> {
    let owner = payload.user_id.unwrap_or(caller.id);
    require_self_or_admin(&state, &caller, owner).await?;

    if let Some(requested) = payload.status.as_deref() {
        debug!(requested, "ignoring client-supplied status");
    }

    let appointment = state
        .appointments
        .create(owner, payload.date, payload.service, payload.barber)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// List appointments ordered by date.
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "Appointments ordered by date", body = [AppointmentDetails]),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Listing other users without ADMIN role")
    )
)]
#[instrument(skip(state, caller))]
pub async fn list_appointments(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiQuery(query): ApiQuery<ListAppointmentsQuery>,
) -> AppResult<Json<Vec<AppointmentDetails>>> {
    match query.user_id {
        Some(owner) => require_self_or_admin(&state, &caller, owner).await?,
        None => state.access.authorize_role(&caller, Role::Admin).await?,
    }
    let appointments = state.appointments.list(query.user_id).await?;
    Ok(Json(appointments))
}

/// Move an appointment to another status.
#[utoipa::path(
    put,
    path = "/api/appointments/{appointment_id}/status",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(("appointment_id" = Uuid, Path, description = "Appointment to update")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AppointmentDetails),
        (status = 400, description = "Invalid status"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner and not ADMIN"),
        (status = 404, description = "Appointment not found")
    )
)]
#[instrument(skip(state, caller, payload))]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(appointment_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> AppResult<Json<AppointmentDetails>> {
    let current = state.appointments.get(appointment_id).await?;
    require_self_or_admin(&state, &caller, current.user_id).await?;

    let updated = state
        .appointments
        .update_status(appointment_id, &payload.status)
        .await?;
    Ok(Json(updated))
}
