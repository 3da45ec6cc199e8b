use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::appointments::{dto as appointment_dto, handlers as appointment_handlers};
use crate::appointments::repo_types::AppointmentStatus;
use crate::auth::{dto as auth_dto, handlers as auth_handlers, repo_types::Role};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Barbershop API",
        version = "1.0.0",
        description = "Barbershop appointment booking"
    ),
    paths(
        auth_handlers::register,
        auth_handlers::login,
        auth_handlers::profile,
        auth_handlers::admin,
        auth_handlers::update_role,
        appointment_handlers::create_appointment,
        appointment_handlers::list_appointments,
        appointment_handlers::update_appointment_status,
    ),
    components(schemas(
        Role,
        AppointmentStatus,
        auth_dto::RegisterRequest,
        auth_dto::LoginRequest,
        auth_dto::LoginResponse,
        auth_dto::UpdateRoleRequest,
        auth_dto::PublicUser,
        auth_dto::Identity,
        auth_dto::ProfileResponse,
        auth_dto::MessageResponse,
        appointment_dto::CreateAppointmentRequest,
        appointment_dto::UpdateStatusRequest,
        appointment_dto::AppointmentDetails,
        appointment_dto::BookedBy,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration, login and access checks"),
        (name = "Appointments", description = "Booking and status changes")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by POST /api/users/login"))
                        .build(),
                ),
            );
        }
    }
}
