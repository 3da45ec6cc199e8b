use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{LoginResponse, PublicUser};
use super::jwt::JwtKeys;
use super::password::{hash_password_blocking, verify_password_blocking};
use super::repo::UserRepository;
use super::repo_types::NewUser;
use crate::error::{AppError, AppResult, AuthError};

/// Registration input as received from the boundary.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Password hashing and token issuing/verification.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> AppResult<PublicUser> {
        require("name", &input.name)?;
        require("email", &input.email)?;
        require("phone", &input.phone)?;
        require("password", &input.password)?;

        let password_hash = hash_password_blocking(input.password).await?;
        let user = self
            .users
            .create(NewUser {
                name: input.name,
                email: input.email,
                phone: input.phone,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(PublicUser::from(user))
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("login for unknown email");
            return Err(AppError::not_found("user not found"));
        };

        let valid =
            verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !valid {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            user: PublicUser::from(user),
            token,
        })
    }

    /// Checks an `Authorization` header value and returns the user id it
    /// was issued for.
    pub fn verify_token(&self, header: Option<&str>) -> Result<Uuid, AuthError> {
        let token = parse_bearer(header)?;
        Ok(self.keys.verify(token)?.sub)
    }
}

/// Splits `Bearer <token>`. The scheme is matched case-insensitively and the
/// header must hold exactly two space-separated parts.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AuthError::MalformedHeader),
    }
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::auth::repo::MockUserRepository;
    use crate::auth::repo_types::{Role, User};
    use crate::config::JwtConfig;
    use crate::memory::MemoryStore;
    use time::OffsetDateTime;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "unit-test-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 60 * 24,
        })
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Alice".into(),
            email: email.into(),
            phone: "555-0100".into(),
            password: "hunter22".into(),
        }
    }

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), keys())
    }

    #[test]
    fn parse_bearer_accepts_any_scheme_case() {
        assert_eq!(parse_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(parse_bearer(Some("bearer abc")).unwrap(), "abc");
        assert_eq!(parse_bearer(Some("BEARER abc")).unwrap(), "abc");
    }

    #[test]
    fn parse_bearer_rejects_bad_headers() {
        assert!(matches!(parse_bearer(None), Err(AuthError::MissingToken)));
        for bad in ["Bearer", "Bearer a b", "Basic abc", "abc", "Bearer ", ""] {
            assert!(
                matches!(parse_bearer(Some(bad)), Err(AuthError::MalformedHeader)),
                "{bad:?} should be malformed"
            );
        }
    }

    #[tokio::test]
    async fn register_hashes_password_and_hides_it() {
        let users = Arc::new(MemoryStore::new());
        let svc = AuthService::new(users.clone(), keys());

        let created = svc.register(registration("alice@x.com")).await.unwrap();
        assert_eq!(created.email, "alice@x.com");
        assert_eq!(created.role, Role::User);

        let json = serde_json::to_string(&created).unwrap();
        assert!(!json.contains("hunter22"));
        assert!(!json.contains("argon2"));

        let stored = users.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hunter22");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_empty_fields() {
        let svc = service();
        let mut input = registration("a@x.com");
        input.phone = "  ".into();
        let err = svc.register(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "phone is required"));
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let svc = service();
        svc.register(registration("dup@x.com")).await.unwrap();
        let err = svc.register(registration("dup@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "email already registered"));
    }

    #[tokio::test]
    async fn register_surfaces_repository_conflict() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(AppError::conflict("email already registered")));

        let svc = AuthService::new(Arc::new(repo), keys());
        let err = svc.register(registration("taken@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn authenticate_issues_token_for_same_user() {
        let svc = service();
        let created = svc.register(registration("bob@x.com")).await.unwrap();

        let login = svc.authenticate("bob@x.com", "hunter22").await.unwrap();
        assert_eq!(login.user.id, created.id);

        let header = format!("Bearer {}", login.token);
        assert_eq!(svc.verify_token(Some(&header)).unwrap(), created.id);
    }

    #[tokio::test]
    async fn authenticate_wrong_password_is_unauthorized() {
        let svc = service();
        svc.register(registration("carol@x.com")).await.unwrap();
        let err = svc.authenticate("carol@x.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Unauthorized(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn authenticate_unknown_email_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let svc = AuthService::new(Arc::new(repo), keys());
        let err = svc.authenticate("ghost@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let hash = hash_password("pw").unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |email| {
            Ok((email == "dan@x.com").then(|| User {
                id: Uuid::new_v4(),
                name: "Dan".into(),
                email: email.to_string(),
                phone: "1".into(),
                password_hash: hash.clone(),
                role: Role::User,
                created_at: OffsetDateTime::now_utc(),
            }))
        });

        let svc = AuthService::new(Arc::new(repo), keys());
        assert!(svc.authenticate("dan@x.com", "pw").await.is_ok());
        assert!(matches!(
            svc.authenticate("DAN@x.com", "pw").await,
            Err(AppError::NotFound(_))
        ));
    }
}
