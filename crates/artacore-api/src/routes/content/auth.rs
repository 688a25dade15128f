//! Authentication extractors and routes

use artacore_auth::{Action, AuthError, AuthUser, hash_password};
use artacore_db::{NewUser, UserRole};
use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};

// ==================== Auth Extractors ====================

/// Extractor for the identity the gate admitted
///
/// The gate middleware inserts an [`AuthUser`] for every request it admits;
/// a handler behind a public prefix gets a 401 instead.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(ApiError::Auth(AuthError::MissingOrMalformedHeader))
    }
}

impl RequireAuth {
    /// Check the configured policy for `action`
    pub fn require(&self, state: &AppState, action: Action) -> Result<&AuthUser, ApiError> {
        state.policy.require(&self.0, action)?;
        Ok(&self.0)
    }
}

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length for new accounts
const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /api/auth
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Stored emails are trimmed at registration
    let email = request.email.trim();
    if email.len() > MAX_EMAIL_LENGTH || request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest("Credentials too long".to_string()));
    }

    let issued = state
        .authenticator
        .authenticate(email, &request.password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!("Failed login for {}", email);
            }
        })?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// POST /api/register
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !state.allow_registration {
        return Err(ApiError::Forbidden("Registration is disabled".to_string()));
    }

    let email = request.email.trim();
    validate_email(email)?;
    validate_new_password(&request.password)?;

    debug!("Registering user: {}", email);

    let password_hash = hash_password(&request.password)?;
    let user = state
        .db
        .insert_user(NewUser {
            email: email.to_string(),
            password_hash,
            role: UserRole::Author,
        })
        .await?;

    info!("Registered user: {}", user.email);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/me
async fn me(
    auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.0.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", auth.0.id)))?;

    Ok(Json(user.into()))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth", post(login))
        .route("/api/register", post(register))
        .route("/api/me", get(me))
}
