//! Handlers for the `/auth` resource (register, login, me).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskhub_core::user::{LoginRequest, RegisterRequest};
use taskhub_db::models::user::{CreateUser, User, UserResponse};
use taskhub_db::UserRepository;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ValidJson};
use crate::middleware::auth::{AuthUser, TOKEN_COOKIE};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Lifetime of the `token` cookie, in seconds (7 days).
const COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// POST /api/auth/register
///
/// Create an account and sign the new user in. Returns 201.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RegisterRequest>,
) -> AppResult<Response> {
    let email = input.normalized_email();
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = state
        .store
        .create_user(&CreateUser {
            username: input.username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    token_response(&state, user, StatusCode::CREATED, "User registered successfully")
}

/// POST /api/auth/login
///
/// Exchange email and password for a token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let (email, password) = input
        .credentials()
        .ok_or_else(|| AppError::BadRequest("Please provide an email and password".into()))?;

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let valid = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(AppError::invalid_credentials());
    }

    tracing::info!(user_id = user.id, "User logged in");
    token_response(&state, user, StatusCode::OK, "User logged in successfully")
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::new(UserResponse::from(auth.user))
}

/// Sign a token for `user` and return it both in the body and as an
/// http-only cookie.
fn token_response(
    state: &AppState,
    user: User,
    status: StatusCode,
    message: &str,
) -> AppResult<Response> {
    let token = generate_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let cookie = format!(
        "{TOKEN_COOKIE}={token}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; HttpOnly; SameSite=Lax"
    );
    let body = ApiResponse::new(UserResponse::from(user))
        .with_message(message)
        .with_token(token);

    Ok((status, [(SET_COOKIE, cookie)], body).into_response())
}
