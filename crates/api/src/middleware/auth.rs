//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use taskhub_core::types::DbId;
use taskhub_db::models::user::User;
use taskhub_db::UserRepository;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the cookie set alongside the token in auth responses.
pub const TOKEN_COOKIE: &str = "token";

/// The authenticated caller.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// The user's current record, re-read on every request.
    pub user: User,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or_else(AppError::not_authorized)?;
        let user = authenticate(state, &token).await?;
        Ok(AuthUser {
            user_id: user.id,
            user,
        })
    }
}

/// Token from `Authorization: Bearer <token>`, falling back to the `token` cookie.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Validate a token and load the user it names.
///
/// Any failure, including a valid token for a user that no longer exists,
/// is the same generic 401.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<User> {
    let claims = validate_token(token, &state.config.jwt).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::not_authorized()
    })?;

    state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(AppError::not_authorized)
}
