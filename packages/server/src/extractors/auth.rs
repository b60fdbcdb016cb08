use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use common::permission::Role;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user taken from the session token.
///
/// The token is read from `Authorization: Bearer <token>` first and falls back to the
/// session cookie. Add this as a handler parameter to require authentication;
/// permission checks happen via `require_permission()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl AuthUser {
    /// Returns `Ok(())` if the user's role grants `action`, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, action: &str) -> Result<(), AppError> {
        if common::has_permission(&self.role, action) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Actions granted to the user's role. Empty for an unknown role.
    pub fn permissions(&self) -> Vec<String> {
        self.role
            .parse::<Role>()
            .map(|role| role.permissions().iter().map(|p| p.to_string()).collect())
            .unwrap_or_default()
    }

    /// Display name, falling back to the email when the provider supplied none.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok());

        let token = match header {
            Some(value) => value
                .strip_prefix("Bearer ")
                .ok_or(AppError::TokenInvalid)?
                .to_string(),
            None => CookieJar::from_headers(&parts.headers)
                .get(&state.config.auth.cookie_name)
                .map(|c| c.value().to_string())
                .ok_or(AppError::TokenMissing)?,
        };

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}
