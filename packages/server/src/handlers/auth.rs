use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::ACCEPT_LANGUAGE;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{MeResponse, UpdateMeRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Current user",
    description = "Returns the identity carried by the session token, the permissions of its role \
                   and the preferred language. On the first call the language is negotiated from \
                   `Accept-Language` and saved.",
    params(("Accept-Language" = Option<String>, Header, description = "Used when no language is saved yet")),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AppError> {
    let accept_language = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let language = state.users.language(&auth_user, accept_language).await?;

    let permissions = auth_user.permissions();
    Ok(Json(MeResponse {
        id: auth_user.user_id,
        email: auth_user.email,
        name: auth_user.name,
        role: auth_user.role,
        permissions,
        language,
    }))
}

#[utoipa::path(
    put,
    path = "/me",
    tag = "Auth",
    operation_id = "updateCurrentUser",
    summary = "Update current user",
    description = "Saves the preferred language. Name changes are forwarded to the identity \
                   provider in the background and show up in new session tokens.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated profile", body = MeResponse),
        (status = 400, description = "Unsupported language (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let name = payload.full_name();
    let prefs = state
        .users
        .update_profile(&auth_user, payload.into_input())
        .await?;

    let permissions = auth_user.permissions();
    Ok(Json(MeResponse {
        id: auth_user.user_id,
        email: auth_user.email,
        name: name.unwrap_or(auth_user.name),
        role: auth_user.role,
        permissions,
        language: prefs.language,
    }))
}
