use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::asset::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Assets",
    operation_id = "createAsset",
    summary = "Create an asset and open upload sessions",
    description = "Creates an asset in `waiting_upload` with one video per filename and returns a direct-upload URL for each. Requires `assets:create` permission and membership of the target group. No asset is created if the video provider fails.",
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Asset created", body = CreateAssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, NOT_GROUP_MEMBER)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Video provider failure (PROVIDER_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_asset(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.into_input()?;
    let created = state.assets.create_asset(&auth_user, input).await?;

    Ok((StatusCode::CREATED, Json(CreateAssetResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Assets",
    operation_id = "listAssets",
    summary = "List assets",
    description = "Returns all assets, newest first, with their cover playback id and thumbnail. Playback ids not yet cached are looked up with the video provider; lookup failures only leave the field empty.",
    responses(
        (status = 200, description = "List of assets", body = AssetListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_assets(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AssetListResponse>, AppError> {
    let views = state.assets.list_assets().await?;
    Ok(Json(AssetListResponse {
        data: views.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Assets",
    operation_id = "getAsset",
    summary = "Get an asset with its videos",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset details", body = AssetResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_asset(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let view = state.assets.get_asset(id).await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "Assets",
    operation_id = "completeUpload",
    summary = "Mark the upload as finished",
    description = "Moves the asset from `waiting_upload` to `pending`. Only the asset owner may call this; calling it again while `pending` is a no-op.",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset is pending review", body = AssetResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the asset owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Asset already completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn complete_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.assets.complete_upload(&auth_user, id).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/finalize",
    tag = "Assets",
    operation_id = "finalizeAsset",
    summary = "Finish reviewing an asset",
    description = "Moves the asset to `completed`, after which its reviews are frozen. Requires `video:finalize` permission. The owner is emailed in the background unless they finalized it themselves.",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset completed", body = AssetResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Asset already completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn finalize_asset(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.assets.finalize_asset(&auth_user, id).await?;
    Ok(Json(asset.into()))
}
