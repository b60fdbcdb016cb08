use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::group::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Groups",
    operation_id = "createGroup",
    summary = "Create a group",
    description = "The caller becomes owner and first member. Requires `groups:create` permission.",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Bad name or avatar (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_group(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = state
        .groups
        .create(&auth_user, &payload.name, payload.avatar.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Groups",
    operation_id = "listGroups",
    summary = "List the caller's groups",
    description = "Requires `groups:read` permission.",
    responses(
        (status = 200, description = "Groups the caller belongs to", body = GroupListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_groups(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<GroupListResponse>, AppError> {
    let groups = state.groups.list(&auth_user).await?;
    Ok(Json(GroupListResponse {
        data: groups.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Groups",
    operation_id = "addGroupMember",
    summary = "Add a member to a group",
    description = "Only the group owner may add members. Adding an existing member is a no-op.",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 204, description = "Member added"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the group owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn add_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(group_id): AppPath<Uuid>,
    AppJson(payload): AppJson<AddMemberRequest>,
) -> Result<StatusCode, AppError> {
    state
        .groups
        .add_member(&auth_user, group_id, &payload.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
