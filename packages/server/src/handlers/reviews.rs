use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::review::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/reviews",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List the reviews of a video",
    description = "Requires `reviews:read` permission.",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Reviews, oldest first", body = ReviewListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_reviews(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<Uuid>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let reviews = state.reviews.list(&auth_user, video_id).await?;
    Ok(Json(ReviewListResponse {
        data: reviews.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/reviews",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a video",
    description = "Requires `reviews:create` permission. Fails with 409 once the asset is completed.",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Asset completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(video_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .reviews
        .create(&auth_user, video_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    patch,
    path = "/{id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Edit a review",
    description = "Requires `reviews:edit` permission. Fails with 409 once the asset is completed.",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or review not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Asset completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((video_id, review_id)): AppPath<(Uuid, Uuid)>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state
        .reviews
        .update(&auth_user, video_id, review_id, &payload.content)
        .await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Requires `reviews:delete` permission. Fails with 409 once the asset is completed.",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or review not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Asset completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((video_id, review_id)): AppPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .reviews
        .delete(&auth_user, video_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/enhance",
    tag = "Reviews",
    operation_id = "enhanceText",
    summary = "Polish review text",
    description = "Rewrites draft review text with an LLM, keeping its language and meaning. Requires `reviews:edit` permission.",
    request_body = EnhanceRequest,
    responses(
        (status = 200, description = "Enhanced text", body = EnhanceResponse),
        (status = 400, description = "Empty text (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn enhance_text(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    let enhanced_text = state.reviews.enhance_text(&auth_user, &payload.text).await?;
    Ok(Json(EnhanceResponse { enhanced_text }))
}
