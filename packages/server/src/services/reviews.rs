use std::sync::Arc;

use common::permission::{REVIEWS_CREATE, REVIEWS_DELETE, REVIEWS_EDIT, REVIEWS_READ};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::providers::llm::TextEnhancer;
use crate::store::{DataStore, Review};

/// Review CRUD. The store refuses writes once the owning asset is completed,
/// checked in the same transaction as the write.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn DataStore>,
    enhancer: Arc<dyn TextEnhancer>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DataStore>, enhancer: Arc<dyn TextEnhancer>) -> Self {
        Self { store, enhancer }
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn list(&self, user: &AuthUser, video_id: Uuid) -> Result<Vec<Review>, AppError> {
        user.require_permission(REVIEWS_READ)?;
        // 404 for an unknown video rather than an empty list.
        self.store.get_asset_status_by_video_id(video_id).await?;
        Ok(self.store.list_reviews(video_id).await?)
    }

    #[instrument(skip(self, user, content), fields(user_id = %user.user_id))]
    pub async fn create(
        &self,
        user: &AuthUser,
        video_id: Uuid,
        content: &str,
    ) -> Result<Review, AppError> {
        user.require_permission(REVIEWS_CREATE)?;
        validate_content(content)?;

        let review = self.store.create_review(video_id, content).await?;
        info!(review_id = %review.id, "Review created");
        Ok(review)
    }

    #[instrument(skip(self, user, content), fields(user_id = %user.user_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        video_id: Uuid,
        review_id: Uuid,
        content: &str,
    ) -> Result<Review, AppError> {
        user.require_permission(REVIEWS_EDIT)?;
        validate_content(content)?;

        Ok(self
            .store
            .update_review(video_id, review_id, content)
            .await?)
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn delete(
        &self,
        user: &AuthUser,
        video_id: Uuid,
        review_id: Uuid,
    ) -> Result<(), AppError> {
        user.require_permission(REVIEWS_DELETE)?;
        self.store.delete_review(video_id, review_id).await?;
        info!("Review deleted");
        Ok(())
    }

    /// Polish review text with the LLM. Gated like editing a review.
    #[instrument(skip(self, user, text), fields(user_id = %user.user_id))]
    pub async fn enhance_text(&self, user: &AuthUser, text: &str) -> Result<String, AppError> {
        user.require_permission(REVIEWS_EDIT)?;
        Ok(self.enhancer.enhance(text).await?)
    }
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Review content must not be empty".into()));
    }
    Ok(())
}
