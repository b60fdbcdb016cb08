use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Review;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReviewRequest {
    /// Review text. Must not be blank.
    #[schema(example = "Relax the right shoulder in bars 12-16.")]
    pub content: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            video_id: review.video_id,
            content: review.content,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<ReviewResponse>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EnhanceRequest {
    #[schema(example = "releax shoulder, bow is to fast")]
    pub text: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnhanceResponse {
    #[schema(example = "Relax your shoulder; the bow speed is too fast.")]
    pub enhanced_text: String,
}
