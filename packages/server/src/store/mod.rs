//! Persistence boundary for the lifecycle core.
//!
//! The transition rules for assets and videos are enforced here, not by the
//! callers: `advance_asset_status` is a compare-and-set that only moves an asset
//! forward, and `set_video_playback` only fills a playback id that is still empty.
//! Review writes check the owning asset's status in the same step as the write.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AssetStatus, VideoStatus};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The asset owning the targeted video is completed; its reviews are frozen.
    #[error("asset is completed")]
    AssetCompleted,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub group_id: Uuid,
    pub owner_id: String,
    pub status: AssetStatus,
    pub playback_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Video {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub upload_id: String,
    pub provider_asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub status: VideoStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub owner_id: String,
    /// Raw image bytes.
    pub avatar: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPreferences {
    pub user_id: String,
    pub language: String,
    pub updated_at: DateTime<Utc>,
}

/// An asset listed together with the first video that has an upload session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSummary {
    pub asset: Asset,
    pub cover: Option<Video>,
}

/// Insert parameters for an asset and its videos, written together.
#[derive(Clone, Debug)]
pub struct NewAsset {
    pub title: String,
    pub description: String,
    pub group_id: Uuid,
    pub owner_id: String,
    /// One provider upload session id per video.
    pub upload_ids: Vec<String>,
}

/// Outcome of a compare-and-set status update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    /// The asset moved from `from` to the requested status.
    Advanced { from: AssetStatus },
    /// The asset was already at or past the requested status; nothing was written.
    Rejected { current: AssetStatus },
}

/// Data store operations consumed by the lifecycle core.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Insert an asset in `WaitingUpload` and one `WaitingUpload` video per upload id,
    /// atomically.
    async fn create_asset(&self, new: NewAsset) -> Result<(Asset, Vec<Video>), StoreError>;

    async fn get_asset(&self, id: Uuid) -> Result<Asset, StoreError>;

    /// All assets, newest first.
    async fn list_assets(&self) -> Result<Vec<AssetSummary>, StoreError>;

    /// Move an asset to `next` if and only if that is a forward transition from its
    /// current status.
    async fn advance_asset_status(
        &self,
        id: Uuid,
        next: AssetStatus,
    ) -> Result<StatusChange, StoreError>;

    /// Videos of an asset in creation order.
    async fn get_asset_videos(&self, asset_id: Uuid) -> Result<Vec<Video>, StoreError>;

    /// Record the playback id for the video with the given upload session and mark
    /// it `Ready`. The owning asset's playback id is filled too if still empty.
    ///
    /// Returns `false` without writing if the video already has a playback id.
    async fn set_video_playback(
        &self,
        upload_id: &str,
        provider_asset_id: &str,
        playback_id: &str,
    ) -> Result<bool, StoreError>;

    /// Move the video with the given upload session to `next` if that is a forward
    /// transition and no playback id is known yet. Returns whether a row changed.
    async fn advance_video_status(
        &self,
        upload_id: &str,
        next: VideoStatus,
        provider_asset_id: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn is_group_member(&self, user_id: &str, group_id: Uuid) -> Result<bool, StoreError>;

    async fn get_group(&self, id: Uuid) -> Result<Group, StoreError>;

    /// Create a group owned by `owner_id`, who also becomes its first member.
    async fn create_group(
        &self,
        name: &str,
        owner_id: &str,
        avatar: Option<Vec<u8>>,
    ) -> Result<Group, StoreError>;

    async fn list_user_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError>;

    /// Add a member; adding an existing member is a no-op.
    async fn add_group_member(&self, group_id: Uuid, user_id: &str) -> Result<(), StoreError>;

    /// Review writes fail with `AssetCompleted` when the owning asset is completed.
    async fn create_review(&self, video_id: Uuid, content: &str) -> Result<Review, StoreError>;

    /// Reviews of a video, oldest first.
    async fn list_reviews(&self, video_id: Uuid) -> Result<Vec<Review>, StoreError>;

    async fn update_review(
        &self,
        video_id: Uuid,
        review_id: Uuid,
        content: &str,
    ) -> Result<Review, StoreError>;

    async fn delete_review(&self, video_id: Uuid, review_id: Uuid) -> Result<(), StoreError>;

    /// Status of the asset owning the given video.
    async fn get_asset_status_by_video_id(&self, video_id: Uuid)
    -> Result<AssetStatus, StoreError>;

    async fn get_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError>;

    async fn upsert_user_preferences(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<UserPreferences, StoreError>;
}
