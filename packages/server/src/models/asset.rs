use chrono::{DateTime, Utc};
use common::{AssetStatus, VideoStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::lifecycle::{AssetView, CreateAsset, CreatedAsset, UploadSlot};
use crate::store::{Asset, Video};

/// Request body for creating an asset.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssetRequest {
    /// Asset title (1-256 characters).
    #[schema(example = "Bach Suite No. 1, Prelude")]
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    #[schema(example = "First take, please focus on intonation")]
    pub description: String,
    /// Group the asset is uploaded to. The caller must be a member.
    #[schema(example = "0192f0c4-6a1e-7c3b-9d2a-5b8e1f4c7a90")]
    pub group_id: String,
    /// One upload session is opened per filename.
    #[schema(example = json!(["prelude.mp4"]))]
    pub filenames: Vec<String>,
}

impl CreateAssetRequest {
    pub fn into_input(self) -> Result<CreateAsset, AppError> {
        let group_id = Uuid::parse_str(self.group_id.trim())
            .map_err(|_| AppError::Validation("group_id must be a valid UUID".into()))?;
        Ok(CreateAsset {
            title: self.title,
            description: self.description,
            group_id,
            filenames: self.filenames,
        })
    }
}

/// A direct-upload session for one file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub video_id: Uuid,
    #[schema(example = "prelude.mp4")]
    pub filename: String,
    /// Provider upload session id.
    pub upload_id: String,
    /// URL the client PUTs the file to.
    pub upload_url: String,
}

impl From<UploadSlot> for UploadResponse {
    fn from(slot: UploadSlot) -> Self {
        Self {
            video_id: slot.video_id,
            filename: slot.filename,
            upload_id: slot.upload_id,
            upload_url: slot.upload_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub upload_id: String,
    pub playback_id: Option<String>,
    pub status: VideoStatus,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            upload_id: video.upload_id,
            playback_id: video.playback_id,
            status: video.status,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub group_id: Uuid,
    /// Identity provider id of the uploader.
    pub owner_id: String,
    pub status: AssetStatus,
    /// Cover playback id. `null` until the provider has processed a video.
    pub playback_id: Option<String>,
    /// Derived from `playback_id`; never stored.
    #[schema(example = "https://image.mux.com/abc123/thumbnail.png")]
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Only present on single-asset reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<VideoResponse>>,
}

impl From<Asset> for AssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            title: asset.title,
            description: asset.description,
            group_id: asset.group_id,
            owner_id: asset.owner_id,
            status: asset.status,
            playback_id: asset.playback_id,
            thumbnail_url: None,
            created_at: asset.created_at,
            videos: None,
        }
    }
}

impl From<AssetView> for AssetResponse {
    fn from(view: AssetView) -> Self {
        Self {
            playback_id: view.playback_id,
            thumbnail_url: view.thumbnail_url,
            videos: view
                .videos
                .map(|videos| videos.into_iter().map(VideoResponse::from).collect()),
            ..AssetResponse::from(view.asset)
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateAssetResponse {
    pub asset: AssetResponse,
    pub uploads: Vec<UploadResponse>,
}

impl From<CreatedAsset> for CreateAssetResponse {
    fn from(created: CreatedAsset) -> Self {
        Self {
            asset: created.asset.into(),
            uploads: created.uploads.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetListResponse {
    pub data: Vec<AssetResponse>,
}
