//! In-memory implementation of `DataStore`.
//!
//! Mirrors the conditional-update semantics of the SeaORM store. All data is
//! lost on restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use common::{AssetStatus, VideoStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Asset, AssetSummary, DataStore, Group, NewAsset, Review, StatusChange, StoreError,
    UserPreferences, Video,
};

#[derive(Default)]
struct Tables {
    /// Insertion order is kept so listings are deterministic.
    assets: Vec<Asset>,
    videos: Vec<Video>,
    reviews: Vec<Review>,
    groups: HashMap<Uuid, Group>,
    members: HashSet<(Uuid, String)>,
    preferences: HashMap<String, UserPreferences>,
}

impl Tables {
    /// Fails unless `video_id` exists and its asset still accepts review changes.
    fn ensure_reviews_mutable(&self, video_id: Uuid) -> Result<(), StoreError> {
        let video = self
            .videos
            .iter()
            .find(|v| v.id == video_id)
            .ok_or(StoreError::NotFound("Video"))?;
        let asset = self
            .assets
            .iter()
            .find(|a| a.id == video.asset_id)
            .ok_or(StoreError::NotFound("Asset"))?;
        if asset.status.is_terminal() {
            return Err(StoreError::AssetCompleted);
        }
        Ok(())
    }
}

/// In-memory data store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn create_asset(&self, new: NewAsset) -> Result<(Asset, Vec<Video>), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&new.group_id) {
            return Err(StoreError::NotFound("Group"));
        }

        let asset = Asset {
            id: Uuid::now_v7(),
            title: new.title,
            description: new.description,
            group_id: new.group_id,
            owner_id: new.owner_id,
            status: AssetStatus::WaitingUpload,
            playback_id: None,
            created_at: Utc::now(),
        };
        let videos: Vec<Video> = new
            .upload_ids
            .into_iter()
            .map(|upload_id| Video {
                id: Uuid::now_v7(),
                asset_id: asset.id,
                upload_id,
                provider_asset_id: None,
                playback_id: None,
                status: VideoStatus::WaitingUpload,
            })
            .collect();

        tables.assets.push(asset.clone());
        tables.videos.extend(videos.iter().cloned());
        Ok((asset, videos))
    }

    async fn get_asset(&self, id: Uuid) -> Result<Asset, StoreError> {
        let tables = self.tables.read().await;
        tables
            .assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("Asset"))
    }

    async fn list_assets(&self) -> Result<Vec<AssetSummary>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assets
            .iter()
            .rev()
            .map(|asset| AssetSummary {
                asset: asset.clone(),
                cover: tables.videos.iter().find(|v| v.asset_id == asset.id).cloned(),
            })
            .collect())
    }

    async fn advance_asset_status(
        &self,
        id: Uuid,
        next: AssetStatus,
    ) -> Result<StatusChange, StoreError> {
        let mut tables = self.tables.write().await;
        let asset = tables
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound("Asset"))?;

        let current = asset.status;
        if !current.can_advance_to(next) {
            return Ok(StatusChange::Rejected { current });
        }
        asset.status = next;
        Ok(StatusChange::Advanced { from: current })
    }

    async fn get_asset_videos(&self, asset_id: Uuid) -> Result<Vec<Video>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .videos
            .iter()
            .filter(|v| v.asset_id == asset_id)
            .cloned()
            .collect())
    }

    async fn set_video_playback(
        &self,
        upload_id: &str,
        provider_asset_id: &str,
        playback_id: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(video) = tables
            .videos
            .iter_mut()
            .find(|v| v.upload_id == upload_id && v.playback_id.is_none())
        else {
            return Ok(false);
        };

        video.provider_asset_id = Some(provider_asset_id.to_string());
        video.playback_id = Some(playback_id.to_string());
        video.status = VideoStatus::Ready;
        let asset_id = video.asset_id;

        if let Some(asset) = tables
            .assets
            .iter_mut()
            .find(|a| a.id == asset_id && a.playback_id.is_none())
        {
            asset.playback_id = Some(playback_id.to_string());
        }
        Ok(true)
    }

    async fn advance_video_status(
        &self,
        upload_id: &str,
        next: VideoStatus,
        provider_asset_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(video) = tables.videos.iter_mut().find(|v| {
            v.upload_id == upload_id && v.playback_id.is_none() && v.status.can_advance_to(next)
        }) else {
            return Ok(false);
        };

        video.status = next;
        if let Some(id) = provider_asset_id {
            video.provider_asset_id = Some(id.to_string());
        }
        Ok(true)
    }

    async fn is_group_member(&self, user_id: &str, group_id: Uuid) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.members.contains(&(group_id, user_id.to_string())))
    }

    async fn get_group(&self, id: Uuid) -> Result<Group, StoreError> {
        let tables = self.tables.read().await;
        tables
            .groups
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Group"))
    }

    async fn create_group(
        &self,
        name: &str,
        owner_id: &str,
        avatar: Option<Vec<u8>>,
    ) -> Result<Group, StoreError> {
        let mut tables = self.tables.write().await;
        let group = Group {
            id: Uuid::now_v7(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            avatar,
            created_at: Utc::now(),
        };
        tables.groups.insert(group.id, group.clone());
        tables.members.insert((group.id, owner_id.to_string()));
        Ok(group)
    }

    async fn list_user_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| tables.members.contains(&(g.id, user_id.to_string())))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn add_group_member(&self, group_id: Uuid, user_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group_id) {
            return Err(StoreError::NotFound("Group"));
        }
        tables.members.insert((group_id, user_id.to_string()));
        Ok(())
    }

    async fn create_review(&self, video_id: Uuid, content: &str) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_reviews_mutable(video_id)?;
        let now = Utc::now();
        let review = Review {
            id: Uuid::now_v7(),
            video_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, video_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.video_id == video_id)
            .cloned()
            .collect())
    }

    async fn update_review(
        &self,
        video_id: Uuid,
        review_id: Uuid,
        content: &str,
    ) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_reviews_mutable(video_id)?;
        let review = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id && r.video_id == video_id)
            .ok_or(StoreError::NotFound("Review"))?;
        review.content = content.to_string();
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn delete_review(&self, video_id: Uuid, review_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_reviews_mutable(video_id)?;
        let before = tables.reviews.len();
        tables
            .reviews
            .retain(|r| !(r.id == review_id && r.video_id == video_id));
        if tables.reviews.len() == before {
            return Err(StoreError::NotFound("Review"));
        }
        Ok(())
    }

    async fn get_asset_status_by_video_id(
        &self,
        video_id: Uuid,
    ) -> Result<AssetStatus, StoreError> {
        let tables = self.tables.read().await;
        let video = tables
            .videos
            .iter()
            .find(|v| v.id == video_id)
            .ok_or(StoreError::NotFound("Video"))?;
        tables
            .assets
            .iter()
            .find(|a| a.id == video.asset_id)
            .map(|a| a.status)
            .ok_or(StoreError::NotFound("Asset"))
    }

    async fn get_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError> {
        let tables = self.tables.read().await;
        tables
            .preferences
            .get(user_id)
            .cloned()
            .ok_or(StoreError::NotFound("User preferences"))
    }

    async fn upsert_user_preferences(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<UserPreferences, StoreError> {
        let mut tables = self.tables.write().await;
        let prefs = UserPreferences {
            user_id: user_id.to_string(),
            language: language.to_string(),
            updated_at: Utc::now(),
        };
        tables.preferences.insert(user_id.to_string(), prefs.clone());
        Ok(prefs)
    }
}
