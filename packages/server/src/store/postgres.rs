use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{AssetStatus, VideoStatus};
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::*;
use uuid::Uuid;

use super::{
    Asset, AssetSummary, DataStore, Group, NewAsset, Review, StatusChange, StoreError,
    UserPreferences, Video,
};
use crate::entity::{asset, group, group_member, review, user_preference, video};

/// `DataStore` backed by PostgreSQL through SeaORM.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<asset::Model> for Asset {
    fn from(m: asset::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            group_id: m.group_id,
            owner_id: m.owner_id,
            status: m.status,
            playback_id: m.playback_id,
            created_at: m.created_at,
        }
    }
}

impl From<video::Model> for Video {
    fn from(m: video::Model) -> Self {
        Self {
            id: m.id,
            asset_id: m.asset_id,
            upload_id: m.upload_id,
            provider_asset_id: m.provider_asset_id,
            playback_id: m.playback_id,
            status: m.status,
        }
    }
}

impl From<review::Model> for Review {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            video_id: m.video_id,
            content: m.content,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<group::Model> for Group {
    fn from(m: group::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            owner_id: m.owner_id,
            avatar: m.avatar,
            created_at: m.created_at,
        }
    }
}

impl From<user_preference::Model> for UserPreferences {
    fn from(m: user_preference::Model) -> Self {
        Self {
            user_id: m.user_id,
            language: m.language,
            updated_at: m.updated_at,
        }
    }
}

async fn find_group<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<group::Model, StoreError> {
    group::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound("Group"))
}

/// Share-locks the asset owning `video_id` until `txn` ends, so a concurrent
/// finalize waits for the review write. Fails if the asset is already completed.
async fn lock_mutable_asset(txn: &DatabaseTransaction, video_id: Uuid) -> Result<(), StoreError> {
    let video = video::Entity::find_by_id(video_id)
        .one(txn)
        .await?
        .ok_or(StoreError::NotFound("Video"))?;
    let asset = asset::Entity::find_by_id(video.asset_id)
        .lock(LockType::Share)
        .one(txn)
        .await?
        .ok_or(StoreError::NotFound("Asset"))?;

    if asset.status.is_terminal() {
        return Err(StoreError::AssetCompleted);
    }
    Ok(())
}

#[async_trait]
impl DataStore for SeaOrmStore {
    async fn create_asset(&self, new: NewAsset) -> Result<(Asset, Vec<Video>), StoreError> {
        let txn = self.db.begin().await?;
        find_group(&txn, new.group_id).await?;

        let now = Utc::now();
        let asset = asset::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(new.title),
            description: Set(new.description),
            status: Set(AssetStatus::WaitingUpload),
            playback_id: Set(None),
            group_id: Set(new.group_id),
            owner_id: Set(new.owner_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut videos = Vec::with_capacity(new.upload_ids.len());
        for upload_id in new.upload_ids {
            let model = video::ActiveModel {
                id: Set(Uuid::now_v7()),
                asset_id: Set(asset.id),
                upload_id: Set(upload_id),
                provider_asset_id: Set(None),
                playback_id: Set(None),
                status: Set(VideoStatus::WaitingUpload),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            videos.push(Video::from(model));
        }

        txn.commit().await?;
        Ok((asset.into(), videos))
    }

    async fn get_asset(&self, id: Uuid) -> Result<Asset, StoreError> {
        asset::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Asset::from)
            .ok_or(StoreError::NotFound("Asset"))
    }

    async fn list_assets(&self) -> Result<Vec<AssetSummary>, StoreError> {
        let assets = asset::Entity::find()
            .order_by_desc(asset::Column::CreatedAt)
            .all(&self.db)
            .await?;
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = assets.iter().map(|a| a.id).collect();
        let videos = video::Entity::find()
            .filter(video::Column::AssetId.is_in(ids))
            .order_by_asc(video::Column::CreatedAt)
            .order_by_asc(video::Column::Id)
            .all(&self.db)
            .await?;

        let mut covers: HashMap<Uuid, Video> = HashMap::new();
        for v in videos {
            covers.entry(v.asset_id).or_insert_with(|| v.into());
        }

        Ok(assets
            .into_iter()
            .map(|a| {
                let cover = covers.remove(&a.id);
                AssetSummary {
                    asset: a.into(),
                    cover,
                }
            })
            .collect())
    }

    async fn advance_asset_status(
        &self,
        id: Uuid,
        next: AssetStatus,
    ) -> Result<StatusChange, StoreError> {
        let txn = self.db.begin().await?;
        let current = asset::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Asset"))?
            .status;

        if !current.can_advance_to(next) {
            return Ok(StatusChange::Rejected { current });
        }

        asset::Entity::update_many()
            .col_expr(asset::Column::Status, Expr::value(next))
            .col_expr(asset::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(asset::Column::Id.eq(id))
            .filter(asset::Column::Status.is_in(AssetStatus::predecessors(next)))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(StatusChange::Advanced { from: current })
    }

    async fn get_asset_videos(&self, asset_id: Uuid) -> Result<Vec<Video>, StoreError> {
        Ok(video::Entity::find()
            .filter(video::Column::AssetId.eq(asset_id))
            .order_by_asc(video::Column::CreatedAt)
            .order_by_asc(video::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Video::from)
            .collect())
    }

    async fn set_video_playback(
        &self,
        upload_id: &str,
        provider_asset_id: &str,
        playback_id: &str,
    ) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;
        let result = video::Entity::update_many()
            .col_expr(
                video::Column::ProviderAssetId,
                Expr::value(Some(provider_asset_id.to_string())),
            )
            .col_expr(
                video::Column::PlaybackId,
                Expr::value(Some(playback_id.to_string())),
            )
            .col_expr(video::Column::Status, Expr::value(VideoStatus::Ready))
            .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(video::Column::UploadId.eq(upload_id))
            .filter(video::Column::PlaybackId.is_null())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        let asset_id: Option<Uuid> = video::Entity::find()
            .select_only()
            .column(video::Column::AssetId)
            .filter(video::Column::UploadId.eq(upload_id))
            .into_tuple()
            .one(&txn)
            .await?;
        if let Some(asset_id) = asset_id {
            asset::Entity::update_many()
                .col_expr(
                    asset::Column::PlaybackId,
                    Expr::value(Some(playback_id.to_string())),
                )
                .filter(asset::Column::Id.eq(asset_id))
                .filter(asset::Column::PlaybackId.is_null())
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn advance_video_status(
        &self,
        upload_id: &str,
        next: VideoStatus,
        provider_asset_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut update = video::Entity::update_many()
            .col_expr(video::Column::Status, Expr::value(next))
            .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(id) = provider_asset_id {
            update = update.col_expr(
                video::Column::ProviderAssetId,
                Expr::value(Some(id.to_string())),
            );
        }

        let result = update
            .filter(video::Column::UploadId.eq(upload_id))
            .filter(video::Column::PlaybackId.is_null())
            .filter(video::Column::Status.is_in(VideoStatus::predecessors(next)))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn is_group_member(&self, user_id: &str, group_id: Uuid) -> Result<bool, StoreError> {
        Ok(
            group_member::Entity::find_by_id((group_id, user_id.to_string()))
                .one(&self.db)
                .await?
                .is_some(),
        )
    }

    async fn get_group(&self, id: Uuid) -> Result<Group, StoreError> {
        Ok(find_group(&self.db, id).await?.into())
    }

    async fn create_group(
        &self,
        name: &str,
        owner_id: &str,
        avatar: Option<Vec<u8>>,
    ) -> Result<Group, StoreError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let group = group::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            owner_id: Set(owner_id.to_string()),
            avatar: Set(avatar),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        group_member::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(owner_id.to_string()),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(group.into())
    }

    async fn list_user_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let group_ids: Vec<Uuid> = group_member::Entity::find()
            .select_only()
            .column(group_member::Column::GroupId)
            .filter(group_member::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await?;
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .order_by_asc(group::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Group::from)
            .collect())
    }

    async fn add_group_member(&self, group_id: Uuid, user_id: &str) -> Result<(), StoreError> {
        find_group(&self.db, group_id).await?;

        let model = group_member::ActiveModel {
            group_id: Set(group_id),
            user_id: Set(user_id.to_string()),
            joined_at: Set(Utc::now()),
        };
        let result = group_member::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    group_member::Column::GroupId,
                    group_member::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_review(&self, video_id: Uuid, content: &str) -> Result<Review, StoreError> {
        let txn = self.db.begin().await?;
        lock_mutable_asset(&txn, video_id).await?;

        let now = Utc::now();
        let model = review::ActiveModel {
            id: Set(Uuid::now_v7()),
            video_id: Set(video_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model.into())
    }

    async fn list_reviews(&self, video_id: Uuid) -> Result<Vec<Review>, StoreError> {
        Ok(review::Entity::find()
            .filter(review::Column::VideoId.eq(video_id))
            .order_by_asc(review::Column::CreatedAt)
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Review::from)
            .collect())
    }

    async fn update_review(
        &self,
        video_id: Uuid,
        review_id: Uuid,
        content: &str,
    ) -> Result<Review, StoreError> {
        let txn = self.db.begin().await?;
        lock_mutable_asset(&txn, video_id).await?;

        let existing = review::Entity::find_by_id(review_id)
            .filter(review::Column::VideoId.eq(video_id))
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Review"))?;

        let mut active: review::ActiveModel = existing.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated.into())
    }

    async fn delete_review(&self, video_id: Uuid, review_id: Uuid) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;
        lock_mutable_asset(&txn, video_id).await?;

        let result = review::Entity::delete_many()
            .filter(review::Column::Id.eq(review_id))
            .filter(review::Column::VideoId.eq(video_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound("Review"));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn get_asset_status_by_video_id(
        &self,
        video_id: Uuid,
    ) -> Result<AssetStatus, StoreError> {
        let video = video::Entity::find_by_id(video_id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Video"))?;
        let asset = asset::Entity::find_by_id(video.asset_id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Asset"))?;
        Ok(asset.status)
    }

    async fn get_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError> {
        user_preference::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .map(UserPreferences::from)
            .ok_or(StoreError::NotFound("User preferences"))
    }

    async fn upsert_user_preferences(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<UserPreferences, StoreError> {
        let prefs = UserPreferences {
            user_id: user_id.to_string(),
            language: language.to_string(),
            updated_at: Utc::now(),
        };
        let model = user_preference::ActiveModel {
            user_id: Set(prefs.user_id.clone()),
            language: Set(prefs.language.clone()),
            updated_at: Set(prefs.updated_at),
        };
        user_preference::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user_preference::Column::UserId)
                    .update_columns([
                        user_preference::Column::Language,
                        user_preference::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(prefs)
    }
}
