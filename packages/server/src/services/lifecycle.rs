//! Asset lifecycle: creation, read-repair of playback ids, and the
//! WaitingUpload -> Pending -> Completed transitions.

use std::sync::Arc;

use common::{AssetStatus, VideoStatus};
use common::permission::{ASSETS_CREATE, VIDEO_FINALIZE};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::notify::{NotificationDispatcher, NotificationEvent};
use crate::providers::video::{PlaybackLookup, VideoProvider, thumbnail_url};
use crate::store::{Asset, DataStore, NewAsset, StatusChange, Video};

const MAX_TITLE_CHARS: usize = 256;

/// Validated input of `AssetService::create_asset`.
#[derive(Debug, Clone)]
pub struct CreateAsset {
    pub title: String,
    pub description: String,
    pub group_id: Uuid,
    pub filenames: Vec<String>,
}

/// One upload session handed back to the client.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub video_id: Uuid,
    pub filename: String,
    pub upload_id: String,
    pub upload_url: String,
}

#[derive(Debug, Clone)]
pub struct CreatedAsset {
    pub asset: Asset,
    pub uploads: Vec<UploadSlot>,
}

/// An asset as shown to clients: the cover playback id and thumbnail are derived at read time.
#[derive(Debug, Clone)]
pub struct AssetView {
    pub asset: Asset,
    pub playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Present on single-asset reads only.
    pub videos: Option<Vec<Video>>,
}

#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn DataStore>,
    provider: Arc<dyn VideoProvider>,
    notifier: NotificationDispatcher,
    image_base_url: String,
}

impl AssetService {
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn VideoProvider>,
        notifier: NotificationDispatcher,
        image_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            image_base_url: image_base_url.into(),
        }
    }

    /// Create an asset with one upload session per filename.
    ///
    /// Every upload session is opened before anything is written, so a provider
    /// failure leaves no asset behind.
    #[instrument(skip(self, user, input), fields(user_id = %user.user_id, group_id = %input.group_id, files = input.filenames.len()))]
    pub async fn create_asset(
        &self,
        user: &AuthUser,
        input: CreateAsset,
    ) -> Result<CreatedAsset, AppError> {
        user.require_permission(ASSETS_CREATE)?;
        validate_create_asset(&input)?;

        self.store.get_group(input.group_id).await?;
        if !self
            .store
            .is_group_member(&user.user_id, input.group_id)
            .await?
        {
            return Err(AppError::NotGroupMember);
        }

        let mut targets = Vec::with_capacity(input.filenames.len());
        for filename in &input.filenames {
            let target = self.provider.create_upload_target().await.map_err(|e| {
                warn!(filename = %filename, error = %e, "Failed to open upload session");
                AppError::from(e)
            })?;
            targets.push(target);
        }

        let (asset, videos) = self
            .store
            .create_asset(NewAsset {
                title: input.title.trim().to_string(),
                description: input.description,
                group_id: input.group_id,
                owner_id: user.user_id.clone(),
                upload_ids: targets.iter().map(|t| t.upload_id.clone()).collect(),
            })
            .await?;

        let uploads = videos
            .into_iter()
            .zip(targets)
            .zip(input.filenames)
            .map(|((video, target), filename)| UploadSlot {
                video_id: video.id,
                filename,
                upload_id: target.upload_id,
                upload_url: target.url,
            })
            .collect();

        info!(asset_id = %asset.id, "Asset created");
        self.notifier.publish(NotificationEvent::AssetCreated {
            asset_title: asset.title.clone(),
            group_id: asset.group_id,
            uploader_id: user.user_id.clone(),
            uploader_name: user.display_name().to_string(),
        });

        Ok(CreatedAsset { asset, uploads })
    }

    /// All assets, newest first. A cover video still lacking a playback id is
    /// reconciled with the provider on the way out.
    #[instrument(skip(self))]
    pub async fn list_assets(&self) -> Result<Vec<AssetView>, AppError> {
        let summaries = self.store.list_assets().await?;

        let mut views = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let mut playback_id = summary.asset.playback_id.clone();
            if playback_id.is_none()
                && let Some(mut cover) = summary.cover
            {
                if cover.playback_id.is_none() && !cover.status.is_final() {
                    self.reconcile(&mut cover).await;
                }
                playback_id = cover.playback_id;
            }
            views.push(self.view(summary.asset, playback_id, None));
        }
        Ok(views)
    }

    /// A single asset with its videos. Videos lacking a playback id are reconciled
    /// unless they already errored; reconciliation failures are logged and the
    /// video is returned as-is.
    #[instrument(skip(self))]
    pub async fn get_asset(&self, id: Uuid) -> Result<AssetView, AppError> {
        let asset = self.store.get_asset(id).await?;
        let mut videos = self.store.get_asset_videos(id).await?;

        for video in videos
            .iter_mut()
            .filter(|v| v.playback_id.is_none() && !v.status.is_final())
        {
            self.reconcile(video).await;
        }

        let playback_id = asset
            .playback_id
            .clone()
            .or_else(|| videos.iter().find_map(|v| v.playback_id.clone()));
        Ok(self.view(asset, playback_id, Some(videos)))
    }

    /// Signal that the file transfer finished: WaitingUpload -> Pending.
    ///
    /// Only the asset owner may do this. Repeating it while Pending is a no-op.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn complete_upload(&self, user: &AuthUser, id: Uuid) -> Result<Asset, AppError> {
        let mut asset = self.store.get_asset(id).await?;
        if asset.owner_id != user.user_id {
            return Err(AppError::PermissionDenied);
        }

        match self
            .store
            .advance_asset_status(id, AssetStatus::Pending)
            .await?
        {
            StatusChange::Advanced { from } => {
                info!(asset_id = %id, %from, "Upload completed");
            }
            StatusChange::Rejected {
                current: AssetStatus::Pending,
            } => {
                debug!(asset_id = %id, "Upload already marked complete");
            }
            StatusChange::Rejected { current } => {
                return Err(AppError::Conflict(format!("Asset is already {current}")));
            }
        }

        asset.status = AssetStatus::Pending;
        Ok(asset)
    }

    /// Mark an asset as reviewed (terminal) and notify its owner.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn finalize_asset(&self, user: &AuthUser, id: Uuid) -> Result<Asset, AppError> {
        user.require_permission(VIDEO_FINALIZE)?;
        let mut asset = self.store.get_asset(id).await?;

        match self
            .store
            .advance_asset_status(id, AssetStatus::Completed)
            .await?
        {
            StatusChange::Advanced { from } => {
                info!(asset_id = %id, %from, "Asset finalized");
            }
            StatusChange::Rejected { current } => {
                return Err(AppError::Conflict(format!("Asset is already {current}")));
            }
        }
        asset.status = AssetStatus::Completed;

        if asset.owner_id != user.user_id {
            self.notifier.publish(NotificationEvent::AssetReviewed {
                asset_title: asset.title.clone(),
                owner_id: asset.owner_id.clone(),
                reviewer_name: user.display_name().to_string(),
            });
        }

        Ok(asset)
    }

    /// Ask the provider about `video` and record what it reports, updating `video`
    /// in place. Never fails: provider or store errors are logged and leave it as-is.
    async fn reconcile(&self, video: &mut Video) {
        let lookup = match self.provider.resolve_playback_id(&video.upload_id).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(video_id = %video.id, upload_id = %video.upload_id, error = %e, "Playback id reconciliation failed");
                return;
            }
        };

        match lookup {
            PlaybackLookup::Available {
                provider_asset_id,
                playback_id,
            } => self.cache_playback(video, &provider_asset_id, playback_id).await,
            PlaybackLookup::NotYetAvailable => {
                debug!(video_id = %video.id, "Playback id not yet available");
            }
            PlaybackLookup::Processing { provider_asset_id } => {
                self.record_status(video, VideoStatus::Processing, Some(&provider_asset_id))
                    .await;
            }
            PlaybackLookup::Failed { reason } => {
                warn!(video_id = %video.id, upload_id = %video.upload_id, %reason, "Video failed at the provider");
                self.record_status(video, VideoStatus::Errored, None).await;
            }
        }
    }

    async fn cache_playback(&self, video: &mut Video, provider_asset_id: &str, playback_id: String) {
        match self
            .store
            .set_video_playback(&video.upload_id, provider_asset_id, &playback_id)
            .await
        {
            Ok(true) => {
                info!(video_id = %video.id, %playback_id, "Cached playback id");
                video.provider_asset_id = Some(provider_asset_id.to_string());
                video.playback_id = Some(playback_id);
                video.status = VideoStatus::Ready;
            }
            // Someone else cached it first; the stored value wins.
            Ok(false) => self.reload(video).await,
            Err(e) => {
                warn!(video_id = %video.id, error = %e, "Failed to cache playback id");
            }
        }
    }

    async fn record_status(
        &self,
        video: &mut Video,
        status: VideoStatus,
        provider_asset_id: Option<&str>,
    ) {
        match self
            .store
            .advance_video_status(&video.upload_id, status, provider_asset_id)
            .await
        {
            Ok(true) => {
                debug!(video_id = %video.id, %status, "Video status updated");
                video.status = status;
                if let Some(id) = provider_asset_id {
                    video.provider_asset_id = Some(id.to_string());
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(video_id = %video.id, %status, error = %e, "Failed to record video status");
            }
        }
    }

    /// Replace `video` with its stored row.
    async fn reload(&self, video: &mut Video) {
        match self.store.get_asset_videos(video.asset_id).await {
            Ok(videos) => {
                if let Some(stored) = videos.into_iter().find(|v| v.id == video.id) {
                    *video = stored;
                }
            }
            Err(e) => {
                warn!(video_id = %video.id, error = %e, "Failed to re-read video");
            }
        }
    }

    fn view(
        &self,
        asset: Asset,
        playback_id: Option<String>,
        videos: Option<Vec<Video>>,
    ) -> AssetView {
        let thumbnail_url = playback_id
            .as_deref()
            .map(|id| thumbnail_url(&self.image_base_url, id));
        AssetView {
            asset,
            playback_id,
            thumbnail_url,
            videos,
        }
    }
}

fn validate_create_asset(input: &CreateAsset) -> Result<(), AppError> {
    let title = input.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    if input.filenames.is_empty() {
        return Err(AppError::Validation(
            "At least one filename is required".into(),
        ));
    }
    if input.filenames.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::Validation("Filenames must not be blank".into()));
    }
    Ok(())
}
