//! Video provider client (Mux direct uploads).

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::VideoProviderConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("video provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("video provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// A direct-upload session the client can PUT a file to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_id: String,
    pub url: String,
}

/// Result of asking the provider for a playback id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackLookup {
    Available {
        provider_asset_id: String,
        playback_id: String,
    },
    /// The upload has not produced a provider asset yet. Retry later.
    NotYetAvailable,
    /// The provider asset exists but has no public playback id yet. Retry later.
    Processing { provider_asset_id: String },
    /// The upload or its asset failed at the provider. Polling again will not help.
    Failed { reason: String },
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Open a new direct-upload session with a public playback policy.
    async fn create_upload_target(&self) -> Result<UploadTarget, ProviderError>;

    /// Read-only lookup of the public playback id behind an upload session.
    async fn resolve_playback_id(&self, upload_id: &str) -> Result<PlaybackLookup, ProviderError>;
}

/// Displayable thumbnail for a playback id. Derived on every read, never stored.
pub fn thumbnail_url(image_base_url: &str, playback_id: &str) -> String {
    format!(
        "{}/{}/thumbnail.png",
        image_base_url.trim_end_matches('/'),
        playback_id
    )
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct UploadData {
    id: String,
    #[serde(default)]
    url: String,
    status: String,
    #[serde(default)]
    asset_id: Option<String>,
}

#[derive(Deserialize)]
struct PlaybackIdData {
    id: String,
    policy: String,
}

#[derive(Deserialize)]
struct AssetData {
    #[serde(default)]
    status: String,
    #[serde(default)]
    playback_ids: Vec<PlaybackIdData>,
}

#[derive(Serialize)]
struct CreateUploadRequest<'a> {
    new_asset_settings: NewAssetSettings,
    cors_origin: &'a str,
}

#[derive(Serialize)]
struct NewAssetSettings {
    playback_policy: Vec<&'static str>,
}

const UPLOAD_STATUS_ASSET_CREATED: &str = "asset_created";
/// Upload statuses after which no asset will ever be created.
const UPLOAD_STATUSES_FAILED: &[&str] = &["errored", "cancelled", "timed_out"];
const ASSET_STATUS_ERRORED: &str = "errored";
const POLICY_PUBLIC: &str = "public";

/// The provider asset to look at next, or the final answer when there is none.
fn asset_of_upload(upload: UploadData) -> Result<String, PlaybackLookup> {
    if UPLOAD_STATUSES_FAILED.contains(&upload.status.as_str()) {
        return Err(PlaybackLookup::Failed {
            reason: format!("upload {}", upload.status),
        });
    }
    match upload.asset_id {
        Some(id) if upload.status == UPLOAD_STATUS_ASSET_CREATED && !id.is_empty() => Ok(id),
        _ => Err(PlaybackLookup::NotYetAvailable),
    }
}

fn playback_of_asset(provider_asset_id: String, asset: &AssetData) -> PlaybackLookup {
    if asset.status == ASSET_STATUS_ERRORED {
        return PlaybackLookup::Failed {
            reason: "asset errored".into(),
        };
    }
    match public_playback_id(&asset.playback_ids) {
        Some(playback_id) => PlaybackLookup::Available {
            playback_id: playback_id.to_string(),
            provider_asset_id,
        },
        None => PlaybackLookup::Processing { provider_asset_id },
    }
}

/// Picks the first playback id whose access policy is public.
fn public_playback_id(ids: &[PlaybackIdData]) -> Option<&str> {
    ids.iter()
        .find(|p| p.policy == POLICY_PUBLIC)
        .map(|p| p.id.as_str())
}

/// Mux API client. Credentials come from configuration, injected once.
pub struct MuxClient {
    http: reqwest::Client,
    base_url: String,
    token_id: String,
    token_secret: String,
    cors_origin: String,
}

impl MuxClient {
    pub fn new(config: &VideoProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
            cors_origin: config.cors_origin.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ProviderError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let envelope: Envelope<T> = res.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl VideoProvider for MuxClient {
    #[instrument(skip(self))]
    async fn create_upload_target(&self) -> Result<UploadTarget, ProviderError> {
        let body = CreateUploadRequest {
            new_asset_settings: NewAssetSettings {
                playback_policy: vec![POLICY_PUBLIC],
            },
            cors_origin: &self.cors_origin,
        };
        let res = self
            .http
            .post(format!("{}/video/v1/uploads", self.base_url))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&body)
            .send()
            .await?;
        let upload: UploadData = Self::decode(res).await?;

        debug!(upload_id = %upload.id, "Created direct upload");
        Ok(UploadTarget {
            upload_id: upload.id,
            url: upload.url,
        })
    }

    #[instrument(skip(self))]
    async fn resolve_playback_id(&self, upload_id: &str) -> Result<PlaybackLookup, ProviderError> {
        let upload: UploadData = self.get(&format!("/video/v1/uploads/{upload_id}")).await?;

        let status = upload.status.clone();
        let asset_id = match asset_of_upload(upload) {
            Ok(id) => id,
            Err(lookup) => {
                debug!(%status, "Upload has no asset");
                return Ok(lookup);
            }
        };

        let asset: AssetData = self.get(&format!("/video/v1/assets/{asset_id}")).await?;
        Ok(playback_of_asset(asset_id, &asset))
    }
}
