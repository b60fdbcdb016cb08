#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an asset.
///
/// Statuses only move forward: `WaitingUpload -> Pending -> Completed`.
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum AssetStatus {
    /// Created, files not yet transferred to the video provider.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "waiting_upload"))]
    #[serde(rename = "waiting_upload")]
    WaitingUpload,
    /// Files transferred, awaiting expert review.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    #[serde(rename = "pending")]
    Pending,
    /// Reviewed and finalized. Terminal.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    #[serde(rename = "completed")]
    Completed,
}

impl AssetStatus {
    pub const ALL: &'static [AssetStatus] = &[Self::WaitingUpload, Self::Pending, Self::Completed];

    /// Position in the lifecycle; later statuses have larger ranks.
    pub fn rank(&self) -> u8 {
        match self {
            Self::WaitingUpload => 0,
            Self::Pending => 1,
            Self::Completed => 2,
        }
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if `next` is strictly later in the lifecycle than `self`.
    pub fn can_advance_to(&self, next: AssetStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Statuses from which `next` may be entered.
    pub fn predecessors(next: AssetStatus) -> Vec<AssetStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_advance_to(next))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingUpload => "waiting_upload",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        Self::WaitingUpload
    }
}

/// Processing status of a single video at the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum VideoStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "waiting_upload"))]
    #[serde(rename = "waiting_upload")]
    WaitingUpload,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "processing"))]
    #[serde(rename = "processing")]
    Processing,
    /// A public playback id is known.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ready"))]
    #[serde(rename = "ready")]
    Ready,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "errored"))]
    #[serde(rename = "errored")]
    Errored,
}

impl VideoStatus {
    pub const ALL: &'static [VideoStatus] = &[
        Self::WaitingUpload,
        Self::Processing,
        Self::Ready,
        Self::Errored,
    ];

    /// `Ready` and `Errored` share the last rank: neither can follow the other.
    pub fn rank(&self) -> u8 {
        match self {
            Self::WaitingUpload => 0,
            Self::Processing => 1,
            Self::Ready | Self::Errored => 2,
        }
    }

    /// A final video is never polled at the provider again.
    pub fn is_final(&self) -> bool {
        self.rank() == 2
    }

    pub fn can_advance_to(&self, next: VideoStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Statuses from which `next` may be entered.
    pub fn predecessors(next: VideoStatus) -> Vec<VideoStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_advance_to(next))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingUpload => "waiting_upload",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for VideoStatus {
    fn default() -> Self {
        Self::WaitingUpload
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status '{invalid}'")]
pub struct ParseStatusError {
    invalid: String,
}

impl FromStr for AssetStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}

impl FromStr for VideoStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
