pub mod asset_status;
pub mod config;
pub mod permission;

pub use asset_status::{AssetStatus, VideoStatus};
pub use config::NotificationConfig;
pub use permission::{Role, has_permission};
