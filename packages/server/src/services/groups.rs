use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::permission::{GROUPS_CREATE, GROUPS_READ};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::store::{DataStore, Group};

const MAX_NAME_CHARS: usize = 100;
/// Largest decoded avatar image.
pub const MAX_AVATAR_BYTES: usize = 300 * 1024;

/// Decode a base64 avatar. An absent or empty value means no avatar.
pub fn decode_avatar(avatar: Option<&str>) -> Result<Option<Vec<u8>>, AppError> {
    let Some(encoded) = avatar.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(None);
    };
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::Validation("Invalid avatar data".into()))?;
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation(
            "Avatar must not exceed 300 KiB".into(),
        ));
    }
    Ok(Some(bytes))
}

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn DataStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Create a group owned by the caller, who becomes its first member.
    #[instrument(skip(self, user, avatar), fields(user_id = %user.user_id))]
    pub async fn create(
        &self,
        user: &AuthUser,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Group, AppError> {
        user.require_permission(GROUPS_CREATE)?;
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation(
                "Group name must be 1-100 characters".into(),
            ));
        }

        let avatar = decode_avatar(avatar)?;

        let group = self
            .store
            .create_group(name, &user.user_id, avatar)
            .await?;
        info!(group_id = %group.id, "Group created");
        Ok(group)
    }

    /// Groups the caller belongs to.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn list(&self, user: &AuthUser) -> Result<Vec<Group>, AppError> {
        user.require_permission(GROUPS_READ)?;
        Ok(self.store.list_user_groups(&user.user_id).await?)
    }

    /// Add `member_id` to a group. Only the group owner may do this.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn add_member(
        &self,
        user: &AuthUser,
        group_id: Uuid,
        member_id: &str,
    ) -> Result<(), AppError> {
        let member_id = member_id.trim();
        if member_id.is_empty() {
            return Err(AppError::Validation("User id must not be empty".into()));
        }

        let group = self.store.get_group(group_id).await?;
        if group.owner_id != user.user_id {
            return Err(AppError::PermissionDenied);
        }

        self.store.add_group_member(group_id, member_id).await?;
        info!(%group_id, member_id, "Group member added");
        Ok(())
    }
}
