use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Group;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    /// Group name (1-100 characters).
    #[schema(example = "Cello studio")]
    pub name: String,
    /// Base64 image, at most 300 KiB once decoded.
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddMemberRequest {
    /// Identity provider id of the user to add.
    #[schema(example = "user_01HXYZ")]
    pub user_id: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: String,
    /// Base64 image.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            owner_id: group.owner_id,
            avatar: group.avatar.map(|bytes| STANDARD.encode(bytes)),
            created_at: group.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GroupListResponse {
    pub data: Vec<GroupResponse>,
}
