use common::AssetStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    pub description: String,

    /// Only ever advanced through `AssetStatus::can_advance_to`.
    pub status: AssetStatus,

    /// Cover playback id, cached once known.
    pub playback_id: Option<String>,

    pub group_id: Uuid,
    #[sea_orm(belongs_to, from = "group_id", to = "id")]
    pub group: HasOne<super::group::Entity>,

    /// Identity provider user id of the uploader.
    pub owner_id: String,

    #[sea_orm(has_many)]
    pub videos: HasMany<super::video::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
