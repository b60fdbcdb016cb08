use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    /// Identity provider user id of the group creator.
    pub owner_id: String,

    /// Raw image bytes, at most 300 KiB.
    pub avatar: Option<Vec<u8>>,

    #[sea_orm(has_many)]
    pub members: HasMany<super::group_member::Entity>,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::asset::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
