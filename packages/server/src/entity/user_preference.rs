use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_preference")]
pub struct Model {
    /// Identity provider user id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Lower-case language tag, e.g. `en`.
    pub language: String,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
