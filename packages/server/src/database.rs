use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{asset, group_member, review, video};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;
    ensure_indexes(&db).await;
    Ok(db)
}

/// Create missing tables and columns for every entity. Never drops anything.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("server::entity::*").sync(db).await
}

/// Create the lookup indexes schema-sync does not derive from the entities.
/// Failures are logged; the service still works without them, only slower.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    let indexes: [(&str, IndexCreateStatement); 4] = [
        (
            // Videos of an asset, in creation order.
            "idx_video_asset_created",
            Index::create()
                .table(video::Entity)
                .col(video::Column::AssetId)
                .col(video::Column::CreatedAt)
                .to_owned(),
        ),
        (
            // Reviews of a video, oldest first.
            "idx_review_video_created",
            Index::create()
                .table(review::Entity)
                .col(review::Column::VideoId)
                .col(review::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_asset_created",
            Index::create()
                .table(asset::Entity)
                .col(asset::Column::CreatedAt)
                .to_owned(),
        ),
        (
            // Groups of a user.
            "idx_group_member_user",
            Index::create()
                .table(group_member::Entity)
                .col(group_member::Column::UserId)
                .to_owned(),
        ),
    ];

    for (name, mut stmt) in indexes {
        let sql = stmt
            .if_not_exists()
            .name(name)
            .to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&sql).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }
}
