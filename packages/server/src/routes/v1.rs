use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/assets", asset_routes())
        .nest("/videos", video_routes())
        .nest("/reviews", review_routes())
        .nest("/groups", group_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::auth::me, handlers::auth::update_me))
}

fn asset_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::assets::list_assets,
            handlers::assets::create_asset
        ))
        .routes(routes!(handlers::assets::get_asset))
        .routes(routes!(handlers::assets::complete_upload))
        .routes(routes!(handlers::assets::finalize_asset))
}

fn video_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::reviews::list_reviews,
            handlers::reviews::create_review
        ))
        .routes(routes!(
            handlers::reviews::update_review,
            handlers::reviews::delete_review
        ))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::reviews::enhance_text))
}

fn group_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::groups::list_groups,
            handlers::groups::create_group
        ))
        .routes(routes!(handlers::groups::add_member))
}
