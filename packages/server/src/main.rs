use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use server::config::AppConfig;
use server::notify::{NotificationDeps, NotificationDispatcher};
use server::providers::email::ResendMailer;
use server::providers::identity::WorkOsIdentity;
use server::providers::llm::OpenRouterEnhancer;
use server::providers::video::MuxClient;
use server::services::{AssetService, GroupService, ReviewService, UserService};
use server::state::AppState;
use server::store::{DataStore, SeaOrmStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("loading configuration")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("connecting to database")?;
    info!("Database ready");

    let store: Arc<dyn DataStore> = Arc::new(SeaOrmStore::new(db));
    let provider = Arc::new(MuxClient::new(&config.video_provider)?);
    let identity = Arc::new(WorkOsIdentity::new(&config.identity)?);
    let mailer = Arc::new(ResendMailer::new(&config.email)?);
    let enhancer = Arc::new(OpenRouterEnhancer::new(&config.llm)?);

    let notifier = NotificationDispatcher::start(
        &config.notification,
        NotificationDeps {
            store: store.clone(),
            identity: identity.clone(),
            mailer,
        },
    );

    let state = AppState {
        assets: AssetService::new(
            store.clone(),
            provider,
            notifier,
            config.video_provider.image_base_url.clone(),
        ),
        reviews: ReviewService::new(store.clone(), enhancer),
        groups: GroupService::new(store.clone()),
        users: UserService::new(store, identity, config.auth.supported_languages.clone()),
        config: Arc::new(config),
    };

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
