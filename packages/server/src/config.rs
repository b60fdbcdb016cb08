use common::NotificationConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret of the session tokens issued by the identity provider login flow.
    pub jwt_secret: String,
    /// Cookie carrying the session token when no `Authorization` header is sent.
    pub cookie_name: String,
    /// Languages a user may choose; the first one is the default.
    pub supported_languages: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoProviderConfig {
    pub base_url: String,
    /// Base of the public thumbnail URLs, e.g. `https://image.mux.com`.
    pub image_base_url: String,
    pub token_id: String,
    pub token_secret: String,
    /// Origin allowed to PUT files to the direct-upload URLs.
    pub cors_origin: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub video_provider: VideoProviderConfig,
    pub identity: IdentityConfig,
    pub email: EmailConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:4200"])?
            .set_default("server.cors.max_age", 300)?
            .set_default("auth.cookie_name", "critic_session")?
            .set_default("auth.supported_languages", vec!["en"])?
            .set_default("video_provider.base_url", "https://api.mux.com")?
            .set_default("video_provider.image_base_url", "https://image.mux.com")?
            .set_default("video_provider.cors_origin", "*")?
            .set_default("video_provider.timeout_secs", 15)?
            .set_default("identity.base_url", "https://api.workos.com")?
            .set_default("email.base_url", "https://api.resend.com")?
            .set_default("email.from", "onboarding@resend.dev")?
            .set_default("llm.base_url", "https://openrouter.ai/api/v1")?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", "anthropic/claude-3-haiku")?
            .set_default("llm.timeout_secs", 30)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CRITIC__VIDEO_PROVIDER__TOKEN_SECRET).
            // Lists are comma separated (e.g., CRITIC__AUTH__SUPPORTED_LANGUAGES=en,ru).
            .add_source(
                Environment::with_prefix("CRITIC")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("auth.supported_languages"),
            )
            .build()?;

        s.try_deserialize()
    }
}
