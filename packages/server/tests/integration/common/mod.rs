use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::watch;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, EmailConfig, IdentityConfig, LlmConfig,
    ServerConfig, VideoProviderConfig,
};
use server::notify::{NotificationDeps, NotificationDispatcher};
use server::providers::email::{MailError, Mailer};
use server::providers::identity::{ContactInfo, IdentityError, IdentityProvider, NameUpdate};
use server::providers::llm::{LlmError, TextEnhancer};
use server::providers::video::{PlaybackLookup, ProviderError, UploadTarget, VideoProvider};
use server::services::{AssetService, GroupService, ReviewService, UserService};
use server::state::AppState;
use server::store::{DataStore, MemoryStore};
use server::utils::jwt::{self, Claims};

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";
pub const COOKIE_NAME: &str = "critic_session";
pub const IMAGE_BASE: &str = "https://image.test";

pub mod routes {
    pub const ME: &str = "/api/v1/auth/me";
    pub const ASSETS: &str = "/api/v1/assets";
    pub const GROUPS: &str = "/api/v1/groups";
    pub const ENHANCE: &str = "/api/v1/reviews/enhance";
    pub const HEALTH: &str = "/health";

    pub fn asset(id: &str) -> String {
        format!("/api/v1/assets/{id}")
    }

    pub fn asset_complete(id: &str) -> String {
        format!("/api/v1/assets/{id}/complete")
    }

    pub fn asset_finalize(id: &str) -> String {
        format!("/api/v1/assets/{id}/finalize")
    }

    pub fn reviews(video_id: &str) -> String {
        format!("/api/v1/videos/{video_id}/reviews")
    }

    pub fn review(video_id: &str, review_id: &str) -> String {
        format!("/api/v1/videos/{video_id}/reviews/{review_id}")
    }

    pub fn group_members(id: &str) -> String {
        format!("/api/v1/groups/{id}/members")
    }
}

/// Video provider double: sequential upload ids and a settable lookup table.
#[derive(Default)]
pub struct FakeVideoProvider {
    issued: AtomicUsize,
    pub fail_uploads: AtomicBool,
    pub fail_lookups: AtomicBool,
    pub lookups: AtomicUsize,
    playback: Mutex<HashMap<String, PlaybackLookup>>,
}

impl FakeVideoProvider {
    /// Make `upload_id` resolve to `playback_id` from now on.
    pub fn set_playback(&self, upload_id: &str, playback_id: &str) {
        self.playback.lock().unwrap().insert(
            upload_id.to_string(),
            PlaybackLookup::Available {
                provider_asset_id: format!("asset-{upload_id}"),
                playback_id: playback_id.to_string(),
            },
        );
    }

    /// Make `upload_id` report a failed upload from now on.
    pub fn set_failed(&self, upload_id: &str) {
        self.playback.lock().unwrap().insert(
            upload_id.to_string(),
            PlaybackLookup::Failed {
                reason: "upload errored".to_string(),
            },
        );
    }
}

#[async_trait]
impl VideoProvider for FakeVideoProvider {
    async fn create_upload_target(&self) -> Result<UploadTarget, ProviderError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(UploadTarget {
            upload_id: format!("upload-{n}"),
            url: format!("https://uploads.test/{n}"),
        })
    }

    async fn resolve_playback_id(&self, upload_id: &str) -> Result<PlaybackLookup, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(self
            .playback
            .lock()
            .unwrap()
            .get(upload_id)
            .cloned()
            .unwrap_or(PlaybackLookup::NotYetAvailable))
    }
}

/// Every user's email is `<user id>@example.com`. Name updates are recorded.
#[derive(Default)]
pub struct FakeIdentity {
    updates: Mutex<Vec<(String, NameUpdate)>>,
}

impl FakeIdentity {
    pub fn name_updates(&self) -> Vec<(String, NameUpdate)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_user_contact_info(&self, user_id: &str) -> Result<ContactInfo, IdentityError> {
        Ok(ContactInfo {
            email: format!("{user_id}@example.com"),
            first_name: None,
            last_name: None,
        })
    }

    async fn update_user_name(
        &self,
        user_id: &str,
        update: &NameUpdate,
    ) -> Result<(), IdentityError> {
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), update.clone()));
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Records sent mail. While the gate is closed, `send` waits for it to open.
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    gate: watch::Receiver<bool>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &[String], subject: &str, text: &str) -> Result<(), MailError> {
        let mut gate = self.gate.clone();
        let _ = gate.wait_for(|open| *open).await;
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: text.to_string(),
        });
        Ok(())
    }
}

pub struct FakeEnhancer;

#[async_trait]
impl TextEnhancer for FakeEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::EmptyText);
        }
        Ok(format!("Enhanced: {}", text.trim()))
    }
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

/// A running test server backed by the in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeVideoProvider>,
    pub identity: Arc<FakeIdentity>,
    mailer: Arc<RecordingMailer>,
    mail_gate: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                cookie_name: COOKIE_NAME.to_string(),
                supported_languages: vec!["en".to_string(), "ru".to_string()],
            },
            video_provider: VideoProviderConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                image_base_url: IMAGE_BASE.to_string(),
                token_id: String::new(),
                token_secret: String::new(),
                cors_origin: "*".to_string(),
                timeout_secs: 1,
            },
            identity: IdentityConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: String::new(),
            },
            email: EmailConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: String::new(),
                from: "noreply@example.com".to_string(),
            },
            llm: LlmConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: String::new(),
                model: "test".to_string(),
                timeout_secs: 1,
            },
            notification: Default::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeVideoProvider::default());
        let identity = Arc::new(FakeIdentity::default());
        let (mail_gate, gate_rx) = watch::channel(true);
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            gate: gate_rx,
        });

        let notifier = NotificationDispatcher::start(
            &config.notification,
            NotificationDeps {
                store: store.clone(),
                identity: identity.clone(),
                mailer: mailer.clone(),
            },
        );

        let state = AppState {
            assets: AssetService::new(store.clone(), provider.clone(), notifier, IMAGE_BASE),
            reviews: ReviewService::new(store.clone(), Arc::new(FakeEnhancer)),
            groups: GroupService::new(store.clone()),
            users: UserService::new(
                store.clone(),
                identity.clone(),
                config.auth.supported_languages.clone(),
            ),
            config: Arc::new(config),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            provider,
            identity,
            mailer,
            mail_gate,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Session token for a user with the given role.
    pub fn token(&self, user_id: &str, role: &str) -> String {
        let claims = Claims::new(
            user_id,
            &format!("{user_id}@example.com"),
            user_id,
            role,
            chrono::Duration::hours(1),
        );
        jwt::sign(&claims, JWT_SECRET).expect("Failed to sign test token")
    }

    /// Create a group owned by `owner_id` with the given extra members.
    pub async fn create_group(&self, owner_id: &str, members: &[&str]) -> String {
        let group = self
            .store
            .create_group("Studio", owner_id, None)
            .await
            .expect("Failed to create group");
        for member in members {
            self.store
                .add_group_member(group.id, member)
                .await
                .expect("Failed to add member");
        }
        group.id.to_string()
    }

    /// Create an asset through the API and return the response body.
    pub async fn create_asset(&self, token: &str, group_id: &str, files: &[&str]) -> Value {
        let res = self
            .post_with_token(
                routes::ASSETS,
                &serde_json::json!({
                    "title": "Prelude",
                    "description": "First take",
                    "group_id": group_id,
                    "filenames": files,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "Asset creation failed: {}", res.text);
        res.body
    }

    /// Make later emails wait until `release_mail` is called.
    pub fn hold_mail(&self) {
        self.mail_gate.send_replace(false);
    }

    pub fn release_mail(&self) {
        self.mail_gate.send_replace(true);
    }

    pub fn sent_mail(&self) -> Vec<SentMail> {
        self.mailer.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` emails were sent.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<SentMail> {
        for _ in 0..100 {
            let sent = self.sent_mail();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "Expected {count} emails, got {}: {:?}",
            self.sent_mail().len(),
            self.sent_mail()
        );
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_language(&self, path: &str, token: &str, language: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept-Language", language)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_cookie(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Cookie", format!("{COOKIE_NAME}={token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }
}
