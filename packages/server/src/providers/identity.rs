use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::IdentityConfig;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("identity provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Contact details of a user, as known to the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Name fields to change; `None` leaves the field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NameUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl NameUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user_contact_info(&self, user_id: &str) -> Result<ContactInfo, IdentityError>;

    async fn update_user_name(&self, user_id: &str, update: &NameUpdate)
    -> Result<(), IdentityError>;
}

/// WorkOS user-management client.
pub struct WorkOsIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WorkOsIdentity {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for WorkOsIdentity {
    #[instrument(skip(self))]
    async fn get_user_contact_info(&self, user_id: &str) -> Result<ContactInfo, IdentityError> {
        let res = self
            .http
            .get(format!("{}/user_management/users/{}", self.base_url, user_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }
        if !status.is_success() {
            return Err(IdentityError::Api {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        Ok(res.json().await?)
    }

    #[instrument(skip(self, update))]
    async fn update_user_name(
        &self,
        user_id: &str,
        update: &NameUpdate,
    ) -> Result<(), IdentityError> {
        let res = self
            .http
            .put(format!("{}/user_management/users/{}", self.base_url, user_id))
            .bearer_auth(&self.api_key)
            .json(update)
            .send()
            .await?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }
        if !status.is_success() {
            return Err(IdentityError::Api {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
