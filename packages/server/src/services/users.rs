//! The caller's own profile: preferred language and display name.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::providers::identity::{IdentityProvider, NameUpdate};
use crate::store::{DataStore, StoreError, UserPreferences};
use crate::utils::language;

/// Input of `UserService::update_profile`.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: String,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DataStore>,
    identity: Arc<dyn IdentityProvider>,
    supported_languages: Arc<[String]>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityProvider>,
        supported_languages: Vec<String>,
    ) -> Self {
        Self {
            store,
            identity,
            supported_languages: supported_languages.into(),
        }
    }

    /// The caller's language. The first time a user is seen it is negotiated from
    /// `accept_language` and saved; if saving fails the negotiated value is still used.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn language(
        &self,
        user: &AuthUser,
        accept_language: Option<&str>,
    ) -> Result<String, AppError> {
        match self.store.get_user_preferences(&user.user_id).await {
            Ok(prefs) => Ok(prefs.language),
            Err(StoreError::NotFound(_)) => {
                let language =
                    language::negotiate(accept_language.unwrap_or_default(), &self.supported_languages);
                match self
                    .store
                    .upsert_user_preferences(&user.user_id, &language)
                    .await
                {
                    Ok(_) => info!(%language, "Default language saved"),
                    Err(e) => error!(%language, error = %e, "Failed to save default language"),
                }
                Ok(language)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save the caller's language. Name changes are sent to the identity provider
    /// in a detached task; its failure is logged and does not affect the response.
    #[instrument(skip(self, user, update), fields(user_id = %user.user_id))]
    pub async fn update_profile(
        &self,
        user: &AuthUser,
        update: UpdateProfile,
    ) -> Result<UserPreferences, AppError> {
        let language = language::normalize(&update.language);
        if !language::is_supported(&language, &self.supported_languages) {
            return Err(AppError::Validation(format!(
                "Unsupported language '{}'",
                update.language
            )));
        }

        let prefs = self
            .store
            .upsert_user_preferences(&user.user_id, &language)
            .await?;
        info!(%language, "Language updated");

        let names = NameUpdate {
            first_name: update.first_name.map(|n| n.trim().to_string()),
            last_name: update.last_name.map(|n| n.trim().to_string()),
        };
        if !names.is_empty() {
            let identity = self.identity.clone();
            let user_id = user.user_id.clone();
            tokio::spawn(async move {
                if let Err(e) = identity.update_user_name(&user_id, &names).await {
                    error!(%user_id, error = %e, "Failed to update name at the identity provider");
                }
            });
        }

        Ok(prefs)
    }
}
