use serde::{Deserialize, Serialize};

use crate::services::users::UpdateProfile;

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    /// Identity provider user id.
    #[schema(example = "user_01HXYZ")]
    pub id: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "student")]
    pub role: String,
    /// Actions granted to the role.
    #[schema(example = json!(["assets:create", "groups:read", "reviews:read"]))]
    pub permissions: Vec<String>,
    /// Preferred interface language.
    #[schema(example = "en")]
    pub language: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    #[schema(example = "Ada")]
    pub first_name: Option<String>,
    #[schema(example = "Lovelace")]
    pub last_name: Option<String>,
    /// One of the configured languages.
    #[schema(example = "en")]
    pub language: String,
}

impl UpdateMeRequest {
    /// Display name built from the submitted names, if any is non-blank.
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }

    pub fn into_input(self) -> UpdateProfile {
        UpdateProfile {
            first_name: self.first_name,
            last_name: self.last_name,
            language: self.language,
        }
    }
}
