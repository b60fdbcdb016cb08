use chrono::{Duration, Utc};
use jsonwebtoken::errors::Error;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session token claims. Issued by the login flow, trusted here once the signature checks out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Identity provider user id
    pub email: String,
    pub name: String,
    pub role: String,
    pub exp: usize, // Expiration timestamp
}

impl Claims {
    /// Claims valid for `ttl` from now.
    pub fn new(user_id: &str, email: &str, name: &str, role: &str, ttl: Duration) -> Self {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        Self {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            name: name.to_owned(),
            role: role.to_owned(),
            exp,
        }
    }
}

/// Sign a session token.
pub fn sign(claims: &Claims, secret: &str) -> Result<String, Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims, Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
