//! HS256 bearer tokens.
//!
//! A token carries only the user id; the bearer extractor re-reads the user
//! on every request so a deleted account stops authenticating immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use taskhub_core::types::DbId;
use uuid::Uuid;

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user id.
    pub sub: DbId,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Issued at, Unix seconds.
    pub iat: i64,
    pub jti: String,
}

/// Signing secret and token lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: i64,
}

/// Default token lifetime in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

impl JwtConfig {
    /// Read `JWT_SECRET` (required, non-empty) and `JWT_EXPIRY_DAYS`
    /// (default 30).
    ///
    /// # Panics
    ///
    /// On a missing or empty secret, or an unparsable lifetime.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .expect("JWT_SECRET must be set to a non-empty value");

        let expiry_days = match std::env::var("JWT_EXPIRY_DAYS") {
            Ok(raw) => raw.parse().expect("JWT_EXPIRY_DAYS must be a whole number of days"),
            Err(_) => DEFAULT_EXPIRY_DAYS,
        };

        Self {
            secret,
            expiry_days,
        }
    }

    fn lifetime(&self) -> Duration {
        Duration::days(self.expiry_days)
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Sign an HS256 token naming `user_id`, valid for `expiry_days`.
pub fn generate_token(user_id: DbId, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let issued = Utc::now();
    let claims = Claims {
        sub: user_id,
        exp: (issued + config.lifetime()).timestamp(),
        iat: issued.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key())
}

/// Check signature and expiry, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &config.decoding_key(), &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
}
