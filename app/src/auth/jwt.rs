//! ID token claim decoding
//!
//! Tokens come straight from the identity provider over TLS, so only the
//! claims are read here; the cloud store verifies signatures server-side.
//! Keys and validation rules are built once and reused.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims of a Firebase ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Firebase copy of the user ID; preferred when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IdTokenClaims {
    pub fn uid(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.sub)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Reads ID token claims with a pre-built validation
#[derive(Clone)]
pub struct IdTokenDecoder {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl IdTokenDecoder {
    /// `audience` is the project the token must be issued for, if known
    pub fn new(audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        // expiry is checked against the app clock by the caller
        validation.validate_exp = false;
        match audience {
            Some(aud) if !aud.is_empty() => validation.set_audience(&[aud]),
            _ => validation.validate_aud = false,
        }

        Self {
            key: Arc::new(DecodingKey::from_secret(&[])),
            validation: Arc::new(validation),
        }
    }

    pub fn decode(&self, token: &str) -> Result<IdTokenClaims, jsonwebtoken::errors::Error> {
        decode::<IdTokenClaims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}
