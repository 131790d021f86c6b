//! Session token issuance and validation
//!
//! This module builds and signs the stateless bearer token handed out at
//! login. Tokens are signed with HS512 using a server-held secret and carry
//! a fixed expiry. There is no server-side revocation; a token is valid
//! until it expires.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// Default session lifetime: 24 hours
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric signing secret
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_seconds: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TOKEN_SECRET`: signing secret (required)
    /// - `TOKEN_TTL_SECONDS`: token lifetime in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = env::var("TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("TOKEN_SECRET environment variable not set"))?;

        let ttl_seconds = env::var("TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        Ok(TokenConfig {
            secret,
            ttl_seconds,
        })
    }
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username
    pub name: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Session token service
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl TokenService {
    /// Initialize a new token service from a configuration
    pub fn new(config: &TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS512);
        validation.validate_exp = true;

        TokenService {
            encoding_key,
            decoding_key,
            validation,
            ttl_seconds: config.ttl_seconds,
        }
    }

    /// Issue a signed session token for a user
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            name: user.username.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS512),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    /// Validate a token and return its claims
    ///
    /// Fails on a bad signature, a malformed token, an unexpected algorithm,
    /// or an expired token. Callers must treat any error as unauthenticated.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the configured token lifetime in seconds
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}
