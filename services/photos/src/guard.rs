//! Session token guard for mutating photo routes
//!
//! Verifies the bearer token issued by the auth service (HS512 over the
//! shared secret) and checks that the caller's identity matches the owner of
//! the targeted resource. Any validation failure is treated as
//! unauthenticated; there is no fallback identity source.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{error::PhotoError, state::AppState};

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

/// Authenticated caller, extracted from a verified token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Verifier for session tokens issued by the auth service
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from the shared signing secret
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS512);
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Validate a token and return its claims; any error means
    /// unauthenticated
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Check that the caller owns the targeted resource
pub fn authorize(token_user: Uuid, resource_owner: Uuid) -> Result<(), PhotoError> {
    if token_user == resource_owner {
        Ok(())
    } else {
        Err(PhotoError::Unauthorized)
    }
}

/// Extract and validate the bearer token from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, PhotoError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(PhotoError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(PhotoError::Unauthorized)?;

    let claims = state.token_verifier.verify(token).map_err(|e| {
        warn!("Rejected token: {}", e);
        PhotoError::Unauthorized
    })?;

    let user = AuthUser {
        id: claims.sub,
        username: claims.name,
    };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs()
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(jsonwebtoken::Algorithm::HS512),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode failed")
    }

    #[test]
    fn valid_token_round_trips() {
        let user_id = Uuid::new_v4();
        let token = sign(
            &Claims {
                sub: user_id,
                name: "lisa".to_string(),
                iat: now(),
                exp: now() + 3600,
            },
            "shared-secret",
        );

        let claims = TokenVerifier::new("shared-secret").verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, "lisa");
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = sign(
            &Claims {
                sub: Uuid::new_v4(),
                name: "lisa".to_string(),
                iat: now(),
                exp: now() + 3600,
            },
            "other-secret",
        );

        assert!(TokenVerifier::new("shared-secret").verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign(
            &Claims {
                sub: Uuid::new_v4(),
                name: "lisa".to_string(),
                iat: now() - 1000,
                exp: now() - 500,
            },
            "shared-secret",
        );

        assert!(TokenVerifier::new("shared-secret").verify(&token).is_err());
    }

    #[test]
    fn ownership_check_is_exact() {
        let user = Uuid::new_v4();
        assert!(authorize(user, user).is_ok());
        assert!(matches!(
            authorize(user, Uuid::new_v4()),
            Err(PhotoError::Unauthorized)
        ));
    }
}
