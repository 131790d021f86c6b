//! Registration and login orchestration

use std::sync::Arc;

use tracing::info;

use crate::error::AuthError;
use crate::models::{NewUser, UserSummary};
use crate::password::{generate_salt, hash_password, verify_password};
use crate::store::CredentialStore;
use crate::token::TokenService;

/// Authentication service
///
/// Orchestrates registration (uniqueness check, hash creation) and login
/// (hash verification, token issuance) against the credential store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Register a new user
    ///
    /// The username is normalized to lowercase before the uniqueness check
    /// and before persistence, so "Lisa" and "lisa" are the same account.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserSummary, AuthError> {
        let username = username.to_lowercase();

        if self.store.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let salt = generate_salt();
        let hash = hash_password(password, &salt);

        let user = self
            .store
            .create(&NewUser {
                username,
                password_hash: hash,
                password_salt: salt.to_vec(),
            })
            .await?;

        info!("Registered user {}", user.id);
        Ok(UserSummary::from(&user))
    }

    /// Authenticate a user and issue a session token
    ///
    /// Unknown usernames and wrong passwords both fail with
    /// `InvalidCredentials` so the response does not reveal which usernames
    /// exist.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, UserSummary), AuthError> {
        let username = username.to_lowercase();

        let Some(user) = self.store.find_by_username(&username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash, &user.password_salt) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user).map_err(AuthError::Internal)?;

        info!("User {} logged in", user.id);
        Ok((token, UserSummary::from(&user)))
    }
}
