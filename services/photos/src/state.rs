//! Application state shared across handlers

use crate::guard::TokenVerifier;
use crate::service::PhotoLifecycle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: PhotoLifecycle,
    pub token_verifier: TokenVerifier,
}
