//! Photo model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Photo entity
///
/// A photo belongs to exactly one user for its lifetime. Once a user has at
/// least one photo, exactly one of them carries `is_main = true`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Public URL served by the asset backend
    pub url: String,
    /// Opaque reference id in the asset backend, used for deletion
    pub asset_id: String,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

/// New photo creation payload
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub user_id: Uuid,
    pub url: String,
    pub asset_id: String,
    pub is_main: bool,
}
