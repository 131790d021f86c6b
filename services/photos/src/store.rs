//! Photo store
//!
//! Persists photo metadata scoped to a user. The trait is the seam between
//! the lifecycle service and the database so the invariant logic can be
//! exercised against an in-memory double.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{NewPhoto, Photo};

/// Store for photo metadata
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// List all photos belonging to a user
    async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>>;

    /// Find a photo by id
    async fn photo_by_id(&self, id: Uuid) -> Result<Option<Photo>>;

    /// Persist a new photo, including its initial `is_main` flag
    async fn create(&self, new_photo: &NewPhoto) -> Result<Photo>;

    /// Atomically demote the user's current main photo and promote the
    /// target
    ///
    /// Implementations must demote before promoting within one atomic unit,
    /// so a partial failure leaves at most the old main flagged, never two
    /// mains.
    async fn promote_main(&self, user_id: Uuid, photo_id: Uuid) -> Result<()>;

    /// Remove a photo record
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// PostgreSQL-backed photo store
#[derive(Clone)]
pub struct PgPhotoStore {
    pool: PgPool,
}

impl PgPhotoStore {
    /// Create a new photo store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn photo_from_row(row: &sqlx::postgres::PgRow) -> Photo {
        Photo {
            id: row.get("id"),
            user_id: row.get("user_id"),
            url: row.get("url"),
            asset_id: row.get("asset_id"),
            is_main: row.get("is_main"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl PhotoStore for PgPhotoStore {
    async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, url, asset_id, is_main, created_at
            FROM photos
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::photo_from_row).collect())
    }

    async fn photo_by_id(&self, id: Uuid) -> Result<Option<Photo>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, url, asset_id, is_main, created_at
            FROM photos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::photo_from_row))
    }

    async fn create(&self, new_photo: &NewPhoto) -> Result<Photo> {
        let row = sqlx::query(
            r#"
            INSERT INTO photos (user_id, url, asset_id, is_main)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, url, asset_id, is_main, created_at
            "#,
        )
        .bind(new_photo.user_id)
        .bind(&new_photo.url)
        .bind(&new_photo.asset_id)
        .bind(new_photo.is_main)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::photo_from_row(&row))
    }

    async fn promote_main(&self, user_id: Uuid, photo_id: Uuid) -> Result<()> {
        // Demote then promote inside one transaction; both updates commit
        // together or not at all.
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE photos SET is_main = FALSE WHERE user_id = $1 AND is_main")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let updated =
            sqlx::query("UPDATE photos SET is_main = TRUE WHERE id = $1 AND user_id = $2")
                .bind(photo_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        anyhow::ensure!(
            updated.rows_affected() == 1,
            "photo {} not found for user {}",
            photo_id,
            user_id
        );

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
