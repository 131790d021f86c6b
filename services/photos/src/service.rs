//! Photo lifecycle orchestration
//!
//! Enforces the ordering rules between the remote asset backend and the
//! photo store:
//! - uploads hit the backend first; a local record exists only after the
//!   backend confirmed the upload
//! - a user's first photo is promoted to main atomically with creation
//! - the current main photo can never be deleted
//! - deletion hits the backend first; the local record is removed only
//!   after the backend confirmed the delete

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::assets::{AssetBackend, TransformPolicy};
use crate::error::PhotoError;
use crate::locks::UserLocks;
use crate::models::{NewPhoto, Photo};
use crate::store::PhotoStore;

/// Photo lifecycle service
#[derive(Clone)]
pub struct PhotoLifecycle {
    store: Arc<dyn PhotoStore>,
    assets: Arc<dyn AssetBackend>,
    transform: TransformPolicy,
    locks: UserLocks,
}

impl PhotoLifecycle {
    /// Create a new photo lifecycle service
    pub fn new(
        store: Arc<dyn PhotoStore>,
        assets: Arc<dyn AssetBackend>,
        transform: TransformPolicy,
    ) -> Self {
        Self {
            store,
            assets,
            transform,
            locks: UserLocks::new(),
        }
    }

    /// Fetch a single photo
    pub async fn get(&self, photo_id: Uuid) -> Result<Photo, PhotoError> {
        self.store
            .photo_by_id(photo_id)
            .await?
            .ok_or(PhotoError::NotFound)
    }

    /// Upload a photo for a user
    ///
    /// The image goes to the asset backend first; only on confirmed upload
    /// is a local record created. The user's first photo becomes the main
    /// photo.
    pub async fn upload(&self, user_id: Uuid, bytes: Vec<u8>) -> Result<Photo, PhotoError> {
        if bytes.is_empty() {
            return Err(PhotoError::BadRequest("Empty image upload".to_string()));
        }

        let _guard = self.locks.acquire(user_id).await;

        let has_main = self
            .store
            .photos_for_user(user_id)
            .await?
            .iter()
            .any(|p| p.is_main);

        let asset = self
            .assets
            .upload(bytes, &self.transform)
            .await
            .map_err(PhotoError::UploadFailed)?;

        let new_photo = NewPhoto {
            user_id,
            url: asset.url,
            asset_id: asset.asset_id.clone(),
            is_main: !has_main,
        };

        let photo = match self.store.create(&new_photo).await {
            Ok(photo) => photo,
            Err(e) => {
                // The asset is already remote; reclaim it so the failed
                // operation leaves nothing behind on either side.
                if let Err(cleanup) = self.assets.delete(&asset.asset_id).await {
                    warn!(
                        "Failed to reclaim asset {} after store error: {:#}",
                        asset.asset_id, cleanup
                    );
                }
                return Err(PhotoError::Internal(e));
            }
        };

        info!("User {} uploaded photo {}", user_id, photo.id);
        Ok(photo)
    }

    /// Make a photo the user's main photo
    pub async fn set_main(&self, user_id: Uuid, photo_id: Uuid) -> Result<(), PhotoError> {
        let _guard = self.locks.acquire(user_id).await;

        let photos = self.store.photos_for_user(user_id).await?;
        let target = photos
            .iter()
            .find(|p| p.id == photo_id)
            .ok_or(PhotoError::NotFound)?;

        if target.is_main {
            return Err(PhotoError::AlreadyMain);
        }

        self.store.promote_main(user_id, photo_id).await?;

        info!("User {} set photo {} as main", user_id, photo_id);
        Ok(())
    }

    /// Delete a non-main photo
    ///
    /// The remote asset is deleted first; the local record is removed only
    /// after the backend confirmed. A failed remote delete leaves local
    /// state untouched.
    pub async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> Result<(), PhotoError> {
        let _guard = self.locks.acquire(user_id).await;

        let photos = self.store.photos_for_user(user_id).await?;
        let target = photos
            .iter()
            .find(|p| p.id == photo_id)
            .ok_or(PhotoError::NotFound)?;

        if target.is_main {
            return Err(PhotoError::MainPhotoUndeletable);
        }

        self.assets
            .delete(&target.asset_id)
            .await
            .map_err(PhotoError::RemoteDeleteFailed)?;

        self.store.delete(photo_id).await?;

        info!("User {} deleted photo {}", user_id, photo_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryPhotoStore {
        photos: Mutex<HashMap<Uuid, Photo>>,
    }

    #[async_trait]
    impl PhotoStore for MemoryPhotoStore {
        async fn photos_for_user(&self, user_id: Uuid) -> Result<Vec<Photo>> {
            let photos = self.photos.lock().await;
            let mut out: Vec<Photo> = photos
                .values()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect();
            out.sort_by_key(|p| p.created_at);
            Ok(out)
        }

        async fn photo_by_id(&self, id: Uuid) -> Result<Option<Photo>> {
            Ok(self.photos.lock().await.get(&id).cloned())
        }

        async fn create(&self, new_photo: &NewPhoto) -> Result<Photo> {
            let photo = Photo {
                id: Uuid::new_v4(),
                user_id: new_photo.user_id,
                url: new_photo.url.clone(),
                asset_id: new_photo.asset_id.clone(),
                is_main: new_photo.is_main,
                created_at: Utc::now(),
            };
            self.photos.lock().await.insert(photo.id, photo.clone());
            Ok(photo)
        }

        async fn promote_main(&self, user_id: Uuid, photo_id: Uuid) -> Result<()> {
            let mut photos = self.photos.lock().await;
            anyhow::ensure!(
                photos.get(&photo_id).is_some_and(|p| p.user_id == user_id),
                "photo not found"
            );
            for photo in photos.values_mut().filter(|p| p.user_id == user_id) {
                photo.is_main = photo.id == photo_id;
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            self.photos.lock().await.remove(&id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryAssetBackend {
        assets: Mutex<Vec<String>>,
        fail_uploads: AtomicBool,
        fail_deletes: AtomicBool,
        delete_calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetBackend for MemoryAssetBackend {
        async fn upload(
            &self,
            _bytes: Vec<u8>,
            _transform: &TransformPolicy,
        ) -> Result<crate::assets::StoredAsset> {
            anyhow::ensure!(!self.fail_uploads.load(Ordering::SeqCst), "backend down");
            let asset_id = Uuid::new_v4().to_string();
            self.assets.lock().await.push(asset_id.clone());
            Ok(crate::assets::StoredAsset {
                url: format!("https://assets.test/{}", asset_id),
                asset_id,
            })
        }

        async fn delete(&self, asset_id: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::ensure!(!self.fail_deletes.load(Ordering::SeqCst), "backend down");
            self.assets.lock().await.retain(|a| a != asset_id);
            Ok(())
        }
    }

    fn lifecycle() -> (
        PhotoLifecycle,
        Arc<MemoryPhotoStore>,
        Arc<MemoryAssetBackend>,
    ) {
        let store = Arc::new(MemoryPhotoStore::default());
        let assets = Arc::new(MemoryAssetBackend::default());
        let service = PhotoLifecycle::new(
            store.clone(),
            assets.clone(),
            TransformPolicy::default(),
        );
        (service, store, assets)
    }

    fn image() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0]
    }

    async fn mains_for(store: &MemoryPhotoStore, user: Uuid) -> Vec<Uuid> {
        store
            .photos_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_main)
            .map(|p| p.id)
            .collect()
    }

    #[tokio::test]
    async fn first_photo_becomes_main() {
        let (service, store, _) = lifecycle();
        let user = Uuid::new_v4();

        let first = service.upload(user, image()).await.unwrap();
        assert!(first.is_main);

        let second = service.upload(user, image()).await.unwrap();
        assert!(!second.is_main);

        assert_eq!(mains_for(&store, user).await, vec![first.id]);
    }

    #[tokio::test]
    async fn upload_failure_leaves_no_local_record() {
        let (service, store, assets) = lifecycle();
        let user = Uuid::new_v4();

        assets.fail_uploads.store(true, Ordering::SeqCst);
        let err = service.upload(user, image()).await.unwrap_err();
        assert!(matches!(err, PhotoError::UploadFailed(_)));
        assert!(store.photos_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let (service, _, assets) = lifecycle();

        let err = service.upload(Uuid::new_v4(), vec![]).await.unwrap_err();
        assert!(matches!(err, PhotoError::BadRequest(_)));
        assert!(assets.assets.lock().await.is_empty());
    }

    #[tokio::test]
    async fn set_main_moves_the_flag() {
        let (service, store, _) = lifecycle();
        let user = Uuid::new_v4();

        let first = service.upload(user, image()).await.unwrap();
        let second = service.upload(user, image()).await.unwrap();

        service.set_main(user, second.id).await.unwrap();

        assert_eq!(mains_for(&store, user).await, vec![second.id]);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn set_main_on_main_fails_unchanged() {
        let (service, store, _) = lifecycle();
        let user = Uuid::new_v4();

        let first = service.upload(user, image()).await.unwrap();
        let err = service.set_main(user, first.id).await.unwrap_err();
        assert!(matches!(err, PhotoError::AlreadyMain));
        assert_eq!(mains_for(&store, user).await, vec![first.id]);
    }

    #[tokio::test]
    async fn set_main_requires_ownership() {
        let (service, _, _) = lifecycle();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        service.upload(user, image()).await.unwrap();
        let foreign = service.upload(other, image()).await.unwrap();

        // A photo owned by someone else is not found among the user's photos.
        let err = service.set_main(user, foreign.id).await.unwrap_err();
        assert!(matches!(err, PhotoError::NotFound));
    }

    #[tokio::test]
    async fn main_photo_cannot_be_deleted() {
        let (service, store, assets) = lifecycle();
        let user = Uuid::new_v4();

        let main = service.upload(user, image()).await.unwrap();
        let before = assets.delete_calls.load(Ordering::SeqCst);

        let err = service.delete(user, main.id).await.unwrap_err();
        assert!(matches!(err, PhotoError::MainPhotoUndeletable));

        // No remote delete happened and the record is still there.
        assert_eq!(assets.delete_calls.load(Ordering::SeqCst), before);
        assert_eq!(store.photos_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_remote_delete_keeps_local_record() {
        let (service, store, assets) = lifecycle();
        let user = Uuid::new_v4();

        service.upload(user, image()).await.unwrap();
        let second = service.upload(user, image()).await.unwrap();

        assets.fail_deletes.store(true, Ordering::SeqCst);
        let err = service.delete(user, second.id).await.unwrap_err();
        assert!(matches!(err, PhotoError::RemoteDeleteFailed(_)));
        assert_eq!(store.photos_for_user(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn successful_delete_removes_both_sides() {
        let (service, store, assets) = lifecycle();
        let user = Uuid::new_v4();

        service.upload(user, image()).await.unwrap();
        let second = service.upload(user, image()).await.unwrap();

        service.delete(user, second.id).await.unwrap();

        let remaining = store.photos_for_user(user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(
            !assets
                .assets
                .lock()
                .await
                .contains(&second.asset_id)
        );
    }

    #[tokio::test]
    async fn deleting_someone_elses_photo_is_not_found() {
        let (service, _, _) = lifecycle();
        let owner = Uuid::new_v4();
        let photo = service.upload(owner, image()).await.unwrap();

        let err = service.delete(Uuid::new_v4(), photo.id).await.unwrap_err();
        assert!(matches!(err, PhotoError::NotFound));
    }

    #[tokio::test]
    async fn concurrent_set_main_keeps_exactly_one_main() {
        let (service, store, _) = lifecycle();
        let user = Uuid::new_v4();

        service.upload(user, image()).await.unwrap();
        let a = service.upload(user, image()).await.unwrap();
        let b = service.upload(user, image()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let service = service.clone();
            let target = if i % 2 == 0 { a.id } else { b.id };
            handles.push(tokio::spawn(async move {
                // AlreadyMain losses are expected under contention.
                let _ = service.set_main(user, target).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mains = mains_for(&store, user).await;
        assert_eq!(mains.len(), 1, "exactly one main must survive the race");
        assert!(mains[0] == a.id || mains[0] == b.id);
    }
}
