//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::media::MediaStorage;

/// Cheaply cloneable handle to shared resources.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    media: MediaStorage,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let media = MediaStorage::new(config.media.root.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Uploaded image storage.
    #[must_use]
    pub fn media(&self) -> &MediaStorage {
        &self.inner.media
    }

    /// URL prefix for stored images, e.g. `/media/`.
    #[must_use]
    pub fn media_url(&self) -> &str {
        &self.inner.config.media.url_prefix
    }
}
