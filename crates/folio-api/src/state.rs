use std::sync::Arc;

use folio_db::Database;

use crate::auth::AdminCredential;
use crate::config::Config;
use crate::error::ApiError;
use crate::token::TokenService;
use crate::upload::ImageStore;

pub type AppState = Arc<AppStateInner>;

/// Everything handlers share. Built once at startup; read-only afterwards.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub admin: AdminCredential,
    pub images: ImageStore,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenService, admin: AdminCredential, images: ImageStore) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            admin,
            images,
        })
    }

    pub async fn from_config(config: &Config, db: Database) -> anyhow::Result<AppState> {
        let images = ImageStore::from_config(config).await?;
        Ok(Self::new(
            db,
            TokenService::new(&config.jwt_secret),
            AdminCredential::from_hash(config.admin_password_hash.clone()),
            images,
        ))
    }
}

/// Run a blocking store call off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db)).await?;
    Ok(result?)
}
