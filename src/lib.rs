pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod sessions;
pub mod storage;
pub mod tokens;

pub use db::DbPool;

use config::Config;
use sessions::SessionStore;
use storage::ObjectStorage;
use tokens::TokenSigner;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub tokens: TokenSigner,
    pub sessions: SessionStore,
    pub storage: ObjectStorage,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, storage: ObjectStorage) -> Self {
        let tokens = TokenSigner::new(&config.auth.jwt_secret, config.auth.token_ttl_days);
        let sessions = SessionStore::new(db.clone());
        Self {
            config,
            db,
            tokens,
            sessions,
            storage,
        }
    }
}
