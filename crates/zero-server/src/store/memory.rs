use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use zero_core::error::{Result, ZeroError};
use zero_core::{NewUser, User};

use crate::config::StoreSection;
use crate::store::UserStore;

/// In-process user table with an auto-increment id.
pub struct MemoryStore {
    users: DashMap<u64, User>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the store described by `cfg` and insert its seed records.
    pub fn open(cfg: &StoreSection) -> Result<Self> {
        if cfg.name.trim().is_empty() {
            return Err(ZeroError::Config("store.name must not be empty".into()));
        }

        let store = Self::new();
        for seed in &cfg.seed {
            seed.validate()
                .map_err(|e| ZeroError::Config(format!("invalid store.seed entry: {e}")))?;
            store.insert_now(seed.clone());
        }
        tracing::info!(dsn = %cfg.redacted_dsn(), users = store.users.len(), "user store opened");
        Ok(store)
    }

    fn insert_now(&self, user: NewUser) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = user.into_user(id);
        self.users.insert(id, user.clone());
        user
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn get(&self, id: u64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        user.validate()?;
        Ok(self.insert_now(user))
    }
}
