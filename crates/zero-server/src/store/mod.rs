//! Data-access seam for user records.
//!
//! Handlers only see `Arc<dyn UserStore>`; implementations manage their own
//! concurrency and never share locks with the request instrumentation.

pub mod memory;

use async_trait::async_trait;
use zero_core::{NewUser, Result, User};

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>>;
    async fn get(&self, id: u64) -> Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> Result<User>;
}
