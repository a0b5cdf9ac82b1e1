//! User records as stored and served over JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZeroError};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub second_name: String,
    pub birth_date: DateTime<Utc>,
}

/// Insert payload; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub first_name: String,
    pub second_name: String,
    pub birth_date: DateTime<Utc>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(ZeroError::BadRequest("firstName must not be empty".into()));
        }
        if self.second_name.trim().is_empty() {
            return Err(ZeroError::BadRequest("secondName must not be empty".into()));
        }
        Ok(())
    }

    /// Attach a store-assigned id.
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            first_name: self.first_name,
            second_name: self.second_name,
            birth_date: self.birth_date,
        }
    }
}
