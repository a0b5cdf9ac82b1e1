//! User CRUD handlers and the shared response helpers they use.

pub mod respond;
pub mod users;

pub use respond::ErrorResponse;
