//! zero core: transport-agnostic domain types, build metadata, and errors.
//!
//! This crate defines the user model, the build information embedded in health
//! responses, and the error surface shared by the server and its handlers. It
//! intentionally carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ZeroError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod build_info;
pub mod error;
pub mod model;

/// Shared result type.
pub use error::{Result, ZeroError};
pub use build_info::{BuildInfo, Commit};
pub use model::{NewUser, User};
