//! zero server library entry.
//!
//! This crate wires configuration, request instrumentation, the user store,
//! and the shutdown orchestrator into one HTTP service. It is intended to be
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod server;
pub mod store;
