//! Top-level facade crate for zero.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use zero_core::*;
}

pub mod server {
    pub use zero_server::*;
}
