// crates/guard-lib/src/middleware/mod.rs

//! Middleware for the `PassGuard` host adapter.

pub mod force_change;

pub use force_change::force_password_change;
