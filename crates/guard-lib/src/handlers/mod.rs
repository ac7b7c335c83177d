// ============================
// guard-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers for the `PassGuard` host adapter.

pub mod admin;
pub mod rotation;

pub use admin::{rearm, rearm_form};
pub use rotation::{change_password, profile_view, rotation_status};
