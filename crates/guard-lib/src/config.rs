// ============================
// guard-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Query-string marker appended to the redirect target so the profile page
/// knows to render the force-change prompt.
pub const FORCE_CHANGE_MARKER: &str = "force_password_change";

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    /// Routes the gate consults
    pub routes: RouteTable,
    /// Anti-forgery nonce lifetime in seconds
    pub nonce_ttl_secs: u64,
}

/// Password complexity requirements
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length in characters
    pub min_length: usize,
    /// Require at least one uppercase letter (any script)
    pub require_uppercase: bool,
    /// Require at least one ASCII digit
    pub require_digit: bool,
    /// Require at least one non-alphanumeric character
    pub require_special: bool,
}

/// The gate's route table. Policy data, not control flow: the exemption
/// list stays auditable and independently testable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Profile/settings page where the password can be changed. Redirect
    /// target when a request is blocked, and the one interactive page that
    /// is always allowed through.
    pub profile: String,
    /// Login page, always allowed through.
    pub login: String,
    /// Background-action endpoints, always allowed through.
    pub exempt: Vec<String>,
    /// Admin page hosting the re-arm form.
    pub admin_rearm: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("static addr"),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            password_requirements: PasswordRequirements::default(),
            routes: RouteTable::default(),
            nonce_ttl_secs: 60 * 15,
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 22,
            require_uppercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            profile: "/profile".to_string(),
            login: "/login".to_string(),
            // the change endpoint itself must stay reachable, or a stale
            // user could never rotate out of the block
            exempt: vec!["/actions".to_string(), "/password/change".to_string()],
            admin_rearm: "/admin/rearm".to_string(),
        }
    }
}

impl RouteTable {
    /// Routes never blocked even when rotation is required.
    pub fn is_allowed(&self, route: &str) -> bool {
        route == self.profile
            || route == self.login
            || self.exempt.iter().any(|r| r == route)
    }
}

impl Settings {
    /// Load settings from `passguard.toml` and `PASSGUARD_`-prefixed
    /// environment variables, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from("passguard.toml")
    }

    /// Load settings from a specific TOML file plus the environment.
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PASSGUARD_").split("__"))
            .extract()?;
        Ok(settings)
    }
}
