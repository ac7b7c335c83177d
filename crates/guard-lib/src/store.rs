// ============================
// guard-lib/src/store.rs
// ============================
//! Timestamp storage abstraction with flat-file implementation.
//!
//! The engine persists exactly two kinds of scalar: the global activation
//! watermark and one last-changed stamp per user. A missing value always
//! reads as 0 ("unset"), never as an error.
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use passguard_common::{UnixSeconds, UserId};
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;

/// Trait for timestamp storage backends
#[async_trait]
pub trait TimestampStore: Send + Sync {
    /// Read the global activation watermark (0 if never armed)
    async fn activation(&self) -> Result<UnixSeconds, AppError>;

    /// Overwrite the global activation watermark
    async fn set_activation(&self, at: UnixSeconds) -> Result<(), AppError>;

    /// Read a user's last-changed stamp (0 if never recorded)
    async fn user_changed_at(&self, user: &UserId) -> Result<UnixSeconds, AppError>;

    /// Overwrite a user's last-changed stamp
    async fn set_user_changed_at(&self, user: &UserId, at: UnixSeconds) -> Result<(), AppError>;
}

/// Flat-file implementation of the `TimestampStore` trait.
///
/// Layout under the root: `activation` holds the watermark, `users/<key>`
/// holds one stamp per user. User ids are opaque strings, so the file name
/// is the URL-safe base64 of the id: collision-free and filesystem-safe.
#[derive(Clone)]
pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("users"))?;
        Ok(Self { root })
    }

    fn activation_path(&self) -> PathBuf {
        self.root.join("activation")
    }

    fn user_path(&self, user: &UserId) -> PathBuf {
        self.root
            .join("users")
            .join(URL_SAFE_NO_PAD.encode(user.as_str()))
    }

    async fn read_stamp(path: &Path) -> Result<UnixSeconds, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(content.trim().parse().unwrap_or(0)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn write_stamp(path: &Path, at: UnixSeconds) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            tokio_fs::create_dir_all(parent).await?;
        }
        tokio_fs::write(path, at.to_string()).await?;
        Ok(())
    }
}

#[async_trait]
impl TimestampStore for FlatFileStore {
    async fn activation(&self) -> Result<UnixSeconds, AppError> {
        Self::read_stamp(&self.activation_path()).await
    }

    async fn set_activation(&self, at: UnixSeconds) -> Result<(), AppError> {
        Self::write_stamp(&self.activation_path(), at).await
    }

    async fn user_changed_at(&self, user: &UserId) -> Result<UnixSeconds, AppError> {
        Self::read_stamp(&self.user_path(user)).await
    }

    async fn set_user_changed_at(&self, user: &UserId, at: UnixSeconds) -> Result<(), AppError> {
        Self::write_stamp(&self.user_path(user), at).await
    }
}

/// In-memory implementation, for tests and embedding hosts that bring
/// their own persistence.
#[derive(Default)]
pub struct MemoryStore {
    activation: DashMap<(), UnixSeconds>,
    users: DashMap<UserId, UnixSeconds>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimestampStore for MemoryStore {
    async fn activation(&self) -> Result<UnixSeconds, AppError> {
        Ok(self.activation.get(&()).map(|v| *v).unwrap_or(0))
    }

    async fn set_activation(&self, at: UnixSeconds) -> Result<(), AppError> {
        self.activation.insert((), at);
        Ok(())
    }

    async fn user_changed_at(&self, user: &UserId) -> Result<UnixSeconds, AppError> {
        Ok(self.users.get(user).map(|v| *v).unwrap_or(0))
    }

    async fn set_user_changed_at(&self, user: &UserId, at: UnixSeconds) -> Result<(), AppError> {
        self.users.insert(user.clone(), at);
        Ok(())
    }
}
