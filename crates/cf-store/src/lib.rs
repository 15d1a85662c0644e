pub mod memory;
pub mod redis_store;
pub mod registry;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use registry::ProjectRegistry;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("project exists: user {user_id} already owns project {project_id}")]
    AlreadyExists { user_id: String, project_id: String },

    #[error("no entry for {field} in {key}")]
    NotFound { key: String, field: String },

    #[error("store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("unexpected PING reply from store: {0}")]
    UnexpectedPing(String),

    #[error("stored value is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Coarse classification callers branch on instead of matching variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    Store,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Redis(_) | Self::UnexpectedPing(_) | Self::Utf8(_) => ErrorKind::Store,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hash-style key-value storage: each `key` holds a map of `field -> bytes`.
///
/// Keys are already namespaced by the caller.
#[async_trait]
pub trait HashStore: Send + Sync + 'static {
    /// Liveness check for the backing store.
    async fn ping(&self) -> Result<()>;

    async fn get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, field: &str, value: &[u8]) -> Result<()>;

    /// Write `field` only if it is absent. Returns `true` when the write happened.
    async fn set_if_absent(&self, key: &str, field: &str, value: &[u8]) -> Result<bool>;

    /// Remove `field`. Returns `true` when something was deleted.
    async fn delete(&self, key: &str, field: &str) -> Result<bool>;

    async fn exists(&self, key: &str, field: &str) -> Result<bool>;

    /// Every field/value pair under `key`, in no particular order.
    async fn entries(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>>;
}
