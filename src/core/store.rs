use async_trait::async_trait;

use crate::core::error::StorageError;

/// Key under which the serialized chat log lives.
pub const CHAT_HISTORY_KEY: &str = "smartspend-chat-history";

/// Key under which the theme preference lives.
pub const THEME_KEY: &str = "smartspend-theme";

/// String key-value storage scoped to the local user profile.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
