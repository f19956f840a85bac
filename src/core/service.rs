use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::category::Category;
use crate::core::error::RemoteError;

#[derive(Debug, Clone, Serialize)]
pub struct CategorizeRequest<'a> {
    pub description: &'a str,
}

/// Successful `/categorize` payload. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategorizeResponse {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

/// Successful `/query` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Remote categorization and question-answering service.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    async fn categorize(&self, description: &str) -> Result<CategorizeResponse, RemoteError>;

    async fn query(&self, query: &str) -> Result<QueryResponse, RemoteError>;

    /// Best-effort reachability check against the service root.
    async fn probe(&self) -> bool;

    fn base_url(&self) -> &str;
}
