use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::core::error::RemoteError;
use crate::core::service::*;

/// `ExpenseService` over plain JSON HTTP.
pub struct HttpExpenseService {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpExpenseService {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Option<Duration>,
        probe_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            probe_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RemoteError::Http(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Malformed(e.to_string()))
}

#[async_trait]
impl ExpenseService for HttpExpenseService {
    async fn categorize(&self, description: &str) -> Result<CategorizeResponse, RemoteError> {
        self.post_json("categorize", &CategorizeRequest { description })
            .await
    }

    async fn query(&self, query: &str) -> Result<QueryResponse, RemoteError> {
        self.post_json("query", &QueryRequest { query }).await
    }

    async fn probe(&self) -> bool {
        let result = self
            .client
            .get(self.url("/"))
            .timeout(self.probe_timeout)
            .send()
            .await;
        match result {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                tracing::debug!(status = %r.status(), "status probe failed");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "status probe failed");
                false
            }
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
