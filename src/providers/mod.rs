mod http;

pub use http::HttpExpenseService;

use crate::core::config::AppConfig;
use crate::core::error::RemoteError;
use crate::core::service::ExpenseService;
use std::sync::Arc;
use std::time::Duration;


/// Create the remote service client described by `config`.
pub fn create_service(config: &AppConfig) -> Result<Arc<dyn ExpenseService>, RemoteError> {
    let service = HttpExpenseService::new(
        config.api_base(),
        config.request_timeout_secs.map(Duration::from_secs),
        Duration::from_secs(config.probe_timeout_secs),
    )?;
    Ok(Arc::new(service))
}
