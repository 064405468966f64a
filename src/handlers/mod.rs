pub mod costs;
pub mod dashboard;
pub mod forecasts;
pub mod health;

use std::sync::Arc;

use crate::backend::CostBackend;
use crate::config::QueryLimits;

/// Shared application state available to all handlers. The backend
/// handle is constructed once at startup and shared read-only across
/// concurrently handled requests.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn CostBackend>,
    pub limits: QueryLimits,
}
