//! Outbound boundary to the billing query backend.
//!
//! The engine only sees [`CostBackend`]; credentials, region selection and
//! transport belong to the implementation. The trait distinguishes "no
//! data for range" (Ok with empty entries) from "query rejected" and
//! "transient failure" so the planner can retry the right things.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::{Granularity, GroupDimension};

pub mod cost_explorer;

pub use cost_explorer::CostExplorerBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend judged the query itself invalid. Never retried.
    #[error("{0}")]
    Rejected(String),
    /// Timeout or throttle; safe to retry with backoff.
    #[error("{0}")]
    Transient(String),
}

/// One cost datum as returned by the backend, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEntry {
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub group_key: Option<String>,
    pub amount: f64,
    pub currency: String,
}

/// One page of results; `next_token` signals more pages remain.
#[derive(Debug, Clone, Default)]
pub struct CostPage {
    pub entries: Vec<BackendEntry>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForecastEntry {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub mean: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Forecast rows as returned by the backend.
#[derive(Debug, Clone)]
pub struct ForecastData {
    pub points: Vec<ForecastEntry>,
    pub total: Option<f64>,
    pub currency: String,
}

#[async_trait]
pub trait CostBackend: Send + Sync {
    async fn query_cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
        group_by: Option<GroupDimension>,
        next_token: Option<String>,
    ) -> Result<CostPage, BackendError>;

    async fn query_cost_forecast(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<ForecastData, BackendError>;

    /// Whether the backend can serve `group_by` at `granularity`.
    fn supports(&self, granularity: Granularity, group_by: Option<GroupDimension>) -> bool {
        let _ = (granularity, group_by);
        true
    }
}
