use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::types::{ChartPayload, Granularity, GroupDimension};

/// Raw `/costs/analyze` body, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct CostQueryRequest {
    pub start_date: String,
    pub end_date: String,
    pub granularity: Option<String>,
    pub group_by: Option<String>,
}

/// Canonical, validated cost query. Invalid shapes never get past the
/// validator, so downstream stages can rely on these fields as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub group_by: Option<GroupDimension>,
}

impl RequestSpec {
    /// Calendar days covered by the request.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// One aggregated time bucket, half-open `[period_start, period_end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CostPeriod {
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub cost: f64,
    pub currency: String,
    pub group_key: Option<String>,
}

/// Combined series: ordered by period start, then group key within a
/// period. Gap-free over the requested range, single currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSeries {
    pub periods: Vec<CostPeriod>,
    pub currency: String,
}

/// Wire projection of a [`CostPeriod`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    pub period_start: String,
    pub period_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub cost: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostResponse {
    pub total_cost: f64,
    pub average_daily_cost: f64,
    pub currency: String,
    pub data: Vec<CostEntry>,
    pub chart_data: ChartPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopServicesResponse {
    pub top_services: Vec<ServiceCost>,
    pub total_services: usize,
    pub period_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct ServicesParams {
    pub days: Option<u32>,
    pub limit: Option<u32>,
}
