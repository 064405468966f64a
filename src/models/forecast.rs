use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecasted bucket; bounds are absent when the backend supplies no
/// prediction interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub predicted_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast_data: Vec<ForecastPoint>,
    pub total_forecast: f64,
    pub currency: String,
    pub forecast_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub days: Option<u32>,
}
