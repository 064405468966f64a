//! Cost query normalization & aggregation engine.
//!
//! Pipeline: validate -> plan -> (backend calls) -> aggregate -> metrics
//! -> chart projection. Everything here is request-scoped; the only
//! shared resource is the backend client handle, which is safe for
//! concurrent use.

pub mod aggregate;
pub mod chart;
pub mod metrics;
pub mod plan;
pub mod validate;

use chrono::{Duration, NaiveDate};

use crate::backend::CostBackend;
use crate::config::QueryLimits;
use crate::errors::QueryError;
use crate::models::{
    CostEntry, CostResponse, ForecastPoint, ForecastResponse, Granularity, GroupDimension,
    RequestSpec, ServiceCost, TopServicesResponse,
};

use self::metrics::round_cents;

/// Run the full pipeline for one validated request.
pub async fn analyze(
    spec: &RequestSpec,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<CostResponse, QueryError> {
    let query_plan = plan::plan(spec, backend, limits)?;
    let entries = plan::execute(&query_plan, backend, limits).await?;
    let series = aggregate::aggregate(spec, entries)?;
    let summary = metrics::summarize(spec, &series)?;
    let chart_data = chart::project(spec.granularity, &series);

    let data: Vec<CostEntry> = series
        .periods
        .iter()
        .map(|period| CostEntry {
            period_start: spec.granularity.label(period.period_start),
            period_end: spec.granularity.label(period.period_end),
            group: period.group_key.clone(),
            cost: period.cost,
            currency: period.currency.clone(),
        })
        .collect();

    Ok(CostResponse {
        total_cost: round_cents(summary.total_cost),
        average_daily_cost: round_cents(summary.average_daily_cost),
        currency: series.currency,
        data,
        chart_data,
    })
}

/// Top-N services by summed cost over a trailing window.
pub async fn top_services(
    days: u32,
    limit: usize,
    today: NaiveDate,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<TopServicesResponse, QueryError> {
    let spec = RequestSpec {
        start: today - Duration::days(days as i64),
        end: today,
        granularity: Granularity::Daily,
        group_by: Some(GroupDimension::Service),
    };
    let query_plan = plan::plan(&spec, backend, limits)?;
    let entries = plan::execute(&query_plan, backend, limits).await?;
    let series = aggregate::aggregate(&spec, entries)?;
    let ranking = metrics::rank_services(&series, limit);

    Ok(TopServicesResponse {
        top_services: ranking
            .top
            .into_iter()
            .map(|s| ServiceCost { service: s.service, cost: round_cents(s.cost) })
            .collect(),
        total_services: ranking.total_services,
        period_days: days,
    })
}

/// Forward cost forecast over `days` from `today`, delegated to the
/// backend's forecasting capability.
pub async fn forecast(
    days: u32,
    today: NaiveDate,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<ForecastResponse, QueryError> {
    let end = today + Duration::days(days as i64);
    let data = plan::call_with_retries(limits, || {
        backend.query_cost_forecast(today, end, Granularity::Daily)
    })
    .await?;

    let forecast_data: Vec<ForecastPoint> = data
        .points
        .iter()
        .map(|point| ForecastPoint {
            period_start: point.period_start,
            period_end: point.period_end,
            predicted_cost: point.mean,
            lower_bound: point.lower,
            upper_bound: point.upper,
        })
        .collect();
    let total = data
        .total
        .unwrap_or_else(|| forecast_data.iter().map(|p| p.predicted_cost).sum());

    Ok(ForecastResponse {
        forecast_data,
        total_forecast: round_cents(total),
        currency: data.currency,
        forecast_days: days,
    })
}
