//! AWS Cost Explorer implementation of [`CostBackend`].

use async_trait::async_trait;
use aws_sdk_costexplorer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::types::{
    DateInterval, Granularity as CeGranularity, GroupDefinition, GroupDefinitionType, Metric,
    MetricValue,
};
use aws_sdk_costexplorer::Client;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::AwsConfig;
use crate::models::{Granularity, GroupDimension};

use super::{BackendEntry, BackendError, CostBackend, CostPage, ForecastData, ForecastEntry};

const COST_METRIC: &str = "BlendedCost";

pub struct CostExplorerBackend {
    client: Client,
}

impl CostExplorerBackend {
    pub async fn new(config: &AwsConfig) -> anyhow::Result<Self> {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Ok(Self { client: Client::new(&sdk_config) })
    }
}

#[async_trait]
impl CostBackend for CostExplorerBackend {
    async fn query_cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
        group_by: Option<GroupDimension>,
        next_token: Option<String>,
    ) -> Result<CostPage, BackendError> {
        let mut request = self
            .client
            .get_cost_and_usage()
            .time_period(date_interval(start, end, granularity)?)
            .granularity(to_ce_granularity(granularity))
            .metrics(COST_METRIC);

        if let Some(dimension) = group_by {
            request = request.group_by(
                GroupDefinition::builder()
                    .r#type(GroupDefinitionType::Dimension)
                    .key(dimension.to_string())
                    .build(),
            );
        }
        if let Some(token) = next_token {
            request = request.next_page_token(token);
        }

        let response = request.send().await.map_err(classify)?;

        let mut entries = Vec::new();
        for result in response.results_by_time() {
            let Some(period) = result.time_period() else {
                continue;
            };
            let period_start = parse_period_stamp(period.start())?;
            let period_end = parse_period_stamp(period.end())?;

            if !result.groups().is_empty() {
                for group in result.groups() {
                    let key = group
                        .keys()
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string());
                    if let Some(metric) = group.metrics().and_then(|m| m.get(COST_METRIC)) {
                        let (amount, currency) = metric_amount(metric);
                        entries.push(BackendEntry {
                            period_start,
                            period_end,
                            group_key: Some(key),
                            amount,
                            currency,
                        });
                    }
                }
            } else if let Some(metric) = result.total().and_then(|t| t.get(COST_METRIC)) {
                let (amount, currency) = metric_amount(metric);
                entries.push(BackendEntry {
                    period_start,
                    period_end,
                    group_key: None,
                    amount,
                    currency,
                });
            }
        }

        Ok(CostPage {
            entries,
            next_token: response.next_page_token().map(String::from),
        })
    }

    async fn query_cost_forecast(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<ForecastData, BackendError> {
        let response = self
            .client
            .get_cost_forecast()
            .time_period(date_interval(start, end, granularity)?)
            .metric(Metric::BlendedCost)
            .granularity(to_ce_granularity(granularity))
            .send()
            .await
            .map_err(classify)?;

        let mut points = Vec::new();
        for result in response.forecast_results_by_time() {
            let Some(period) = result.time_period() else {
                continue;
            };
            let period_start = parse_period_stamp(period.start())?.date();
            let period_end = parse_period_stamp(period.end())?.date();
            points.push(ForecastEntry {
                period_start,
                period_end,
                mean: parse_amount(result.mean_value()),
                lower: result
                    .prediction_interval_lower_bound()
                    .and_then(|v| v.parse().ok()),
                upper: result
                    .prediction_interval_upper_bound()
                    .and_then(|v| v.parse().ok()),
            });
        }

        let total = response.total().and_then(|t| t.amount()).and_then(|a| a.parse().ok());
        let currency = response
            .total()
            .and_then(|t| t.unit())
            .unwrap_or("USD")
            .to_string();

        Ok(ForecastData { points, total, currency })
    }
}

fn date_interval(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> Result<DateInterval, BackendError> {
    DateInterval::builder()
        .start(format_boundary(start, granularity))
        .end(format_boundary(end, granularity))
        .build()
        .map_err(|e| BackendError::Rejected(format!("invalid date interval: {e}")))
}

/// Hourly queries take full timestamps, wider granularities plain dates.
fn format_boundary(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hourly => format!("{date}T00:00:00Z"),
        _ => date.to_string(),
    }
}

fn to_ce_granularity(granularity: Granularity) -> CeGranularity {
    match granularity {
        Granularity::Daily => CeGranularity::Daily,
        Granularity::Monthly => CeGranularity::Monthly,
        Granularity::Hourly => CeGranularity::Hourly,
    }
}

/// The backend stamps daily/monthly periods as dates and hourly periods
/// as UTC timestamps; accept both.
fn parse_period_stamp(stamp: &str) -> Result<NaiveDateTime, BackendError> {
    if let Ok(date) = stamp.parse::<NaiveDate>() {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%SZ")
        .map_err(|_| BackendError::Rejected(format!("unparseable period boundary '{stamp}'")))
}

fn metric_amount(metric: &MetricValue) -> (f64, String) {
    (parse_amount(metric.amount()), metric.unit().unwrap_or("USD").to_string())
}

fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|a| a.parse().ok()).unwrap_or(0.0)
}

fn classify<E>(err: SdkError<E>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let throttled = matches!(
        err.as_service_error().and_then(ProvideErrorMetadata::code),
        Some("LimitExceededException") | Some("ThrottlingException")
    );
    let retryable = throttled
        || matches!(err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_));
    let message = format!("{}", DisplayErrorContext(&err));
    if retryable {
        BackendError::Transient(message)
    } else {
        BackendError::Rejected(message)
    }
}
