//! Request validation: raw query input in, canonical [`RequestSpec`] out.

use chrono::{Datelike, Duration, NaiveDate};

use crate::config::QueryLimits;
use crate::errors::QueryError;
use crate::models::{CostQueryRequest, Granularity, GroupDimension, RequestSpec};

const MAX_SERVICE_LIMIT: u32 = 365;

/// Validate and canonicalize a raw cost query. `today` anchors the hourly
/// lookback window so callers (and tests) control the clock.
pub fn validate(
    raw: &CostQueryRequest,
    limits: &QueryLimits,
    today: NaiveDate,
) -> Result<RequestSpec, QueryError> {
    let start = parse_date(&raw.start_date, "start_date")?;
    let end = parse_date(&raw.end_date, "end_date")?;

    if start >= end {
        return Err(QueryError::InvalidRequest(
            "start_date must be strictly before end_date".into(),
        ));
    }
    let span = (end - start).num_days();
    if span > limits.max_span_days {
        return Err(QueryError::InvalidRequest(format!(
            "date range spans {span} days, maximum is {}",
            limits.max_span_days
        )));
    }

    let granularity = match raw.granularity.as_deref() {
        None | Some("") => Granularity::Daily,
        Some(token) => token.parse().map_err(|_| {
            QueryError::InvalidRequest(format!(
                "unknown granularity '{token}', expected DAILY, MONTHLY or HOURLY"
            ))
        })?,
    };
    let group_by = match raw.group_by.as_deref() {
        None | Some("") => None,
        Some(token) => Some(token.parse::<GroupDimension>().map_err(|_| {
            QueryError::InvalidRequest(format!(
                "unknown group_by '{token}', expected SERVICE, REGION or USAGE_TYPE"
            ))
        })?),
    };

    match granularity {
        Granularity::Monthly => {
            if start.day() != 1 || end.day() != 1 {
                return Err(QueryError::InvalidRequest(
                    "MONTHLY queries must start and end on the first day of a month".into(),
                ));
            }
        }
        Granularity::Hourly => {
            let window_start = today - Duration::days(limits.hourly_lookback_days);
            if start < window_start || end > today + Duration::days(1) {
                return Err(QueryError::InvalidRequest(format!(
                    "HOURLY granularity is only available for the trailing {} days",
                    limits.hourly_lookback_days
                )));
            }
        }
        Granularity::Daily => {}
    }

    Ok(RequestSpec { start, end, granularity, group_by })
}

/// Lookback window for the services and forecast views.
pub fn validate_days(days: u32, limits: &QueryLimits) -> Result<u32, QueryError> {
    if days == 0 || days > limits.max_lookback_days {
        return Err(QueryError::InvalidRequest(format!(
            "days must be between 1 and {}",
            limits.max_lookback_days
        )));
    }
    Ok(days)
}

pub fn validate_limit(limit: u32) -> Result<usize, QueryError> {
    if limit == 0 || limit > MAX_SERVICE_LIMIT {
        return Err(QueryError::InvalidRequest(format!(
            "limit must be between 1 and {MAX_SERVICE_LIMIT}"
        )));
    }
    Ok(limit as usize)
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, QueryError> {
    raw.parse().map_err(|_| {
        QueryError::InvalidRequest(format!("{field} '{raw}' is not a valid date (YYYY-MM-DD)"))
    })
}
