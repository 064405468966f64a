//! Summary statistics over an aggregated series.

use std::collections::BTreeMap;

use crate::errors::QueryError;
use crate::models::{CostSeries, RequestSpec, ServiceCost};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostMetrics {
    pub total_cost: f64,
    pub average_daily_cost: f64,
}

/// Total across all periods and groups. The average divides by the
/// calendar days spanned by the request, not by the period count; the
/// two differ whenever granularity is not DAILY.
pub fn summarize(spec: &RequestSpec, series: &CostSeries) -> Result<CostMetrics, QueryError> {
    let total_cost: f64 = series.periods.iter().map(|p| p.cost).sum();
    let days = spec.span_days();
    if days <= 0 {
        // Unreachable past validation; refusing beats a silent divide.
        return Err(QueryError::AggregationInconsistency(
            "request spans zero days past validation".into(),
        ));
    }
    Ok(CostMetrics { total_cost, average_daily_cost: total_cost / days as f64 })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRanking {
    pub top: Vec<ServiceCost>,
    pub total_services: usize,
}

/// Rank groups by summed cost, descending, ties broken by name
/// ascending. `total_services` counts distinct services before the
/// truncation to `limit`.
pub fn rank_services(series: &CostSeries, limit: usize) -> ServiceRanking {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for period in &series.periods {
        let Some(name) = period.group_key.as_deref() else {
            continue;
        };
        *totals.entry(name).or_insert(0.0) += period.cost;
    }
    let total_services = totals.len();
    let mut ranked: Vec<ServiceCost> = totals
        .into_iter()
        .map(|(service, cost)| ServiceCost { service: service.to_string(), cost })
        .collect();
    ranked.sort_by(|a, b| b.cost.total_cmp(&a.cost).then_with(|| a.service.cmp(&b.service)));
    ranked.truncate(limit);
    ServiceRanking { top: ranked, total_services }
}

/// Money values leave the API rounded to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::daily_entry;
    use crate::engine::aggregate::aggregate;
    use crate::models::{Granularity, GroupDimension};

    fn spec(start: &str, end: &str, granularity: Granularity, grouped: bool) -> RequestSpec {
        RequestSpec {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            granularity,
            group_by: grouped.then_some(GroupDimension::Service),
        }
    }

    #[test]
    fn test_average_uses_calendar_days_not_periods() {
        // Two monthly periods over 60 calendar days (leap February).
        let spec = spec("2024-01-01", "2024-03-01", Granularity::Monthly, false);
        let mut series = aggregate(&spec, Vec::new()).unwrap();
        series.periods[0].cost = 310.0;
        series.periods[1].cost = 290.0;
        let metrics = summarize(&spec, &series).unwrap();
        assert_eq!(metrics.total_cost, 600.0);
        assert_eq!(metrics.average_daily_cost, 10.0);
    }

    #[test]
    fn test_empty_series_totals_zero() {
        let spec = spec("2024-07-01", "2024-07-03", Granularity::Daily, false);
        let series = aggregate(&spec, Vec::new()).unwrap();
        let metrics = summarize(&spec, &series).unwrap();
        assert_eq!(metrics.total_cost, 0.0);
        assert_eq!(metrics.average_daily_cost, 0.0);
    }

    #[test]
    fn test_ranking_sorted_and_truncated() {
        let spec = spec("2024-07-01", "2024-07-02", Granularity::Daily, true);
        let series = aggregate(
            &spec,
            vec![
                daily_entry("2024-07-01", Some("A"), 10.0, "USD"),
                daily_entry("2024-07-01", Some("B"), 5.0, "USD"),
                daily_entry("2024-07-01", Some("C"), 20.0, "USD"),
            ],
        )
        .unwrap();
        let ranking = rank_services(&series, 2);
        assert_eq!(ranking.total_services, 3);
        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.top[0].service, "C");
        assert_eq!(ranking.top[0].cost, 20.0);
        assert_eq!(ranking.top[1].service, "A");
    }

    #[test]
    fn test_ranking_ties_break_by_name() {
        let spec = spec("2024-07-01", "2024-07-02", Granularity::Daily, true);
        let series = aggregate(
            &spec,
            vec![
                daily_entry("2024-07-01", Some("S3"), 5.0, "USD"),
                daily_entry("2024-07-01", Some("EC2"), 5.0, "USD"),
            ],
        )
        .unwrap();
        let ranking = rank_services(&series, 10);
        assert_eq!(ranking.top[0].service, "EC2");
        assert_eq!(ranking.top[1].service, "S3");
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(3.7549), 3.75);
        assert_eq!(round_cents(3.756), 3.76);
    }
}
