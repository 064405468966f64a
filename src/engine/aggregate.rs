//! Merge raw backend pages into an ordered, gap-free cost series.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::backend::BackendEntry;
use crate::errors::QueryError;
use crate::models::{CostPeriod, CostSeries, RequestSpec};

const FALLBACK_CURRENCY: &str = "USD";

/// Pure fold over backend entries, in whatever order pages arrived.
/// Correctness relies only on `(period_start, group_key)` identity:
/// duplicates and mixed currencies fail the whole request, and missing
/// periods are filled with explicit zero-cost entries so consumers can
/// assume a complete sequence.
pub fn aggregate(spec: &RequestSpec, entries: Vec<BackendEntry>) -> Result<CostSeries, QueryError> {
    let expected = spec.granularity.periods(spec.start, spec.end);
    let expected_starts: BTreeSet<NaiveDateTime> = expected.iter().map(|(s, _)| *s).collect();

    let mut currency: Option<String> = None;
    let mut buckets: BTreeMap<(NaiveDateTime, Option<String>), CostPeriod> = BTreeMap::new();

    for entry in entries {
        if entry.period_start >= entry.period_end {
            return Err(QueryError::AggregationInconsistency(format!(
                "non-monotonic period [{} .. {}]",
                entry.period_start, entry.period_end
            )));
        }
        if !expected_starts.contains(&entry.period_start) {
            return Err(QueryError::AggregationInconsistency(format!(
                "backend returned period {} outside the requested range",
                entry.period_start
            )));
        }
        match &currency {
            None => currency = Some(entry.currency.clone()),
            Some(seen) if *seen != entry.currency => {
                return Err(QueryError::AggregationInconsistency(format!(
                    "mixed currencies in response: {seen} and {}",
                    entry.currency
                )));
            }
            _ => {}
        }

        let key = (entry.period_start, entry.group_key.clone());
        if buckets.contains_key(&key) {
            return Err(QueryError::AggregationInconsistency(format!(
                "duplicate entry for period {} group '{}'",
                entry.period_start,
                entry.group_key.as_deref().unwrap_or("-")
            )));
        }
        buckets.insert(
            key,
            CostPeriod {
                period_start: entry.period_start,
                period_end: entry.period_end,
                cost: entry.amount,
                currency: entry.currency,
                group_key: entry.group_key,
            },
        );
    }

    let currency = currency.unwrap_or_else(|| FALLBACK_CURRENCY.to_string());

    // Every (period x group) cell must exist. An ungrouped query (or a
    // grouped one that matched nothing) fills a single ungrouped series.
    let mut group_keys: BTreeSet<Option<String>> =
        buckets.keys().map(|(_, group)| group.clone()).collect();
    if group_keys.is_empty() {
        group_keys.insert(None);
    }
    for &(start, end) in &expected {
        for key in &group_keys {
            buckets.entry((start, key.clone())).or_insert_with(|| CostPeriod {
                period_start: start,
                period_end: end,
                cost: 0.0,
                currency: currency.clone(),
                group_key: key.clone(),
            });
        }
    }

    Ok(CostSeries { periods: buckets.into_values().collect(), currency })
}
