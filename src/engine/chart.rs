//! Projection of an aggregated series into a chart-agnostic payload.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::{ChartDataset, ChartPayload, CostSeries, Granularity};

const UNGROUPED_LABEL: &str = "Cost";

/// One label per period (canonical start string, strictly increasing),
/// one dataset per group in order of first appearance. Every dataset is
/// positionally aligned to the labels; a group missing a period keeps an
/// explicit zero at that position.
pub fn project(granularity: Granularity, series: &CostSeries) -> ChartPayload {
    let mut labels: Vec<String> = Vec::new();
    let mut label_index: HashMap<NaiveDateTime, usize> = HashMap::new();
    for period in &series.periods {
        if !label_index.contains_key(&period.period_start) {
            label_index.insert(period.period_start, labels.len());
            labels.push(granularity.label(period.period_start));
        }
    }

    let mut datasets: Vec<ChartDataset> = Vec::new();
    let mut dataset_index: HashMap<Option<&str>, usize> = HashMap::new();
    for period in &series.periods {
        let key = period.group_key.as_deref();
        let index = match dataset_index.get(&key) {
            Some(index) => *index,
            None => {
                datasets.push(ChartDataset {
                    label: key.unwrap_or(UNGROUPED_LABEL).to_string(),
                    data: vec![0.0; labels.len()],
                });
                dataset_index.insert(key, datasets.len() - 1);
                datasets.len() - 1
            }
        };
        datasets[index].data[label_index[&period.period_start]] += period.cost;
    }

    ChartPayload { labels, datasets }
}
