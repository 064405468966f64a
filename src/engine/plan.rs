//! Backend query planning: date-range chunking, pagination, retries.

use std::time::Duration;

use chrono::{Months, NaiveDate};
use futures::future::try_join_all;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::backend::{BackendEntry, BackendError, CostBackend};
use crate::config::QueryLimits;
use crate::errors::QueryError;
use crate::models::{Granularity, GroupDimension, RequestSpec};

/// One bounded backend call range; pagination happens within a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryChunk {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub chunks: Vec<QueryChunk>,
    pub granularity: Granularity,
    pub group_by: Option<GroupDimension>,
}

/// Gate on backend capability, then split the requested span into
/// contiguous non-overlapping chunks covering it exactly once.
pub fn plan(
    spec: &RequestSpec,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<QueryPlan, QueryError> {
    if !backend.supports(spec.granularity, spec.group_by) {
        let dimension = spec
            .group_by
            .map(|d| d.to_string())
            .unwrap_or_else(|| "NONE".into());
        return Err(QueryError::BackendRejected(format!(
            "backend does not support grouping by {dimension} at {} granularity",
            spec.granularity
        )));
    }
    Ok(QueryPlan {
        chunks: chunk_range(spec, limits.max_days_per_query),
        granularity: spec.granularity,
        group_by: spec.group_by,
    })
}

fn chunk_range(spec: &RequestSpec, max_days: i64) -> Vec<QueryChunk> {
    match spec.granularity {
        Granularity::Monthly => chunk_months(spec.start, spec.end, max_days),
        _ => chunk_days(spec.start, spec.end, max_days),
    }
}

fn chunk_days(start: NaiveDate, end: NaiveDate, max_days: i64) -> Vec<QueryChunk> {
    let mut chunks = Vec::new();
    let mut cur = start;
    while cur < end {
        let next = (cur + chrono::Duration::days(max_days)).min(end);
        chunks.push(QueryChunk { start: cur, end: next });
        cur = next;
    }
    chunks
}

/// Chunk boundaries snap to month starts so no month straddles two calls.
/// A chunk always contains at least one whole month, even when a single
/// month exceeds `max_days`.
fn chunk_months(start: NaiveDate, end: NaiveDate, max_days: i64) -> Vec<QueryChunk> {
    let mut chunks = Vec::new();
    let mut cur = start;
    while cur < end {
        let mut next = (cur + Months::new(1)).min(end);
        while next < end {
            let candidate = next + Months::new(1);
            if candidate > end || (candidate - cur).num_days() > max_days {
                break;
            }
            next = candidate;
        }
        chunks.push(QueryChunk { start: cur, end: next });
        cur = next;
    }
    chunks
}

/// Fetch every chunk of the plan. Chunks fan out concurrently; pagination
/// within one chunk is sequential because each token depends on the prior
/// page. Arrival order is irrelevant to the aggregator, which keys
/// entries by period and group.
pub async fn execute(
    plan: &QueryPlan,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<Vec<BackendEntry>, QueryError> {
    let pages = try_join_all(
        plan.chunks
            .iter()
            .map(|chunk| fetch_chunk(*chunk, plan, backend, limits)),
    )
    .await?;
    Ok(pages.into_iter().flatten().collect())
}

async fn fetch_chunk(
    chunk: QueryChunk,
    plan: &QueryPlan,
    backend: &dyn CostBackend,
    limits: &QueryLimits,
) -> Result<Vec<BackendEntry>, QueryError> {
    let mut entries = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = call_with_retries(limits, || {
            backend.query_cost_and_usage(
                chunk.start,
                chunk.end,
                plan.granularity,
                plan.group_by,
                token.clone(),
            )
        })
        .await?;
        entries.extend(page.entries);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(entries)
}

/// Per-call timeout plus bounded retry with exponential backoff.
/// Only transient failures are retried; rejections pass straight through.
pub(crate) async fn call_with_retries<T, F, Fut>(
    limits: &QueryLimits,
    op: F,
) -> Result<T, QueryError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, BackendError>>,
{
    let per_call = Duration::from_secs(limits.backend_timeout_secs);
    let mut attempt = 0u32;
    loop {
        let failure = match timeout(per_call, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(BackendError::Rejected(msg))) => return Err(QueryError::BackendRejected(msg)),
            Ok(Err(BackendError::Transient(msg))) => msg,
            Err(_) => format!("backend call timed out after {}s", limits.backend_timeout_secs),
        };
        if attempt >= limits.max_retries {
            return Err(QueryError::BackendTransient(failure));
        }
        let delay =
            Duration::from_millis(limits.retry_base_delay_ms.saturating_mul(1 << attempt.min(10)));
        warn!(attempt, ?delay, "Transient backend failure, retrying: {failure}");
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{daily_entry, page, ScriptedBackend};
    use chrono::Datelike;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn spec(start: &str, end: &str, granularity: Granularity) -> RequestSpec {
        RequestSpec {
            start: date(start),
            end: date(end),
            granularity,
            group_by: None,
        }
    }

    fn fast_limits() -> QueryLimits {
        QueryLimits { retry_base_delay_ms: 1, ..QueryLimits::default() }
    }

    fn assert_covers(chunks: &[QueryChunk], start: NaiveDate, end: NaiveDate, max_days: i64) {
        assert_eq!(chunks.first().unwrap().start, start);
        assert_eq!(chunks.last().unwrap().end, end);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for chunk in chunks {
            assert!(chunk.start < chunk.end);
            assert!((chunk.end - chunk.start).num_days() <= max_days);
        }
    }

    #[test]
    fn test_daily_chunking_covers_span() {
        let spec = spec("2024-01-01", "2024-12-31", Granularity::Daily);
        let chunks = chunk_range(&spec, 92);
        assert_eq!(chunks.len(), 4);
        assert_covers(&chunks, spec.start, spec.end, 92);
    }

    #[test]
    fn test_short_span_single_chunk() {
        let spec = spec("2024-07-01", "2024-07-03", Granularity::Daily);
        let chunks = chunk_range(&spec, 92);
        assert_eq!(chunks, vec![QueryChunk { start: spec.start, end: spec.end }]);
    }

    #[test]
    fn test_monthly_chunks_snap_to_month_starts() {
        let spec = spec("2024-01-01", "2025-01-01", Granularity::Monthly);
        let chunks = chunk_range(&spec, 92);
        assert_eq!(chunks.len(), 4);
        assert_covers(&chunks, spec.start, spec.end, 92);
        for chunk in &chunks {
            assert_eq!(chunk.start.day(), 1);
            assert_eq!(chunk.end.day(), 1);
        }
    }

    #[test]
    fn test_monthly_chunk_keeps_whole_month_over_budget() {
        // A single month is longer than the per-call budget; the chunk
        // must still contain the whole month rather than split it.
        let spec = spec("2024-01-01", "2024-03-01", Granularity::Monthly);
        let chunks = chunk_range(&spec, 20);
        assert_eq!(chunks.len(), 2);
        assert_covers(&chunks, spec.start, spec.end, 31);
    }

    #[tokio::test]
    async fn test_capability_mismatch_fails_before_any_call() {
        let backend = ScriptedBackend::new()
            .without_support(Granularity::Hourly, Some(GroupDimension::Service));
        let spec = RequestSpec {
            start: date("2024-07-01"),
            end: date("2024-07-02"),
            granularity: Granularity::Hourly,
            group_by: Some(GroupDimension::Service),
        };
        let err = plan(&spec, &backend, &fast_limits()).unwrap_err();
        assert!(matches!(err, QueryError::BackendRejected(_)));
        assert_eq!(*backend.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination_drains_all_pages() {
        let start = date("2024-07-01");
        let backend = ScriptedBackend::new()
            .with_page(
                start,
                None,
                page(vec![daily_entry("2024-07-01", None, 1.0, "USD")], Some("t1")),
            )
            .with_page(
                start,
                Some("t1"),
                page(vec![daily_entry("2024-07-02", None, 2.0, "USD")], None),
            );
        let spec = spec("2024-07-01", "2024-07-03", Granularity::Daily);
        let plan = plan(&spec, &backend, &fast_limits()).unwrap();
        let entries = execute(&plan, &backend, &fast_limits()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(*backend.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transient_failures_retried_then_succeed() {
        let start = date("2024-07-01");
        let backend = ScriptedBackend::new()
            .with_page(start, None, page(vec![daily_entry("2024-07-01", None, 1.0, "USD")], None))
            .failing_first(2);
        let spec = spec("2024-07-01", "2024-07-02", Granularity::Daily);
        let plan = plan(&spec, &backend, &fast_limits()).unwrap();
        let entries = execute(&plan, &backend, &fast_limits()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(*backend.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_surface_transient() {
        let backend = ScriptedBackend::new().failing_first(10);
        let spec = spec("2024-07-01", "2024-07-02", Granularity::Daily);
        let limits = QueryLimits { max_retries: 2, retry_base_delay_ms: 1, ..QueryLimits::default() };
        let plan = plan(&spec, &backend, &limits).unwrap();
        let err = execute(&plan, &backend, &limits).await.unwrap_err();
        assert!(matches!(err, QueryError::BackendTransient(_)));
        assert_eq!(*backend.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rejection_not_retried() {
        let backend = ScriptedBackend::new().rejecting("bad dimension");
        let spec = spec("2024-07-01", "2024-07-02", Granularity::Daily);
        let plan = plan(&spec, &backend, &fast_limits()).unwrap();
        let err = execute(&plan, &backend, &fast_limits()).await.unwrap_err();
        assert!(matches!(err, QueryError::BackendRejected(msg) if msg == "bad dimension"));
        assert_eq!(*backend.calls.lock().unwrap(), 1);
    }
}
