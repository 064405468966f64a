use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::engine;
use crate::engine::validate;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{CostQueryRequest, CostResponse, ServicesParams, TopServicesResponse};

pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<CostQueryRequest>,
) -> Result<Json<CostResponse>, AppError> {
    let today = Utc::now().date_naive();
    let spec = validate::validate(&body, &state.limits, today)?;
    let response = engine::analyze(&spec, state.backend.as_ref(), &state.limits).await?;
    Ok(Json(response))
}

pub async fn top_services(
    State(state): State<AppState>,
    Query(params): Query<ServicesParams>,
) -> Result<Json<TopServicesResponse>, AppError> {
    let days = validate::validate_days(params.days.unwrap_or(30), &state.limits)?;
    let limit = validate::validate_limit(params.limit.unwrap_or(10))?;
    let today = Utc::now().date_naive();
    let response =
        engine::top_services(days, limit, today, state.backend.as_ref(), &state.limits).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{daily_entry, page, ScriptedBackend};
    use crate::config::QueryLimits;
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn state(backend: ScriptedBackend) -> AppState {
        AppState {
            backend: Arc::new(backend),
            limits: QueryLimits { retry_base_delay_ms: 1, ..QueryLimits::default() },
        }
    }

    fn body(start: &str, end: &str) -> CostQueryRequest {
        CostQueryRequest {
            start_date: start.into(),
            end_date: end.into(),
            granularity: None,
            group_by: None,
        }
    }

    #[tokio::test]
    async fn test_analyze_returns_aggregated_response() {
        let backend = ScriptedBackend::new().with_page(
            "2024-07-01".parse().unwrap(),
            None,
            page(
                vec![
                    daily_entry("2024-07-01", None, 1.50, "USD"),
                    daily_entry("2024-07-02", None, 2.25, "USD"),
                ],
                None,
            ),
        );
        let Json(response) = analyze(State(state(backend)), Json(body("2024-07-01", "2024-07-03")))
            .await
            .unwrap();
        assert_eq!(response.total_cost, 3.75);
        assert_eq!(response.data.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_maps_invalid_request_to_400() {
        let err = analyze(
            State(state(ScriptedBackend::new())),
            Json(body("2024-07-03", "2024-07-01")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_top_services_rejects_zero_days() {
        let err = top_services(
            State(state(ScriptedBackend::new())),
            Query(ServicesParams { days: Some(0), limit: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
