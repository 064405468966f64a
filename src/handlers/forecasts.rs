use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::engine;
use crate::engine::validate;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{ForecastParams, ForecastResponse};

pub async fn forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<ForecastResponse>, AppError> {
    let days = validate::validate_days(params.days.unwrap_or(30), &state.limits)?;
    let today = Utc::now().date_naive();
    let response = engine::forecast(days, today, state.backend.as_ref(), &state.limits).await?;
    Ok(Json(response))
}
