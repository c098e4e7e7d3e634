use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;

use crate::error::AppError;
use crate::reports::{
    customer_report, peak_hours_report, sales_report, top_meals, CustomerReport, DateWindow,
    MealPopularity, PeakHoursReport, ReportError, SalesReport, TOP_MEALS_DEFAULT_LIMIT,
};
use crate::routes::{meals, orders};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMealsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

/// Resolve the requested window. Both bounds or neither; a missing window
/// falls back to the given default. The clock is read here so the engine
/// itself stays deterministic.
fn resolve_window(
    start_date: &Option<String>,
    end_date: &Option<String>,
    default: Option<DateWindow>,
) -> Result<Option<DateWindow>, AppError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) => Ok(Some(DateWindow::parse(start, end)?)),
        (None, None) => Ok(default),
        _ => Err(ReportError::InvalidWindow(
            "both startDate and endDate are required".to_string(),
        )
        .into()),
    }
}

fn today() -> DateWindow {
    DateWindow::single_day(Local::now().date_naive())
}

pub async fn get_sales_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SalesReport>, AppError> {
    let window = resolve_window(&query.start_date, &query.end_date, Some(today()))?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    let all_orders = orders::fetch_all(&conn)?;

    Ok(Json(sales_report(&all_orders, window.as_ref())))
}

pub async fn get_peak_hours_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<PeakHoursReport>, AppError> {
    let window = resolve_window(&query.start_date, &query.end_date, Some(today()))?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    let all_orders = orders::fetch_all(&conn)?;

    Ok(Json(peak_hours_report(&all_orders, window.as_ref())))
}

pub async fn get_customer_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CustomerReport>, AppError> {
    let window = resolve_window(&query.start_date, &query.end_date, None)?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    let all_orders = orders::fetch_all(&conn)?;
    let catalog = meals::fetch_all(&conn)?;

    Ok(Json(customer_report(&all_orders, &catalog, window.as_ref())))
}

pub async fn get_top_meals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopMealsQuery>,
) -> Result<Json<Vec<MealPopularity>>, AppError> {
    let window = resolve_window(&query.start_date, &query.end_date, None)?;
    let limit = query.limit.unwrap_or(TOP_MEALS_DEFAULT_LIMIT);

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    let all_orders = orders::fetch_all(&conn)?;
    let catalog = meals::fetch_all(&conn)?;

    Ok(Json(top_meals(&all_orders, &catalog, window.as_ref(), limit)))
}
