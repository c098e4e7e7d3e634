use std::sync::Arc;

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::reports::{customer_report, CustomerReport};
use crate::routes::{meals, orders};
use crate::state::AppState;

/// There is no customer entity; the customers page is derived from the
/// stored orders, keyed by the free-text customer name.
pub async fn get_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CustomerReport>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let all_orders = orders::fetch_all(&conn)?;
    let catalog = meals::fetch_all(&conn)?;

    Ok(Json(customer_report(&all_orders, &catalog, None)))
}
