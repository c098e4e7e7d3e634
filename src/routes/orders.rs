use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::models::{
    CreateOrder, LineItem, Order, OrderStatus, UpdateOrder, UpdateOrderStatus,
};
use crate::state::AppState;

const SELECT_ORDER: &str = "SELECT o.id, o.customer_name, o.items, o.total, o.status, o.staff_id, s.name, o.created_at
     FROM orders o
     LEFT JOIN staff s ON o.staff_id = s.id";

struct OrderRow {
    id: i64,
    customer_name: Option<String>,
    items: String,
    total: f64,
    status: String,
    staff_id: i64,
    staff_name: Option<String>,
    created_at: String,
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        items: row.get(2)?,
        total: row.get(3)?,
        status: row.get(4)?,
        staff_id: row.get(5)?,
        staff_name: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn into_order(row: OrderRow) -> Result<Order, AppError> {
    let items: Vec<LineItem> = serde_json::from_str(&row.items)?;
    let status = OrderStatus::parse(&row.status).unwrap_or_else(|| {
        warn!(order_id = row.id, status = %row.status, "Unknown order status in store, treating as pending");
        OrderStatus::Pending
    });

    Ok(Order {
        id: row.id,
        customer_name: row.customer_name,
        items,
        total: row.total,
        status,
        staff_id: row.staff_id,
        staff_name: row.staff_name,
        created_at: row.created_at,
    })
}

pub(crate) fn fetch_all(conn: &Connection) -> Result<Vec<Order>, AppError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ORDER} ORDER BY o.created_at DESC"))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(into_order).collect()
}

fn fetch_one(conn: &Connection, id: i64) -> Result<Order, AppError> {
    let row = conn
        .query_row(&format!("{SELECT_ORDER} WHERE o.id = ?1"), [id], read_row)
        .map_err(|_| AppError::NotFound("Order".to_string()))?;

    into_order(row)
}

/// Validate line items against the menu and fix the order total at
/// today's prices. An embedded snapshot's price is the fallback for meals
/// no longer on the menu.
pub(crate) fn price_items(conn: &Connection, items: &[LineItem]) -> Result<f64, AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut total = 0.0;

    for item in items {
        if item.quantity < 1 {
            return Err(AppError::Validation(
                "Item quantity must be at least 1".to_string(),
            ));
        }

        let meal_id = item.meal_ref.meal_id();
        let meal: Option<(f64, bool, String)> = conn
            .query_row(
                "SELECT price, available, name FROM meals WHERE id = ?1",
                [meal_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .ok();

        let price = match meal {
            Some((_, false, name)) => {
                return Err(AppError::Validation(format!("{name} is not available")));
            }
            Some((price, true, _)) => price,
            None => match item.meal_ref.snapshot().and_then(|s| s.price) {
                Some(price) => price,
                None => return Err(AppError::NotFound("Meal".to_string())),
            },
        };

        total += price * item.quantity as f64;
    }

    Ok(total)
}

fn staff_exists(conn: &Connection, staff_id: i64) -> Result<(), AppError> {
    conn.query_row("SELECT id FROM staff WHERE id = ?1", [staff_id], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|_| AppError::NotFound("Staff member".to_string()))?;
    Ok(())
}

#[derive(Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            OrderStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown order status: {s}")))
        })
        .transpose()?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    let mut orders = fetch_all(&conn)?;
    if let Some(status) = status {
        orders.retain(|o| o.status == status);
    }

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(order): Json<CreateOrder>,
) -> Result<Json<Order>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    staff_exists(&conn, order.staff_id)?;
    let total = price_items(&conn, &order.items)?;
    let items = serde_json::to_string(&order.items)?;

    conn.execute(
        "INSERT INTO orders (customer_name, items, total, status, staff_id) VALUES (?1, ?2, ?3, 'pending', ?4)",
        rusqlite::params![order.customer_name, items, total, order.staff_id],
    )?;

    let id = conn.last_insert_rowid();
    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateOrder>,
) -> Result<Json<Order>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let existing = fetch_one(&conn, id)?;

    let staff_id = update.staff_id.unwrap_or(existing.staff_id);
    staff_exists(&conn, staff_id)?;

    let customer_name = match update.customer_name {
        Some(name) => name,
        None => existing.customer_name,
    };

    // Replacing the items re-prices the whole order
    let (items, total) = match update.items {
        Some(items) => {
            let total = price_items(&conn, &items)?;
            (items, total)
        }
        None => (existing.items, existing.total),
    };
    let items_json = serde_json::to_string(&items)?;

    conn.execute(
        "UPDATE orders SET customer_name = ?1, items = ?2, total = ?3, staff_id = ?4 WHERE id = ?5",
        rusqlite::params![customer_name, items_json, total, staff_id, id],
    )?;

    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateOrderStatus>,
) -> Result<Json<Order>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let existing = fetch_one(&conn, id)?;

    if !existing.status.can_transition_to(update.status) {
        return Err(AppError::Validation(format!(
            "Cannot change order status from {} to {}",
            existing.status.as_str(),
            update.status.as_str()
        )));
    }

    conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        rusqlite::params![update.status.as_str(), id],
    )?;

    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<(), AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let changed = conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::NotFound("Order".to_string()));
    }

    Ok(())
}
