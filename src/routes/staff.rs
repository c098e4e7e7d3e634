use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use rusqlite::Connection;

use crate::error::AppError;
use crate::models::{CreateStaff, Staff};
use crate::state::AppState;

/// Orders keep a staff reference, so a member with orders on record
/// cannot be deleted.
pub(crate) fn ensure_deletable(conn: &Connection, id: i64) -> Result<(), AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE staff_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Err(AppError::Validation(
            "Cannot delete staff member with existing orders".to_string(),
        ));
    }

    Ok(())
}

pub async fn get_staff(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Staff>>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let mut stmt = conn.prepare("SELECT id, name, role, created_at FROM staff ORDER BY name")?;
    let staff = stmt
        .query_map([], |row| {
            Ok(Staff {
                id: row.get(0)?,
                name: row.get(1)?,
                role: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(staff))
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    Json(staff): Json<CreateStaff>,
) -> Result<Json<Staff>, AppError> {
    if staff.name.trim().is_empty() {
        return Err(AppError::Validation("Staff name is required".to_string()));
    }

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    conn.execute(
        "INSERT INTO staff (name, role) VALUES (?1, ?2)",
        rusqlite::params![staff.name, staff.role],
    )?;

    let id = conn.last_insert_rowid();

    let staff = conn.query_row(
        "SELECT id, name, role, created_at FROM staff WHERE id = ?1",
        [id],
        |row| {
            Ok(Staff {
                id: row.get(0)?,
                name: row.get(1)?,
                role: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )?;

    Ok(Json(staff))
}

pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<(), AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    ensure_deletable(&conn, id)?;

    let changed = conn.execute("DELETE FROM staff WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::NotFound("Staff member".to_string()));
    }

    Ok(())
}
