use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use rusqlite::Connection;

use crate::error::AppError;
use crate::models::{CreateMeal, Meal, UpdateMeal};
use crate::state::AppState;

pub(crate) fn fetch_all(conn: &Connection) -> Result<Vec<Meal>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, price, available, created_at
         FROM meals
         ORDER BY name",
    )?;

    let meals = stmt
        .query_map([], |row| {
            Ok(Meal {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                available: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(meals)
}

fn fetch_one(conn: &Connection, id: i64) -> Result<Meal, AppError> {
    conn.query_row(
        "SELECT id, name, category, price, available, created_at
         FROM meals
         WHERE id = ?1",
        [id],
        |row| {
            Ok(Meal {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                available: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .map_err(|_| AppError::NotFound("Meal".to_string()))
}

fn validate(name: &str, price: f64) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Meal name is required".to_string()));
    }
    if price < 0.0 {
        return Err(AppError::Validation(
            "Meal price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_meals(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Meal>>, AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;
    Ok(Json(fetch_all(&conn)?))
}

pub async fn create_meal(
    State(state): State<Arc<AppState>>,
    Json(meal): Json<CreateMeal>,
) -> Result<Json<Meal>, AppError> {
    validate(&meal.name, meal.price)?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    conn.execute(
        "INSERT INTO meals (name, category, price, available) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            meal.name,
            meal.category,
            meal.price,
            meal.available.unwrap_or(true)
        ],
    )?;

    let id = conn.last_insert_rowid();
    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn update_meal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(meal): Json<UpdateMeal>,
) -> Result<Json<Meal>, AppError> {
    validate(&meal.name, meal.price)?;

    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let changed = conn.execute(
        "UPDATE meals SET name = ?1, category = ?2, price = ?3, available = ?4 WHERE id = ?5",
        rusqlite::params![meal.name, meal.category, meal.price, meal.available, id],
    )?;

    if changed == 0 {
        return Err(AppError::NotFound("Meal".to_string()));
    }

    Ok(Json(fetch_one(&conn, id)?))
}

pub async fn delete_meal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<(), AppError> {
    let conn = state.db.conn.lock().map_err(|_| AppError::lock())?;

    let changed = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::NotFound("Meal".to_string()));
    }

    Ok(())
}
