//! Restaurant management backend: menu, orders, staff and customer CRUD
//! over SQLite, plus a pure reporting engine (daily sales, peak hours,
//! customer segments, meal popularity) behind a small REST API.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, put},
    Router,
};
use tokio::{
    net::TcpListener,
    signal::{
        ctrl_c,
        unix::{signal, SignalKind},
    },
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod routes;
pub mod state;


use routes::{customers, meals, orders, reports as report_routes, staff};
use state::AppState;

async fn health() -> &'static str {
    "ok"
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/health", get(health))
        .route("/meals", get(meals::get_meals).post(meals::create_meal))
        .route(
            "/meals/{id}",
            put(meals::update_meal).delete(meals::delete_meal),
        )
        .route(
            "/orders",
            get(orders::get_orders).post(orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/orders/{id}/status", put(orders::update_order_status))
        .route("/staff", get(staff::get_staff).post(staff::create_staff))
        .route("/staff/{id}", delete(staff::delete_staff))
        .route("/customers", get(customers::get_customers))
        .route("/reports/sales", get(report_routes::get_sales_report))
        .route(
            "/reports/peak-hours",
            get(report_routes::get_peak_hours_report),
        )
        .route(
            "/reports/customers",
            get(report_routes::get_customer_report),
        )
        .route("/reports/top-meals", get(report_routes::get_top_meals))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind listener");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
