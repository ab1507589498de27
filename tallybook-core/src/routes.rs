use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::jwt_middleware;
use crate::invoicing::handlers as invoices;
use crate::ledger::handlers as ledger;
use crate::ledger::LedgerLinked;
use crate::models::{Borrowing, Expenditure, FuelLog, Revenue, Salary};
use crate::payroll::handlers as payroll;
use crate::AppState;

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tallybook-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Database health check endpoint.
///
/// Verifies that the database connection is working by executing
/// a simple query.
async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// `POST /`, `GET /:id`, `PUT /:id` and `DELETE /:id` for one ledger-linked kind.
fn linked_routes<R: LedgerLinked>() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(ledger::create::<R>))
        .route(
            "/:id",
            get(ledger::get::<R>)
                .put(ledger::update::<R>)
                .delete(ledger::delete::<R>),
        )
}

/// Everything under `/api`; each route expects a [`crate::auth::RequestContext`].
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(ledger::list_transactions))
        .route("/transactions/:id", get(ledger::get_transaction))
        .nest("/borrowings", linked_routes::<Borrowing>())
        .nest("/expenditures", linked_routes::<Expenditure>())
        .nest("/fuel", linked_routes::<FuelLog>())
        .nest("/revenues", linked_routes::<Revenue>())
        .route(
            "/salaries/calculate/:employee_id",
            get(payroll::calculate_salary),
        )
        .nest("/salaries", linked_routes::<Salary>())
        .route("/invoices", axum::routing::post(invoices::create_invoice))
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/attendance", axum::routing::post(payroll::mark_attendance))
        .route(
            "/attendance/:id",
            axum::routing::delete(payroll::delete_attendance),
        )
        .route(
            "/employees/:employee_id/attendance",
            get(payroll::list_attendance),
        )
}

/// Creates the main application router.
///
/// Public health routes plus the `/api` tree behind the JWT gate, with
/// permissive CORS and request tracing on everything.
pub fn create_router(state: AppState) -> Router {
    let api = api_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        jwt_middleware,
    ));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
