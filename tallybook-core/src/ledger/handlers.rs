use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::ledger::entries::{self, LedgerFilter};
use crate::ledger::linked::{self, LedgerLinked, Linked, LinkedPayload};
use crate::models::{LedgerEntry, Page};
use crate::AppState;

/// Body returned by the create, read and update endpoints of ledger-linked records.
#[derive(Debug, Serialize)]
pub struct LinkedResponse<R> {
    pub message: String,
    pub result: R,
    pub transaction: LedgerEntry,
}

impl<R: LedgerLinked> LinkedResponse<R> {
    fn new(message: String, linked: Linked<R>) -> Self {
        Self {
            message,
            result: linked.result,
            transaction: linked.transaction,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse<R> {
    pub message: String,
    pub result: R,
}

/// `POST /api/<kind>`
pub async fn create<R: LedgerLinked>(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<LinkedPayload<R::Fields>>,
) -> Result<(StatusCode, Json<LinkedResponse<R>>), AppError> {
    let linked = linked::create_linked::<R>(&state.db, &ctx, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(LinkedResponse::new(format!("{} saved successfully", R::LABEL), linked)),
    ))
}

/// `GET /api/<kind>/:id`
pub async fn get<R: LedgerLinked>(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LinkedResponse<R>>, AppError> {
    let linked = linked::get_linked::<R>(&state.db, &ctx, id).await?;
    Ok(Json(LinkedResponse::new(
        format!("{} fetched successfully", R::LABEL),
        linked,
    )))
}

/// `PUT /api/<kind>/:id`
pub async fn update<R: LedgerLinked>(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkedPayload<R::Fields>>,
) -> Result<Json<LinkedResponse<R>>, AppError> {
    let linked = linked::update_linked::<R>(&state.db, &ctx, id, payload).await?;
    Ok(Json(LinkedResponse::new(
        format!("{} updated successfully", R::LABEL),
        linked,
    )))
}

/// `DELETE /api/<kind>/:id`
pub async fn delete<R: LedgerLinked>(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse<R>>, AppError> {
    let result = linked::delete_linked::<R>(&state.db, &ctx, id).await?;
    Ok(Json(DeletedResponse {
        message: format!("{} deleted successfully", R::LABEL),
        result,
    }))
}

/// Transaction listing endpoint handler.
///
/// Handles GET requests to `/api/transactions` with optional source,
/// category, status, employee and date filters.
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<LedgerFilter>,
) -> Result<Json<Page<LedgerEntry>>, AppError> {
    info!(business_id = %ctx.business_id, "Listing ledger entries");
    let page = entries::list_entries(&state.db, ctx.business_id, &filter).await?;
    Ok(Json(page))
}

/// `GET /api/transactions/:id`
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerEntry>, AppError> {
    entries::get_entry(&state.db, ctx.business_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("ledger entry {}", id)))
}
