use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::AppError;
use crate::invoicing::store::{self, InvoiceDetail, InvoiceNumbering};
use crate::models::invoice::{CreateInvoice, UpdateInvoice};
use crate::models::{Invoice, LedgerEntry};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreatedResponse {
    pub message: String,
    pub result: Invoice,
    pub transaction: LedgerEntry,
    pub linked_works: u64,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub message: String,
    pub result: Invoice,
    pub transaction: Option<LedgerEntry>,
}

/// Invoice creation endpoint handler.
///
/// Handles POST requests to `/api/invoices`. The invoice number is issued
/// by the server; works are linked before the response is sent.
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateInvoice>,
) -> Result<(StatusCode, Json<InvoiceCreatedResponse>), AppError> {
    let numbering = InvoiceNumbering::from(state.config.as_ref());
    let created = store::create_invoice(&state.db, &ctx, numbering, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceCreatedResponse {
            message: "Invoice information saved successfully".to_string(),
            result: created.invoice,
            transaction: created.transaction,
            linked_works: created.linked_works,
        }),
    ))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceDetail>, AppError> {
    let detail = store::get_invoice(&state.db, &ctx, id).await?;
    Ok(Json(detail))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoice>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let (result, transaction) = store::update_invoice(&state.db, &ctx, id, payload).await?;
    Ok(Json(InvoiceResponse {
        message: "Invoice information updated successfully".to_string(),
        result,
        transaction,
    }))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let result = store::delete_invoice(&state.db, &ctx, id).await?;
    Ok(Json(InvoiceResponse {
        message: "Invoice information deleted successfully".to_string(),
        result,
        transaction: None,
    }))
}
