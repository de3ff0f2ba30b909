//! Billing endpoints: invoices, payments and insurance claims.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::billing::{self, ClaimDecision, NewInvoice, NewPayment, OverdueSweep, RevenueSummary};
use crate::db::Stored;
use crate::models::{InsuranceClaim, Invoice, Payment};

/// `POST /api/invoices`
pub async fn create_invoice(
    State(ctx): State<ApiContext>,
    ApiJson(new): ApiJson<NewInvoice>,
) -> Result<(StatusCode, Json<Stored<Invoice>>), ApiError> {
    let invoice = billing::create_invoice(ctx.store(), new, Utc::now().date_naive())?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub invoice: Stored<Invoice>,
    pub payment: Stored<Payment>,
}

/// `POST /api/invoices/:id/payments`
pub async fn record_payment(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payment): ApiJson<NewPayment>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let (invoice, payment) = billing::record_payment(ctx.store(), &id, payment, Utc::now())?;
    Ok((StatusCode::CREATED, Json(PaymentResponse { invoice, payment })))
}

/// `POST /api/invoices/mark-overdue`
pub async fn mark_overdue(State(ctx): State<ApiContext>) -> Result<Json<OverdueSweep>, ApiError> {
    Ok(Json(billing::mark_overdue_invoices(ctx.store(), Utc::now().date_naive())?))
}

/// `GET /api/billing/summary`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<RevenueSummary>, ApiError> {
    Ok(Json(billing::billing_summary(ctx.store(), Utc::now().date_naive())?))
}

/// `POST /api/claims/:id/submit`
pub async fn submit_claim(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Stored<InsuranceClaim>>, ApiError> {
    Ok(Json(billing::submit_claim(ctx.store(), &id, Utc::now())?))
}

/// `POST /api/claims/:id/decision`
pub async fn decide_claim(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(decision): ApiJson<ClaimDecision>,
) -> Result<Json<Stored<InsuranceClaim>>, ApiError> {
    Ok(Json(billing::decide_claim(ctx.store(), &id, decision)?))
}
