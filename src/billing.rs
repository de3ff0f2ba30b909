//! Invoicing, payments and insurance claims.
//!
//! Money is carried as `f64` dollars and rounded to cents wherever a total
//! is derived. A balance within half a cent of zero counts as settled.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{to_fields, DatabaseError, DocumentStore, Stored, WriteOp, WriteResult};
use crate::models::enums::{ClaimStatus, Collection, InvoiceStatus, PaymentMethod};
use crate::models::{InsuranceClaim, Invoice, LineItem, Payment};

const SETTLED_EPSILON: f64 = 0.005;
const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;
/// Attempts at minting a fresh invoice number before giving up.
const INVOICE_NUMBER_ATTEMPTS: usize = 3;

// ═══════════════════════════════════════════
// Totals
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `subtotal = Σ qty × unitPrice`, `tax = (subtotal − discount) × taxRate`,
/// `total = subtotal − discount + tax`.
pub fn compute_totals(items: &[LineItem], tax_rate: f64, discount: f64) -> InvoiceTotals {
    let subtotal: f64 = items
        .iter()
        .map(|i| f64::from(i.quantity) * i.unit_price)
        .sum();
    let taxable = subtotal - discount;
    let tax = taxable * tax_rate;
    InvoiceTotals {
        subtotal: round_cents(subtotal),
        tax: round_cents(tax),
        total: round_cents(taxable + tax),
    }
}

pub fn balance_due(invoice: &Invoice) -> f64 {
    round_cents(invoice.total - invoice.amount_paid)
}

/// `INV-YYYYMMDD-XXXX`, numbering from 0001 each day.
pub fn next_invoice_number<'a>(existing: impl IntoIterator<Item = &'a str>, issue_date: NaiveDate) -> String {
    let prefix = format!("INV-{}-", issue_date.format("%Y%m%d"));
    let last = existing
        .into_iter()
        .filter_map(|n| n.strip_prefix(&prefix))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:04}", last + 1)
}

pub fn is_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
    matches!(
        invoice.status,
        InvoiceStatus::Pending | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
    ) && invoice.due_date < today
        && balance_due(invoice) > SETTLED_EPSILON
}

/// Sum of unpaid balances on invoices that are billable.
pub fn outstanding_balance<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> f64 {
    round_cents(
        invoices
            .into_iter()
            .filter(|i| !matches!(i.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled))
            .map(|i| balance_due(i).max(0.0))
            .sum(),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub invoiced: f64,
    pub collected: f64,
    pub outstanding: f64,
    pub invoice_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub overdue_amount: f64,
    pub collected_by_method: BTreeMap<&'static str, f64>,
}

pub fn revenue_summary<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
    payments: impl IntoIterator<Item = &'a Payment>,
    today: NaiveDate,
) -> RevenueSummary {
    let mut summary = RevenueSummary::default();
    for invoice in invoices {
        if matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
            continue;
        }
        summary.invoice_count += 1;
        summary.invoiced += invoice.total;
        summary.outstanding += balance_due(invoice).max(0.0);
        if invoice.status == InvoiceStatus::Paid {
            summary.paid_count += 1;
        }
        if is_overdue(invoice, today) {
            summary.overdue_count += 1;
            summary.overdue_amount += balance_due(invoice);
        }
    }
    for payment in payments {
        summary.collected += payment.amount;
        *summary
            .collected_by_method
            .entry(payment.method.as_str())
            .or_default() += payment.amount;
    }
    summary.invoiced = round_cents(summary.invoiced);
    summary.collected = round_cents(summary.collected);
    summary.outstanding = round_cents(summary.outstanding);
    summary.overdue_amount = round_cents(summary.overdue_amount);
    for amount in summary.collected_by_method.values_mut() {
        *amount = round_cents(*amount);
    }
    summary
}

// ═══════════════════════════════════════════
// Invoices and payments
// ═══════════════════════════════════════════

/// Fields for a new invoice; totals and the number are derived.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub amount: f64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

fn invalid(reason: impl Into<String>) -> DatabaseError {
    DatabaseError::ConstraintViolation(reason.into())
}

pub fn create_invoice(
    store: &DocumentStore,
    new: NewInvoice,
    today: NaiveDate,
) -> Result<Stored<Invoice>, DatabaseError> {
    if new.items.is_empty() {
        return Err(invalid("an invoice needs at least one line item"));
    }
    if !(0.0..=1.0).contains(&new.tax_rate) {
        return Err(invalid(format!("tax rate {} is outside 0..1", new.tax_rate)));
    }
    let totals = compute_totals(&new.items, new.tax_rate, new.discount);
    if new.discount < 0.0 || new.discount > totals.subtotal {
        return Err(invalid(format!(
            "discount {} must be between 0 and the subtotal {}",
            new.discount, totals.subtotal
        )));
    }

    let issue_date = new.issue_date.unwrap_or(today);
    let due_date = match new.due_date {
        Some(due) => due,
        None => TimeDelta::try_days(DEFAULT_PAYMENT_TERMS_DAYS)
            .and_then(|terms| issue_date.checked_add_signed(terms))
            .ok_or_else(|| invalid(format!("issue date {issue_date} leaves no room for payment terms")))?,
    };

    let mut invoice = Invoice {
        invoice_number: String::new(),
        patient_id: new.patient_id,
        patient_name: new.patient_name,
        issue_date,
        due_date,
        items: new.items,
        tax_rate: new.tax_rate,
        discount: new.discount,
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        amount_paid: 0.0,
        status: InvoiceStatus::Pending,
    };

    // Numbers are unique in storage; a concurrent create that took the same
    // number makes the insert fail, and the next attempt sees it.
    let mut attempt = 1;
    loop {
        let existing = store.fetch_all::<Invoice>()?;
        invoice.invoice_number = next_invoice_number(
            existing.iter().map(|i| i.invoice_number.as_str()),
            issue_date,
        );
        match store.insert(&invoice) {
            Ok(stored) => {
                tracing::info!(id = %stored.id, number = %stored.invoice_number, total = stored.total, "Invoice created");
                return Ok(stored);
            }
            Err(DatabaseError::ConstraintViolation(reason)) if attempt < INVOICE_NUMBER_ATTEMPTS => {
                tracing::warn!(number = %invoice.invoice_number, attempt, "Invoice number taken, retrying: {reason}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Record a payment against an invoice. The payment document and the
/// invoice's new `amountPaid`/status are committed together, guarded by
/// the invoice version that was read.
pub fn record_payment(
    store: &DocumentStore,
    invoice_id: &str,
    payment: NewPayment,
    now: DateTime<Utc>,
) -> Result<(Stored<Invoice>, Stored<Payment>), DatabaseError> {
    if payment.amount <= 0.0 {
        return Err(invalid("payment amount must be positive"));
    }
    let mut invoice = store.fetch::<Invoice>(invoice_id)?;
    if matches!(
        invoice.status,
        InvoiceStatus::Draft | InvoiceStatus::Cancelled | InvoiceStatus::Paid
    ) {
        return Err(invalid(format!(
            "invoice {} is {} and cannot take payments",
            invoice.invoice_number, invoice.status
        )));
    }

    let record = Payment {
        invoice_id: invoice_id.to_string(),
        amount: round_cents(payment.amount),
        method: payment.method,
        paid_at: now,
        reference: payment.reference,
    };
    invoice.amount_paid = round_cents(invoice.amount_paid + record.amount);
    invoice.status = if balance_due(&invoice) <= SETTLED_EPSILON {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };

    let results = store.commit_batch(vec![
        WriteOp::Create {
            collection: Collection::Payments,
            data: to_fields(&record)?,
        },
        WriteOp::Update {
            collection: Collection::Invoices,
            id: invoice.id.clone(),
            patch: to_fields(&invoice.record)?,
            expected_version: Some(invoice.version),
        },
    ])?;

    let mut docs = results.into_iter().filter_map(|r| match r {
        WriteResult::Written(doc) => Some(doc),
        WriteResult::Deleted { .. } => None,
    });
    let (Some(payment_doc), Some(invoice_doc)) = (docs.next(), docs.next()) else {
        return Err(invalid("payment batch returned no documents"));
    };
    let payment: Stored<Payment> = Stored::from_document(payment_doc)?;
    let invoice: Stored<Invoice> = Stored::from_document(invoice_doc)?;
    tracing::info!(
        invoice = invoice_id,
        amount = payment.amount,
        status = %invoice.status,
        "Payment recorded"
    );
    Ok((invoice, payment))
}

/// Outcome of an overdue sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSweep {
    pub marked_overdue: Vec<String>,
    /// Invoices edited concurrently during the sweep; the next sweep picks
    /// them up.
    pub skipped: Vec<String>,
}

/// Flag every billable invoice past its due date.
///
/// Writes commit in chunks of at most one batch each, so the sweep as a
/// whole is not atomic. A chunk that hits a version conflict is retried
/// one invoice at a time and conflicting invoices are reported as skipped.
/// Any other storage error aborts the sweep; chunks committed before it
/// stay written and a rerun only touches what is left.
pub fn mark_overdue_invoices(store: &DocumentStore, today: NaiveDate) -> Result<OverdueSweep, DatabaseError> {
    let mut pending = Vec::new();
    for mut invoice in store.fetch_all::<Invoice>()? {
        if invoice.status != InvoiceStatus::Overdue && is_overdue(&invoice, today) {
            invoice.status = InvoiceStatus::Overdue;
            pending.push((
                invoice.id.clone(),
                WriteOp::Update {
                    collection: Collection::Invoices,
                    id: invoice.id.clone(),
                    patch: to_fields(&invoice.record)?,
                    expected_version: Some(invoice.version),
                },
            ));
        }
    }

    let mut sweep = OverdueSweep::default();
    for chunk in pending.chunks(crate::db::MAX_BATCH_WRITES) {
        let ops = chunk.iter().map(|(_, op)| op.clone()).collect();
        match store.commit_batch(ops) {
            Ok(_) => sweep.marked_overdue.extend(chunk.iter().map(|(id, _)| id.clone())),
            Err(DatabaseError::VersionConflict { .. }) => {
                for (id, op) in chunk {
                    match store.commit_batch(vec![op.clone()]) {
                        Ok(_) => sweep.marked_overdue.push(id.clone()),
                        Err(DatabaseError::VersionConflict { .. }) => sweep.skipped.push(id.clone()),
                        Err(e) => return Err(e),
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }
    if !sweep.marked_overdue.is_empty() || !sweep.skipped.is_empty() {
        tracing::info!(
            marked = sweep.marked_overdue.len(),
            skipped = sweep.skipped.len(),
            "Invoices marked overdue"
        );
    }
    Ok(sweep)
}

pub fn billing_summary(store: &DocumentStore, today: NaiveDate) -> Result<RevenueSummary, DatabaseError> {
    let invoices = store.fetch_all::<Invoice>()?;
    let payments = store.fetch_all::<Payment>()?;
    Ok(revenue_summary(
        invoices.iter().map(|i| &i.record),
        payments.iter().map(|p| &p.record),
        today,
    ))
}

// ═══════════════════════════════════════════
// Insurance claims
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDecision {
    pub approved: bool,
    /// Defaults to the full claim amount when approving.
    #[serde(default)]
    pub approved_amount: Option<f64>,
}

pub fn submit_claim(
    store: &DocumentStore,
    claim_id: &str,
    now: DateTime<Utc>,
) -> Result<Stored<InsuranceClaim>, DatabaseError> {
    let mut claim = store.fetch::<InsuranceClaim>(claim_id)?;
    if claim.status != ClaimStatus::Draft {
        return Err(invalid(format!("claim {claim_id} is already {}", claim.status)));
    }
    claim.status = ClaimStatus::Submitted;
    claim.submitted_at = Some(now);
    let saved = store.replace(&claim)?;
    tracing::info!(claim = claim_id, provider = %saved.provider, "Insurance claim submitted");
    Ok(saved)
}

pub fn decide_claim(
    store: &DocumentStore,
    claim_id: &str,
    decision: ClaimDecision,
) -> Result<Stored<InsuranceClaim>, DatabaseError> {
    let mut claim = store.fetch::<InsuranceClaim>(claim_id)?;
    if !matches!(claim.status, ClaimStatus::Submitted | ClaimStatus::UnderReview) {
        return Err(invalid(format!(
            "claim {claim_id} is {} and awaits no decision",
            claim.status
        )));
    }
    if decision.approved {
        let amount = decision.approved_amount.unwrap_or(claim.claim_amount);
        if amount < 0.0 || amount > claim.claim_amount {
            return Err(invalid(format!(
                "approved amount {amount} exceeds the claimed {}",
                claim.claim_amount
            )));
        }
        claim.status = ClaimStatus::Approved;
        claim.approved_amount = Some(round_cents(amount));
    } else {
        claim.status = ClaimStatus::Rejected;
        claim.approved_amount = None;
    }
    let saved = store.replace(&claim)?;
    tracing::info!(claim = claim_id, status = %saved.status, "Insurance claim decided");
    Ok(saved)
}
