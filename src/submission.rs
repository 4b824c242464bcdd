//! Submission driver.
//!
//! Walks the built orders one at a time: create, then pay and invoice unless
//! Spire reports a backorder or the order is on hold. Every backend call is
//! made once; a failure abandons that order and moves on.

use serde::Serialize;

use crate::backend::OrderBackend;
use crate::domain::events::SubmissionEvent;
use crate::{Payment, SalesOrder};

/// Totals and per-order outcomes of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub invoiced: usize,
    pub skipped: usize,
    pub create_failed: usize,
    pub payment_failed: usize,
    pub invoice_failed: usize,
    pub events: Vec<SubmissionEvent>,
}

impl SubmissionSummary {
    fn record(&mut self, event: SubmissionEvent) {
        match &event {
            SubmissionEvent::Invoiced { .. } => self.invoiced += 1,
            SubmissionEvent::Skipped { .. } => self.skipped += 1,
            SubmissionEvent::CreateFailed { .. } => self.create_failed += 1,
            SubmissionEvent::PaymentFailed { .. } => self.payment_failed += 1,
            SubmissionEvent::InvoiceFailed { .. } => self.invoice_failed += 1,
        }
        self.events.push(event);
    }

    pub fn failures(&self) -> usize { self.create_failed + self.payment_failed + self.invoice_failed }
}

pub struct SubmissionDriver<'a, B: OrderBackend + ?Sized> {
    backend: &'a B,
    payment_method: String,
}

impl<'a, B: OrderBackend + ?Sized> SubmissionDriver<'a, B> {
    pub fn new(backend: &'a B, payment_method: impl Into<String>) -> Self {
        Self { backend, payment_method: payment_method.into() }
    }

    /// Submits every order in list order and reports what happened to each.
    pub async fn run(&self, orders: &[SalesOrder]) -> SubmissionSummary {
        let mut summary = SubmissionSummary::default();
        for order in orders {
            summary.record(self.submit(order).await);
        }
        summary
    }

    /// Drives a single order as far as it can go.
    pub async fn submit(&self, sales_order: &SalesOrder) -> SubmissionEvent {
        let reference_no = sales_order.reference_no.clone();

        let mut order = match self.backend.create_sales_order(sales_order).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!("Error Creating Order {} | Error : {}", reference_no, e);
                return SubmissionEvent::CreateFailed { reference_no, error: e.to_string() };
            }
        };

        let backordered = order.is_backordered();
        if backordered || order.hold {
            tracing::info!(
                "Order No {} Successfully Created, Skipped Invoicing | Backordered : {} | Pending : {}",
                reference_no, backordered, order.hold
            );
            return SubmissionEvent::Skipped { reference_no, backordered, hold: order.hold };
        }

        order.payments = vec![Payment { method: self.payment_method.clone(), amount: order.total.clone() }];
        if let Err(e) = self.backend.update_sales_order(&order).await {
            tracing::error!("Error adding payment to Order {} | Error : {}", reference_no, e);
            return SubmissionEvent::PaymentFailed { reference_no, error: e.to_string() };
        }

        if let Err(e) = self.backend.invoice_sales_order(&order).await {
            tracing::error!("Error invoicing Order {} | Error : {}", reference_no, e);
            return SubmissionEvent::InvoiceFailed { reference_no, error: e.to_string() };
        }

        tracing::info!("Order No {} Successfully Created and Invoiced", reference_no);
        SubmissionEvent::Invoiced { reference_no }
    }
}
