//! Submission events
use serde::Serialize;

/// What happened to one order during submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionEvent {
    Invoiced { reference_no: String },
    Skipped { reference_no: String, backordered: bool, hold: bool },
    CreateFailed { reference_no: String, error: String },
    PaymentFailed { reference_no: String, error: String },
    InvoiceFailed { reference_no: String, error: String },
}

impl SubmissionEvent {
    pub fn reference_no(&self) -> &str {
        match self {
            Self::Invoiced { reference_no }
            | Self::Skipped { reference_no, .. }
            | Self::CreateFailed { reference_no, .. }
            | Self::PaymentFailed { reference_no, .. }
            | Self::InvoiceFailed { reference_no, .. } => reference_no,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CreateFailed { .. } | Self::PaymentFailed { .. } | Self::InvoiceFailed { .. })
    }
}
