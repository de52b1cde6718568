use crate::models::dispute::UrgencyTier;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MSG_INVOICE_NUMBER_MISSING: &str = "invoice number not found";
pub const MSG_GLOSA_CODE_MISSING: &str = "glosa code not found";
pub const MSG_AMOUNT_MISSING: &str = "glossed amount not found";
pub const MSG_AMOUNT_OUT_OF_RANGE: &str = "glossed amount out of range";
pub const MSG_GLOSA_DATE_MISSING: &str = "glosa date not found";
pub const MSG_GLOSA_DATE_INVALID: &str = "invalid glosa date";
pub const MSG_INVOICE_UNMATCHED: &str = "invoice not found — will be created without linkage";
pub const MSG_READY: &str = "ready to import";

/// Diagnostics only ever attached to `error` rows
pub const ERROR_MESSAGES: &[&str] = &[
    MSG_INVOICE_NUMBER_MISSING,
    MSG_GLOSA_CODE_MISSING,
    MSG_AMOUNT_MISSING,
    MSG_AMOUNT_OUT_OF_RANGE,
    MSG_GLOSA_DATE_MISSING,
    MSG_GLOSA_DATE_INVALID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Valid,
    Warning,
    Error,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Valid => "valid",
            CandidateStatus::Warning => "warning",
            CandidateStatus::Error => "error",
        }
    }
}

/// Resolved form of one input row, pending operator review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDispute {
    /// 0-based position of the source row
    pub row: usize,
    pub invoice_number: String,
    pub glosa_code: String,
    pub description: String,
    pub glossed_amount: BigDecimal,
    pub glosa_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub invoice_id: Option<i64>,
    pub batch_label: Option<String>,
    pub tier: Option<UrgencyTier>,
    pub status: CandidateStatus,
    pub message: String,
}

impl CandidateDispute {
    /// Candidates come back from review as sent by the client, so a row
    /// still carrying an error diagnostic is refused whatever its status says.
    pub fn is_importable(&self) -> bool {
        self.status != CandidateStatus::Error && !ERROR_MESSAGES.contains(&self.message.as_str())
    }
}
