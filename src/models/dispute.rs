use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Deadline semaphore. Ordered by urgency: `Green < Yellow < Red < Black`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Green,
    Yellow,
    Red,
    Black,
}

impl UrgencyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyTier::Green => "green",
            UrgencyTier::Yellow => "yellow",
            UrgencyTier::Red => "red",
            UrgencyTier::Black => "black",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow state of a stored glosa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeState {
    Pending,
    InProcess,
    Resolved,
    Rejected,
}

impl DisputeState {
    /// States whose semaphore is still recomputed
    pub const ACTIVE: [DisputeState; 2] = [DisputeState::Pending, DisputeState::InProcess];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeState::Pending => "pending",
            DisputeState::InProcess => "in_process",
            DisputeState::Resolved => "resolved",
            DisputeState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeState::Resolved | DisputeState::Rejected)
    }
}

impl fmt::Display for DisputeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisputeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DisputeState::Pending),
            "in_process" => Ok(DisputeState::InProcess),
            "resolved" => Ok(DisputeState::Resolved),
            "rejected" => Ok(DisputeState::Rejected),
            other => Err(format!("unknown dispute state '{other}'")),
        }
    }
}

/// Write request for one persisted glosa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDispute {
    pub insurer_id: i64,
    pub invoice_id: Option<i64>,
    pub invoice_number: String,
    pub glosa_code: String,
    pub description: String,
    pub glossed_amount: BigDecimal,
    pub glosa_date: NaiveDate,
    pub due_date: NaiveDate,
    pub batch_label: Option<String>,
    pub business_days_remaining: i32,
    pub tier: UrgencyTier,
    pub state: DisputeState,
    pub created_by: i64,
}

/// Stored glosa still subject to semaphore recomputation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActiveDispute {
    pub id: i64,
    pub due_date: NaiveDate,
}

/// Result of re-classifying one stored glosa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUpdate {
    pub dispute_id: i64,
    pub tier: UrgencyTier,
    pub business_days_remaining: i32,
}
