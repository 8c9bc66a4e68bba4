//! Application models shared across admissions services

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Draft => write!(f, "draft"),
            ApplicationStatus::Submitted => write!(f, "submitted"),
            ApplicationStatus::UnderReview => write!(f, "under_review"),
            ApplicationStatus::Approved => write!(f, "approved"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown application status: {}",
                other
            ))),
        }
    }
}

/// Payment verification status for a submitted proof of payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingReview,
    Verified,
    Rejected,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::PendingReview => write!(f, "pending_review"),
            PaymentStatus::Verified => write!(f, "verified"),
            PaymentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_review" => Ok(PaymentStatus::PendingReview),
            "verified" => Ok(PaymentStatus::Verified),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// One application record as stored by the hosted database.
///
/// The upstream platform delivers every column except the identifier as
/// nullable, and timestamps arrive as raw text that may be malformed, so
/// they are kept as strings and parsed at the point of use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: String,
    pub application_number: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nrc_number: Option<String>,
    pub passport_number: Option<String>,
    pub program: Option<String>,
    pub intake: Option<String>,
    pub institution: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub application_fee: Option<f64>,
    pub paid_amount: Option<f64>,
    pub result_slip_url: Option<String>,
    pub pop_url: Option<String>,
    pub created_at: Option<String>,
    pub submitted_at: Option<String>,
    pub updated_at: Option<String>,
    pub user_id: Option<String>,
}

impl ApplicationRow {
    /// Lifecycle status with the missing-value default applied
    pub fn effective_status(&self) -> ApplicationStatus {
        self.status.unwrap_or(ApplicationStatus::Draft)
    }

    /// Payment status with the missing-value default applied
    pub fn effective_payment_status(&self) -> PaymentStatus {
        self.payment_status.unwrap_or(PaymentStatus::PendingReview)
    }

    /// Creation timestamp, falling back to the submission timestamp
    pub fn effective_created_at(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.submitted_at.as_deref())
    }
}

/// Reduced projection of an application row used by list views.
///
/// Every field is non-null; the projector fills deterministic defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub application_number: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub program: String,
    pub intake: String,
    pub institution: String,
    pub status: ApplicationStatus,
    pub payment_status: PaymentStatus,
    pub application_fee: f64,
    pub paid_amount: f64,
    pub created_at: String,
    pub submitted_at: String,
    pub updated_at: Option<String>,
    pub user_id: Option<String>,
}
