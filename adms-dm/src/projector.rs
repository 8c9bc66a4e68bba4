//! Row-to-summary projection for list views
//!
//! Total function: every nullable row field maps to a deterministic default
//! so list rendering never has to handle nulls.

use adms_common::models::{ApplicationRow, ApplicationSummary};

/// Project a full application row into the reduced list-view shape
pub fn project(row: &ApplicationRow) -> ApplicationSummary {
    ApplicationSummary {
        id: row.id.clone(),
        application_number: row.application_number.clone().unwrap_or_default(),
        full_name: row.full_name.clone().unwrap_or_default(),
        email: row.email.clone().unwrap_or_default(),
        phone: row.phone.clone().unwrap_or_default(),
        program: row.program.clone().unwrap_or_default(),
        intake: row.intake.clone().unwrap_or_default(),
        institution: row.institution.clone().unwrap_or_default(),
        status: row.effective_status(),
        payment_status: row.effective_payment_status(),
        application_fee: row.application_fee.unwrap_or(0.0),
        // Unpaid rows show the assessed fee as the amount owed
        paid_amount: row.paid_amount.or(row.application_fee).unwrap_or(0.0),
        created_at: row.created_at.clone().unwrap_or_default(),
        submitted_at: row
            .submitted_at
            .clone()
            .or_else(|| row.created_at.clone())
            .unwrap_or_default(),
        updated_at: row.updated_at.clone(),
        user_id: row.user_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adms_common::models::{ApplicationStatus, PaymentStatus};

    fn blank_row() -> ApplicationRow {
        ApplicationRow {
            id: "row-1".to_string(),
            application_number: None,
            full_name: None,
            email: None,
            phone: None,
            nrc_number: None,
            passport_number: None,
            program: None,
            intake: None,
            institution: None,
            status: None,
            payment_status: None,
            application_fee: None,
            paid_amount: None,
            result_slip_url: None,
            pop_url: None,
            created_at: None,
            submitted_at: None,
            updated_at: None,
            user_id: None,
        }
    }

    #[test]
    fn test_all_nulls_get_defaults() {
        let summary = project(&blank_row());

        assert_eq!(summary.id, "row-1");
        assert_eq!(summary.application_number, "");
        assert_eq!(summary.full_name, "");
        assert_eq!(summary.email, "");
        assert_eq!(summary.status, ApplicationStatus::Draft);
        assert_eq!(summary.payment_status, PaymentStatus::PendingReview);
        assert_eq!(summary.application_fee, 0.0);
        assert_eq!(summary.paid_amount, 0.0);
        assert_eq!(summary.created_at, "");
        assert_eq!(summary.submitted_at, "");
        assert_eq!(summary.updated_at, None);
        assert_eq!(summary.user_id, None);
    }

    #[test]
    fn test_submitted_at_falls_back_to_created_at() {
        let mut row = blank_row();
        row.created_at = Some("2026-01-15T10:00:00Z".to_string());

        let summary = project(&row);
        assert_eq!(summary.submitted_at, "2026-01-15T10:00:00Z");

        row.submitted_at = Some("2026-01-16T08:00:00Z".to_string());
        let summary = project(&row);
        assert_eq!(summary.submitted_at, "2026-01-16T08:00:00Z");
    }

    #[test]
    fn test_paid_amount_fallback_chain() {
        let mut row = blank_row();
        row.application_fee = Some(150.0);

        // paid_amount absent: falls back to the fee
        let summary = project(&row);
        assert_eq!(summary.paid_amount, 150.0);

        // paid_amount present: used as-is
        row.paid_amount = Some(75.0);
        let summary = project(&row);
        assert_eq!(summary.paid_amount, 75.0);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let mut row = blank_row();
        row.full_name = Some("Bupe Kasonde".to_string());
        row.status = Some(ApplicationStatus::Approved);

        assert_eq!(project(&row), project(&row));
    }
}
