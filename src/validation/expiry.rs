use chrono::{Local, NaiveDate};

use super::format::parse_card_date;
use crate::models::{Field, FieldMap, ValidationIssue, ValidationIssueType};

pub struct ExpiryValidator;

impl ExpiryValidator {
    pub fn validate(fields: &FieldMap) -> Vec<ValidationIssue> {
        Self::validate_on(fields, Local::now().naive_local().date())
    }

    /// Report a card whose expiration date lies before `today`. Unreadable
    /// dates are left to the format checks.
    pub fn validate_on(fields: &FieldMap, today: NaiveDate) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if let Some(date) = fields.get(Field::DateExpiration).and_then(parse_card_date) {
            if date < today {
                issues.push(ValidationIssue {
                    field: Field::DateExpiration,
                    issue_type: ValidationIssueType::Expiry,
                    message: format!("Card expired on {}", date.format("%d/%m/%Y")),
                });
            }
        }

        issues
    }
}
