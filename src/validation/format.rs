use chrono::NaiveDate;

use crate::models::{Field, FieldMap, ValidationIssue, ValidationIssueType};

/// Heights outside this range (metres) are almost certainly misreads.
const MIN_HEIGHT_M: f32 = 0.50;
const MAX_HEIGHT_M: f32 = 2.50;

pub struct FormatValidator;

impl FormatValidator {
    pub fn validate(fields: &FieldMap) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for field in [Field::DateNaissance, Field::DateExpiration] {
            if let Some(value) = fields.get(field) {
                if parse_card_date(value).is_none() {
                    issues.push(ValidationIssue {
                        field,
                        issue_type: ValidationIssueType::Format,
                        message: format!("'{}' is not a calendar date", value),
                    });
                }
            }
        }

        if let Some(value) = fields.get(Field::Taille) {
            match parse_height(value) {
                Some(height) if (MIN_HEIGHT_M..=MAX_HEIGHT_M).contains(&height) => {}
                _ => issues.push(ValidationIssue {
                    field: Field::Taille,
                    issue_type: ValidationIssueType::Format,
                    message: format!(
                        "Height '{}' is outside {:.2}-{:.2} m",
                        value, MIN_HEIGHT_M, MAX_HEIGHT_M
                    ),
                }),
            }
        }

        issues
    }
}

/// Parse a date printed as `DD/MM/YYYY`.
pub fn parse_card_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%d/%m/%Y").ok()
}

/// Parse a height printed with a decimal comma, e.g. `1,78`.
pub fn parse_height(height_str: &str) -> Option<f32> {
    height_str.trim().replace(',', ".").parse::<f32>().ok()
}
