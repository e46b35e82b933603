pub mod expiry;
pub mod format;

pub use expiry::ExpiryValidator;
pub use format::FormatValidator;

use crate::models::{FieldMap, ValidationIssue};

/// Opt-in plausibility checks over extracted fields. The map itself is never
/// altered: extraction stays permissive and callers decide what to do with
/// the issues.
pub struct FieldValidator;

impl FieldValidator {
    pub fn validate(fields: &FieldMap) -> Vec<ValidationIssue> {
        let mut issues = FormatValidator::validate(fields);
        issues.extend(ExpiryValidator::validate(fields));
        issues
    }
}
