use thiserror::Error as ThisError;

use crate::RecordType;

/// Rejected input
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),
    #[error("category name must not be empty")]
    EmptyCategory,
    #[error("{1} category {0:?} already exists")]
    DuplicateCategory(String, RecordType),
    #[error("invalid month {0:?}, expected YYYY-MM")]
    InvalidMonth(String),
}

/// Money amounts are strictly positive and finite.
pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

/// Category names are trimmed and must not be empty.
pub fn validate_category_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyCategory);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(12.5), Ok(12.5));
        assert_eq!(
            validate_amount(0.0),
            Err(ValidationError::NonPositiveAmount(0.0))
        );
        assert_eq!(
            validate_amount(-3.0),
            Err(ValidationError::NonPositiveAmount(-3.0))
        );
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_category_name() {
        assert_eq!(validate_category_name("  Food "), Ok("Food".to_string()));
        assert_eq!(
            validate_category_name("   "),
            Err(ValidationError::EmptyCategory)
        );
    }
}
