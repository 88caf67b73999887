//! Validation utilities shared by the repository boundary and billing

use bigdecimal::BigDecimal;

/// A value failed a validation rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Result type for validation checks
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(ValidationError("Amount must be positive".to_string()))
    } else {
        Ok(())
    }
}

/// Validate that an amount is zero or positive
pub fn validate_non_negative_amount(amount: &BigDecimal) -> ValidationResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(ValidationError("Amount cannot be negative".to_string()))
    } else {
        Ok(())
    }
}

/// Validate a record identifier (student, staff, payment)
pub fn validate_identifier(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError("Identifier cannot be empty".to_string()));
    }

    if id.len() > 64 {
        return Err(ValidationError(
            "Identifier cannot exceed 64 characters".to_string(),
        ));
    }

    // Document ids from the store are alphanumeric with dashes and underscores
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError(format!(
            "Identifier '{}' can only contain alphanumeric characters, dashes, and underscores",
            id
        )));
    }

    Ok(())
}

/// Validate a person's display name
pub fn validate_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError("Name cannot be empty".to_string()));
    }

    if name.len() > 100 {
        return Err(ValidationError(
            "Name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_rules() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_non_negative_amount(&BigDecimal::from(0)).is_ok());
        assert!(validate_non_negative_amount(&BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("stu_001-A").is_ok());
        assert!(validate_identifier("  ").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Chidi Okeke").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }
}
