//! Field validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that a monetary amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::Validation(
            "amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an account code is usable
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 20 {
        return Err(LedgerError::Validation(
            "account code cannot exceed 20 characters".to_string(),
        ));
    }

    // Codes sort lexicographically in the chart, so keep them plain
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(LedgerError::Validation(
            "account code can only contain alphanumeric characters, dashes, and dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name is usable
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a transaction description
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}
