//! Validation utilities for the Branch Inventory Management Platform

// ============================================================================
// Code Formats
// ============================================================================

/// Validate branch code format (2-10 uppercase alphanumeric)
pub fn validate_branch_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Branch code must be at least 2 characters");
    }
    if code.len() > 10 {
        return Err("Branch code must be at most 10 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Branch code must be uppercase alphanumeric only");
    }
    Ok(())
}

/// Validate item code format (3-20 uppercase alphanumeric, dashes allowed)
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Item code must be at least 3 characters");
    }
    if code.len() > 20 {
        return Err("Item code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Item code must be uppercase alphanumeric (dashes allowed)");
    }
    Ok(())
}

/// Validate category code format (2-10 uppercase alphanumeric)
pub fn validate_category_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Category code must be at least 2 characters");
    }
    if code.len() > 10 {
        return Err("Category code must be at most 10 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Category code must be uppercase alphanumeric only");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate username (3-30 chars, lowercase alphanumeric plus `._-`)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 30 {
        return Err("Username must be 3-30 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_' || c == '-')
    {
        return Err("Username must be lowercase alphanumeric, '.', '_' or '-'");
    }
    Ok(())
}

/// Validate a movement or transfer quantity is strictly positive
pub fn validate_positive_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate stock thresholds: minimum must not exceed maximum
pub fn validate_stock_thresholds(minimum: i32, maximum: i32) -> Result<(), &'static str> {
    if minimum < 0 {
        return Err("Minimum stock level cannot be negative");
    }
    if maximum < minimum {
        return Err("Maximum stock level cannot be below the minimum");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_codes() {
        assert!(validate_branch_code("BKK01").is_ok());
        assert!(validate_branch_code("HQ").is_ok());
        assert!(validate_branch_code("b01").is_err());
        assert!(validate_branch_code("X").is_err());
        assert!(validate_branch_code("TOOLONGCODE1").is_err());
    }

    #[test]
    fn item_codes() {
        assert!(validate_item_code("ITM-001").is_ok());
        assert!(validate_item_code("AB1").is_ok());
        assert!(validate_item_code("ab-1").is_err());
        assert!(validate_item_code("AB").is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("bad").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn usernames() {
        assert!(validate_username("warehouse.lead").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("UPPER").is_err());
    }

    #[test]
    fn quantities() {
        assert!(validate_positive_quantity(1).is_ok());
        assert!(validate_positive_quantity(0).is_err());
        assert!(validate_positive_quantity(-5).is_err());
    }

    #[test]
    fn thresholds() {
        assert!(validate_stock_thresholds(0, 100).is_ok());
        assert!(validate_stock_thresholds(10, 5).is_err());
        assert!(validate_stock_thresholds(-1, 5).is_err());
    }
}
