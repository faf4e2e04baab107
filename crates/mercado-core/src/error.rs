//! # Error Types
//!
//! Domain-specific error types for mercado-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Error Types                             │
//! │                                                                 │
//! │  mercado-core errors (this file)                                │
//! │  ├── CoreError        - Business rule violations                │
//! │  └── ValidationError  - Input validation failures               │
//! │                                                                 │
//! │  mercado-db errors (separate crate)                             │
//! │  └── DbError          - Persistence failures; absorbs both      │
//! │                         core errors via From impls              │
//! │                                                                 │
//! │  Flow: ValidationError → CoreError → DbError → request layer    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (user id, field name, etc.)
//! 3. Errors are enum variants, never String
//! 4. Business failures (empty cart) stay distinguishable from
//!    infrastructure failures all the way up to the caller

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations, not infrastructure
/// failures. They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was attempted with no cart lines.
    ///
    /// This is an explicit business rule, not a generic not-found: an order
    /// must never exist with zero lines, so an empty cart aborts the whole
    /// checkout transaction.
    #[error("Cart is empty for user {user_id}")]
    EmptyCart { user_id: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::EmptyCart { user_id: 42 };
        assert_eq!(err.to_string(), "Cart is empty for user 42");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "payment method".to_string(),
        };
        assert_eq!(err.to_string(), "payment method is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "total".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
