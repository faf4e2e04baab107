//! # Validation Module
//!
//! Input validation for the order engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Validation Layers                           │
//! │                                                                 │
//! │  Layer 1: Request layer (external)                              │
//! │  ├── Deserialization / type checks                              │
//! │  └── Immediate user feedback                                    │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 2: THIS MODULE - business rule validation                │
//! │  ├── Runs before any write                                      │
//! │  └── Typed ValidationError results                              │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 3: Database (SQLite)                                     │
//! │  ├── CHECK (cantidad >= 1), CHECK (total > 0)                   │
//! │  ├── UNIQUE (usuario_id, producto_id)                           │
//! │  └── Foreign key constraints                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0); a quantity of zero never overwrites a line
/// - Must not exceed MAX_LINE_QUANTITY (999)
///
/// ## Example
/// ```rust
/// use mercado_core::validation::validate_quantity;
///
/// assert!(validate_quantity(5).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an order total.
///
/// ## Rules
/// - Must be strictly positive; a zero-total order is meaningless and a
///   negative one would invert the even split
pub fn validate_order_total(total: Money) -> ValidationResult<()> {
    if !total.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "total".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a payment method tag.
///
/// The tag is opaque and persisted verbatim ("card", "transfer", ...);
/// only emptiness and length are checked here.
///
/// ## Returns
/// The trimmed tag.
pub fn validate_payment_method(method: &str) -> ValidationResult<String> {
    let method = method.trim();

    if method.is_empty() {
        return Err(ValidationError::Required {
            field: "payment method".to_string(),
        });
    }

    if method.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "payment method".to_string(),
            max: 50,
        });
    }

    Ok(method.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
