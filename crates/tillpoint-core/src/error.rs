//! # Error Types
//!
//! Domain-specific error types for tillpoint-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillpoint-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillpoint-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tillpoint-service errors                                              │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every failure in the cart and checkout paths surfaces as one of these
/// variants. None are retried; the caller corrects the request and resubmits.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Cart cannot be found.
    ///
    /// ## When This Occurs
    /// - Cart ID doesn't exist
    /// - Cart was consumed by a completed checkout (carts are deleted once
    ///   their sale is recorded, so a second checkout lands here)
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// Sale record cannot be found.
    #[error("No sale record was found with that ID: {0}")]
    SaleNotFound(String),

    /// The cart exists but has no line item for the given product.
    #[error("Product not found in cart: {0}")]
    ItemNotInCart(String),

    /// Checkout was attempted on a cart with no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The cart is not open, so it cannot be mutated or checked out.
    ///
    /// Enforces at-most-once checkout: only one transition out of `open`
    /// ever succeeds for a given cart.
    #[error("Cart is already completed")]
    CartNotOpen,

    /// Not enough stock on hand to cover a cart line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (line: 5 × Coca-Cola)
    ///      │
    ///      ▼
    /// Conditional decrement: available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Coca-Cola", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough stock for Coca-Cola"
    /// ```
    #[error("Not enough stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Payment method was not one of the recognized values. A missing
    /// method is caught earlier, at the request boundary.
    #[error("Payment method must be one of cash, card, mobile money, bank transfer (got '{0}')")]
    InvalidPaymentMethod(String),

    /// Cash tendered does not cover the cart total.
    #[error("Insufficient cash amount: paid {paid}, required {required}")]
    InsufficientCash { paid: i64, required: i64 },

    /// The caller is not allowed to view or act on this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantity fell below the minimum of one.
    #[error("Quantity must be at least 1")]
    QuantityTooSmall,

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, price with too few digits).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::InsufficientStock {
            name: "Coca-Cola 330ml".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for Coca-Cola 330ml: available 3, requested 5"
        );

        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            CoreError::CartNotOpen.to_string(),
            "Cart is already completed"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        assert_eq!(
            ValidationError::QuantityTooSmall.to_string(),
            "Quantity must be at least 1"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::QuantityTooSmall;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
