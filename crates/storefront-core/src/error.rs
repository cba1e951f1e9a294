//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── PromotionRejection - A promotion cannot go into a slot            │
//! │  ├── ValidationError    - Input validation failures                    │
//! │  └── CoreError          - Draft / order rule violations (wraps both)   │
//! │                                                                         │
//! │  storefront-core::checkout                                             │
//! │  └── CheckoutError<E>   - CoreError or a collaborator failure E        │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError            - Database operation failures                  │
//! │                                                                         │
//! │  Flow: PromotionRejection → CoreError → DbError → UI message           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derives, no manual impls
//! 2. Messages carry the offending code, amount or field
//! 3. Every rejection has a stable machine-readable code for the UI

use thiserror::Error;

use crate::money::Money;
use crate::types::{PromotionKind, PromotionSlot};

// =============================================================================
// Promotion Rejection
// =============================================================================

/// Why a promotion was not applied.
///
/// These are expected outcomes of operator input, not defects. The draft is
/// left untouched and the UI shows the message next to the code field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionRejection {
    /// Shipping promotion in the product slot or vice versa.
    #[error("Promotion {code} ({kind}) cannot be applied as a {slot} discount")]
    WrongSlotKind {
        code: String,
        kind: PromotionKind,
        slot: PromotionSlot,
    },

    /// The merchandise subtotal is below the promotion's minimum.
    ///
    /// ## User Workflow
    /// ```text
    /// Subtotal: 20,000,000
    /// Apply "BIGSPENDER" (min 30,000,000)
    ///      │
    ///      ▼
    /// BelowMinimumOrder { min_order_value: 30,000,000, subtotal: 20,000,000 }
    ///      │
    ///      ▼
    /// UI shows: "requires a minimum order of 30,000,000"
    /// ```
    #[error("Promotion {code} requires a minimum order of {min_order_value}, subtotal is {subtotal}")]
    BelowMinimumOrder {
        code: String,
        min_order_value: Money,
        subtotal: Money,
    },

    #[error("Promotion {code} is not active")]
    Inactive { code: String },

    /// The lookup collaborator has no promotion with this code.
    #[error("Promotion code not found: {code}")]
    PromotionNotFound { code: String },
}

impl PromotionRejection {
    /// Stable code for programmatic handling in the UI.
    pub const fn code(&self) -> &'static str {
        match self {
            PromotionRejection::WrongSlotKind { .. } => "WRONG_SLOT_KIND",
            PromotionRejection::BelowMinimumOrder { .. } => "BELOW_MINIMUM_ORDER",
            PromotionRejection::Inactive { .. } => "INACTIVE",
            PromotionRejection::PromotionNotFound { .. } => "PROMOTION_NOT_FOUND",
        }
    }

    /// Code of the promotion that was rejected.
    pub fn promotion_code(&self) -> &str {
        match self {
            PromotionRejection::WrongSlotKind { code, .. }
            | PromotionRejection::BelowMinimumOrder { code, .. }
            | PromotionRejection::Inactive { code }
            | PromotionRejection::PromotionNotFound { code } => code,
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Order-composition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rejected(#[from] PromotionRejection),

    /// A line index that does not exist in the draft.
    #[error("Line item {index} not found (order has {len} lines)")]
    LineItemNotFound { index: usize, len: usize },

    /// Draft has reached the maximum number of distinct lines.
    #[error("Order cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Submitting an order with no lines.
    #[error("Order has no line items")]
    EmptyOrder,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// The rejection, if this error is one.
    pub fn as_rejection(&self) -> Option<&PromotionRejection> {
        match self {
            CoreError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any pricing logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid code characters).
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
    fn test_rejection_messages() {
        let err = PromotionRejection::BelowMinimumOrder {
            code: "BIG".to_string(),
            min_order_value: Money::from_minor(30_000_000),
            subtotal: Money::from_minor(20_000_000),
        };
        assert_eq!(
            err.to_string(),
            "Promotion BIG requires a minimum order of 30,000,000, subtotal is 20,000,000"
        );

        let err = PromotionRejection::WrongSlotKind {
            code: "FREESHIP".to_string(),
            kind: PromotionKind::ShippingDiscount,
            slot: PromotionSlot::Product,
        };
        assert_eq!(
            err.to_string(),
            "Promotion FREESHIP (SHIPPING_DISCOUNT) cannot be applied as a product discount"
        );
    }

    #[test]
    fn test_rejection_codes() {
        let err = PromotionRejection::Inactive {
            code: "OLD".to_string(),
        };
        assert_eq!(err.code(), "INACTIVE");
        assert_eq!(err.promotion_code(), "OLD");
    }

    #[test]
    fn test_rejection_converts_to_core_error() {
        let rejection = PromotionRejection::PromotionNotFound {
            code: "NOPE".to_string(),
        };
        let core_err: CoreError = rejection.clone().into();
        assert_eq!(core_err.as_rejection(), Some(&rejection));
        assert_eq!(core_err.to_string(), "Promotion code not found: NOPE");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.as_rejection().is_none());
    }
}
