//! # Validation Module
//!
//! Input validation run before any pricing logic.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  ├── Empty fields, numeric inputs                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Promotion code format, quantities, prices                         │
//! │  └── Promotion definitions before they are stored                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (storefront-db)                                       │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (promotion code, order number)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{normalize_promotion_code, validate_quantity};
//!
//! assert_eq!(normalize_promotion_code(" sale10 ").unwrap(), "SALE10");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LineItem, PageRequest, Promotion, PromotionKind};
use crate::{MAX_AMOUNT, MAX_LINE_QUANTITY, MAX_PAGE_SIZE, MAX_PROMOTION_CODE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a promotion code and returns its canonical (upper-case) form.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_PROMOTION_CODE_LEN` characters
/// - ASCII letters, digits, hyphens and underscores only
///
/// ```rust
/// use storefront_core::validation::normalize_promotion_code;
///
/// assert_eq!(normalize_promotion_code("freeShip").unwrap(), "FREESHIP");
/// assert!(normalize_promotion_code("").is_err());
/// assert!(normalize_promotion_code("TWO WORDS").is_err());
/// ```
pub fn normalize_promotion_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "promotion code".to_string(),
        });
    }

    if code.len() > MAX_PROMOTION_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "promotion code".to_string(),
            max: MAX_PROMOTION_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "promotion code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphen, underscore
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a search keyword and returns it trimmed.
///
/// Empty is allowed (lists everything). Maximum 100 characters.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_LINE_QUANTITY`
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

/// Validates an amount (unit price, shipping fee, thresholds).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed `MAX_AMOUNT`
///
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::validation::validate_amount;
///
/// assert!(validate_amount("shipping fee", Money::from_minor(0)).is_ok());
/// assert!(validate_amount("shipping fee", Money::from_minor(-1)).is_err());
/// assert!(validate_amount("shipping fee", Money::from_minor(i64::MAX)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if amount.minor() > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }

    Ok(())
}

/// Validates a line item before it enters a draft or an order request.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    if item.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }
    validate_sku(&item.sku)?;
    if item.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    validate_amount("unit price", item.unit_price)?;
    validate_quantity(item.quantity)
}

/// Validates a promotion definition before it is stored.
///
/// ## Rules
/// - `id` is a UUID
/// - Code passes [`normalize_promotion_code`]
/// - `value` ≥ 0, and ≤ 100 for percentages
/// - Minimum order value and cap, when present, are non-negative
pub fn validate_promotion(promotion: &Promotion) -> ValidationResult<()> {
    validate_uuid(&promotion.id)?;
    normalize_promotion_code(&promotion.code)?;

    if promotion.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    match promotion.kind {
        PromotionKind::Percentage if !(0..=100).contains(&promotion.value) => {
            return Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max: 100,
            });
        }
        _ if promotion.value < 0 => {
            return Err(ValidationError::MustNotBeNegative {
                field: "value".to_string(),
            });
        }
        _ => {}
    }

    if let Some(min) = promotion.min_order_value {
        validate_amount("min order value", min)?;
    }

    if let Some(max) = promotion.max_discount_amount {
        validate_amount("max discount amount", max)?;
    }

    Ok(())
}

/// Validates a page request.
pub fn validate_page_request(page: &PageRequest) -> ValidationResult<()> {
    if page.page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if page.page_size == 0 || page.page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use storefront_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
