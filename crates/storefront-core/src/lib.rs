//! # storefront-core: Order Pricing for the Storefront Admin
//!
//! This crate holds the pricing rules used while an operator composes an
//! order on the admin "create order" screen. Everything here is a pure
//! function or plain data; persistence lives in `storefront-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Admin Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI (admin app)                       │   │
//! │  │   Product picker ──► Line table ──► Promo fields ──► Summary   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (types exported via ts-rs)        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ storefront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │ pricing │ │  draft  │ │  ports  │ │checkout │  │   │
//! │  │   │  Money  │ │ totals  │ │  Order  │ │ Lookup  │ │ apply   │  │   │
//! │  │   │         │ │ promos  │ │  Draft  │ │ Submit  │ │ reprice │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • INTEGER MONEY             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ports implemented by                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (Database Layer)                  │   │
//! │  │        promotions + orders in SQLite, migrations, seed          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in minor units, integer arithmetic only
//! - [`types`] - Promotions, line items, totals, orders
//! - [`pricing`] - Subtotal, promotion eligibility, order totals
//! - [`draft`] - The order being composed
//! - [`ports`] - Collaborator traits (promotion lookup, order submission)
//! - [`checkout`] - Code lookup + apply, server-side repricing
//! - [`error`] - Rejections and domain errors
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::draft::OrderDraft;
//! use storefront_core::money::Money;
//! use storefront_core::types::{LineItem, Promotion, PromotionKind, PromotionSlot};
//!
//! let mut draft = OrderDraft::new(Money::from_minor(40_000)).unwrap();
//! draft
//!     .add_item(LineItem::new("p1", "PHONE-X", "Phone X", Money::from_minor(20_000_000), 1))
//!     .unwrap();
//!
//! let ten_off = Promotion::new("TEN", PromotionKind::Percentage, 10);
//! let discount = draft.apply_promotion(ten_off, PromotionSlot::Product).unwrap();
//!
//! assert_eq!(discount.minor(), 2_000_000);
//! assert_eq!(draft.totals().grand_total.minor(), 18_040_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod draft;
pub mod error;
pub mod money;
pub mod ports;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, PromotionRejection, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines on one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Largest single amount accepted as a unit price, shipping fee or
/// promotion threshold, in minor units.
///
/// `MAX_ORDER_LINES × MAX_LINE_QUANTITY × MAX_AMOUNT` plus one shipping fee
/// stays below `i64::MAX`, so totals of a valid order never saturate.
pub const MAX_AMOUNT: i64 = 10_000_000_000_000;

/// Maximum length of a promotion code.
pub const MAX_PROMOTION_CODE_LEN: usize = 32;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a listing will return.
pub const MAX_PAGE_SIZE: u32 = 100;
