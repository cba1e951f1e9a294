//! # Domain Types
//!
//! Types shared by the pricing logic, the order draft and the stores.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │    Promotion    │   │  PromotionSlot  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  code           │   │  Product        │       │
//! │  │  unit_price     │   │  kind / value   │   │  Shipping       │       │
//! │  │  quantity       │   │  min / max      │   └─────────────────┘       │
//! │  └─────────────────┘   │  active         │                              │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CreateOrder-    │──►│ OrderConfirm-   │   │   OrderStatus   │       │
//! │  │ Request         │   │ ation           │   │  Pending        │       │
//! │  │ (draft → wire)  │   │ (store → UI)    │   │  Confirmed      │       │
//! │  └─────────────────┘   └─────────────────┘   │  Cancelled      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All JSON shapes are camelCase to match the browser client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Promotion Kind
// =============================================================================

/// How a promotion computes its discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionKind {
    /// `value` percent of the discounted amount.
    Percentage,
    /// `value` minor units off the merchandise subtotal.
    FixedAmount,
    /// `value` minor units off the shipping fee.
    ShippingDiscount,
}

impl PromotionKind {
    /// The slot this kind of promotion is allowed to occupy.
    pub const fn slot(&self) -> PromotionSlot {
        match self {
            PromotionKind::Percentage | PromotionKind::FixedAmount => PromotionSlot::Product,
            PromotionKind::ShippingDiscount => PromotionSlot::Shipping,
        }
    }

    /// Wire name, as stored and serialized.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PromotionKind::Percentage => "PERCENTAGE",
            PromotionKind::FixedAmount => "FIXED_AMOUNT",
            PromotionKind::ShippingDiscount => "SHIPPING_DISCOUNT",
        }
    }
}

impl fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Promotion Slot
// =============================================================================

/// One of the two independent places a promotion can be applied on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PromotionSlot {
    /// Discounts the merchandise subtotal.
    Product,
    /// Discounts the delivery fee.
    Shipping,
}

impl PromotionSlot {
    /// Whether a promotion of `kind` may be applied to this slot.
    pub const fn accepts(&self, kind: PromotionKind) -> bool {
        matches!(
            (self, kind.slot()),
            (PromotionSlot::Product, PromotionSlot::Product)
                | (PromotionSlot::Shipping, PromotionSlot::Shipping)
        )
    }
}

impl fmt::Display for PromotionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionSlot::Product => f.write_str("product"),
            PromotionSlot::Shipping => f.write_str("shipping"),
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A discount rule identified by a code.
///
/// Immutable once fetched from the promotion lookup.
///
/// ## Value Semantics
/// - `Percentage`: whole percent (10 = 10%)
/// - `FixedAmount` / `ShippingDiscount`: minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    /// Code typed by the operator (stored upper-case).
    pub code: String,
    /// Display name shown next to the applied code.
    pub name: String,
    pub kind: PromotionKind,
    pub value: i64,
    /// Minimum merchandise subtotal required (product slot only).
    pub min_order_value: Option<Money>,
    /// Upper bound on the computed discount.
    pub max_discount_amount: Option<Money>,
    pub active: bool,
}

impl Promotion {
    /// Creates an active promotion with no minimum and no cap.
    ///
    /// The code is normalized to upper-case and the id is a fresh UUID v4.
    pub fn new(code: impl Into<String>, kind: PromotionKind, value: i64) -> Self {
        let code = code.into().trim().to_uppercase();
        Promotion {
            id: uuid::Uuid::new_v4().to_string(),
            name: code.clone(),
            code,
            kind,
            value,
            min_order_value: None,
            max_discount_amount: None,
            active: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the minimum order value.
    pub fn with_min_order_value(mut self, min: Money) -> Self {
        self.min_order_value = Some(min);
        self
    }

    /// Sets the discount cap.
    pub fn with_max_discount(mut self, max: Money) -> Self {
        self.max_discount_amount = Some(max);
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A product line on an order being composed.
///
/// Product details are snapshotted when the line is added so that the draft
/// keeps a consistent price even if the catalogue changes meanwhile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(
        product_id: impl Into<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        LineItem {
            product_id: product_id.into(),
            sku: sku.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// Every figure shown in the order summary panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub product_discount: Money,
    pub discounted_subtotal: Money,
    pub shipping_fee: Money,
    pub shipping_discount: Money,
    pub discounted_shipping: Money,
    pub total_discount: Money,
    pub grand_total: Money,
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created by the operator, awaiting fulfilment.
    #[default]
    Pending,
    /// Accepted for fulfilment.
    Confirmed,
    /// Cancelled before fulfilment.
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// Create Order Request / Confirmation
// =============================================================================

/// What a finished draft turns into when the operator submits it.
///
/// Promotions travel by code; the receiving side re-resolves and re-prices
/// them rather than trusting client-side discount amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub line_items: Vec<LineItem>,
    pub shipping_fee: Money,
    pub product_promotion_code: Option<String>,
    pub shipping_promotion_code: Option<String>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
}

/// Returned by the order submitter once an order is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stored Orders
// =============================================================================

/// A submitted order as listed in order management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub product_promotion_code: Option<String>,
    pub shipping_promotion_code: Option<String>,
    pub totals: OrderTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A stored order line (frozen copy of the draft line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

// =============================================================================
// Search & Pagination
// =============================================================================

/// Filters for the promotion picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionFilter {
    /// Only promotions of this kind.
    pub kind: Option<PromotionKind>,
    /// Only promotions applicable to this slot.
    pub slot: Option<PromotionSlot>,
    /// Hide deactivated promotions.
    pub active_only: bool,
}

impl PromotionFilter {
    /// Whether `promotion` passes every filter that is set.
    pub fn matches(&self, promotion: &Promotion) -> bool {
        if self.active_only && !promotion.active {
            return false;
        }
        if let Some(kind) = self.kind {
            if promotion.kind != kind {
                return false;
            }
        }
        if let Some(slot) = self.slot {
            if !slot.accepts(promotion.kind) {
                return false;
            }
        }
        true
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }

    /// Row offset for SQL `OFFSET`. Page 0 is treated as page 1.
    pub fn offset(&self) -> u32 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit())
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: TS> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T: TS> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Page {
            items,
            total,
            page: request.page.max(1),
            page_size: request.limit(),
        }
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64) as u32
    }
}

/// Filters for the order management list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    /// Matches order number or customer name (substring, case-insensitive).
    pub keyword: Option<String>,
    pub status: Option<OrderStatus>,
    pub page: PageRequest,
}

// =============================================================================
// Unit Tests
// =============================================================================
