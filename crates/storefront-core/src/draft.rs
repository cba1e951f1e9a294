//! # Order Draft
//!
//! The order being composed on the "create order" screen.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Draft Operations                               │
//! │                                                                         │
//! │  Operator Action         Draft Method             State Change          │
//! │  ───────────────         ────────────             ────────────          │
//! │                                                                         │
//! │  Pick product ─────────► add_item() ────────────► items.push / qty += n │
//! │  Change quantity ──────► update_quantity() ─────► items[i].qty = n      │
//! │  Click remove ─────────► remove_item() ─────────► items.remove(i)       │
//! │  Edit shipping fee ────► set_shipping_fee() ────► shipping_fee = x      │
//! │  Enter code ───────────► apply_promotion() ─────► slot = Some(promo)    │
//! │  Clear code ───────────► remove_promotion() ────► slot = None           │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                      recompute() (single path)                          │
//! │                      refresh both slot discounts                        │
//! │                                                                         │
//! │  Submit ───────────────► into_request() ────────► CreateOrderRequest    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding again increases quantity)
//! - Every line has `1 ≤ quantity ≤ MAX_LINE_QUANTITY`
//! - Each slot holds at most one promotion of a kind the slot accepts
//! - Each slot discount is in `[0, base]` and respects the promotion cap
//! - A rejected operation leaves the draft unchanged
//!
//! The draft is owned exclusively by its caller; it never performs I/O.

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, PromotionRejection};
use crate::money::Money;
use crate::pricing::{
    compute_subtotal, compute_totals, recalculate_on_item_removal,
    recalculate_on_quantity_change, refresh_discount, try_apply_promotion, Recalculation,
};
use crate::types::{CreateOrderRequest, LineItem, OrderTotals, Promotion, PromotionSlot};
use crate::validation::{validate_amount, validate_line_item};
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// An order under composition: lines, shipping fee and two promotion slots.
///
/// Deserializing re-derives both discounts from the promotions, so a stored
/// or client-supplied draft cannot carry amounts of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    items: Vec<LineItem>,
    shipping_fee: Money,
    product_promotion: Option<Promotion>,
    shipping_promotion: Option<Promotion>,
    product_discount: Money,
    shipping_discount: Money,
}

impl OrderDraft {
    /// Creates an empty draft with the given shipping fee.
    pub fn new(shipping_fee: Money) -> CoreResult<Self> {
        validate_amount("shipping fee", shipping_fee)?;
        Ok(OrderDraft {
            shipping_fee,
            ..Default::default()
        })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merchandise subtotal before discounts.
    pub fn subtotal(&self) -> Money {
        compute_subtotal(&self.items)
    }

    /// The promotion currently held by `slot`.
    pub fn promotion(&self, slot: PromotionSlot) -> Option<&Promotion> {
        match slot {
            PromotionSlot::Product => self.product_promotion.as_ref(),
            PromotionSlot::Shipping => self.shipping_promotion.as_ref(),
        }
    }

    /// The discount `slot` currently grants.
    ///
    /// Zero when the slot is empty or its promotion no longer qualifies.
    pub fn discount(&self, slot: PromotionSlot) -> Money {
        match slot {
            PromotionSlot::Product => self.product_discount,
            PromotionSlot::Shipping => self.shipping_discount,
        }
    }

    /// Full order summary.
    pub fn totals(&self) -> OrderTotals {
        compute_totals(
            &self.items,
            self.shipping_fee,
            self.product_discount,
            self.shipping_discount,
        )
    }

    // =========================================================================
    // Line Mutations
    // =========================================================================

    /// Adds a line or increases the quantity of an existing one.
    ///
    /// ## Behavior
    /// - Same `product_id` already present: quantities are merged, the
    ///   snapshot price of the existing line is kept
    /// - New product: appended, subject to `MAX_ORDER_LINES`
    pub fn add_item(&mut self, item: LineItem) -> CoreResult<()> {
        validate_line_item(&item)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            let merged = existing.quantity + item.quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_LINE_QUANTITY,
                });
            }
            existing.quantity = merged;
        } else {
            if self.items.len() >= MAX_ORDER_LINES {
                return Err(CoreError::CartTooLarge {
                    max: MAX_ORDER_LINES,
                });
            }
            self.items.push(item);
        }

        self.recompute();
        Ok(())
    }

    /// Sets the quantity of line `index`; zero or less removes it.
    pub fn update_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        let next = recalculate_on_quantity_change(
            &self.items,
            index,
            quantity,
            self.product_promotion.as_ref(),
        )?;
        self.accept(next);
        Ok(())
    }

    /// Removes line `index`.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        let removed = self
            .items
            .get(index)
            .cloned()
            .ok_or(CoreError::LineItemNotFound {
                index,
                len: self.items.len(),
            })?;
        let next =
            recalculate_on_item_removal(&self.items, index, self.product_promotion.as_ref())?;
        self.accept(next);
        Ok(removed)
    }

    /// Replaces the shipping fee and re-prices the shipping slot.
    pub fn set_shipping_fee(&mut self, fee: Money) -> CoreResult<()> {
        validate_amount("shipping fee", fee)?;
        self.shipping_fee = fee;
        self.recompute();
        Ok(())
    }

    /// Empties the draft, keeping the shipping fee.
    pub fn clear(&mut self) {
        let fee = self.shipping_fee;
        *self = OrderDraft {
            shipping_fee: fee,
            ..Default::default()
        };
    }

    // =========================================================================
    // Promotion Slots
    // =========================================================================

    /// Puts `promotion` into `slot` and returns the discount it grants.
    ///
    /// Replaces whatever the slot held. On rejection nothing changes, so a
    /// previously applied promotion stays in place.
    pub fn apply_promotion(
        &mut self,
        promotion: Promotion,
        slot: PromotionSlot,
    ) -> Result<Money, PromotionRejection> {
        let discount = try_apply_promotion(&promotion, slot, self.subtotal(), self.shipping_fee)?;

        match slot {
            PromotionSlot::Product => {
                self.product_promotion = Some(promotion);
                self.product_discount = discount;
            }
            PromotionSlot::Shipping => {
                self.shipping_promotion = Some(promotion);
                self.shipping_discount = discount;
            }
        }

        Ok(discount)
    }

    /// Empties `slot` and returns the promotion it held.
    pub fn remove_promotion(&mut self, slot: PromotionSlot) -> Option<Promotion> {
        let removed = match slot {
            PromotionSlot::Product => self.product_promotion.take(),
            PromotionSlot::Shipping => self.shipping_promotion.take(),
        };
        self.recompute();
        removed
    }

    /// Whether the promotion in `slot` currently qualifies.
    pub fn slot_qualifies(&self, slot: PromotionSlot) -> bool {
        self.promotion(slot).is_some_and(|p| {
            try_apply_promotion(p, slot, self.subtotal(), self.shipping_fee).is_ok()
        })
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Converts the draft into a create-order request.
    ///
    /// Only promotions that currently qualify are sent; a held promotion
    /// whose minimum is no longer met contributes nothing and is left out.
    pub fn into_request(
        self,
        customer_name: Option<String>,
        note: Option<String>,
    ) -> CoreResult<CreateOrderRequest> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        let product_promotion_code = self
            .slot_qualifies(PromotionSlot::Product)
            .then(|| self.product_promotion.as_ref().map(|p| p.code.clone()))
            .flatten();
        let shipping_promotion_code = self
            .slot_qualifies(PromotionSlot::Shipping)
            .then(|| self.shipping_promotion.as_ref().map(|p| p.code.clone()))
            .flatten();

        Ok(CreateOrderRequest {
            line_items: self.items,
            shipping_fee: self.shipping_fee,
            product_promotion_code,
            shipping_promotion_code,
            customer_name: trimmed(customer_name),
            note: trimmed(note),
        })
    }

    // =========================================================================
    // Recomputation
    // =========================================================================

    fn accept(&mut self, next: Recalculation) {
        self.items = next.items;
        self.product_discount = next.product_discount;
        self.shipping_discount = refresh_discount(
            self.shipping_promotion.as_ref(),
            PromotionSlot::Shipping,
            self.subtotal(),
            self.shipping_fee,
        );
    }

    fn recompute(&mut self) {
        let subtotal = self.subtotal();
        self.product_discount = refresh_discount(
            self.product_promotion.as_ref(),
            PromotionSlot::Product,
            subtotal,
            self.shipping_fee,
        );
        self.shipping_discount = refresh_discount(
            self.shipping_promotion.as_ref(),
            PromotionSlot::Shipping,
            subtotal,
            self.shipping_fee,
        );
    }
}

/// Wire shape of [`OrderDraft`]; the discounts are accepted and discarded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftSnapshot {
    #[serde(default)]
    items: Vec<LineItem>,
    shipping_fee: Money,
    #[serde(default)]
    product_promotion: Option<Promotion>,
    #[serde(default)]
    shipping_promotion: Option<Promotion>,
}

impl<'de> Deserialize<'de> for OrderDraft {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = DraftSnapshot::deserialize(deserializer)?;
        let mut draft = OrderDraft {
            items: snapshot.items,
            shipping_fee: snapshot.shipping_fee,
            product_promotion: snapshot.product_promotion,
            shipping_promotion: snapshot.shipping_promotion,
            ..Default::default()
        };
        draft.recompute();
        Ok(draft)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
