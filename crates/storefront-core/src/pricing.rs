//! # Pricing Module
//!
//! Stateless order pricing: subtotal, promotion eligibility and totals.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Pricing                                    │
//! │                                                                         │
//! │  line items ──► compute_subtotal ──► subtotal                           │
//! │                                         │                               │
//! │   product promotion ──► try_apply_promotion(Product) ──► product disc.  │
//! │  shipping promotion ──► try_apply_promotion(Shipping) ─► shipping disc. │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                                   compute_totals                        │
//! │                                         │                               │
//! │          discounted subtotal + discounted shipping = grand total        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: same input, same output, nothing retained
//! between calls. The order draft and the checkout layer build on them.

use crate::error::{CoreError, CoreResult, PromotionRejection};
use crate::money::Money;
use crate::types::{LineItem, OrderTotals, Promotion, PromotionKind, PromotionSlot};
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Subtotal
// =============================================================================

/// Sum of `unit_price × quantity` over all lines. Zero for an empty cart.
///
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::pricing::compute_subtotal;
/// use storefront_core::types::LineItem;
///
/// let items = vec![
///     LineItem::new("p1", "CASE-1", "Case", Money::from_minor(150_000), 2),
///     LineItem::new("p2", "CABLE-1", "Cable", Money::from_minor(90_000), 1),
/// ];
/// assert_eq!(compute_subtotal(&items).minor(), 390_000);
/// assert!(compute_subtotal(&[]).is_zero());
/// ```
pub fn compute_subtotal(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

// =============================================================================
// Promotion Eligibility
// =============================================================================

/// Computes the discount `promotion` grants in `slot`.
///
/// ## Checks (in order)
/// 1. Kind must match the slot → `WrongSlotKind`
/// 2. Product slot only: `subtotal ≥ min_order_value` → `BelowMinimumOrder`
/// 3. Promotion must be active → `Inactive`
///
/// ## Discount
/// ```text
/// base = subtotal (product slot) | shipping_fee (shipping slot)
///
/// PERCENTAGE                      raw = base × value / 100
/// FIXED_AMOUNT / SHIPPING_DISCOUNT raw = min(value, base)
///
/// discount = min(raw, max_discount_amount ?? raw), clamped to [0, base]
/// ```
///
/// ## Example
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::pricing::try_apply_promotion;
/// use storefront_core::types::{Promotion, PromotionKind, PromotionSlot};
///
/// let half_off = Promotion::new("HALF", PromotionKind::Percentage, 50)
///     .with_max_discount(Money::from_minor(50_000));
///
/// let discount = try_apply_promotion(
///     &half_off,
///     PromotionSlot::Product,
///     Money::from_minor(1_000_000),
///     Money::zero(),
/// )
/// .unwrap();
/// assert_eq!(discount.minor(), 50_000);
/// ```
pub fn try_apply_promotion(
    promotion: &Promotion,
    slot: PromotionSlot,
    subtotal: Money,
    shipping_fee: Money,
) -> Result<Money, PromotionRejection> {
    if !slot.accepts(promotion.kind) {
        return Err(PromotionRejection::WrongSlotKind {
            code: promotion.code.clone(),
            kind: promotion.kind,
            slot,
        });
    }

    if slot == PromotionSlot::Product {
        if let Some(min_order_value) = promotion.min_order_value {
            if subtotal < min_order_value {
                return Err(PromotionRejection::BelowMinimumOrder {
                    code: promotion.code.clone(),
                    min_order_value,
                    subtotal,
                });
            }
        }
    }

    if !promotion.active {
        return Err(PromotionRejection::Inactive {
            code: promotion.code.clone(),
        });
    }

    let base = match slot {
        PromotionSlot::Product => subtotal,
        PromotionSlot::Shipping => shipping_fee,
    };

    let raw = match promotion.kind {
        PromotionKind::Percentage => base.percentage(promotion.value),
        PromotionKind::FixedAmount | PromotionKind::ShippingDiscount => {
            Money::from_minor(promotion.value).clamp_to(base)
        }
    };

    let capped = match promotion.max_discount_amount {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    Ok(capped.clamp_to(base))
}

/// Discount for an already-applied promotion after its base changed.
///
/// A promotion that no longer qualifies grants nothing; it is not an error
/// because the operator did not ask to apply anything.
pub fn refresh_discount(
    promotion: Option<&Promotion>,
    slot: PromotionSlot,
    subtotal: Money,
    shipping_fee: Money,
) -> Money {
    promotion
        .and_then(|p| try_apply_promotion(p, slot, subtotal, shipping_fee).ok())
        .unwrap_or_default()
}

// =============================================================================
// Totals
// =============================================================================

/// Computes every figure of the order summary.
///
/// Discounts are expected to come from [`try_apply_promotion`]; they are
/// clamped to their base again here so that the summary can never show a
/// negative amount.
///
/// ```text
/// discounted_subtotal = subtotal - product_discount
/// discounted_shipping = shipping_fee - shipping_discount
/// total_discount      = product_discount + shipping_discount
/// grand_total         = discounted_subtotal + discounted_shipping
/// ```
pub fn compute_totals(
    items: &[LineItem],
    shipping_fee: Money,
    product_discount: Money,
    shipping_discount: Money,
) -> OrderTotals {
    summarize(
        compute_subtotal(items),
        shipping_fee,
        product_discount,
        shipping_discount,
    )
}

/// [`compute_totals`] for a subtotal that is already known, e.g. one read
/// back from storage.
pub fn summarize(
    subtotal: Money,
    shipping_fee: Money,
    product_discount: Money,
    shipping_discount: Money,
) -> OrderTotals {
    let product_discount = product_discount.clamp_to(subtotal);
    let shipping_discount = shipping_discount.clamp_to(shipping_fee);

    let discounted_subtotal = subtotal.saturating_sub_to_zero(product_discount);
    let discounted_shipping = shipping_fee.saturating_sub_to_zero(shipping_discount);

    OrderTotals {
        subtotal,
        product_discount,
        discounted_subtotal,
        shipping_fee,
        shipping_discount,
        discounted_shipping,
        total_discount: product_discount + shipping_discount,
        grand_total: discounted_subtotal + discounted_shipping,
    }
}

// =============================================================================
// Recalculation on Mutation
// =============================================================================

/// New line items plus the refreshed product discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recalculation {
    pub items: Vec<LineItem>,
    pub product_discount: Money,
}

/// Sets the quantity of line `changed_index` and re-prices the product slot.
///
/// ## Behavior
/// - `new_quantity ≤ 0` removes the line
/// - `new_quantity > MAX_LINE_QUANTITY` → `QuantityTooLarge`
/// - unknown index → `LineItemNotFound`
/// - the product promotion, if any, is re-applied to the new subtotal and
///   falls back to zero when it no longer qualifies
///
/// The input slice is not modified.
pub fn recalculate_on_quantity_change(
    items: &[LineItem],
    changed_index: usize,
    new_quantity: i64,
    current_product_promotion: Option<&Promotion>,
) -> CoreResult<Recalculation> {
    if changed_index >= items.len() {
        return Err(CoreError::LineItemNotFound {
            index: changed_index,
            len: items.len(),
        });
    }

    if new_quantity > MAX_LINE_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: new_quantity,
            max: MAX_LINE_QUANTITY,
        });
    }

    let mut next = items.to_vec();
    if new_quantity <= 0 {
        next.remove(changed_index);
    } else {
        next[changed_index].quantity = new_quantity;
    }

    Ok(reprice(next, current_product_promotion))
}

/// Removes line `index` and re-prices the product slot.
pub fn recalculate_on_item_removal(
    items: &[LineItem],
    index: usize,
    current_product_promotion: Option<&Promotion>,
) -> CoreResult<Recalculation> {
    recalculate_on_quantity_change(items, index, 0, current_product_promotion)
}

fn reprice(items: Vec<LineItem>, product_promotion: Option<&Promotion>) -> Recalculation {
    let subtotal = compute_subtotal(&items);
    // Shipping fee is irrelevant to the product slot.
    let product_discount =
        refresh_discount(product_promotion, PromotionSlot::Product, subtotal, Money::zero());
    Recalculation {
        items,
        product_discount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, qty: i64) -> LineItem {
        LineItem::new(
            format!("p-{}", price),
            format!("SKU-{}", price),
            format!("Product {}", price),
            Money::from_minor(price),
            qty,
        )
    }

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let items = vec![item(100, 3), item(250, 2)];
        assert_eq!(compute_subtotal(&items), m(800));
        assert_eq!(compute_subtotal(&[]), Money::zero());
    }

    #[test]
    fn test_subtotal_non_decreasing_in_quantity() {
        let mut items = vec![item(1_999, 1), item(0, 1), item(5, 4)];
        let mut previous = compute_subtotal(&items);
        for qty in 2..50 {
            items[0].quantity = qty;
            items[2].quantity = qty * 2;
            let current = compute_subtotal(&items);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_percentage_without_cap() {
        let promo = Promotion::new("TEN", PromotionKind::Percentage, 10);
        let discount =
            try_apply_promotion(&promo, PromotionSlot::Product, m(1_000_000), Money::zero());
        assert_eq!(discount, Ok(m(100_000)));
    }

    #[test]
    fn test_percentage_cap_applies() {
        let promo = Promotion::new("HALF", PromotionKind::Percentage, 50)
            .with_max_discount(m(50_000));
        let discount =
            try_apply_promotion(&promo, PromotionSlot::Product, m(1_000_000), Money::zero());
        assert_eq!(discount, Ok(m(50_000)));
    }

    #[test]
    fn test_fixed_amount_clamped_to_subtotal() {
        let promo = Promotion::new("BIG", PromotionKind::FixedAmount, 500_000);
        let discount =
            try_apply_promotion(&promo, PromotionSlot::Product, m(300_000), Money::zero());
        assert_eq!(discount, Ok(m(300_000)));
    }

    #[test]
    fn test_shipping_discount_clamped_to_fee() {
        let promo = Promotion::new("SHIP", PromotionKind::ShippingDiscount, 100_000);
        let discount =
            try_apply_promotion(&promo, PromotionSlot::Shipping, m(5_000_000), m(40_000));
        assert_eq!(discount, Ok(m(40_000)));
    }

    #[test]
    fn test_shipping_slot_ignores_min_order_value() {
        let promo = Promotion::new("SHIP", PromotionKind::ShippingDiscount, 10_000)
            .with_min_order_value(m(99_000_000));
        let discount = try_apply_promotion(&promo, PromotionSlot::Shipping, m(1), m(40_000));
        assert_eq!(discount, Ok(m(10_000)));
    }

    #[test]
    fn test_shipping_promotion_in_product_slot_always_rejected() {
        let variants = [
            Promotion::new("S1", PromotionKind::ShippingDiscount, 0),
            Promotion::new("S2", PromotionKind::ShippingDiscount, 40_000).with_active(false),
            Promotion::new("S3", PromotionKind::ShippingDiscount, 40_000)
                .with_min_order_value(m(1))
                .with_max_discount(m(1)),
        ];
        for promo in &variants {
            for subtotal in [0, 1, 1_000_000_000] {
                let result =
                    try_apply_promotion(promo, PromotionSlot::Product, m(subtotal), m(40_000));
                assert!(matches!(
                    result,
                    Err(PromotionRejection::WrongSlotKind {
                        slot: PromotionSlot::Product,
                        ..
                    })
                ));
            }
        }
    }

    #[test]
    fn test_product_promotion_in_shipping_slot_rejected() {
        for kind in [PromotionKind::Percentage, PromotionKind::FixedAmount] {
            let promo = Promotion::new("P", kind, 10);
            let result = try_apply_promotion(&promo, PromotionSlot::Shipping, m(100), m(100));
            assert!(matches!(
                result,
                Err(PromotionRejection::WrongSlotKind { .. })
            ));
        }
    }

    #[test]
    fn test_below_minimum_order() {
        let promo = Promotion::new("MIN", PromotionKind::Percentage, 10)
            .with_min_order_value(m(30_000_000));
        let result =
            try_apply_promotion(&promo, PromotionSlot::Product, m(20_000_000), m(40_000));
        assert_eq!(
            result,
            Err(PromotionRejection::BelowMinimumOrder {
                code: "MIN".to_string(),
                min_order_value: m(30_000_000),
                subtotal: m(20_000_000),
            })
        );
    }

    #[test]
    fn test_minimum_order_is_inclusive() {
        let promo = Promotion::new("MIN", PromotionKind::FixedAmount, 1_000)
            .with_min_order_value(m(10_000));
        let result = try_apply_promotion(&promo, PromotionSlot::Product, m(10_000), Money::zero());
        assert_eq!(result, Ok(m(1_000)));
    }

    #[test]
    fn test_inactive_rejected() {
        let promo = Promotion::new("OLD", PromotionKind::FixedAmount, 1_000).with_active(false);
        let result = try_apply_promotion(&promo, PromotionSlot::Product, m(10_000), Money::zero());
        assert_eq!(
            result,
            Err(PromotionRejection::Inactive {
                code: "OLD".to_string()
            })
        );
    }

    #[test]
    fn test_rejection_order_slot_before_minimum_before_active() {
        let promo = Promotion::new("X", PromotionKind::Percentage, 10)
            .with_min_order_value(m(1_000))
            .with_active(false);

        let wrong_slot = try_apply_promotion(&promo, PromotionSlot::Shipping, m(0), m(0));
        assert!(matches!(wrong_slot, Err(PromotionRejection::WrongSlotKind { .. })));

        let below = try_apply_promotion(&promo, PromotionSlot::Product, m(0), m(0));
        assert!(matches!(below, Err(PromotionRejection::BelowMinimumOrder { .. })));

        let inactive = try_apply_promotion(&promo, PromotionSlot::Product, m(1_000), m(0));
        assert!(matches!(inactive, Err(PromotionRejection::Inactive { .. })));
    }

    #[test]
    fn test_oversized_lines_saturate_instead_of_overflowing() {
        let huge = i64::MAX / 2 + 1;
        let items = vec![item(huge, 1), item(huge, 1)];

        assert_eq!(compute_subtotal(&items), m(i64::MAX));

        let totals = compute_totals(&items, m(40_000), Money::zero(), Money::zero());
        assert!(totals.grand_total >= Money::zero());
        assert_eq!(totals.grand_total, m(i64::MAX));
    }

    #[test]
    fn test_largest_valid_order_is_exact() {
        let items: Vec<LineItem> = (0..crate::MAX_ORDER_LINES)
            .map(|i| {
                LineItem::new(
                    format!("p-{}", i),
                    format!("SKU-{}", i),
                    "Max",
                    m(crate::MAX_AMOUNT),
                    MAX_LINE_QUANTITY,
                )
            })
            .collect();
        let expected = crate::MAX_AMOUNT * MAX_LINE_QUANTITY * crate::MAX_ORDER_LINES as i64;

        let totals = compute_totals(&items, m(crate::MAX_AMOUNT), Money::zero(), Money::zero());
        assert_eq!(totals.subtotal, m(expected));
        assert_eq!(totals.grand_total, m(expected + crate::MAX_AMOUNT));
    }

    #[test]
    fn test_discount_never_exceeds_base() {
        let promos = [
            Promotion::new("A", PromotionKind::Percentage, 100),
            Promotion::new("B", PromotionKind::FixedAmount, i64::MAX / 4),
            Promotion::new("C", PromotionKind::Percentage, 75).with_max_discount(m(1_000_000)),
        ];
        for promo in &promos {
            for subtotal in [0, 1, 99, 12_345, 20_000_000] {
                let discount =
                    try_apply_promotion(promo, PromotionSlot::Product, m(subtotal), Money::zero())
                        .unwrap();
                assert!(discount >= Money::zero());
                assert!(discount <= m(subtotal));
                if let Some(cap) = promo.max_discount_amount {
                    assert!(discount <= cap);
                }
            }
        }
    }

    #[test]
    fn test_totals_identity() {
        let items = vec![item(1_250_000, 2), item(75_000, 3)];
        let subtotal = compute_subtotal(&items);
        let fee = m(35_000);

        for (pd, sd) in [(0, 0), (100_000, 35_000), (subtotal.minor(), 10_000)] {
            let totals = compute_totals(&items, fee, m(pd), m(sd));
            assert_eq!(
                totals.grand_total,
                subtotal - m(pd) + fee - m(sd),
                "pd={pd} sd={sd}"
            );
            assert_eq!(totals.total_discount, m(pd + sd));
            assert!(totals.grand_total >= Money::zero());
        }
    }

    #[test]
    fn test_totals_clamp_oversized_discounts() {
        let items = vec![item(1_000, 1)];
        let totals = compute_totals(&items, m(500), m(9_999), m(9_999));
        assert_eq!(totals.product_discount, m(1_000));
        assert_eq!(totals.shipping_discount, m(500));
        assert_eq!(totals.grand_total, Money::zero());
    }

    #[test]
    fn test_scenario_both_slots() {
        let items = vec![item(20_000_000, 1)];
        let fee = m(40_000);
        let subtotal = compute_subtotal(&items);

        let product = Promotion::new("TEN", PromotionKind::Percentage, 10)
            .with_min_order_value(m(10_000_000));
        let shipping = Promotion::new("FREESHIP", PromotionKind::ShippingDiscount, 40_000);

        let pd = try_apply_promotion(&product, PromotionSlot::Product, subtotal, fee).unwrap();
        let sd = try_apply_promotion(&shipping, PromotionSlot::Shipping, subtotal, fee).unwrap();
        let totals = compute_totals(&items, fee, pd, sd);

        assert_eq!(totals.discounted_subtotal, m(18_000_000));
        assert_eq!(totals.discounted_shipping, Money::zero());
        assert_eq!(totals.grand_total, m(18_000_000));
    }

    #[test]
    fn test_scenario_minimum_not_met_leaves_totals() {
        let items = vec![item(20_000_000, 1)];
        let fee = m(40_000);
        let subtotal = compute_subtotal(&items);

        let product = Promotion::new("BIG", PromotionKind::Percentage, 10)
            .with_min_order_value(m(30_000_000));

        let result = try_apply_promotion(&product, PromotionSlot::Product, subtotal, fee);
        assert!(matches!(
            result,
            Err(PromotionRejection::BelowMinimumOrder { .. })
        ));

        let pd = result.unwrap_or_default();
        assert_eq!(pd, Money::zero());

        let totals = compute_totals(&items, fee, pd, Money::zero());
        assert_eq!(totals.discounted_subtotal, m(20_000_000));
        assert_eq!(totals.grand_total, m(20_040_000));
    }

    #[test]
    fn test_quantity_change_refreshes_discount() {
        let items = vec![item(1_000_000, 1)];
        let promo = Promotion::new("TEN", PromotionKind::Percentage, 10);

        let result = recalculate_on_quantity_change(&items, 0, 3, Some(&promo)).unwrap();
        assert_eq!(result.items[0].quantity, 3);
        assert_eq!(result.product_discount, m(300_000));
        // input untouched
        assert_eq!(items[0].quantity, 1);
    }

    #[test]
    fn test_quantity_change_drops_discount_below_minimum() {
        let items = vec![item(1_000_000, 3)];
        let promo = Promotion::new("MIN", PromotionKind::FixedAmount, 200_000)
            .with_min_order_value(m(2_000_000));

        let result = recalculate_on_quantity_change(&items, 0, 1, Some(&promo)).unwrap();
        assert_eq!(result.product_discount, Money::zero());

        let back = recalculate_on_quantity_change(&result.items, 0, 2, Some(&promo)).unwrap();
        assert_eq!(back.product_discount, m(200_000));
    }

    #[test]
    fn test_quantity_zero_removes_line() {
        let items = vec![item(100, 1), item(200, 1)];
        let result = recalculate_on_quantity_change(&items, 0, 0, None).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].unit_price, m(200));
        assert_eq!(result.product_discount, Money::zero());

        let negative = recalculate_on_quantity_change(&items, 1, -4, None).unwrap();
        assert_eq!(negative.items.len(), 1);
    }

    #[test]
    fn test_quantity_change_errors() {
        let items = vec![item(100, 1)];
        assert_eq!(
            recalculate_on_quantity_change(&items, 5, 1, None),
            Err(CoreError::LineItemNotFound { index: 5, len: 1 })
        );
        assert!(matches!(
            recalculate_on_quantity_change(&items, 0, MAX_LINE_QUANTITY + 1, None),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_item_removal_reprices() {
        let items = vec![item(600_000, 1), item(500_000, 1)];
        let promo = Promotion::new("MIN", PromotionKind::FixedAmount, 100_000)
            .with_min_order_value(m(1_000_000));

        let result = recalculate_on_item_removal(&items, 1, Some(&promo)).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.product_discount, Money::zero());
    }
}
