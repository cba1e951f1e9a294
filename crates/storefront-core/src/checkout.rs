//! # Checkout
//!
//! Glue between the draft, the pricing rules and the [`PromotionLookup`]
//! collaborator.
//!
//! ## Two Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types a code                                                 │
//! │    apply_promotion_code(draft, lookup, "ten", Product)                 │
//! │      normalize ─► lookup ─► None? PromotionNotFound                    │
//! │                           └► draft.apply_promotion(promo, slot)        │
//! │                                                                         │
//! │  Order is submitted                                                    │
//! │    price_request(lookup, request)                                      │
//! │      validate lines ─► resolve both codes ─► try_apply each slot       │
//! │      ─► compute_totals  (client figures are never trusted)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::draft::OrderDraft;
use crate::error::{CoreError, PromotionRejection};
use crate::money::Money;
use crate::ports::PromotionLookup;
use crate::pricing::{compute_subtotal, compute_totals, try_apply_promotion};
use crate::types::{CreateOrderRequest, OrderTotals, Promotion, PromotionFilter, PromotionSlot};
use crate::validation::{normalize_promotion_code, validate_amount, validate_line_item};
use crate::MAX_ORDER_LINES;

/// Checkout failures: a domain error or a failure of the lookup itself.
#[derive(Debug, Error)]
pub enum CheckoutError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Promotion lookup failed: {0}")]
    Lookup(#[source] E),
}

impl<E> CheckoutError<E>
where
    E: std::error::Error + 'static,
{
    /// The rejection, if the promotion was refused.
    pub fn as_rejection(&self) -> Option<&PromotionRejection> {
        match self {
            CheckoutError::Core(err) => err.as_rejection(),
            CheckoutError::Lookup(_) => None,
        }
    }
}

impl<E> From<PromotionRejection> for CheckoutError<E>
where
    E: std::error::Error + 'static,
{
    fn from(rejection: PromotionRejection) -> Self {
        CheckoutError::Core(CoreError::Rejected(rejection))
    }
}

/// Looks up `code` and applies it to `slot` of the draft.
///
/// Returns the discount granted. On any error the draft is unchanged.
pub async fn apply_promotion_code<L>(
    draft: &mut OrderDraft,
    lookup: &L,
    code: &str,
    slot: PromotionSlot,
) -> Result<Money, CheckoutError<L::Error>>
where
    L: PromotionLookup,
{
    let code = normalize_promotion_code(code).map_err(CoreError::from)?;
    let promotion = find(lookup, &code).await?;
    Ok(draft.apply_promotion(promotion, slot)?)
}

/// A promotion candidate and what it would do to the current draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPreview {
    pub promotion: Promotion,
    pub outcome: Result<Money, PromotionRejection>,
}

/// Lists promotions matching `keyword` for `slot`, each with the discount it
/// would grant to `draft` or the reason it would be refused.
///
/// Qualifying promotions come first, largest discount first.
pub async fn preview_promotions<L>(
    draft: &OrderDraft,
    lookup: &L,
    keyword: &str,
    slot: PromotionSlot,
) -> Result<Vec<PromotionPreview>, CheckoutError<L::Error>>
where
    L: PromotionLookup,
{
    let filter = PromotionFilter {
        slot: Some(slot),
        active_only: true,
        ..Default::default()
    };
    let candidates = lookup
        .search_promotions(keyword, &filter)
        .await
        .map_err(CheckoutError::Lookup)?;

    let subtotal = draft.subtotal();
    let mut previews: Vec<PromotionPreview> = candidates
        .into_iter()
        .map(|promotion| {
            let outcome = try_apply_promotion(&promotion, slot, subtotal, draft.shipping_fee());
            PromotionPreview { promotion, outcome }
        })
        .collect();

    previews.sort_by(|a, b| match (&a.outcome, &b.outcome) {
        (Ok(x), Ok(y)) => y.cmp(x),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.promotion.code.cmp(&b.promotion.code),
    });

    Ok(previews)
}

// =============================================================================
// Server-Side Repricing
// =============================================================================

/// An order request priced from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    /// Request with trimmed fields and canonical promotion codes.
    pub request: CreateOrderRequest,
    pub product_promotion: Option<Promotion>,
    pub shipping_promotion: Option<Promotion>,
    pub totals: OrderTotals,
}

/// Re-validates and re-prices a create-order request.
///
/// Any promotion code on the request must exist and qualify; unlike the
/// draft, a submitted order never carries a promotion worth zero.
pub async fn price_request<L>(
    lookup: &L,
    request: &CreateOrderRequest,
) -> Result<PricedOrder, CheckoutError<L::Error>>
where
    L: PromotionLookup,
{
    if request.line_items.is_empty() {
        return Err(CoreError::EmptyOrder.into());
    }
    if request.line_items.len() > MAX_ORDER_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_ORDER_LINES,
        }
        .into());
    }
    for item in &request.line_items {
        validate_line_item(item).map_err(CoreError::from)?;
    }
    validate_amount("shipping fee", request.shipping_fee).map_err(CoreError::from)?;

    let subtotal = compute_subtotal(&request.line_items);

    let product_promotion = resolve(lookup, request.product_promotion_code.as_deref()).await?;
    let product_discount = match &product_promotion {
        Some(promotion) => try_apply_promotion(
            promotion,
            PromotionSlot::Product,
            subtotal,
            request.shipping_fee,
        )?,
        None => Money::zero(),
    };

    let shipping_promotion = resolve(lookup, request.shipping_promotion_code.as_deref()).await?;
    let shipping_discount = match &shipping_promotion {
        Some(promotion) => try_apply_promotion(
            promotion,
            PromotionSlot::Shipping,
            subtotal,
            request.shipping_fee,
        )?,
        None => Money::zero(),
    };

    let totals = compute_totals(
        &request.line_items,
        request.shipping_fee,
        product_discount,
        shipping_discount,
    );

    let request = CreateOrderRequest {
        line_items: request.line_items.clone(),
        shipping_fee: request.shipping_fee,
        product_promotion_code: product_promotion.as_ref().map(|p| p.code.clone()),
        shipping_promotion_code: shipping_promotion.as_ref().map(|p| p.code.clone()),
        customer_name: clean(request.customer_name.as_deref()),
        note: clean(request.note.as_deref()),
    };

    Ok(PricedOrder {
        request,
        product_promotion,
        shipping_promotion,
        totals,
    })
}

async fn resolve<L>(
    lookup: &L,
    code: Option<&str>,
) -> Result<Option<Promotion>, CheckoutError<L::Error>>
where
    L: PromotionLookup,
{
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let code = normalize_promotion_code(code).map_err(CoreError::from)?;
    find(lookup, &code).await.map(Some)
}

async fn find<L>(lookup: &L, code: &str) -> Result<Promotion, CheckoutError<L::Error>>
where
    L: PromotionLookup,
{
    lookup
        .find_promotion_by_code(code)
        .await
        .map_err(CheckoutError::Lookup)?
        .ok_or_else(|| {
            PromotionRejection::PromotionNotFound {
                code: code.to_string(),
            }
            .into()
        })
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StaticPromotions;
    use crate::types::{LineItem, PromotionKind};

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    fn lookup() -> StaticPromotions {
        StaticPromotions::new([
            Promotion::new("TEN", PromotionKind::Percentage, 10)
                .with_min_order_value(m(10_000_000)),
            Promotion::new("BIG", PromotionKind::Percentage, 10)
                .with_min_order_value(m(30_000_000)),
            Promotion::new("FLAT", PromotionKind::FixedAmount, 500_000),
            Promotion::new("FREESHIP", PromotionKind::ShippingDiscount, 40_000),
            Promotion::new("OLD", PromotionKind::FixedAmount, 100).with_active(false),
        ])
    }

    fn phone_draft() -> OrderDraft {
        let mut draft = OrderDraft::new(m(40_000)).unwrap();
        draft
            .add_item(LineItem::new("phone", "PHONE-X", "Phone X", m(20_000_000), 1))
            .unwrap();
        draft
    }

    fn request(product: Option<&str>, shipping: Option<&str>) -> CreateOrderRequest {
        CreateOrderRequest {
            line_items: vec![LineItem::new("phone", "PHONE-X", "Phone X", m(20_000_000), 1)],
            shipping_fee: m(40_000),
            product_promotion_code: product.map(str::to_string),
            shipping_promotion_code: shipping.map(str::to_string),
            customer_name: Some(" Tran Thi B ".to_string()),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_apply_code_found() {
        let mut draft = phone_draft();
        let discount = apply_promotion_code(&mut draft, &lookup(), "ten", PromotionSlot::Product)
            .await
            .unwrap();

        assert_eq!(discount, m(2_000_000));
        assert_eq!(draft.totals().grand_total, m(18_040_000));
    }

    #[tokio::test]
    async fn test_apply_code_not_found() {
        let mut draft = phone_draft();
        let before = draft.clone();

        let err = apply_promotion_code(&mut draft, &lookup(), "NOPE", PromotionSlot::Product)
            .await
            .unwrap_err();

        assert_eq!(
            err.as_rejection(),
            Some(&PromotionRejection::PromotionNotFound {
                code: "NOPE".to_string()
            })
        );
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn test_apply_code_rejected() {
        let mut draft = phone_draft();
        let err = apply_promotion_code(&mut draft, &lookup(), "BIG", PromotionSlot::Product)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_rejection().map(PromotionRejection::code),
            Some("BELOW_MINIMUM_ORDER")
        );

        let err = apply_promotion_code(&mut draft, &lookup(), "FREESHIP", PromotionSlot::Product)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_rejection().map(PromotionRejection::code),
            Some("WRONG_SLOT_KIND")
        );

        assert!(draft.promotion(PromotionSlot::Product).is_none());
    }

    #[tokio::test]
    async fn test_apply_code_invalid_format() {
        let mut draft = phone_draft();
        let err = apply_promotion_code(&mut draft, &lookup(), "two words", PromotionSlot::Product)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_preview_orders_qualifying_first() {
        let draft = phone_draft();
        let previews = preview_promotions(&draft, &lookup(), "", PromotionSlot::Product)
            .await
            .unwrap();

        let codes: Vec<&str> = previews.iter().map(|p| p.promotion.code.as_str()).collect();
        // OLD is inactive and filtered out; BIG does not qualify.
        assert_eq!(codes, vec!["TEN", "FLAT", "BIG"]);
        assert_eq!(previews[0].outcome, Ok(m(2_000_000)));
        assert!(previews[2].outcome.is_err());
    }

    #[tokio::test]
    async fn test_price_request() {
        let priced = price_request(&lookup(), &request(Some("ten"), Some("freeship")))
            .await
            .unwrap();

        assert_eq!(priced.totals.subtotal, m(20_000_000));
        assert_eq!(priced.totals.product_discount, m(2_000_000));
        assert_eq!(priced.totals.shipping_discount, m(40_000));
        assert_eq!(priced.totals.grand_total, m(18_000_000));
        assert_eq!(priced.request.product_promotion_code.as_deref(), Some("TEN"));
        assert_eq!(
            priced.request.shipping_promotion_code.as_deref(),
            Some("FREESHIP")
        );
        assert_eq!(priced.request.customer_name.as_deref(), Some("Tran Thi B"));
    }

    #[tokio::test]
    async fn test_price_request_without_codes() {
        let priced = price_request(&lookup(), &request(None, Some("  ")))
            .await
            .unwrap();
        assert!(priced.product_promotion.is_none());
        assert!(priced.shipping_promotion.is_none());
        assert_eq!(priced.totals.grand_total, m(20_040_000));
    }

    #[tokio::test]
    async fn test_price_request_rejects() {
        let err = price_request(&lookup(), &request(Some("BIG"), None))
            .await
            .unwrap_err();
        assert_eq!(
            err.as_rejection().map(PromotionRejection::code),
            Some("BELOW_MINIMUM_ORDER")
        );

        let err = price_request(&lookup(), &request(Some("OLD"), None))
            .await
            .unwrap_err();
        assert_eq!(err.as_rejection().map(PromotionRejection::code), Some("INACTIVE"));

        let err = price_request(&lookup(), &request(None, Some("MISSING")))
            .await
            .unwrap_err();
        assert_eq!(
            err.as_rejection().map(PromotionRejection::code),
            Some("PROMOTION_NOT_FOUND")
        );
    }

    #[tokio::test]
    async fn test_price_request_empty() {
        let mut empty = request(None, None);
        empty.line_items.clear();
        let err = price_request(&lookup(), &empty).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyOrder)));
    }

    #[tokio::test]
    async fn test_price_request_rejects_oversized_amounts() {
        let mut bad = request(None, None);
        let huge = m(i64::MAX / 2 + 1);
        bad.line_items = vec![
            LineItem::new("a", "HUGE-A", "Huge A", huge, 1),
            LineItem::new("b", "HUGE-B", "Huge B", huge, 1),
        ];
        let err = price_request(&lookup(), &bad).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::Validation(
                crate::error::ValidationError::OutOfRange { .. }
            ))
        ));

        let mut bad_fee = request(None, None);
        bad_fee.shipping_fee = m(crate::MAX_AMOUNT + 1);
        let err = price_request(&lookup(), &bad_fee).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_price_request_invalid_line() {
        let mut bad = request(None, None);
        bad.line_items[0].quantity = 0;
        let err = price_request(&lookup(), &bad).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::Validation(_))));
    }
}
