//! # Collaborator Ports
//!
//! Traits for the two things the pricing logic needs from the outside
//! world. `storefront-db` implements both against SQLite; tests and the
//! offline preview use [`StaticPromotions`].
//!
//! ```text
//! ┌──────────────────┐   find_promotion_by_code   ┌──────────────────────┐
//! │    checkout      │ ─────────────────────────► │   PromotionLookup    │
//! │ apply / reprice  │                            │ (PromotionRepository)│
//! └────────┬─────────┘                            └──────────────────────┘
//!          │ submit_order
//!          ▼
//! ┌──────────────────────┐
//! │    OrderSubmitter    │
//! │  (OrderRepository)   │
//! └──────────────────────┘
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;

use crate::types::{CreateOrderRequest, OrderConfirmation, Promotion, PromotionFilter};

/// Resolves promotion codes.
pub trait PromotionLookup {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finds a promotion by code, case-insensitively.
    ///
    /// Inactive promotions are returned too; eligibility decides what to do
    /// with them.
    fn find_promotion_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Promotion>, Self::Error>> + Send;

    /// Promotions whose code or name contains `keyword`, filtered.
    fn search_promotions(
        &self,
        keyword: &str,
        filter: &PromotionFilter,
    ) -> impl Future<Output = Result<Vec<Promotion>, Self::Error>> + Send;
}

/// Accepts finished orders.
pub trait OrderSubmitter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn submit_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<OrderConfirmation, Self::Error>> + Send;
}

// =============================================================================
// In-Memory Lookup
// =============================================================================

/// A fixed set of promotions keyed by upper-case code.
#[derive(Debug, Clone, Default)]
pub struct StaticPromotions {
    by_code: HashMap<String, Promotion>,
}

impl StaticPromotions {
    pub fn new(promotions: impl IntoIterator<Item = Promotion>) -> Self {
        StaticPromotions {
            by_code: promotions
                .into_iter()
                .map(|p| (p.code.to_ascii_uppercase(), p))
                .collect(),
        }
    }

    pub fn insert(&mut self, promotion: Promotion) {
        self.by_code
            .insert(promotion.code.to_ascii_uppercase(), promotion);
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl PromotionLookup for StaticPromotions {
    type Error = Infallible;

    async fn find_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>, Infallible> {
        Ok(self.by_code.get(&code.trim().to_ascii_uppercase()).cloned())
    }

    async fn search_promotions(
        &self,
        keyword: &str,
        filter: &PromotionFilter,
    ) -> Result<Vec<Promotion>, Infallible> {
        let keyword = keyword.trim().to_lowercase();
        let mut found: Vec<Promotion> = self
            .by_code
            .values()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                keyword.is_empty()
                    || p.code.to_lowercase().contains(&keyword)
                    || p.name.to_lowercase().contains(&keyword)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(found)
    }
}
