//! # Promotion Repository
//!
//! Database operations for promotions.
//!
//! ## Key Operations
//! - Case-insensitive lookup by code (what the operator types)
//! - Keyword search with kind / slot / active filters and pagination
//! - Insert and activate / deactivate
//!
//! ## Code Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types: " freeShip "                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_promotion_code → "FREESHIP"                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  promotions.code (COLLATE NOCASE, unique index)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Some(Promotion)  or  None → PromotionNotFound in checkout             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inactive promotions are still returned by code so that the operator sees
//! "not active" rather than "not found".

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use storefront_core::ports::PromotionLookup;
use storefront_core::validation::{
    normalize_promotion_code, validate_page_request, validate_promotion, validate_search_query,
};
use storefront_core::{
    Money, Page, PageRequest, Promotion, PromotionFilter, PromotionKind, PromotionSlot,
    MAX_PAGE_SIZE,
};

/// Row shape of the `promotions` table.
#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: String,
    code: String,
    name: String,
    kind: PromotionKind,
    value: i64,
    min_order_value: Option<i64>,
    max_discount_amount: Option<i64>,
    active: bool,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Promotion {
            id: row.id,
            code: row.code,
            name: row.name,
            kind: row.kind,
            value: row.value,
            min_order_value: row.min_order_value.map(Money::from_minor),
            max_discount_amount: row.max_discount_amount.map(Money::from_minor),
            active: row.active,
        }
    }
}

/// Repository for promotion database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.promotions();
///
/// let promo = repo.find_by_code("freeship").await?;
/// let page = repo.search("ship", &PromotionFilter::default(), PageRequest::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Finds a promotion by code, ignoring case and surrounding whitespace.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let code = normalize_promotion_code(code)?;

        debug!(code = %code, "Looking up promotion");

        let row: Option<PromotionRow> = sqlx::query_as(
            r#"
            SELECT id, code, name, kind, value, min_order_value, max_discount_amount, active
            FROM promotions
            WHERE code = ?1
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Promotion::from))
    }

    /// Gets a promotion by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let row: Option<PromotionRow> = sqlx::query_as(
            r#"
            SELECT id, code, name, kind, value, min_order_value, max_discount_amount, active
            FROM promotions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Promotion::from))
    }

    /// Searches promotions whose code or name contains `keyword`.
    ///
    /// An empty keyword lists everything that passes `filter`. Results are
    /// ordered by code.
    pub async fn search(
        &self,
        keyword: &str,
        filter: &PromotionFilter,
        page: PageRequest,
    ) -> DbResult<Page<Promotion>> {
        let keyword = validate_search_query(keyword)?;
        validate_page_request(&page)?;

        debug!(keyword = %keyword, ?filter, page = page.page, "Searching promotions");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM promotions WHERE 1 = 1");
        push_filters(&mut count_query, &keyword, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, code, name, kind, value, min_order_value, max_discount_amount, active \
             FROM promotions WHERE 1 = 1",
        );
        push_filters(&mut query, &keyword, filter);
        query
            .push(" ORDER BY code LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::from(page.offset()));

        let rows: Vec<PromotionRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total, "Search returned promotions");

        Ok(Page::new(
            rows.into_iter().map(Promotion::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    /// Stores a new promotion and returns it as stored (canonical code).
    ///
    /// ## Errors
    /// - `Rejected(Validation)` for an invalid definition
    /// - `UniqueViolation` when the code exists in any letter case
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<Promotion> {
        validate_promotion(promotion)?;

        let mut stored = promotion.clone();
        stored.code = normalize_promotion_code(&promotion.code)?;
        stored.name = promotion.name.trim().to_string();
        let now = Utc::now();

        debug!(id = %stored.id, code = %stored.code, kind = %stored.kind, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, code, name, kind, value,
                min_order_value, max_discount_amount, active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?9
            )
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.code)
        .bind(&stored.name)
        .bind(stored.kind)
        .bind(stored.value)
        .bind(stored.min_order_value.map(|m| m.minor()))
        .bind(stored.max_discount_amount.map(|m| m.minor()))
        .bind(stored.active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("promotion code", &stored.code),
            other => other,
        })?;

        Ok(stored)
    }

    /// Activates or deactivates a promotion.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting promotion active flag");

        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                active = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    /// Number of stored promotions.
    pub async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

/// Appends the `AND ...` clauses for `keyword` and `filter`.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, keyword: &str, filter: &PromotionFilter) {
    if !keyword.is_empty() {
        let pattern = like_pattern(keyword);
        query
            .push(" AND (code LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(kind) = filter.kind {
        query.push(" AND kind = ").push_bind(kind);
    }

    match filter.slot {
        Some(PromotionSlot::Product) => {
            query.push(" AND kind IN ('PERCENTAGE', 'FIXED_AMOUNT')");
        }
        Some(PromotionSlot::Shipping) => {
            query.push(" AND kind = 'SHIPPING_DISCOUNT'");
        }
        None => {}
    }

    if filter.active_only {
        query.push(" AND active = 1");
    }
}

// =============================================================================
// Collaborator Implementation
// =============================================================================

impl PromotionLookup for PromotionRepository {
    type Error = DbError;

    async fn find_promotion_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        self.find_by_code(code).await
    }

    async fn search_promotions(
        &self,
        keyword: &str,
        filter: &PromotionFilter,
    ) -> DbResult<Vec<Promotion>> {
        let page = self
            .search(keyword, filter, PageRequest::new(1, MAX_PAGE_SIZE))
            .await?;
        Ok(page.items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use storefront_core::checkout::apply_promotion_code;
    use storefront_core::draft::OrderDraft;
    use storefront_core::{CoreError, LineItem};

    async fn seeded() -> (Database, PromotionRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promotions();

        let promotions = [
            Promotion::new("TEN", PromotionKind::Percentage, 10)
                .with_name("Ten percent off")
                .with_min_order_value(Money::from_minor(10_000_000)),
            Promotion::new("FLAT50K", PromotionKind::FixedAmount, 50_000).with_name("50k off"),
            Promotion::new("FREESHIP", PromotionKind::ShippingDiscount, 40_000)
                .with_name("Free shipping"),
            Promotion::new("OLD_SHIP", PromotionKind::ShippingDiscount, 10_000)
                .with_name("Old shipping deal")
                .with_active(false),
        ];
        for promotion in &promotions {
            repo.insert(promotion).await.unwrap();
        }

        (db, repo)
    }

    #[tokio::test]
    async fn test_insert_and_find_by_code() {
        let (_db, repo) = seeded().await;

        let found = repo.find_by_code("  ten ").await.unwrap().unwrap();
        assert_eq!(found.code, "TEN");
        assert_eq!(found.kind, PromotionKind::Percentage);
        assert_eq!(found.min_order_value, Some(Money::from_minor(10_000_000)));
        assert_eq!(found.max_discount_amount, None);
        assert!(found.active);

        assert!(repo.find_by_code("MISSING").await.unwrap().is_none());

        let by_id = repo.get_by_id(&found.id).await.unwrap();
        assert_eq!(by_id, Some(found));
    }

    #[tokio::test]
    async fn test_find_returns_inactive() {
        let (_db, repo) = seeded().await;
        let found = repo.find_by_code("old_ship").await.unwrap().unwrap();
        assert!(!found.active);
    }

    #[tokio::test]
    async fn test_insert_canonicalizes_code() {
        let (_db, repo) = seeded().await;

        let mut promotion = Promotion::new("x", PromotionKind::FixedAmount, 1);
        promotion.code = "summer-sale".to_string();
        let stored = repo.insert(&promotion).await.unwrap();
        assert_eq!(stored.code, "SUMMER-SALE");
        assert!(repo.find_by_code("SUMMER-SALE").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_duplicate_code_any_case() {
        let (_db, repo) = seeded().await;

        let mut dup = Promotion::new("TEN", PromotionKind::FixedAmount, 1);
        dup.code = "ten".to_string();
        let err = repo.insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_invalid_definition() {
        let (_db, repo) = seeded().await;

        let bad = Promotion::new("HUGE", PromotionKind::Percentage, 150);
        let err = repo.insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_search_keyword_and_filters() {
        let (_db, repo) = seeded().await;

        let all = repo
            .search("", &PromotionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 4);
        let codes: Vec<&str> = all.items.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["FLAT50K", "FREESHIP", "OLD_SHIP", "TEN"]);

        let shipping = repo
            .search(
                "ship",
                &PromotionFilter {
                    slot: Some(PromotionSlot::Shipping),
                    active_only: true,
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(shipping.total, 1);
        assert_eq!(shipping.items[0].code, "FREESHIP");

        let by_name = repo
            .search("PERCENT", &PromotionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(by_name.items.len(), 1);
        assert_eq!(by_name.items[0].code, "TEN");

        let fixed = repo
            .search(
                "",
                &PromotionFilter {
                    kind: Some(PromotionKind::FixedAmount),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(fixed.total, 1);
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let (_db, repo) = seeded().await;

        // "_" would match any single character if it were not escaped.
        let found = repo
            .search("T_N", &PromotionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.total, 0);

        let found = repo
            .search("OLD_", &PromotionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.total, 1);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let (_db, repo) = seeded().await;

        let first = repo
            .search("", &PromotionFilter::default(), PageRequest::new(1, 3))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total, 4);
        assert_eq!(first.total_pages(), 2);

        let second = repo
            .search("", &PromotionFilter::default(), PageRequest::new(2, 3))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].code, "TEN");

        let invalid = repo
            .search("", &PromotionFilter::default(), PageRequest::new(0, 3))
            .await;
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_set_active() {
        let (_db, repo) = seeded().await;
        let promo = repo.find_by_code("FREESHIP").await.unwrap().unwrap();

        repo.set_active(&promo.id, false).await.unwrap();
        let reloaded = repo.find_by_code("FREESHIP").await.unwrap().unwrap();
        assert!(!reloaded.active);

        let err = repo.set_active("no-such-id", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_apply_code_through_repository() {
        let (_db, repo) = seeded().await;

        let mut draft = OrderDraft::new(Money::from_minor(40_000)).unwrap();
        draft
            .add_item(LineItem::new(
                "phone",
                "PHONE-X",
                "Phone X",
                Money::from_minor(20_000_000),
                1,
            ))
            .unwrap();

        let discount = apply_promotion_code(&mut draft, &repo, "ten", PromotionSlot::Product)
            .await
            .unwrap();
        assert_eq!(discount, Money::from_minor(2_000_000));

        let err = apply_promotion_code(&mut draft, &repo, "old_ship", PromotionSlot::Shipping)
            .await
            .unwrap_err();
        assert_eq!(err.as_rejection().map(|r| r.code()), Some("INACTIVE"));
    }
}
