//! # Order Repository
//!
//! Database operations for submitted orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. SUBMIT                                                             │
//! │     └── submit(request)                                                │
//! │         ├── price_request() re-resolves codes and re-computes totals   │
//! │         └── one transaction: orders row + order_items rows             │
//! │             → Order { status: Pending }                                │
//! │                                                                         │
//! │  2. CONFIRM                                                            │
//! │     └── confirm() → Order { status: Confirmed }                        │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel() → Order { status: Cancelled }  (from Pending/Confirmed)│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never taken from the client. A request whose promotion does
//! not qualify is refused and nothing is written.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::like_pattern;
use super::promotion::PromotionRepository;
use crate::error::{DbError, DbResult};
use storefront_core::checkout::{price_request, CheckoutError, PricedOrder};
use storefront_core::ports::OrderSubmitter;
use storefront_core::pricing::summarize;
use storefront_core::validation::{validate_page_request, validate_search_query};
use storefront_core::{
    CreateOrderRequest, Money, Order, OrderConfirmation, OrderItem, OrderQuery, OrderStatus, Page,
};

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    status: OrderStatus,
    customer_name: Option<String>,
    note: Option<String>,
    product_promotion_code: Option<String>,
    shipping_promotion_code: Option<String>,
    subtotal: i64,
    product_discount: i64,
    shipping_fee: i64,
    shipping_discount: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            status: row.status,
            customer_name: row.customer_name,
            note: row.note,
            product_promotion_code: row.product_promotion_code,
            shipping_promotion_code: row.shipping_promotion_code,
            totals: summarize(
                Money::from_minor(row.subtotal),
                Money::from_minor(row.shipping_fee),
                Money::from_minor(row.product_discount),
                Money::from_minor(row.shipping_discount),
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row shape of the `order_items` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    sku: String,
    name: String,
    unit_price: i64,
    quantity: i64,
    line_total: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            sku: row.sku,
            name: row.name,
            unit_price: Money::from_minor(row.unit_price),
            quantity: row.quantity,
            line_total: Money::from_minor(row.line_total),
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    promotions: PromotionRepository,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    ///
    /// Promotion codes on submitted orders are resolved against the same pool.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository {
            promotions: PromotionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Re-prices `request` and stores it as a pending order.
    ///
    /// ## What This Does
    /// 1. `price_request` validates the lines and resolves both codes
    /// 2. Inserts the order and every line in one transaction
    /// 3. Returns the generated id, order number and server-side totals
    ///
    /// ## Errors
    /// - `Rejected` when a code is unknown, inactive, in the wrong slot or
    ///   below its minimum, or when a line is invalid
    pub async fn submit(&self, request: &CreateOrderRequest) -> DbResult<OrderConfirmation> {
        let priced = price_request(&self.promotions, request)
            .await
            .map_err(|err| match err {
                CheckoutError::Core(core) => {
                    if let Some(rejection) = core.as_rejection() {
                        warn!(
                            code = %rejection.promotion_code(),
                            reason = rejection.code(),
                            "Promotion rejected while re-pricing order"
                        );
                    }
                    DbError::Rejected(core)
                }
                CheckoutError::Lookup(db) => db,
            })?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, lines = priced.request.line_items.len(), "Inserting order");

        let order_number = self
            .insert_numbered(&id, &priced, now, || generate_order_number(now))
            .await?;

        info!(
            order_id = %id,
            order_number = %order_number,
            grand_total = %priced.totals.grand_total,
            "Order submitted"
        );

        Ok(OrderConfirmation {
            order_id: id,
            order_number,
            status: OrderStatus::Pending,
            totals: priced.totals,
            created_at: now,
        })
    }

    /// Inserts `priced` under a number from `next_number`, drawing a new
    /// one when the previous number is already taken.
    async fn insert_numbered(
        &self,
        id: &str,
        priced: &PricedOrder,
        now: DateTime<Utc>,
        mut next_number: impl FnMut() -> String,
    ) -> DbResult<String> {
        let mut attempt = 1;
        loop {
            let order_number = next_number();
            match self.insert_priced(id, &order_number, priced, now).await {
                Ok(()) => return Ok(order_number),
                Err(DbError::UniqueViolation { field, .. })
                    if field == ORDER_NUMBER_COLUMN && attempt < ORDER_NUMBER_ATTEMPTS =>
                {
                    warn!(order_number = %order_number, attempt, "Order number taken, drawing another");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn insert_priced(
        &self,
        id: &str,
        order_number: &str,
        priced: &PricedOrder,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let request = &priced.request;
        let totals = &priced.totals;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, status,
                customer_name, note,
                product_promotion_code, shipping_promotion_code,
                subtotal, product_discount, shipping_fee, shipping_discount, grand_total,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?13
            )
            "#,
        )
        .bind(id)
        .bind(order_number)
        .bind(OrderStatus::Pending)
        .bind(&request.customer_name)
        .bind(&request.note)
        .bind(&request.product_promotion_code)
        .bind(&request.shipping_promotion_code)
        .bind(totals.subtotal.minor())
        .bind(totals.product_discount.minor())
        .bind(totals.shipping_fee.minor())
        .bind(totals.shipping_discount.minor())
        .bind(totals.grand_total.minor())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, item) in request.line_items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position,
                    product_id, sku, name,
                    unit_price, quantity, line_total
                ) VALUES (
                    ?1, ?2, ?3,
                    ?4, ?5, ?6,
                    ?7, ?8, ?9
                )
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(item.sku.trim())
            .bind(item.name.trim())
            .bind(item.unit_price.minor())
            .bind(item.quantity)
            .bind(item.line_total().minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT
                id, order_number, status, customer_name, note,
                product_promotion_code, shipping_promotion_code,
                subtotal, product_discount, shipping_fee, shipping_discount,
                created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Gets the lines of an order in the order they were entered.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, sku, name, unit_price, quantity, line_total
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Lists orders, newest first.
    ///
    /// `keyword` matches the order number or the customer name.
    pub async fn list(&self, query: &OrderQuery) -> DbResult<Page<Order>> {
        let keyword = validate_search_query(query.keyword.as_deref().unwrap_or_default())?;
        validate_page_request(&query.page)?;

        debug!(keyword = %keyword, status = ?query.status, page = query.page.page, "Listing orders");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        push_filters(&mut count_query, &keyword, query.status);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut list_query = QueryBuilder::<Sqlite>::new(
            "SELECT id, order_number, status, customer_name, note, \
             product_promotion_code, shipping_promotion_code, \
             subtotal, product_discount, shipping_fee, shipping_discount, \
             created_at, updated_at \
             FROM orders WHERE 1 = 1",
        );
        push_filters(&mut list_query, &keyword, query.status);
        list_query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(query.page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::from(query.page.offset()));

        let rows: Vec<OrderRow> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(Order::from).collect(),
            total.max(0) as u64,
            query.page,
        ))
    }

    /// Marks a pending order as confirmed.
    pub async fn confirm(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Confirming order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'confirmed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", id));
        }

        Ok(())
    }

    /// Cancels a pending or confirmed order.
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Cancelling order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", id));
        }

        info!(order_id = %id, "Order cancelled");
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, keyword: &str, status: Option<OrderStatus>) {
    if !keyword.is_empty() {
        let pattern = like_pattern(keyword);
        query
            .push(" AND (order_number LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR customer_name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status);
    }
}

/// Column reported by SQLite when an order number is already taken.
const ORDER_NUMBER_COLUMN: &str = "orders.order_number";

/// Numbers drawn per submission before the collision is returned.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Hex digits of randomness in an order number.
const ORDER_NUMBER_SUFFIX_LEN: usize = 10;

/// Generates an order number in format: SO-YYYYMMDD-XXXXXXXXXX
///
/// ## Format
/// - YYYYMMDD: UTC date of submission
/// - XXXXXXXXXX: first ten hex digits of a fresh UUID, upper-case
///
/// ## Example
/// `SO-20260131-4F9A0C7B12`
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("SO-{}-{}", now.format("%Y%m%d"), suffix)
}

// =============================================================================
// Collaborator Implementation
// =============================================================================

impl OrderSubmitter for OrderRepository {
    type Error = DbError;

    async fn submit_order(&self, request: &CreateOrderRequest) -> DbResult<OrderConfirmation> {
        self.submit(request).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
