//! # storefront-db: Local Store for the Storefront Admin
//!
//! SQLite-backed storage for promotions and submitted orders. The two
//! repositories implement the `PromotionLookup` and `OrderSubmitter` ports
//! from `storefront-core`, so the pricing logic can run against a real
//! database in development, offline operation and integration tests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Submission Flow                            │
//! │                                                                         │
//! │  OrderDraft::into_request()                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  storefront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ PromotionRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │    │ 001_initial  │  │   │
//! │  │   │ DbConfig      │    │  └─ re-prices  │    │   _schema    │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file ($STOREFRONT_DB_PATH, default ./storefront.db)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Promotion and order repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let promo = db.promotions().find_by_code("freeship").await?;
//! let confirmation = db.orders().submit(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::order::OrderRepository;
pub use repository::promotion::PromotionRepository;
