//! # Repository Module
//!
//! Database repository implementations for the local store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Ports                               │
//! │                                                                         │
//! │  storefront-core::checkout                                             │
//! │       │                                                                 │
//! │       │  PromotionLookup                  OrderSubmitter                │
//! │       ▼                                        ▼                        │
//! │  PromotionRepository                     OrderRepository               │
//! │  ├── find_by_code(code)                  ├── submit(request)           │
//! │  ├── search(keyword, filter, page)       ├── get_by_id(id)             │
//! │  ├── insert(promotion)                   ├── get_items(order_id)       │
//! │  ├── set_active(id, active)              ├── list(query)               │
//! │  └── count()                             └── confirm / cancel(id)      │
//! │       │                                        │                        │
//! │       └──────────────── SQLite ────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PromotionRepository`](promotion::PromotionRepository) - Promotion lookup, search, admin
//! - [`OrderRepository`](order::OrderRepository) - Order submission and management

pub mod order;
pub mod promotion;

/// `%keyword%` with the LIKE wildcards inside `keyword` escaped by `\`.
///
/// Pair with `ESCAPE '\'` in the SQL.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
