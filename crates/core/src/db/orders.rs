//! Orders (shared reads and status transitions).
//!
//! The storefront creates and pays orders, the admin moves them through
//! fulfilment. Both read them through here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::RepositoryError;
use crate::{OrderId, OrderItemId, OrderStatus, PaymentStatus, Price, ProductId, UserId};

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    #[sqlx(rename = "shipping_name")]
    pub name: String,
    #[sqlx(rename = "shipping_line1")]
    pub line1: String,
    #[sqlx(rename = "shipping_line2")]
    #[serde(default)]
    pub line2: Option<String>,
    #[sqlx(rename = "shipping_city")]
    pub city: String,
    #[sqlx(rename = "shipping_postal_code")]
    pub postal_code: String,
    #[sqlx(rename = "shipping_country")]
    pub country: String,
    #[sqlx(rename = "shipping_phone")]
    #[serde(default)]
    pub phone: Option<String>,
}

/// A snapshotted order line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub title: String,
    pub sku: String,
    pub size: Option<String>,
    pub unit_price: Price,
    pub quantity: i32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity.unsigned_abs())
    }
}

/// An order with its lines and payment state.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub subtotal: Price,
    pub shipping_total: Price,
    pub total: Price,
    pub shipping: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of an order listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub total: Price,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    customer_email: String,
    status: OrderStatus,
    payment_status: Option<PaymentStatus>,
    subtotal: Price,
    shipping_total: Price,
    total: Price,
    #[sqlx(flatten)]
    shipping: ShippingAddress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, u.email AS customer_email, o.status,
           pay.status AS payment_status,
           o.subtotal, o.shipping_total, o.total,
           o.shipping_name, o.shipping_line1, o.shipping_line2, o.shipping_city,
           o.shipping_postal_code, o.shipping_country, o.shipping_phone,
           o.created_at, o.updated_at
    FROM shop.order o
    JOIN shop.user u ON u.id = o.user_id
    LEFT JOIN shop.payment pay ON pay.order_id = o.id
";

/// Repository for order reads and status changes.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an order. With `owner`, orders of other users are invisible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND ($2::int IS NULL OR o.user_id = $2)"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, product_id, title, sku, size, unit_price, quantity
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Order {
            id: row.id,
            user_id: row.user_id,
            customer_email: row.customer_email,
            status: row.status,
            payment_status: row.payment_status,
            subtotal: row.subtotal,
            shipping_total: row.shipping_total,
            total: row.total,
            shipping: row.shipping,
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Newest-first listing, optionally scoped to one user and/or status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        owner: Option<UserId>,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let items = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.user_id, u.email AS customer_email, o.status,
                   pay.status AS payment_status, o.total,
                   (SELECT COALESCE(SUM(oi.quantity), 0)::int8
                    FROM shop.order_item oi WHERE oi.order_id = o.id) AS item_count,
                   o.created_at
            FROM shop.order o
            JOIN shop.user u ON u.id = o.user_id
            LEFT JOIN shop.payment pay ON pay.order_id = o.id
            WHERE ($1::int IS NULL OR o.user_id = $1)
              AND ($2::shop.order_status IS NULL OR o.status = $2)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(owner)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.order o
            WHERE ($1::int IS NULL OR o.user_id = $1)
              AND ($2::shop.order_status IS NULL OR o.status = $2)
            ",
        )
        .bind(owner)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((items, total))
    }

    /// Move an order to `next`, enforcing [`OrderStatus::can_transition_to`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist (or
    /// belongs to someone other than `owner`), `RepositoryError::Conflict`
    /// if the transition is not allowed.
    pub async fn transition(
        &self,
        id: OrderId,
        owner: Option<UserId>,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: OrderStatus = sqlx::query_scalar(
            r"
            SELECT status FROM shop.order
            WHERE id = $1 AND ($2::int IS NULL OR user_id = $2)
            FOR UPDATE
            ",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {current} to {next}"
            )));
        }

        sqlx::query("UPDATE shop.order SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, from = %current, to = %next, "Order status changed");

        self.get(id, owner).await?.ok_or(RepositoryError::NotFound)
    }
}
