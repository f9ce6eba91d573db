//! Order and payment writes for checkout.
//!
//! These run on a caller-owned transaction so that reading the cart,
//! writing the order and clearing the cart commit together.

use sqlx::PgConnection;

use tidewear_core::db::orders::ShippingAddress;
use tidewear_core::{OrderId, OrderStatus, PaymentStatus, Price, ProductId, UserId};

use super::RepositoryError;

/// An order line about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub sku: String,
    pub size: Option<String>,
    pub unit_price: Price,
    pub quantity: i32,
}

/// Insert a `pending` order with free shipping.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    shipping: &ShippingAddress,
    subtotal: Price,
) -> Result<OrderId, RepositoryError> {
    Ok(sqlx::query_scalar(
        r"
        INSERT INTO shop.order
            (user_id, status, subtotal, shipping_total, total,
             shipping_name, shipping_line1, shipping_line2, shipping_city,
             shipping_postal_code, shipping_country, shipping_phone)
        VALUES ($1, 'pending', $2, 0, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(subtotal)
    .bind(&shipping.name)
    .bind(&shipping.line1)
    .bind(shipping.line2.as_deref())
    .bind(&shipping.city)
    .bind(&shipping.postal_code)
    .bind(&shipping.country)
    .bind(shipping.phone.as_deref())
    .fetch_one(&mut *conn)
    .await?)
}

/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    items: &[NewOrderItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            r"
            INSERT INTO shop.order_item
                (order_id, product_id, title, sku, size, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.title)
        .bind(&item.sku)
        .bind(item.size.as_deref())
        .bind(item.unit_price)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn insert_payment(
    conn: &mut PgConnection,
    order_id: OrderId,
    provider: &str,
    amount: Price,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.payment (order_id, provider, status, amount)
        VALUES ($1, $2, 'pending', $3)
        ",
    )
    .bind(order_id)
    .bind(provider)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Lock an order owned by `user_id` and its payment for the pay flow.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn lock_for_payment(
    conn: &mut PgConnection,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Option<(OrderStatus, Option<PaymentStatus>)>, RepositoryError> {
    Ok(sqlx::query_as::<_, (OrderStatus, Option<PaymentStatus>)>(
        r"
        SELECT o.status, pay.status
        FROM shop.order o
        LEFT JOIN shop.payment pay ON pay.order_id = o.id
        WHERE o.id = $1 AND o.user_id = $2
        FOR UPDATE OF o
        ",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?)
}

/// Record a payment attempt, creating the payment row if it is missing.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn record_payment(
    conn: &mut PgConnection,
    order_id: OrderId,
    provider: &str,
    status: PaymentStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.payment (order_id, provider, status, amount)
        SELECT id, $2, $3, total FROM shop.order WHERE id = $1
        ON CONFLICT (order_id) DO UPDATE
        SET status = EXCLUDED.status, provider = EXCLUDED.provider, updated_at = NOW()
        ",
    )
    .bind(order_id)
    .bind(provider)
    .bind(status)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn mark_paid(conn: &mut PgConnection, order_id: OrderId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.order SET status = 'paid', updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
