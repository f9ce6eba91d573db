//! Cart lines (`shop.cart_item`).
//!
//! A line is unique per (product, size, color); adding an identical line
//! bumps its quantity instead. Lines without a size store `''`.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use tidewear_core::{CartItemId, ColorId, Price, ProductId, UserId};

use super::RepositoryError;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// A cart line joined with the product it points at.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub title: String,
    pub slug: String,
    pub sku: Option<String>,
    pub unit_price: Price,
    pub quantity: i32,
    pub size: Option<String>,
    pub color_id: Option<ColorId>,
    pub color_name: Option<String>,
    pub image_url: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity.unsigned_abs())
    }
}

const CART_SELECT: &str = r"
    SELECT ci.id, ci.product_id, p.title, p.slug, p.sku, p.price AS unit_price,
           ci.quantity, NULLIF(ci.size, '') AS size, ci.color_id, c.name AS color_name,
           (SELECT m.url FROM shop.product_media m
            WHERE m.product_id = p.id
            ORDER BY m.position, m.id LIMIT 1) AS image_url
    FROM shop.cart_item ci
    JOIN shop.product p ON p.id = ci.product_id
    LEFT JOIN shop.color c ON c.id = ci.color_id
    WHERE ci.user_id = $1
    ORDER BY ci.created_at, ci.id
";

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines in the user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        lines_for_update(&mut conn, user_id, false).await
    }

    /// Add `quantity` of a product, merging with an identical line. The
    /// merged quantity is capped at [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
        color_id: Option<ColorId>,
    ) -> Result<CartItemId, RepositoryError> {
        Ok(sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_item AS ci (user_id, product_id, quantity, size, color_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id, size, (COALESCE(color_id, 0)))
            DO UPDATE SET quantity = LEAST(ci.quantity + EXCLUDED.quantity, $6)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size.unwrap_or(""))
        .bind(color_id)
        .bind(MAX_LINE_QUANTITY)
        .fetch_one(self.pool)
        .await?)
    }

    /// Set a line's quantity. Returns `false` if the line isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.cart_item SET quantity = $3 WHERE id = $1 AND user_id = $2")
                .bind(item_id)
                .bind(user_id)
                .bind(quantity)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove one line. Returns `false` if the line isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear(&mut conn, user_id).await
    }
}

/// Read the cart on an existing connection, optionally locking the lines.
pub(crate) async fn lines_for_update(
    conn: &mut PgConnection,
    user_id: UserId,
    lock: bool,
) -> Result<Vec<CartLine>, RepositoryError> {
    let sql = if lock {
        format!("{CART_SELECT} FOR UPDATE OF ci")
    } else {
        CART_SELECT.to_owned()
    };
    Ok(sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub(crate) async fn clear(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
