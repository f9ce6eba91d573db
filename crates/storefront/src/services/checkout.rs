//! Checkout and simulated payment.
//!
//! Checkout turns the cart into a `pending` order in one transaction. There
//! is no payment provider: [`CheckoutService::pay`] records the outcome the
//! client asks for under the `simulated` provider.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use tidewear_core::db::OrderRepository;
use tidewear_core::db::orders::{Order, ShippingAddress};
use tidewear_core::{OrderId, OrderStatus, PaymentStatus, Price, UserId};

use crate::db::RepositoryError;
use crate::db::cart::{self, CartLine};
use crate::db::checkout::{self as checkout_db, NewOrderItem};

pub const PAYMENT_PROVIDER: &str = "simulated";

const MAX_ADDRESS_FIELD_LENGTH: usize = 200;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid shipping address: {0}")]
    InvalidAddress(String),

    #[error("order not found")]
    OrderNotFound,

    /// Order is not pending or its payment already succeeded.
    #[error("order cannot be paid: {0}")]
    NotPayable(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What the simulated provider should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    #[default]
    Succeed,
    Fail,
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAddress` for missing address fields
    /// and `CheckoutError::EmptyCart` when there is nothing to buy.
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping: ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        let shipping = normalize_address(shipping)?;

        let mut tx = self.pool.begin().await?;
        let lines = cart::lines_for_update(&mut tx, user_id, true).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items: Vec<NewOrderItem> = lines.iter().map(snapshot_line).collect();
        let subtotal = order_subtotal(&items);

        let order_id = checkout_db::insert_order(&mut tx, user_id, &shipping, subtotal).await?;
        checkout_db::insert_items(&mut tx, order_id, &items).await?;
        checkout_db::insert_payment(&mut tx, order_id, PAYMENT_PROVIDER, subtotal).await?;
        cart::clear(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            user_id = %user_id,
            total = %subtotal,
            lines = items.len(),
            "Order placed"
        );

        self.load(order_id, user_id).await
    }

    /// Run a simulated payment for one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` for someone else's or a
    /// missing order, `CheckoutError::NotPayable` unless the order is pending
    /// and its payment has not succeeded.
    pub async fn pay(
        &self,
        user_id: UserId,
        order_id: OrderId,
        outcome: PaymentOutcome,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let (status, payment) = checkout_db::lock_for_payment(&mut tx, order_id, user_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        ensure_payable(status, payment)?;

        match outcome {
            PaymentOutcome::Succeed => {
                checkout_db::record_payment(
                    &mut tx,
                    order_id,
                    PAYMENT_PROVIDER,
                    PaymentStatus::Succeeded,
                )
                .await?;
                checkout_db::mark_paid(&mut tx, order_id).await?;
            }
            PaymentOutcome::Fail => {
                checkout_db::record_payment(
                    &mut tx,
                    order_id,
                    PAYMENT_PROVIDER,
                    PaymentStatus::Failed,
                )
                .await?;
            }
        }
        tx.commit().await?;

        tracing::info!(order_id = %order_id, outcome = ?outcome, "Simulated payment recorded");
        self.load(order_id, user_id).await
    }

    async fn load(&self, order_id: OrderId, user_id: UserId) -> Result<Order, CheckoutError> {
        OrderRepository::new(self.pool)
            .get(order_id, Some(user_id))
            .await?
            .ok_or(CheckoutError::OrderNotFound)
    }
}

/// Freeze a cart line into an order line.
///
/// With a size, the title becomes `"{title} - {size}"` and the SKU
/// `"{sku or slug}-{size}"`.
#[must_use]
pub fn snapshot_line(line: &CartLine) -> NewOrderItem {
    let base_sku = line
        .sku
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&line.slug);

    let (title, sku) = match line.size.as_deref() {
        Some(size) => (
            format!("{} - {size}", line.title),
            format!("{base_sku}-{size}"),
        ),
        None => (line.title.clone(), base_sku.to_owned()),
    };

    NewOrderItem {
        product_id: line.product_id,
        title,
        sku,
        size: line.size.clone(),
        unit_price: line.unit_price,
        quantity: line.quantity,
    }
}

/// Sum of line totals. Shipping is free, so this is also the order total.
#[must_use]
pub fn order_subtotal(items: &[NewOrderItem]) -> Price {
    Price::sum(
        items
            .iter()
            .map(|item| item.unit_price.line_total(item.quantity.unsigned_abs())),
    )
}

fn ensure_payable(
    status: OrderStatus,
    payment: Option<PaymentStatus>,
) -> Result<(), CheckoutError> {
    if status != OrderStatus::Pending {
        return Err(CheckoutError::NotPayable(format!("order is {status}")));
    }
    if payment == Some(PaymentStatus::Succeeded) {
        return Err(CheckoutError::NotPayable("payment already succeeded".to_owned()));
    }
    Ok(())
}

fn normalize_address(address: ShippingAddress) -> Result<ShippingAddress, CheckoutError> {
    fn required(value: String, field: &str) -> Result<String, CheckoutError> {
        let value = value.trim().to_owned();
        if value.is_empty() {
            return Err(CheckoutError::InvalidAddress(format!("{field} is required")));
        }
        if value.chars().count() > MAX_ADDRESS_FIELD_LENGTH {
            return Err(CheckoutError::InvalidAddress(format!("{field} is too long")));
        }
        Ok(value)
    }
    fn optional(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    Ok(ShippingAddress {
        name: required(address.name, "name")?,
        line1: required(address.line1, "line1")?,
        line2: optional(address.line2),
        city: required(address.city, "city")?,
        postal_code: required(address.postal_code, "postal_code")?,
        country: required(address.country, "country")?,
        phone: optional(address.phone),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewear_core::{CartItemId, ProductId};

    use super::*;

    fn line(size: Option<&str>, sku: Option<&str>, cents: u32, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(1),
            product_id: ProductId::new(7),
            title: "Linen Shirt".to_owned(),
            slug: "linen-shirt".to_owned(),
            sku: sku.map(str::to_owned),
            unit_price: Price::from_cents(cents),
            quantity,
            size: size.map(str::to_owned),
            color_id: None,
            color_name: None,
            image_url: None,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: " Ana Lopez ".to_owned(),
            line1: "1 Harbour Rd".to_owned(),
            line2: Some("   ".to_owned()),
            city: "Porto".to_owned(),
            postal_code: "4000-001".to_owned(),
            country: "PT".to_owned(),
            phone: None,
        }
    }

    #[test]
    fn test_snapshot_with_size_uses_sku() {
        let item = snapshot_line(&line(Some("M"), Some("LIN-01"), 4_500, 2));
        assert_eq!(item.title, "Linen Shirt - M");
        assert_eq!(item.sku, "LIN-01-M");
        assert_eq!(item.size.as_deref(), Some("M"));
    }

    #[test]
    fn test_snapshot_falls_back_to_slug() {
        let item = snapshot_line(&line(Some("XL"), Some("  "), 4_500, 1));
        assert_eq!(item.sku, "linen-shirt-XL");

        let item = snapshot_line(&line(None, None, 4_500, 1));
        assert_eq!(item.title, "Linen Shirt");
        assert_eq!(item.sku, "linen-shirt");
    }

    #[test]
    fn test_subtotal() {
        let items = [
            snapshot_line(&line(Some("M"), None, 4_500, 2)),
            snapshot_line(&line(None, None, 1_250, 3)),
        ];
        assert_eq!(order_subtotal(&items), Price::from_cents(12_750));
    }

    #[test]
    fn test_ensure_payable() {
        assert!(ensure_payable(OrderStatus::Pending, Some(PaymentStatus::Pending)).is_ok());
        assert!(ensure_payable(OrderStatus::Pending, Some(PaymentStatus::Failed)).is_ok());
        assert!(ensure_payable(OrderStatus::Pending, None).is_ok());
        assert!(matches!(
            ensure_payable(OrderStatus::Pending, Some(PaymentStatus::Succeeded)),
            Err(CheckoutError::NotPayable(_))
        ));
        assert!(matches!(
            ensure_payable(OrderStatus::Cancelled, Some(PaymentStatus::Pending)),
            Err(CheckoutError::NotPayable(_))
        ));
    }

    #[test]
    fn test_normalize_address() {
        let normalized = normalize_address(address()).unwrap();
        assert_eq!(normalized.name, "Ana Lopez");
        assert_eq!(normalized.line2, None);

        let missing_city = ShippingAddress {
            city: " ".to_owned(),
            ..address()
        };
        assert!(matches!(
            normalize_address(missing_city),
            Err(CheckoutError::InvalidAddress(msg)) if msg.contains("city")
        ));
    }

    #[test]
    fn test_payment_outcome_parsing() {
        let outcome: PaymentOutcome = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(outcome, PaymentOutcome::Fail);
        assert_eq!(PaymentOutcome::default(), PaymentOutcome::Succeed);
    }
}
