//! Shipping settings singleton (`shop.shipping_settings`, `id = 1`).

use sqlx::PgPool;

use super::{RepositoryError, non_negative};
use crate::shipping::ShippingSettings;

#[derive(sqlx::FromRow)]
struct ShippingSettingsRow {
    processing_days_min: i32,
    processing_days_max: i32,
    transit_days_min: i32,
    transit_days_max: i32,
    weekend_delivery: bool,
}

impl TryFrom<ShippingSettingsRow> for ShippingSettings {
    type Error = RepositoryError;

    fn try_from(row: ShippingSettingsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            processing_days_min: non_negative(row.processing_days_min, "processing_days_min")?,
            processing_days_max: non_negative(row.processing_days_max, "processing_days_max")?,
            transit_days_min: non_negative(row.transit_days_min, "transit_days_min")?,
            transit_days_max: non_negative(row.transit_days_max, "transit_days_max")?,
            weekend_delivery: row.weekend_delivery,
        })
    }
}

/// Repository for the store's shipping settings.
pub struct ShippingSettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingSettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The stored settings, or `None` when no admin has saved any yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<Option<ShippingSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingSettingsRow>(
            r"
            SELECT processing_days_min, processing_days_max,
                   transit_days_min, transit_days_max, weekend_delivery
            FROM shop.shipping_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        row.map(ShippingSettings::try_from).transpose()
    }

    /// The stored settings, falling back to [`ShippingSettings::default`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_default(&self) -> Result<ShippingSettings, RepositoryError> {
        Ok(self.get().await?.unwrap_or_default())
    }

    /// Create or replace the singleton row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a value does not fit in the
    /// column, `RepositoryError::Database` for other failures.
    pub async fn upsert(
        &self,
        settings: &ShippingSettings,
    ) -> Result<ShippingSettings, RepositoryError> {
        let column = |value: u32, name: &str| {
            i32::try_from(value)
                .map_err(|_| RepositoryError::Conflict(format!("{name} is out of range")))
        };

        let row = sqlx::query_as::<_, ShippingSettingsRow>(
            r"
            INSERT INTO shop.shipping_settings
                (id, processing_days_min, processing_days_max,
                 transit_days_min, transit_days_max, weekend_delivery)
            VALUES (1, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                processing_days_min = EXCLUDED.processing_days_min,
                processing_days_max = EXCLUDED.processing_days_max,
                transit_days_min = EXCLUDED.transit_days_min,
                transit_days_max = EXCLUDED.transit_days_max,
                weekend_delivery = EXCLUDED.weekend_delivery,
                updated_at = NOW()
            RETURNING processing_days_min, processing_days_max,
                      transit_days_min, transit_days_max, weekend_delivery
            ",
        )
        .bind(column(settings.processing_days_min, "processing_days_min")?)
        .bind(column(settings.processing_days_max, "processing_days_max")?)
        .bind(column(settings.transit_days_min, "transit_days_min")?)
        .bind(column(settings.transit_days_max, "transit_days_max")?)
        .bind(settings.weekend_delivery)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }
}
