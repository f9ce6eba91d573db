//! Store-wide shipping settings used by the delivery estimator.
//!
//! `min <= max` is not checked: an inverted pair is stored as given and the
//! storefront estimate reflects it.

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::{MAX_SHIPPING_DAYS, ShippingSettings};
use tidewear_core::db::ShippingSettingsRepository;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the shipping router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/shipping", get(show).put(update))
}

/// Body of `PUT /api/shipping`. Signed so negative values get a 400
/// instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub processing_days_min: i64,
    pub processing_days_max: i64,
    pub transit_days_min: i64,
    pub transit_days_max: i64,
    pub weekend_delivery: bool,
}

impl TryFrom<ShippingRequest> for ShippingSettings {
    type Error = AppError;

    fn try_from(body: ShippingRequest) -> Result<Self> {
        Ok(Self {
            processing_days_min: day_count(body.processing_days_min, "processingDaysMin")?,
            processing_days_max: day_count(body.processing_days_max, "processingDaysMax")?,
            transit_days_min: day_count(body.transit_days_min, "transitDaysMin")?,
            transit_days_max: day_count(body.transit_days_max, "transitDaysMax")?,
            weekend_delivery: body.weekend_delivery,
        })
    }
}

fn day_count(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|days| *days <= MAX_SHIPPING_DAYS)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "{field} must be a day count between 0 and {MAX_SHIPPING_DAYS}"
            ))
        })
}

/// Current settings, or the defaults if none were ever saved.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ShippingSettings>> {
    Ok(Json(
        ShippingSettingsRepository::new(state.pool())
            .get_or_default()
            .await?,
    ))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ShippingRequest>,
) -> Result<Json<ShippingSettings>> {
    let settings = ShippingSettings::try_from(body)?;
    let saved = ShippingSettingsRepository::new(state.pool())
        .upsert(&settings)
        .await?;
    tracing::info!(?saved, "Shipping settings updated");
    Ok(Json(saved))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: serde_json::Value) -> ShippingRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_inverted_pair_is_accepted() {
        let settings = ShippingSettings::try_from(body(json!({
            "processingDaysMin": 3, "processingDaysMax": 1,
            "transitDaysMin": 0, "transitDaysMax": 0,
            "weekendDelivery": true
        })))
        .unwrap();
        assert_eq!(settings.processing_days_min, 3);
        assert_eq!(settings.processing_days_max, 1);
        assert!(settings.weekend_delivery);
    }

    #[test]
    fn test_negative_rejected() {
        let result = ShippingSettings::try_from(body(json!({
            "processingDaysMin": 1, "processingDaysMax": 2,
            "transitDaysMin": -1, "transitDaysMax": 5,
            "weekendDelivery": false
        })));
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("transitDaysMin")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_day_count_bounds() {
        assert_eq!(day_count(0, "x").unwrap(), 0);
        assert_eq!(day_count(365, "x").unwrap(), 365);
        assert!(day_count(366, "x").is_err());
        assert!(day_count(i64::from(i32::MAX), "x").is_err());
    }
}
