//! Shipping settings and delivery-date estimation.
//!
//! The estimate is a pure function of "now" and the store's shipping
//! settings. Processing and transit are counted in business days unless the
//! store delivers on weekends, in which case plain calendar days are used.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Store-wide shipping timings (singleton row `shop.shipping_settings`).
///
/// `min <= max` is deliberately not enforced anywhere: an inverted pair is
/// stored and used as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSettings {
    pub processing_days_min: u32,
    pub processing_days_max: u32,
    pub transit_days_min: u32,
    pub transit_days_max: u32,
    pub weekend_delivery: bool,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            processing_days_min: 1,
            processing_days_max: 2,
            transit_days_min: 2,
            transit_days_max: 5,
            weekend_delivery: false,
        }
    }
}

/// Largest day count accepted for any of the four settings.
pub const MAX_SHIPPING_DAYS: u32 = 365;

/// Advance `date` by `days`.
///
/// Without weekend delivery, the date moves forward one calendar day at a
/// time and only Monday–Friday landings count toward `days`. With weekend
/// delivery it simply moves `days` calendar days. `days == 0` returns the
/// input unchanged in both modes, even when it falls on a weekend.
#[must_use]
pub fn add_business_days(date: NaiveDate, days: u32, weekend_delivery: bool) -> NaiveDate {
    if weekend_delivery {
        return date
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
    }

    let mut current = date;
    let mut remaining = days;
    while remaining > 0 {
        // From a weekday, every 5 business days is exactly one calendar week.
        if remaining > 5 && !is_weekend(current) {
            let weeks = (remaining - 1) / 5;
            let Some(next) = current.checked_add_days(Days::new(u64::from(weeks) * 7)) else {
                return NaiveDate::MAX;
            };
            current = next;
            remaining -= weeks * 5;
            continue;
        }

        let Some(next) = current.succ_opt() else {
            return NaiveDate::MAX;
        };
        current = next;
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    current
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every date involved in a delivery estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryEstimate {
    /// Earliest day the order could leave the warehouse.
    pub processing_start: NaiveDate,
    /// Latest day the order leaves the warehouse; transit is counted from here.
    pub processing_end: NaiveDate,
    /// Earliest delivery day.
    pub start: NaiveDate,
    /// Latest delivery day.
    pub end: NaiveDate,
}

impl DeliveryEstimate {
    /// The customer-facing `{start, end}` pair.
    #[must_use]
    pub fn range(&self) -> DeliveryRange {
        DeliveryRange {
            start: format_day_month(self.start),
            end: format_day_month(self.end),
        }
    }
}

/// Formatted delivery window, e.g. `{"start": "07 Mar", "end": "12 Mar"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRange {
    pub start: String,
    pub end: String,
}

/// Estimate the delivery window for an order placed at `now`.
///
/// Both ends of the delivery window are measured from the *latest*
/// processing day, so the window only reflects transit variance.
#[must_use]
pub fn estimate_delivery(now: DateTime<Utc>, settings: &ShippingSettings) -> DeliveryEstimate {
    let today = now.date_naive();
    let weekend = settings.weekend_delivery;

    let processing_start = add_business_days(today, settings.processing_days_min, weekend);
    let processing_end = add_business_days(today, settings.processing_days_max, weekend);

    DeliveryEstimate {
        processing_start,
        processing_end,
        start: add_business_days(processing_end, settings.transit_days_min, weekend),
        end: add_business_days(processing_end, settings.transit_days_max, weekend),
    }
}

/// `"DD Mon"` with a zero-padded day and English month abbreviation.
fn format_day_month(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-03-01 is a Friday.
    const FRIDAY: (i32, u32, u32) = (2024, 3, 1);

    fn friday() -> NaiveDate {
        date(FRIDAY.0, FRIDAY.1, FRIDAY.2)
    }

    #[test]
    fn test_zero_days_is_identity_in_both_modes() {
        let saturday = date(2024, 3, 2);
        for start in [friday(), saturday] {
            assert_eq!(add_business_days(start, 0, false), start);
            assert_eq!(add_business_days(start, 0, true), start);
        }
    }

    #[test]
    fn test_business_days_skip_weekends_from_friday() {
        assert_eq!(add_business_days(friday(), 1, false), date(2024, 3, 4));
        assert_eq!(add_business_days(friday(), 3, false), date(2024, 3, 6));
        assert_eq!(add_business_days(friday(), 5, false), date(2024, 3, 8));
        assert_eq!(add_business_days(friday(), 6, false), date(2024, 3, 11));
    }

    #[test]
    fn test_business_days_never_land_on_weekend() {
        for n in 1..=30 {
            let landed = add_business_days(friday(), n, false);
            assert!(!is_weekend(landed), "{n} business days landed on {landed}");

            let weekdays_crossed = friday()
                .iter_days()
                .skip(1)
                .take_while(|d| *d <= landed)
                .filter(|d| !is_weekend(*d))
                .count();
            assert_eq!(weekdays_crossed, n as usize);
        }
    }

    #[test]
    fn test_week_jumps_match_day_by_day_walk() {
        let saturday = date(2024, 3, 2);
        for start in [friday(), saturday] {
            let mut walked = start;
            for n in 1..=MAX_SHIPPING_DAYS {
                walked = walked.succ_opt().unwrap();
                while is_weekend(walked) {
                    walked = walked.succ_opt().unwrap();
                }
                assert_eq!(add_business_days(start, n, false), walked, "{n} days from {start}");
            }
        }
    }

    #[test]
    fn test_huge_day_counts_terminate() {
        assert_eq!(add_business_days(friday(), u32::MAX, false), NaiveDate::MAX);
        assert_eq!(add_business_days(friday(), u32::MAX, true), NaiveDate::MAX);
    }

    #[test]
    fn test_weekend_delivery_uses_calendar_days() {
        assert_eq!(add_business_days(friday(), 1, true), date(2024, 3, 2));
        assert_eq!(add_business_days(friday(), 3, true), date(2024, 3, 4));
    }

    #[test]
    fn test_estimate_with_default_settings() {
        // Wednesday 2024-03-06 09:30 UTC.
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 9, 30, 0).unwrap();
        let estimate = estimate_delivery(now, &ShippingSettings::default());

        assert_eq!(estimate.processing_start, date(2024, 3, 7));
        assert_eq!(estimate.processing_end, date(2024, 3, 8));
        assert_eq!(estimate.start, date(2024, 3, 12));
        assert_eq!(estimate.end, date(2024, 3, 15));
        assert!(estimate.end >= estimate.start);

        assert_eq!(
            estimate.range(),
            DeliveryRange {
                start: "12 Mar".to_owned(),
                end: "15 Mar".to_owned(),
            }
        );
    }

    #[test]
    fn test_default_settings_window_is_ordered_every_weekday() {
        let settings = ShippingSettings::default();
        for day in 1..=14 {
            let now = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
            let estimate = estimate_delivery(now, &settings);
            assert!(estimate.end >= estimate.start, "inverted window for {now}");
        }
    }

    #[test]
    fn test_inverted_transit_is_not_corrected() {
        let settings = ShippingSettings {
            transit_days_min: 5,
            transit_days_max: 2,
            ..ShippingSettings::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 9, 30, 0).unwrap();
        let estimate = estimate_delivery(now, &settings);

        assert!(estimate.start > estimate.end);
        assert_eq!(estimate.range().start, "15 Mar");
        assert_eq!(estimate.range().end, "12 Mar");
    }

    #[test]
    fn test_weekend_delivery_estimate() {
        let settings = ShippingSettings {
            weekend_delivery: true,
            ..ShippingSettings::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let estimate = estimate_delivery(now, &settings);

        assert_eq!(estimate.processing_end, date(2024, 3, 3));
        assert_eq!(estimate.start, date(2024, 3, 5));
        assert_eq!(estimate.end, date(2024, 3, 8));
    }

    #[test]
    fn test_format_pads_day() {
        assert_eq!(format_day_month(date(2024, 1, 5)), "05 Jan");
        assert_eq!(format_day_month(date(2024, 12, 25)), "25 Dec");
    }

    #[test]
    fn test_settings_serde_uses_camel_case() {
        let json = serde_json::to_value(ShippingSettings::default()).unwrap();
        assert_eq!(json["processingDaysMin"], 1);
        assert_eq!(json["transitDaysMax"], 5);
        assert_eq!(json["weekendDelivery"], false);
    }
}
