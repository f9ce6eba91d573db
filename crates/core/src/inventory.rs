//! Per-size remaining stock.
//!
//! Products carry a single stock count, not a per-size ledger. Unless an
//! admin has stored an explicit `sizeStock` map in the product attributes,
//! remaining stock per size is inferred from past order items: an item whose
//! title or SKU mentions a size label counts against that size.
//!
//! The inference is crude on purpose. A label "mentions" a size when it
//! appears case-insensitively with no letter or digit directly on either
//! side (`"Shirt M"` and `"tee-m"` mention `M`, `"Shirt"` does not mention
//! `S`). Each item counts against the first declared size it mentions, and
//! every size is measured against the product-wide total rather than a
//! per-size count.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;

/// A past order line for the product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct HistoricalItem {
    pub title: String,
    pub sku: String,
    pub quantity: i64,
}

/// Everything [`resolve_size_stock`] looks at.
#[derive(Debug, Clone, Default)]
pub struct SizeStockInput {
    /// Size labels from the product's size detail records, in display order.
    pub declared_sizes: Vec<String>,
    /// Legacy comma-separated size list, used when there are no detail records.
    pub sizes_csv: Option<String>,
    /// Product-wide stock count.
    pub total_stock: i64,
    pub history: Vec<HistoricalItem>,
    /// `attributes.sizeStock`, if the product has one.
    pub explicit: Option<Value>,
}

/// Size label to remaining units, in size order.
///
/// Serializes as a JSON object: `{"S": 10, "M": 7}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeStock(Vec<(String, i64)>);

impl SizeStock {
    #[must_use]
    pub fn get(&self, size: &str) -> Option<i64> {
        self.0
            .iter()
            .find_map(|(label, remaining)| (label == size).then_some(*remaining))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(label, remaining)| (label.as_str(), *remaining))
    }
}

impl Serialize for SizeStock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, remaining) in &self.0 {
            map.serialize_entry(label, remaining)?;
        }
        map.end()
    }
}

/// Resolve remaining stock for each of a product's sizes.
///
/// A well-formed explicit map (a JSON object with integer values) is
/// returned with the stored counts, keys in label order. Anything else
/// falls through to inference from order history; an unusable explicit map
/// is never an error.
#[must_use]
pub fn resolve_size_stock(input: &SizeStockInput) -> SizeStock {
    if let Some(explicit) = input.explicit.as_ref().and_then(explicit_map) {
        return explicit;
    }

    let sizes = size_labels(input);
    if sizes.is_empty() {
        return SizeStock::default();
    }

    let needles: Vec<String> = sizes.iter().map(|s| s.to_lowercase()).collect();
    let mut ordered = vec![0_i64; sizes.len()];

    for item in &input.history {
        let title = item.title.to_lowercase();
        let sku = item.sku.to_lowercase();
        if let Some(index) = needles
            .iter()
            .position(|needle| mentions(&title, needle) || mentions(&sku, needle))
            && let Some(sold) = ordered.get_mut(index)
        {
            *sold = sold.saturating_add(item.quantity);
        }
    }

    SizeStock(
        sizes
            .into_iter()
            .zip(ordered)
            .map(|(label, sold)| (label, input.total_stock.saturating_sub(sold).max(0)))
            .collect(),
    )
}

/// Whether `needle` occurs in `haystack` without an alphanumeric neighbour.
fn mentions(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, found)| {
        let before = haystack
            .get(..start)
            .and_then(|head| head.chars().next_back());
        let after = haystack
            .get(start + found.len()..)
            .and_then(|tail| tail.chars().next());
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// The stored map's entries, ordered by label.
///
/// JSONB does not keep key order, so the admin's original order is already
/// gone by the time the map is read back; sorting keeps the output stable.
fn explicit_map(value: &Value) -> Option<SizeStock> {
    let object = value.as_object()?;
    let mut entries = object
        .iter()
        .map(|(label, remaining)| remaining.as_i64().map(|n| (label.clone(), n)))
        .collect::<Option<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Some(SizeStock(entries))
}

/// Declared sizes, else CSV tokens; duplicates keep their first position.
fn size_labels(input: &SizeStockInput) -> Vec<String> {
    let declared: Vec<&str> = input
        .declared_sizes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let raw = if declared.is_empty() {
        input
            .sizes_csv
            .as_deref()
            .map(parse_sizes_csv)
            .unwrap_or_default()
    } else {
        declared
    };

    let mut labels: Vec<String> = Vec::with_capacity(raw.len());
    for label in raw {
        if !labels.iter().any(|existing| existing == label) {
            labels.push(label.to_owned());
        }
    }
    labels
}

/// Split a `"S, M ,L,,"` style list into trimmed non-empty tokens.
#[must_use]
pub fn parse_sizes_csv(csv: &str) -> Vec<&str> {
    csv.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(title: &str, sku: &str, quantity: i64) -> HistoricalItem {
        HistoricalItem {
            title: title.to_owned(),
            sku: sku.to_owned(),
            quantity,
        }
    }

    fn sizes(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_history_reduces_matching_size() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["S", "M", "L"]),
            total_stock: 10,
            history: vec![item("Shirt M", "", 3)],
            ..SizeStockInput::default()
        };

        let stock = resolve_size_stock(&input);
        assert_eq!(
            serde_json::to_value(&stock).unwrap(),
            json!({"S": 10, "M": 7, "L": 10})
        );
    }

    #[test]
    fn test_explicit_map_wins() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["S", "M", "L"]),
            total_stock: 99,
            history: vec![item("Tee S", "TEE-S", 50)],
            explicit: Some(json!({"S": 2, "M": 0})),
            ..SizeStockInput::default()
        };

        let stock = resolve_size_stock(&input);
        assert_eq!(serde_json::to_value(&stock).unwrap(), json!({"S": 2, "M": 0}));
        assert_eq!(stock.get("L"), None);
    }

    #[test]
    fn test_explicit_map_keys_come_back_sorted() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["XL", "S"]),
            explicit: Some(json!({"XL": 1, "S": 2})),
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert_eq!(stock.iter().collect::<Vec<_>>(), vec![("S", 2), ("XL", 1)]);
        assert_eq!(serde_json::to_string(&stock).unwrap(), r#"{"S":2,"XL":1}"#);
    }

    #[test]
    fn test_malformed_explicit_map_is_ignored() {
        for explicit in [json!(["S", "M"]), json!("S:2"), json!({"S": "two"}), json!({"S": 1.5})] {
            let input = SizeStockInput {
                declared_sizes: sizes(&["S", "M"]),
                total_stock: 4,
                history: vec![item("Hoodie", "hood-m", 1)],
                explicit: Some(explicit),
                ..SizeStockInput::default()
            };
            let stock = resolve_size_stock(&input);
            assert_eq!(stock.get("S"), Some(4));
            assert_eq!(stock.get("M"), Some(3));
        }
    }

    #[test]
    fn test_no_sizes_yields_empty_map() {
        let input = SizeStockInput {
            total_stock: 5,
            history: vec![item("Cap", "cap", 1)],
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert!(stock.is_empty());
        assert_eq!(serde_json::to_string(&stock).unwrap(), "{}");

        let blank_csv = SizeStockInput {
            sizes_csv: Some(" , ,".to_owned()),
            ..input
        };
        assert!(resolve_size_stock(&blank_csv).is_empty());
    }

    #[test]
    fn test_falls_back_to_csv() {
        let input = SizeStockInput {
            sizes_csv: Some(" XS, XL ,, XS".to_owned()),
            total_stock: 6,
            history: vec![item("Parka - XL", "", 2)],
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert_eq!(stock.len(), 2);
        assert_eq!(stock.iter().collect::<Vec<_>>(), vec![("XS", 6), ("XL", 4)]);
    }

    #[test]
    fn test_first_matching_size_takes_the_whole_item() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["M", "S", "XL"]),
            total_stock: 5,
            history: vec![item("Sock bundle S + M", "", 2), item("Shirt XL", "", 1)],
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert_eq!(stock.get("M"), Some(3));
        assert_eq!(stock.get("S"), Some(5));
        assert_eq!(stock.get("XL"), Some(4));
    }

    #[test]
    fn test_mentions_requires_boundaries() {
        assert!(mentions("shirt m", "m"));
        assert!(mentions("tee-m", "m"));
        assert!(mentions("one size fits all", "one size"));
        assert!(mentions("jeans 32/34", "32"));
        assert!(!mentions("shirt m", "s"));
        assert!(!mentions("shirt xl", "l"));
        assert!(!mentions("", "m"));
    }

    #[test]
    fn test_sku_match_is_case_insensitive() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["m"]),
            total_stock: 3,
            history: vec![item("Linen shirt", "LIN-M", 1)],
            ..SizeStockInput::default()
        };
        assert_eq!(resolve_size_stock(&input).get("m"), Some(2));
    }

    #[test]
    fn test_remaining_never_negative() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["S", "M"]),
            total_stock: 2,
            history: vec![item("Tee S", "", 5), item("Tee S", "", 7), item("Tee", "", 100)],
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert_eq!(stock.get("S"), Some(0));
        assert_eq!(stock.get("M"), Some(2));
        assert!(stock.iter().all(|(_, remaining)| remaining >= 0));
    }

    #[test]
    fn test_duplicate_declared_sizes_collapse() {
        let input = SizeStockInput {
            declared_sizes: sizes(&["M", "S", "M"]),
            total_stock: 1,
            ..SizeStockInput::default()
        };
        let stock = resolve_size_stock(&input);
        assert_eq!(stock.iter().collect::<Vec<_>>(), vec![("M", 1), ("S", 1)]);
    }
}
