//! ============================================================================
//! Purchase Tracker - Purchased flags, prices and running total
//! ============================================================================

use tracing::debug;

use crate::types::{ActiveList, PurchaseItem, ShoplistError};

/// Parse a typed price the lenient way: the longest numeric prefix wins,
/// anything without one is 0. "12." -> 12, "3.50abc" -> 3.5, "abc" -> 0.
pub fn parse_price(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Mutable purchase state over the active monthly list
#[derive(Debug, Default)]
pub struct PurchaseTracker {
    active: Option<ActiveList>,
}

impl PurchaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveList> {
        self.active.as_ref()
    }

    /// Reference month of the active list, empty when none
    pub fn reference_month(&self) -> &str {
        self.active
            .as_ref()
            .map(|a| a.reference_month.as_str())
            .unwrap_or("")
    }

    /// Install a list, replacing whatever was active
    pub fn start(&mut self, list: ActiveList) {
        self.active = Some(list);
    }

    /// Drop the active list. Returns it if there was one.
    pub fn clear(&mut self) -> Option<ActiveList> {
        self.active.take()
    }

    fn item_mut(&mut self, category: &str, index: usize) -> Result<&mut PurchaseItem, ShoplistError> {
        let active = self.active.as_mut().ok_or(ShoplistError::NoActiveList)?;
        let items = active
            .categories
            .get_mut(category)
            .ok_or_else(|| ShoplistError::UnknownCategory(category.to_string()))?;
        items
            .get_mut(index)
            .ok_or_else(|| ShoplistError::ItemIndexOutOfRange {
                category: category.to_string(),
                index,
            })
    }

    /// Flip the purchased flag. Returns the new value.
    pub fn toggle_purchased(&mut self, category: &str, index: usize) -> Result<bool, ShoplistError> {
        let item = self.item_mut(category, index)?;
        item.purchased = !item.purchased;
        debug!("{} purchased: {}", item.name, item.purchased);
        Ok(item.purchased)
    }

    /// Overwrite the price from typed text. Returns the stored price.
    pub fn set_price(&mut self, category: &str, index: usize, raw: &str) -> Result<f64, ShoplistError> {
        let price = parse_price(raw);
        let item = self.item_mut(category, index)?;
        item.price = price;
        debug!("{} price: {:.2}", item.name, price);
        Ok(price)
    }

    /// Sum of prices of purchased items
    pub fn total(&self) -> f64 {
        self.active
            .as_ref()
            .map(|a| {
                a.categories
                    .values()
                    .flatten()
                    .filter(|item| item.purchased)
                    .map(|item| item.price)
                    .sum()
            })
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MonthlyList, TemplateItem};

    fn tracker_with(items: &[(&str, &str)]) -> PurchaseTracker {
        let mut categories = MonthlyList::new();
        categories.insert(
            "🍎 Fruits".to_string(),
            items
                .iter()
                .map(|(id, name)| PurchaseItem::from(&TemplateItem::new(*id, *name)))
                .collect(),
        );
        let mut tracker = PurchaseTracker::new();
        tracker.start(ActiveList {
            reference_month: "March/2024".into(),
            categories,
        });
        tracker
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("3.50"), 3.5);
        assert_eq!(parse_price("12."), 12.0);
        assert_eq!(parse_price(".5"), 0.5);
        assert_eq!(parse_price("  7"), 7.0);
        assert_eq!(parse_price("3.50abc"), 3.5);
        assert_eq!(parse_price("1e2"), 100.0);
        assert_eq!(parse_price("1e"), 1.0);
        assert_eq!(parse_price("-2"), -2.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("."), 0.0);
        assert_eq!(parse_price("abc"), 0.0);
        assert_eq!(parse_price("1e999"), 0.0);
    }

    #[test]
    fn test_purchase_and_price_total() {
        let mut tracker = tracker_with(&[("a", "Apple")]);
        assert!(tracker.toggle_purchased("🍎 Fruits", 0).unwrap());
        tracker.set_price("🍎 Fruits", 0, "3.50").unwrap();
        assert_eq!(tracker.total(), 3.5);
    }

    #[test]
    fn test_price_on_unpurchased_item_not_counted() {
        let mut tracker = tracker_with(&[("a", "Apple"), ("b", "Banana")]);
        tracker.toggle_purchased("🍎 Fruits", 0).unwrap();
        tracker.set_price("🍎 Fruits", 0, "2").unwrap();
        tracker.set_price("🍎 Fruits", 1, "10").unwrap();
        assert_eq!(tracker.total(), 2.0);

        tracker.toggle_purchased("🍎 Fruits", 1).unwrap();
        assert_eq!(tracker.total(), 12.0);
    }

    #[test]
    fn test_toggle_zero_price_keeps_total() {
        let mut tracker = tracker_with(&[("a", "Apple"), ("b", "Banana")]);
        tracker.toggle_purchased("🍎 Fruits", 0).unwrap();
        tracker.set_price("🍎 Fruits", 0, "4").unwrap();
        let before = tracker.total();
        tracker.toggle_purchased("🍎 Fruits", 1).unwrap();
        assert_eq!(tracker.total(), before);
        tracker.toggle_purchased("🍎 Fruits", 1).unwrap();
        assert_eq!(tracker.total(), before);
    }

    #[test]
    fn test_invalid_price_coerced_to_zero() {
        let mut tracker = tracker_with(&[("a", "Apple")]);
        tracker.set_price("🍎 Fruits", 0, "5").unwrap();
        assert_eq!(tracker.set_price("🍎 Fruits", 0, "abc").unwrap(), 0.0);
    }

    #[test]
    fn test_operations_without_list() {
        let mut tracker = PurchaseTracker::new();
        assert_eq!(tracker.toggle_purchased("x", 0), Err(ShoplistError::NoActiveList));
        assert_eq!(tracker.set_price("x", 0, "1"), Err(ShoplistError::NoActiveList));
        assert_eq!(tracker.total(), 0.0);
        assert_eq!(tracker.reference_month(), "");
    }

    #[test]
    fn test_out_of_range_index() {
        let mut tracker = tracker_with(&[("a", "Apple")]);
        assert_eq!(
            tracker.toggle_purchased("🍎 Fruits", 3),
            Err(ShoplistError::ItemIndexOutOfRange {
                category: "🍎 Fruits".into(),
                index: 3
            })
        );
    }

    #[test]
    fn test_clear_resets_month() {
        let mut tracker = tracker_with(&[("a", "Apple")]);
        assert!(tracker.clear().is_some());
        assert!(tracker.active().is_none());
        assert_eq!(tracker.reference_month(), "");
    }
}
