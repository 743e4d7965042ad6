//! ============================================================================
//! Monthly List Builder - Selection of template items for one shopping cycle
//! ============================================================================

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::types::{ActiveList, MonthlyList, PurchaseItem, SelectionSet, ShoplistError, TemplateItem};

const MONTH_NAMES_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

/// Suggested reference month, long form as pt-BR renders it ("março de 2024")
pub fn default_month_label(date: NaiveDate) -> String {
    format!("{} de {}", MONTH_NAMES_PT[date.month0() as usize], date.year())
}

/// Selection state between "start month list" and "confirm month list"
#[derive(Debug, Default)]
pub struct MonthlyListBuilder {
    selection: SelectionSet,
    /// Suggested label while the month prompt is open
    pending_month: Option<String>,
}

impl MonthlyListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn is_selected(&self, category: &str, item_id: &str) -> bool {
        self.selection
            .get(category)
            .map(|items| items.iter().any(|i| i.id == item_id))
            .unwrap_or(false)
    }

    /// Number of selected items across all categories
    pub fn selected_count(&self) -> usize {
        self.selection.values().map(Vec::len).sum()
    }

    /// Flip membership of `item` in `category`. Returns true if now selected.
    pub fn toggle_selection(&mut self, category: &str, item: &TemplateItem) -> bool {
        let current = self.selection.entry(category.to_string()).or_default();
        match current.iter().position(|i| i.id == item.id) {
            Some(pos) => {
                current.remove(pos);
                false
            }
            None => {
                current.push(item.clone());
                true
            }
        }
    }

    /// Validate the selection and open the month prompt with a suggested label
    pub fn finalize_selection(&mut self, today: NaiveDate) -> Result<String, ShoplistError> {
        if self.selected_count() == 0 {
            return Err(ShoplistError::EmptySelection);
        }

        let label = default_month_label(today);
        debug!("Month prompt opened with suggestion: {}", label);
        self.pending_month = Some(label.clone());
        Ok(label)
    }

    pub fn pending_month(&self) -> Option<&str> {
        self.pending_month.as_deref()
    }

    /// Close the month prompt, keeping the selection
    pub fn cancel_prompt(&mut self) {
        self.pending_month = None;
    }

    /// Build the monthly list for `label`. `None` when the label is empty.
    /// Categories without selected items are left out.
    pub fn confirm_month(&mut self, label: &str) -> Option<ActiveList> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        let categories: MonthlyList = self
            .selection
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(cat, items)| (cat.clone(), items.iter().map(PurchaseItem::from).collect()))
            .collect();

        self.reset();

        let list = ActiveList {
            reference_month: label.to_string(),
            categories,
        };
        info!(
            "Monthly list for {} built: {} items in {} categories",
            list.reference_month,
            list.item_count(),
            list.categories.len()
        );
        Some(list)
    }

    pub fn reset(&mut self) {
        self.selection.clear();
        self.pending_month = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apple() -> TemplateItem {
        TemplateItem::new("a", "Apple")
    }

    #[test]
    fn test_default_month_label() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(default_month_label(date), "março de 2024");
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(default_month_label(date), "dezembro de 2025");
    }

    #[test]
    fn test_toggle_is_symmetric() {
        let mut builder = MonthlyListBuilder::new();
        assert!(builder.toggle_selection("🍎 Fruits", &apple()));
        assert!(builder.is_selected("🍎 Fruits", "a"));
        assert!(!builder.toggle_selection("🍎 Fruits", &apple()));
        assert!(!builder.is_selected("🍎 Fruits", "a"));
        assert_eq!(builder.selected_count(), 0);
    }

    #[test]
    fn test_finalize_empty_selection_fails() {
        let mut builder = MonthlyListBuilder::new();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(builder.finalize_selection(today), Err(ShoplistError::EmptySelection));
        assert!(builder.pending_month().is_none());

        // Toggled on then off leaves an empty list under the key, still empty overall
        builder.toggle_selection("🍎 Fruits", &apple());
        builder.toggle_selection("🍎 Fruits", &apple());
        assert_eq!(builder.finalize_selection(today), Err(ShoplistError::EmptySelection));
    }

    #[test]
    fn test_finalize_opens_prompt() {
        let mut builder = MonthlyListBuilder::new();
        builder.toggle_selection("🍎 Fruits", &apple());
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let label = builder.finalize_selection(today).unwrap();
        assert_eq!(builder.pending_month(), Some(label.as_str()));

        builder.cancel_prompt();
        assert!(builder.pending_month().is_none());
        assert_eq!(builder.selected_count(), 1);
    }

    #[test]
    fn test_confirm_omits_empty_categories() {
        let mut builder = MonthlyListBuilder::new();
        builder.toggle_selection("Fruits", &apple());
        let milk = TemplateItem::new("m", "Milk");
        builder.toggle_selection("Dairy", &milk);
        builder.toggle_selection("Dairy", &milk);

        let list = builder.confirm_month("March/2024").unwrap();
        assert_eq!(list.categories.len(), 1);
        assert!(list.categories.contains_key("Fruits"));
        assert!(!list.categories.contains_key("Dairy"));
    }

    #[test]
    fn test_confirm_builds_unpurchased_items() {
        let mut builder = MonthlyListBuilder::new();
        builder.toggle_selection("🍎 Fruits", &apple());

        let list = builder.confirm_month("March/2024").unwrap();
        assert_eq!(list.reference_month, "March/2024");
        assert_eq!(
            list.categories["🍎 Fruits"],
            vec![PurchaseItem {
                id: "a".into(),
                name: "Apple".into(),
                purchased: false,
                price: 0.0,
            }]
        );
        // Selection is consumed
        assert_eq!(builder.selected_count(), 0);
    }

    #[test]
    fn test_confirm_with_empty_label_is_noop() {
        let mut builder = MonthlyListBuilder::new();
        builder.toggle_selection("🍎 Fruits", &apple());
        assert!(builder.confirm_month("  ").is_none());
        assert_eq!(builder.selected_count(), 1);
    }
}
