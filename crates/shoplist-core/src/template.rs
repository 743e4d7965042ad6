//! ============================================================================
//! Template Store - The reusable catalog of categories and items
//! ============================================================================
//! Pure in-memory mutations. Remote mirroring and user confirmation are the
//! caller's concern (see `app`).
//! ============================================================================

use chrono::Utc;
use tracing::debug;

use crate::types::{ShoplistError, Template, TemplateItem};

/// Keyword -> emoji rules, first match wins
const CATEGORY_EMOJI_RULES: &[(&[&str], &str)] = &[
    (&["higiene", "banho"], "🧼"),
    (&["limpeza"], "🧹"),
    (&["comida", "alimento"], "🍎"),
    (&["carne", "proteina"], "🥩"),
    (&["bebida"], "🥤"),
    (&["doce", "sobremesa"], "🍫"),
    (&["fruta", "vegetal"], "🥦"),
    (&["padaria", "pão"], "🥖"),
    (&["pet"], "🐾"),
];

/// Emoji used when no keyword matches
const FALLBACK_EMOJI: &str = "📦";

/// Pick the emoji for a category name (case-insensitive substring scan)
pub fn category_emoji(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    CATEGORY_EMOJI_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(FALLBACK_EMOJI)
}

/// Full label stored as the template key, e.g. "🧹 Limpeza"
pub fn category_label(name: &str) -> String {
    format!("{} {}", category_emoji(name), name)
}

/// Millisecond-clock item ids, bumped when the clock has not moved
#[derive(Debug, Default)]
pub struct ItemIdGenerator {
    last: i64,
}

impl ItemIdGenerator {
    pub fn next_id(&mut self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_ms: i64) -> String {
        let id = now_ms.max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// In-memory template for the active session
#[derive(Debug, Default)]
pub struct TemplateStore {
    categories: Template,
    ids: ItemIdGenerator,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &Template {
        &self.categories
    }

    pub fn items(&self, label: &str) -> Option<&[TemplateItem]> {
        self.categories.get(label).map(Vec::as_slice)
    }

    pub fn find_item(&self, label: &str, item_id: &str) -> Option<&TemplateItem> {
        self.items(label)?.iter().find(|i| i.id == item_id)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.categories.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Replace everything, e.g. after a remote fetch
    pub fn replace(&mut self, template: Template) {
        debug!("Template replaced: {} categories", template.len());
        self.categories = template;
    }

    pub fn clear(&mut self) {
        self.categories.clear();
    }

    /// Create an empty category. Returns the emoji-prefixed label.
    pub fn create_category(&mut self, name: &str) -> Result<String, ShoplistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShoplistError::EmptyCategoryName);
        }

        let label = category_label(name);
        if self.contains(name) || self.contains(&label) {
            debug!("Ignoring duplicate category: {}", label);
            return Err(ShoplistError::DuplicateCategory(label));
        }

        self.categories.insert(label.clone(), Vec::new());
        debug!("Created category: {}", label);
        Ok(label)
    }

    /// Append a freshly identified item to an existing category
    pub fn add_item(&mut self, label: &str, name: &str) -> Result<TemplateItem, ShoplistError> {
        let name = name.trim();
        if label.is_empty() || name.is_empty() {
            return Err(ShoplistError::MissingItemFields);
        }

        let items = self
            .categories
            .get_mut(label)
            .ok_or_else(|| ShoplistError::UnknownCategory(label.to_string()))?;

        let item = TemplateItem::new(self.ids.next_id(), name);
        items.push(item.clone());
        debug!("Added item {} ({}) to {}", item.name, item.id, label);
        Ok(item)
    }

    /// Remove a category and all its items. Returns the removed items.
    pub fn delete_category(&mut self, label: &str) -> Option<Vec<TemplateItem>> {
        let removed = self.categories.remove(label);
        if removed.is_some() {
            debug!("Deleted category: {}", label);
        }
        removed
    }

    /// Remove an item by id. `Ok(None)` when the id is not in the category.
    pub fn delete_item(
        &mut self,
        label: &str,
        item_id: &str,
    ) -> Result<Option<TemplateItem>, ShoplistError> {
        let items = self
            .categories
            .get_mut(label)
            .ok_or_else(|| ShoplistError::UnknownCategory(label.to_string()))?;

        let removed = items
            .iter()
            .position(|i| i.id == item_id)
            .map(|pos| items.remove(pos));
        if let Some(item) = &removed {
            debug!("Deleted item {} from {}", item.id, label);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_keyword_match() {
        assert_eq!(category_emoji("Produtos de Limpeza"), "🧹");
        assert_eq!(category_emoji("BEBIDAS"), "🥤");
        assert_eq!(category_emoji("Pão e Padaria"), "🥖");
        assert_eq!(category_emoji("Ração Pet"), "🐾");
        assert_eq!(category_emoji("Ferramentas"), "📦");
    }

    #[test]
    fn test_emoji_first_rule_wins() {
        // "comida" (rule 3) is listed before "pet" (rule 9)
        assert_eq!(category_emoji("Comida pet"), "🍎");
        // "higiene" beats "limpeza"
        assert_eq!(category_emoji("Higiene e limpeza"), "🧼");
    }

    #[test]
    fn test_create_category_prefixes_emoji() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Frutas").unwrap();
        assert_eq!(label, "🥦 Frutas");
        assert_eq!(store.items(&label), Some(&[][..]));
    }

    #[test]
    fn test_duplicate_category_is_rejected() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Bebidas").unwrap();
        store.add_item(&label, "Suco").unwrap();

        let err = store.create_category("Bebidas").unwrap_err();
        assert_eq!(err, ShoplistError::DuplicateCategory(label.clone()));
        assert_eq!(store.categories().len(), 1);
        // Existing items survive the rejected attempt
        assert_eq!(store.items(&label).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_category_name_rejected() {
        let mut store = TemplateStore::new();
        assert_eq!(store.create_category("   "), Err(ShoplistError::EmptyCategoryName));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_item_validation() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Carnes").unwrap();

        assert_eq!(store.add_item(&label, ""), Err(ShoplistError::MissingItemFields));
        assert_eq!(store.add_item("", "Frango"), Err(ShoplistError::MissingItemFields));
        assert_eq!(
            store.add_item("🥩 Peixes", "Salmão"),
            Err(ShoplistError::UnknownCategory("🥩 Peixes".into()))
        );
        assert!(store.items(&label).unwrap().is_empty());
    }

    #[test]
    fn test_add_then_delete_restores_length() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Doces").unwrap();
        store.add_item(&label, "Chocolate").unwrap();
        let before = store.items(&label).unwrap().len();

        let item = store.add_item(&label, "Bala").unwrap();
        assert_eq!(store.items(&label).unwrap().len(), before + 1);

        let removed = store.delete_item(&label, &item.id).unwrap();
        assert_eq!(removed, Some(item.clone()));
        assert_eq!(store.items(&label).unwrap().len(), before);
        assert!(store.find_item(&label, &item.id).is_none());
    }

    #[test]
    fn test_delete_missing_item_is_noop() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Pet").unwrap();
        assert_eq!(store.delete_item(&label, "nope"), Ok(None));
    }

    #[test]
    fn test_item_ids_unique_within_same_millisecond() {
        let mut ids = ItemIdGenerator::default();
        let a = ids.next_at(1_700_000_000_000);
        let b = ids.next_at(1_700_000_000_000);
        let c = ids.next_at(1_699_999_999_999);
        assert_eq!(a, "1700000000000");
        assert_eq!(b, "1700000000001");
        assert_eq!(c, "1700000000002");
    }

    #[test]
    fn test_delete_category_removes_items() {
        let mut store = TemplateStore::new();
        let label = store.create_category("Limpeza").unwrap();
        store.add_item(&label, "Detergente").unwrap();

        let removed = store.delete_category(&label).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!store.contains(&label));
        assert!(store.delete_category(&label).is_none());
    }
}
