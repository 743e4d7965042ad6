//! ============================================================================
//! Core Types - Shared data structures for the shopping list
//! ============================================================================
//! Field names on the serde side follow the webhook/storage contract
//! (`nome`, `comprado`, `preco`); Rust-side names are English.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Template Types
// ============================================================================

/// One reusable entry in the template catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    /// Unique within its category
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
}

impl TemplateItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Category label (emoji-prefixed) -> ordered items
pub type Template = BTreeMap<String, Vec<TemplateItem>>;

/// Items picked for the next monthly list, keyed like the template
pub type SelectionSet = BTreeMap<String, Vec<TemplateItem>>;

// ============================================================================
// Monthly List Types
// ============================================================================

/// An item on the month's purchase list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "comprado", default)]
    pub purchased: bool,
    #[serde(rename = "preco", default)]
    pub price: f64,
}

impl From<&TemplateItem> for PurchaseItem {
    fn from(item: &TemplateItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            purchased: false,
            price: 0.0,
        }
    }
}

/// Category label -> purchase items. Only categories with at least one item.
pub type MonthlyList = BTreeMap<String, Vec<PurchaseItem>>;

/// A monthly list together with its reference month.
/// The two only ever exist together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveList {
    pub reference_month: String,
    pub categories: MonthlyList,
}

impl ActiveList {
    pub fn item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn purchased_count(&self) -> usize {
        self.categories
            .values()
            .flatten()
            .filter(|item| item.purchased)
            .count()
    }
}

// ============================================================================
// Screen & Session Types
// ============================================================================

/// The five screens of the application flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    Home,
    Template,
    MonthBuilder,
    Purchase,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Login => "login",
            Screen::Home => "home",
            Screen::Template => "template",
            Screen::MonthBuilder => "month-builder",
            Screen::Purchase => "purchase",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// Inline message shown on the login screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl LoginMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Error, text: text.into() }
    }
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn { user_id: String },
    InvalidCredentials,
    ConnectionFailed,
}

// ============================================================================
// Errors
// ============================================================================

/// Validation failures surfaced to the user. State is untouched when returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShoplistError {
    #[error("Category name must not be empty")]
    EmptyCategoryName,

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Fill in the item name and select a category")]
    MissingItemFields,

    #[error("Category not found: {0}")]
    UnknownCategory(String),

    #[error("Item not found: {0}")]
    UnknownItem(String),

    #[error("Select at least one item")]
    EmptySelection,

    #[error("Reference month must not be empty")]
    EmptyMonthLabel,

    #[error("No monthly list is active")]
    NoActiveList,

    #[error("No item at position {index} in {category}")]
    ItemIndexOutOfRange { category: String, index: usize },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Finish the selection before choosing a month")]
    MonthPromptClosed,
}
