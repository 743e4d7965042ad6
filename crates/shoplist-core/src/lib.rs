//! ============================================================================
//! SHOPLIST-CORE: Monthly shopping list engine
//! ============================================================================
//! This crate handles all logic behind the shopping list screens:
//! - Template of categorized items, mirrored to the automation webhooks
//! - Monthly list derivation from a selection of template items
//! - Purchase tracking with prices and running total
//! - Local persistence of session, theme and monthly list via redb
//! ============================================================================

pub mod app;
pub mod config;
pub mod db;
pub mod monthly;
pub mod purchase;
pub mod remote;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use types::*;
pub use app::{AppState, Prompter, ShoppingApp};
pub use config::AppConfig;
pub use db::{KeyValueStore, MemoryStore, ShoplistDb};
pub use remote::{NotificationSink, RemoteBackend, SyncNotification, SyncQueue, WebhookClient};
