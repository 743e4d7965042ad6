//! ============================================================================
//! Remote Module - Automation webhook backend
//! ============================================================================
//! - RemoteBackend: async seam over login, template fetch and notifications
//! - WebhookClient: reqwest implementation against the webhook endpoints
//! - SyncQueue: fire-and-forget delivery of template mutation notifications
//! - decode: tolerant response shapes resolved into tagged results
//! ============================================================================

pub mod decode;
mod queue;
mod webhook;

pub use decode::{decode_template, extract_user_id, TemplateDecode};
pub use queue::{NotificationSink, SyncQueue, SyncStats};
pub use webhook::WebhookClient;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::types::TemplateItem;

/// Template mutation mirrored to the backend after the local change
#[derive(Debug, Clone, PartialEq)]
pub enum SyncNotification {
    CreateCategory { user_id: String, category: String },
    AddItem { user_id: String, category: String, item: TemplateItem },
    DeleteCategory { user_id: String, category: String },
    DeleteItem { user_id: String, item_id: String },
}

impl SyncNotification {
    /// Webhook path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            SyncNotification::CreateCategory { .. } => "/template/criar-sessao",
            SyncNotification::AddItem { .. } => "/template/adicionar-item",
            SyncNotification::DeleteCategory { .. } => "/template/deletar-sessao",
            SyncNotification::DeleteItem { .. } => "/template/deletar-item",
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncNotification::CreateCategory { .. } => "create-category",
            SyncNotification::AddItem { .. } => "add-item",
            SyncNotification::DeleteCategory { .. } => "delete-category",
            SyncNotification::DeleteItem { .. } => "delete-item",
        }
    }

    /// JSON request body
    pub fn body(&self) -> Value {
        match self {
            SyncNotification::CreateCategory { user_id, category }
            | SyncNotification::DeleteCategory { user_id, category } => json!({
                "user_id": user_id,
                "categoria": category,
            }),
            SyncNotification::AddItem { user_id, category, item } => json!({
                "user_id": user_id,
                "item_id": item.id,
                "categoria": category,
                "item_nome": item.name,
            }),
            SyncNotification::DeleteItem { user_id, item_id } => json!({
                "user_id": user_id,
                "item_id": item_id,
            }),
        }
    }
}

/// The automation backend as seen by the app
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// `Ok(Some(user_id))` on success, `Ok(None)` for rejected credentials.
    /// Transport or body-parse failures are errors.
    async fn login(&self, email: &str, password: &str) -> Result<Option<String>>;

    /// Raw template response body, to be run through `decode_template`
    async fn fetch_template(&self, user_id: &str) -> Result<Value>;

    /// Deliver one notification. The response body is ignored.
    async fn notify(&self, notification: &SyncNotification) -> Result<()>;
}
