//! ============================================================================
//! Shopping App - Screen controller and session orchestration
//! ============================================================================
//! Every user action is one method on `ShoppingApp`. Each applies the change
//! to `AppState` first, then:
//! - writes the affected persisted record (failures logged, never fatal)
//! - submits a sync notification for template mutations (fire-and-forget)
//!
//! Validation failures come back as `ShoplistError` with state untouched.
//! ============================================================================

use chrono::Local;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::db::{self, KeyValueStore, SessionRecord};
use crate::monthly::MonthlyListBuilder;
use crate::purchase::PurchaseTracker;
use crate::remote::{decode_template, NotificationSink, RemoteBackend, SyncNotification, TemplateDecode};
use crate::template::TemplateStore;
use crate::types::{LoginMessage, LoginOutcome, Screen, ShoplistError, TemplateItem};

/// Synchronous yes/no question put to the user
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Everything the screens render from
#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub user_id: Option<String>,
    pub email: String,
    /// Set while a login request is in flight. Rendering only: `login`
    /// holds `&mut self`, so a second request cannot start meanwhile.
    pub loading: bool,
    pub login_message: Option<LoginMessage>,
    pub dark_mode: bool,
    pub template: TemplateStore,
    /// Category the template editor adds new items to
    pub item_category: Option<String>,
    pub builder: MonthlyListBuilder,
    pub tracker: PurchaseTracker,
}

impl AppState {
    fn new(dark_mode: bool) -> Self {
        Self {
            screen: Screen::Login,
            user_id: None,
            email: String::new(),
            loading: false,
            login_message: None,
            dark_mode,
            template: TemplateStore::new(),
            item_category: None,
            builder: MonthlyListBuilder::new(),
            tracker: PurchaseTracker::new(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }
}

pub struct ShoppingApp {
    state: AppState,
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn RemoteBackend>,
    sink: Arc<dyn NotificationSink>,
    prompter: Box<dyn Prompter>,
}

impl ShoppingApp {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn RemoteBackend>,
        sink: Arc<dyn NotificationSink>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        let dark_mode = db::load_dark_mode(store.as_ref()).unwrap_or_else(|e| {
            warn!("Failed to read theme flag: {}", e);
            false
        });

        Self {
            state: AppState::new(dark_mode),
            store,
            backend,
            sink,
            prompter,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Resume a saved session, if any. Returns true when one was restored.
    pub async fn restore_session(&mut self) -> bool {
        let session = match db::load_session(self.store.as_ref()) {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to read saved session: {}", e);
                return false;
            }
        };

        info!("Restoring session for {}", session.email);
        self.begin_session(session.user_id, session.email).await;
        true
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginOutcome, ShoplistError> {
        self.state.loading = true;
        self.state.login_message = Some(LoginMessage::info("Signing in..."));

        let result = self.backend.login(email, password).await;
        self.state.loading = false;

        let outcome = match result {
            Ok(Some(user_id)) => {
                self.state.login_message = Some(LoginMessage::success("Logged in"));
                let session = SessionRecord {
                    user_id: user_id.clone(),
                    email: email.to_string(),
                };
                if let Err(e) = db::save_session(self.store.as_ref(), &session) {
                    warn!("Failed to save session: {}", e);
                }
                self.begin_session(user_id.clone(), email.to_string()).await;
                LoginOutcome::LoggedIn { user_id }
            }
            Ok(None) => {
                info!("Login rejected for {}", email);
                self.state.login_message = Some(LoginMessage::error("Invalid email or password"));
                LoginOutcome::InvalidCredentials
            }
            Err(e) => {
                error!("Login error: {}", e);
                self.state.login_message = Some(LoginMessage::error("Connection error"));
                LoginOutcome::ConnectionFailed
            }
        };

        Ok(outcome)
    }

    /// Identity set -> template hydrated -> saved list loaded -> home
    async fn begin_session(&mut self, user_id: String, email: String) {
        // Nothing user-scoped may leak from a previous session
        let login_message = self.state.login_message.take();
        self.state = AppState::new(self.state.dark_mode);
        self.state.login_message = login_message;

        self.state.user_id = Some(user_id.clone());
        self.state.email = email;

        self.hydrate_template().await;

        match db::load_active_list(self.store.as_ref(), &user_id) {
            Ok(Some(list)) => {
                debug!("Loaded saved list {}", list.reference_month);
                self.state.tracker.start(list);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load saved list: {}", e),
        }

        self.state.screen = Screen::Home;
    }

    /// Clear in-memory session state. The saved monthly list stays on disk.
    pub fn logout(&mut self) {
        info!("Logging out {}", self.state.email);

        if let Err(e) = db::clear_session(self.store.as_ref()) {
            warn!("Failed to clear saved session: {}", e);
        }

        let dark_mode = self.state.dark_mode;
        self.state = AppState::new(dark_mode);
    }

    /// Re-fetch the template. Returns true if it was replaced.
    pub async fn hydrate_template(&mut self) -> bool {
        let Some(user_id) = self.state.user_id.clone() else {
            return false;
        };

        let body = match self.backend.fetch_template(&user_id).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to load template: {}", e);
                return false;
            }
        };

        match decode_template(&body) {
            TemplateDecode::Template(template) => {
                info!("Template loaded: {} categories", template.len());
                self.state.template.replace(template);
                true
            }
            TemplateDecode::Unrecognized(reason) => {
                warn!("Ignoring template response: {}", reason);
                false
            }
        }
    }

    // ========================================================================
    // Navigation & Theme
    // ========================================================================

    pub fn navigate(&mut self, screen: Screen) -> Result<(), ShoplistError> {
        if screen != Screen::Login && !self.state.is_logged_in() {
            return Err(ShoplistError::NotLoggedIn);
        }
        debug!("Screen: {} -> {}", self.state.screen, screen);
        self.state.screen = screen;
        Ok(())
    }

    /// Flip and persist the theme flag. Returns the new value.
    pub fn toggle_theme(&mut self) -> bool {
        self.set_theme(!self.state.dark_mode)
    }

    pub fn set_theme(&mut self, dark: bool) -> bool {
        self.state.dark_mode = dark;
        if let Err(e) = db::save_dark_mode(self.store.as_ref(), dark) {
            warn!("Failed to save theme flag: {}", e);
        }
        dark
    }

    // ========================================================================
    // Template Editor
    // ========================================================================

    pub fn create_category(&mut self, name: &str) -> Result<String, ShoplistError> {
        let label = self.state.template.create_category(name)?;
        self.mirror(|user_id| SyncNotification::CreateCategory {
            user_id,
            category: label.clone(),
        });
        Ok(label)
    }

    /// Pick the category that new items go to
    pub fn select_item_category(&mut self, label: &str) -> Result<(), ShoplistError> {
        if !self.state.template.contains(label) {
            return Err(ShoplistError::UnknownCategory(label.to_string()));
        }
        self.state.item_category = Some(label.to_string());
        Ok(())
    }

    pub fn add_item(&mut self, label: &str, name: &str) -> Result<TemplateItem, ShoplistError> {
        let item = self.state.template.add_item(label, name)?;
        self.mirror(|user_id| SyncNotification::AddItem {
            user_id,
            category: label.to_string(),
            item: item.clone(),
        });
        Ok(item)
    }

    /// Delete after confirmation. Ok(false) when the user declined.
    pub fn delete_category(&mut self, label: &str) -> Result<bool, ShoplistError> {
        if !self.state.template.contains(label) {
            return Err(ShoplistError::UnknownCategory(label.to_string()));
        }

        let question = format!("Delete the category \"{}\" and all of its items?", label);
        if !self.prompter.confirm(&question) {
            return Ok(false);
        }

        self.state.template.delete_category(label);
        if self.state.item_category.as_deref() == Some(label) {
            self.state.item_category = None;
        }
        self.mirror(|user_id| SyncNotification::DeleteCategory {
            user_id,
            category: label.to_string(),
        });
        Ok(true)
    }

    /// Ok(false) when no item with that id exists in the category
    pub fn delete_item(&mut self, label: &str, item_id: &str) -> Result<bool, ShoplistError> {
        let Some(item) = self.state.template.delete_item(label, item_id)? else {
            return Ok(false);
        };
        self.mirror(|user_id| SyncNotification::DeleteItem {
            user_id,
            item_id: item.id.clone(),
        });
        Ok(true)
    }

    // ========================================================================
    // Month Builder
    // ========================================================================

    /// Returns true if the item is now selected
    pub fn toggle_selection(&mut self, category: &str, item_id: &str) -> Result<bool, ShoplistError> {
        if !self.state.template.contains(category) {
            return Err(ShoplistError::UnknownCategory(category.to_string()));
        }
        let item = self
            .state
            .template
            .find_item(category, item_id)
            .cloned()
            .ok_or_else(|| ShoplistError::UnknownItem(item_id.to_string()))?;
        Ok(self.state.builder.toggle_selection(category, &item))
    }

    /// Open the month prompt. Returns the suggested reference month.
    pub fn finalize_selection(&mut self) -> Result<String, ShoplistError> {
        self.state.builder.finalize_selection(Local::now().date_naive())
    }

    pub fn cancel_month_prompt(&mut self) {
        self.state.builder.cancel_prompt();
    }

    /// Build and activate the monthly list. Only valid while the month prompt
    /// is open. Ok(false) on an empty label.
    pub fn confirm_month(&mut self, label: &str) -> Result<bool, ShoplistError> {
        if self.state.builder.pending_month().is_none() {
            return Err(ShoplistError::MonthPromptClosed);
        }
        if self.state.builder.selected_count() == 0 {
            return Err(ShoplistError::EmptySelection);
        }

        let Some(list) = self.state.builder.confirm_month(label) else {
            return Ok(false);
        };

        self.state.tracker.start(list);
        self.persist_active_list();
        self.state.screen = Screen::Purchase;
        Ok(true)
    }

    // ========================================================================
    // Purchase
    // ========================================================================

    pub fn toggle_purchased(&mut self, category: &str, index: usize) -> Result<bool, ShoplistError> {
        let purchased = self.state.tracker.toggle_purchased(category, index)?;
        self.persist_active_list();
        Ok(purchased)
    }

    pub fn set_price(&mut self, category: &str, index: usize, raw: &str) -> Result<f64, ShoplistError> {
        let price = self.state.tracker.set_price(category, index, raw)?;
        self.persist_active_list();
        Ok(price)
    }

    pub fn total(&self) -> f64 {
        self.state.tracker.total()
    }

    /// Discard the active list after confirmation. Ok(false) when declined.
    pub fn clear_list(&mut self) -> Result<bool, ShoplistError> {
        if self.state.tracker.active().is_none() {
            return Err(ShoplistError::NoActiveList);
        }
        if !self.prompter.confirm("Clear the current list?") {
            return Ok(false);
        }

        self.state.tracker.clear();
        self.persist_active_list();
        Ok(true)
    }

    /// End the shopping trip: back to home, list kept. Returns the total.
    pub fn finish_purchase(&mut self) -> f64 {
        let total = self.total();
        info!(
            "Purchase finished for {}: {:.2}",
            self.state.tracker.reference_month(),
            total
        );
        self.state.screen = Screen::Home;
        total
    }

    // ========================================================================
    // Side Effects
    // ========================================================================

    /// Submit a notification for the logged-in user; skipped when logged out
    fn mirror(&self, build: impl FnOnce(String) -> SyncNotification) {
        if let Some(user_id) = self.state.user_id.clone() {
            self.sink.submit(build(user_id));
        }
    }

    /// Write (or remove) the user's saved list to match memory
    fn persist_active_list(&self) {
        let Some(user_id) = self.state.user_id.as_deref() else {
            return;
        };

        let result = match self.state.tracker.active() {
            Some(list) => db::save_active_list(self.store.as_ref(), user_id, list),
            None => db::clear_active_list(self.store.as_ref(), user_id),
        };
        if let Err(e) = result {
            warn!("Failed to persist monthly list: {}", e);
        }
    }
}
