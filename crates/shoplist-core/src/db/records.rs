//! ============================================================================
//! Persisted Records - Typed access on top of the key/value store
//! ============================================================================
//! Keys:
//!   session:user_id, session:email    saved session identity
//!   settings:dark_mode                global theme flag ("true"/"false")
//!   monthly_list:<user_id>            monthly list as JSON
//!   reference_month:<user_id>         reference month label
//! ============================================================================

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::types::{ActiveList, MonthlyList};

const SESSION_USER_ID: &str = "session:user_id";
const SESSION_EMAIL: &str = "session:email";
const DARK_MODE: &str = "settings:dark_mode";

fn monthly_list_key(user_id: &str) -> String {
    format!("monthly_list:{}", user_id)
}

fn reference_month_key(user_id: &str) -> String {
    format!("reference_month:{}", user_id)
}

/// Saved login identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub email: String,
}

/// Both the user id and the email must be present to restore a session
pub fn load_session(store: &dyn KeyValueStore) -> Result<Option<SessionRecord>> {
    let user_id = store.get(SESSION_USER_ID)?.filter(|s| !s.is_empty());
    let email = store.get(SESSION_EMAIL)?.filter(|s| !s.is_empty());
    Ok(user_id.zip(email).map(|(user_id, email)| SessionRecord { user_id, email }))
}

pub fn save_session(store: &dyn KeyValueStore, session: &SessionRecord) -> Result<()> {
    store.set_many(&[
        (SESSION_USER_ID, session.user_id.as_str()),
        (SESSION_EMAIL, session.email.as_str()),
    ])?;
    debug!("Saved session for {}", session.email);
    Ok(())
}

pub fn clear_session(store: &dyn KeyValueStore) -> Result<()> {
    store.remove_many(&[SESSION_USER_ID, SESSION_EMAIL])?;
    Ok(())
}

pub fn load_dark_mode(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(store.get(DARK_MODE)?.as_deref() == Some("true"))
}

pub fn save_dark_mode(store: &dyn KeyValueStore, enabled: bool) -> Result<()> {
    store.set(DARK_MODE, if enabled { "true" } else { "false" })
}

/// Load the user's monthly list. A list without its month label (or the
/// reverse) is treated as absent.
pub fn load_active_list(store: &dyn KeyValueStore, user_id: &str) -> Result<Option<ActiveList>> {
    let list = store.get(&monthly_list_key(user_id))?;
    let month = store.get(&reference_month_key(user_id))?.filter(|m| !m.is_empty());

    match (list, month) {
        (Some(json), Some(reference_month)) => {
            let categories: MonthlyList = serde_json::from_str(&json)
                .map_err(|e| anyhow!("Failed to deserialize monthly list: {}", e))?;
            Ok(Some(ActiveList {
                reference_month,
                categories,
            }))
        }
        (None, None) => Ok(None),
        _ => {
            warn!("Incomplete monthly list record for user {}, ignoring", user_id);
            Ok(None)
        }
    }
}

pub fn save_active_list(store: &dyn KeyValueStore, user_id: &str, list: &ActiveList) -> Result<()> {
    let json = serde_json::to_string(&list.categories)
        .map_err(|e| anyhow!("Failed to serialize monthly list: {}", e))?;
    // One transaction, so a list is never paired with a stale month label
    store.set_many(&[
        (monthly_list_key(user_id).as_str(), json.as_str()),
        (reference_month_key(user_id).as_str(), list.reference_month.as_str()),
    ])?;
    debug!("Saved monthly list {} for user {}", list.reference_month, user_id);
    Ok(())
}

pub fn clear_active_list(store: &dyn KeyValueStore, user_id: &str) -> Result<()> {
    store.remove_many(&[
        monthly_list_key(user_id).as_str(),
        reference_month_key(user_id).as_str(),
    ])?;
    debug!("Cleared monthly list for user {}", user_id);
    Ok(())
}
