//! Local sign-in. The identity is captured from an email address and kept in
//! the store; there is no password or remote verification.

use crate::error::{AtomError, Result};
use crate::store::{KeyValueStore, StoreKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl UserIdentity {
    pub fn from_email(email: &str) -> Result<Self> {
        let email = email.trim();
        let Some((name, _domain)) = email.split_once('@') else {
            return Err(AtomError::invalid(format!("not an email address: {:?}", email)));
        };

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            avatar: format!("{}{}", AVATAR_BASE_URL, email),
        })
    }
}

/// Capture and persist the identity for `email`
pub fn login(store: &dyn KeyValueStore, email: &str) -> Result<UserIdentity> {
    let user = UserIdentity::from_email(email)?;
    store.set(StoreKey::CurrentUser, &serde_json::to_string(&user)?)?;
    debug!(name = %user.name, "logged in");
    Ok(user)
}

/// The signed-in user, if any. Unreadable records count as signed out.
pub fn current_user(store: &dyn KeyValueStore) -> Option<UserIdentity> {
    let raw = match store.get(StoreKey::CurrentUser) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, "could not read current user");
            return None;
        }
    };

    serde_json::from_str(&raw)
        .map_err(|e| warn!(error = %e, "persisted user malformed, ignoring"))
        .ok()
}

pub fn logout(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(StoreKey::CurrentUser)
}
