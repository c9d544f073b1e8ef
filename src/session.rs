// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Current-user session kept in the key-value store.
//!
//! The engine never looks identity up itself; callers obtain an [`Identity`]
//! here and pass the borrower id and role into each engine call.

use crate::backend::{KeyValueStore, keys};
use crate::base::BorrowerId;
use crate::policy::UserRole;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stored profile of the logged-in user.
///
/// Fields this crate does not know about are preserved on rewrite.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub account: BorrowerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserRole>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
    pub fn new(account: impl Into<String>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            account: BorrowerId::new(account),
            name: name.into(),
            user_type: Some(role),
            extra: serde_json::Map::new(),
        }
    }
}

/// Who is borrowing, as consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub borrower_id: BorrowerId,
    pub role: UserRole,
}

/// Login state and user profile.
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Stores the profile and marks the session logged in.
    pub fn save_user_info(&self, info: &UserInfo) -> bool {
        let raw = match serde_json::to_string(info) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode user info");
                return false;
            }
        };
        self.write(keys::USER_INFO, &raw) && self.write(keys::LOGIN_STATUS, "true")
    }

    /// The stored profile, or `None` if absent or unreadable.
    pub fn user_info(&self) -> Option<UserInfo> {
        let raw = self.read(keys::USER_INFO)?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "stored user info is malformed");
                None
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(keys::LOGIN_STATUS).as_deref() == Some("true")
    }

    /// Clears the profile and the login flag. The stored role is kept.
    pub fn logout(&self) -> bool {
        self.delete(keys::USER_INFO) && self.delete(keys::LOGIN_STATUS)
    }

    pub fn set_user_type(&self, role: UserRole) -> bool {
        self.write(keys::USER_TYPE, role.as_str())
    }

    pub fn user_type(&self) -> Option<UserRole> {
        self.read(keys::USER_TYPE).map(UserRole::from)
    }

    /// Borrower id and role of the logged-in user.
    ///
    /// The role comes from the profile, then the separately stored user type,
    /// then defaults to student.
    pub fn identity(&self) -> Option<Identity> {
        if !self.is_logged_in() {
            return None;
        }
        let info = self.user_info()?;
        let role = info
            .user_type
            .or_else(|| self.user_type())
            .unwrap_or_default();
        Some(Identity {
            borrower_id: info.account,
            role,
        })
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key, "failed to read session");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> bool {
        match self.backend.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key, "failed to write session");
                false
            }
        }
    }

    fn delete(&self, key: &str) -> bool {
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key, "failed to clear session");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    #[test]
    fn logged_out_by_default() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.is_logged_in());
        assert_eq!(session.user_info(), None);
        assert_eq!(session.identity(), None);
    }

    #[test]
    fn unknown_profile_fields_survive() {
        let backend = MemoryStore::new();
        backend
            .set(
                keys::USER_INFO,
                r#"{"account":"20220001","name":"Zhang San","userType":"student","college":"CS"}"#,
            )
            .unwrap();
        let session = SessionStore::new(backend);
        let info = session.user_info().unwrap();
        assert_eq!(info.extra["college"], "CS");

        assert!(session.save_user_info(&info));
        let raw = session.backend.get(keys::USER_INFO).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["college"], "CS");
        assert_eq!(value["userType"], "student");
    }

    #[test]
    fn malformed_profile_is_none() {
        let backend = MemoryStore::new();
        backend.set(keys::USER_INFO, "{").unwrap();
        backend.set(keys::LOGIN_STATUS, "true").unwrap();
        let session = SessionStore::new(backend);
        assert_eq!(session.user_info(), None);
        assert_eq!(session.identity(), None);
    }
}
