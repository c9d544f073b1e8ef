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

//! Catalog entries and the time-limited book cache.

use crate::backend::{KeyValueStore, keys};
use crate::base::BookId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Cached books older than this are considered stale.
pub const DEFAULT_CACHE_MAX_AGE: TimeDelta = TimeDelta::minutes(30);

/// A catalog entry as displayed to users.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CachedBooks {
    books: Vec<Book>,
    timestamp: DateTime<Utc>,
}

/// Snapshot of the catalog kept in the key-value store.
#[derive(Debug)]
pub struct BookCache<S> {
    backend: S,
}

impl<S: KeyValueStore> BookCache<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Stores `books` stamped with `now`. Returns `false` if the write failed.
    pub fn cache_books(&self, books: &[Book], now: DateTime<Utc>) -> bool {
        let entry = CachedBooks {
            books: books.to_vec(),
            timestamp: now,
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode book cache");
                return false;
            }
        };
        match self.backend.set(keys::BOOK_CACHE, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to write book cache");
                false
            }
        }
    }

    /// Returns the cached books unless the cache is missing, unreadable, or
    /// older than `max_age` at `now`.
    pub fn cached_books(&self, max_age: TimeDelta, now: DateTime<Utc>) -> Option<Vec<Book>> {
        let raw = match self.backend.get(keys::BOOK_CACHE) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read book cache");
                return None;
            }
        };
        let entry: CachedBooks = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "book cache is malformed");
                return None;
            }
        };
        if now.signed_duration_since(entry.timestamp) > max_age {
            return None;
        }
        Some(entry.books)
    }

    /// Drops the cached catalog. Returns `false` if the backend refused.
    pub fn clear(&self) -> bool {
        match self.backend.remove(keys::BOOK_CACHE) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to clear book cache");
                false
            }
        }
    }
}
