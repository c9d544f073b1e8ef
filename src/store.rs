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

//! Persistence of the borrow-record collection.
//!
//! The whole collection is one JSON array under [`keys::BORROW_RECORDS`].
//! Reads and writes fail soft: an unreadable or malformed document loads as an
//! empty collection and a failed write reports `false`, with the cause logged.

use crate::backend::{KeyValueStore, keys};
use crate::base::RecordId;
use crate::error::StorageError;
use crate::record::BorrowRecord;
use std::collections::HashSet;
use tracing::{error, warn};

/// Borrow records stored as a single document in a [`KeyValueStore`].
#[derive(Debug)]
pub struct RecordStore<S> {
    backend: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Loads every record in stored order.
    ///
    /// Returns an empty collection when the backend is unavailable, the key is
    /// absent, or the document is malformed.
    pub fn load_all(&self) -> Vec<BorrowRecord> {
        let raw = match self.backend.get(keys::BORROW_RECORDS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read borrow records");
                return Vec::new();
            }
        };

        let records: Vec<BorrowRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "borrow records document is malformed; treating as empty");
                return Vec::new();
            }
        };

        if let Err(reason) = check_collection(&records) {
            error!(%reason, "borrow records document is inconsistent; treating as empty");
            return Vec::new();
        }

        records
    }

    /// Replaces the stored collection with `records`.
    ///
    /// Returns `false` (and logs why) if the write failed.
    pub fn save_all(&self, records: &[BorrowRecord]) -> bool {
        match self.try_save_all(records) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, count = records.len(), "failed to save borrow records");
                false
            }
        }
    }

    /// Writes `records` only when no records are stored yet.
    ///
    /// Returns `true` if the seed was written.
    pub fn seed_if_empty(&self, records: &[BorrowRecord]) -> bool {
        if !self.load_all().is_empty() {
            return false;
        }
        self.save_all(records)
    }

    fn try_save_all(&self, records: &[BorrowRecord]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(records)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.backend.set(keys::BORROW_RECORDS, &raw)
    }
}

/// Verifies that ids are unique and every record is internally consistent.
fn check_collection(records: &[BorrowRecord]) -> Result<(), String> {
    let mut seen: HashSet<RecordId> = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(format!("duplicate record id {}", record.id()));
        }
        if let Some(violation) = record.violation() {
            return Err(format!("record {}: {}", record.id(), violation));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    const TWO_RECORDS: &str = r#"[
        {"id": 1, "bookId": 1, "borrowerId": "U1", "borrowDate": "2024-01-01",
         "dueDate": "2024-01-31", "status": "borrowed", "returnDate": null, "renewalCount": 0},
        {"id": 2, "bookId": 2, "borrowerId": "U1", "borrowDate": "2024-01-02",
         "dueDate": "2024-02-01", "status": "returned", "returnDate": "2024-01-05", "renewalCount": 1}
    ]"#;

    fn store_with(raw: &str) -> RecordStore<MemoryStore> {
        let backend = MemoryStore::new();
        backend.set(keys::BORROW_RECORDS, raw).unwrap();
        RecordStore::new(backend)
    }

    #[test]
    fn missing_key_loads_empty() {
        let store = RecordStore::new(MemoryStore::new());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn loads_records_in_stored_order() {
        let records = store_with(TWO_RECORDS).load_all();
        let ids: Vec<_> = records.iter().map(BorrowRecord::id).collect();
        assert_eq!(ids, vec![RecordId(1), RecordId(2)]);
    }

    #[test]
    fn malformed_json_loads_empty() {
        assert!(store_with("{not json").load_all().is_empty());
        assert!(store_with(r#"{"id": 1}"#).load_all().is_empty());
    }

    #[test]
    fn duplicate_ids_load_empty() {
        let raw = TWO_RECORDS.replace("\"id\": 2", "\"id\": 1");
        assert!(store_with(&raw).load_all().is_empty());
    }

    #[test]
    fn unavailable_backend_loads_empty_and_fails_save() {
        let store = store_with(TWO_RECORDS);
        store.backend().set_available(false);
        assert!(store.load_all().is_empty());
        assert!(!store.save_all(&[]));
    }

    #[test]
    fn save_then_load_is_identical() {
        let store = store_with(TWO_RECORDS);
        let first = store.load_all();
        assert!(store.save_all(&first));
        let second = store.load_all();
        assert_eq!(first, second);
        assert_eq!(
            store.backend().get(keys::BORROW_RECORDS).unwrap().unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn seed_only_when_empty() {
        let seed = store_with(TWO_RECORDS).load_all();

        let empty = RecordStore::new(MemoryStore::new());
        assert!(empty.seed_if_empty(&seed));
        assert_eq!(empty.load_all(), seed);

        let populated = store_with(TWO_RECORDS);
        assert!(!populated.seed_if_empty(&seed[..1]));
        assert_eq!(populated.load_all().len(), 2);
    }
}
