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

//! Record store and backend integration tests.

use chrono::NaiveDate;
use lending_demo_rs::backend::keys;
use lending_demo_rs::demo::{DEMO_ACCOUNT, demo_records};
use lending_demo_rs::{
    BookId, BorrowerId, Engine, FileStore, KeyValueStore, LoanStatus, MemoryStore, RecordStore,
    UserRole,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn save_load_round_trip_is_idempotent() {
    let engine = Engine::new(MemoryStore::new());
    let u1 = BorrowerId::new("U1");
    let first = engine
        .borrow(&u1, BookId(1), UserRole::Student, date(2024, 1, 1))
        .unwrap();
    engine
        .borrow(&u1, BookId(2), UserRole::Student, date(2024, 1, 2))
        .unwrap();
    engine.renew(first.id(), date(2024, 1, 10)).unwrap();
    engine.return_book(first.id(), date(2024, 1, 12)).unwrap();

    let store = engine.store();
    let before = store.backend().get(keys::BORROW_RECORDS).unwrap();
    let loaded = store.load_all();
    assert!(store.save_all(&loaded));
    let after = store.backend().get(keys::BORROW_RECORDS).unwrap();

    assert_eq!(before, after);
    assert_eq!(store.load_all(), loaded);
}

#[test]
fn engine_state_survives_reopening_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let u1 = BorrowerId::new("U1");

    let record = {
        let engine = Engine::new(FileStore::open(dir.path()).unwrap());
        engine
            .borrow(&u1, BookId(1), UserRole::Student, date(2024, 1, 1))
            .unwrap()
    };

    let engine = Engine::new(FileStore::open(dir.path()).unwrap());
    assert_eq!(engine.active_loans(&u1), vec![record.clone()]);
    let returned = engine.return_book(record.id(), date(2024, 1, 3)).unwrap();
    assert_eq!(returned.status(), LoanStatus::Returned);
}

#[test]
fn corrupt_file_loads_as_empty_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::open(dir.path()).unwrap();
    backend.set(keys::BORROW_RECORDS, "[{\"id\": ").unwrap();

    let engine = Engine::new(backend);
    assert!(engine.records().is_empty());

    engine
        .borrow(&BorrowerId::new("U1"), BookId(1), UserRole::Student, date(2024, 1, 1))
        .unwrap();
    assert_eq!(engine.records().len(), 1);
}

#[test]
fn records_from_older_documents_load() {
    let backend = MemoryStore::new();
    backend
        .set(
            keys::BORROW_RECORDS,
            r#"[
                {"id": 1704096000000, "bookId": 1, "bookTitle": "To Live", "bookAuthor": "Yu Hua",
                 "bookCover": "https://picsum.photos/id/24/300/450",
                 "borrowerId": "20220001", "borrowerName": "Zhang San",
                 "borrowDate": "2024-01-01T08:00:00.000Z", "dueDate": "2024-01-31T08:00:00.000Z",
                 "status": "borrowed", "returnDate": null},
                {"id": 1704182400000, "bookId": 2, "bookTitle": "The Three-Body Problem",
                 "bookAuthor": "Liu Cixin", "borrowerId": "20220001", "borrowerName": "Zhang San",
                 "borrowDate": "2023-11-01T10:15:30.123Z", "dueDate": "2023-12-01T10:15:30.123Z",
                 "status": "overdue", "returnDate": null},
                {"id": 1003, "bookId": 3, "borrowerId": "20220001",
                 "borrowDate": "2023-10-01T00:00:00.000Z", "dueDate": "2023-10-31T00:00:00.000Z",
                 "status": "returned", "returnDate": "2023-10-20T16:45:00.000Z"}
            ]"#,
        )
        .unwrap();

    let store = RecordStore::new(backend);
    let records = store.load_all();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].borrow_date(), date(2024, 1, 1));
    assert_eq!(records[0].due_date(), date(2024, 1, 31));
    assert_eq!(records[0].renewal_count(), 0);
    assert_eq!(records[0].book_title(), Some("To Live"));
    assert_eq!(records[0].borrower_name(), Some("Zhang San"));
    assert_eq!(records[1].status(), LoanStatus::Borrowed);
    assert!(records[1].is_overdue(date(2024, 1, 2)));
    assert_eq!(records[2].return_date(), Some(date(2023, 10, 20)));

    // Written back in the current form.
    assert!(store.save_all(&records));
    let raw = store.backend().get(keys::BORROW_RECORDS).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[0]["borrowDate"], "2024-01-01");
    assert_eq!(json[1]["status"], "borrowed");
    assert_eq!(json[1]["renewalCount"], 0);
    assert_eq!(json[2]["returnDate"], "2023-10-20");
    assert_eq!(store.load_all(), records);
}

#[test]
fn older_history_survives_a_new_borrow() {
    let backend = MemoryStore::new();
    backend
        .set(
            keys::BORROW_RECORDS,
            r#"[{"id": 1704096000000, "bookId": 1, "borrowerId": "20220001",
                 "borrowDate": "2024-01-01T08:00:00.000Z", "dueDate": "2024-01-31T08:00:00.000Z",
                 "status": "borrowed", "returnDate": null}]"#,
        )
        .unwrap();

    let engine = Engine::new(backend);
    let account = BorrowerId::new("20220001");
    let record = engine
        .borrow(&account, BookId(2), UserRole::Student, date(2024, 1, 5))
        .unwrap();
    assert_eq!(record.id().0, 1_704_096_000_001);
    assert_eq!(engine.history(&account).len(), 2);
}

#[test]
fn seeded_demo_data_drives_the_engine() {
    let today = date(2024, 3, 1);
    let engine = Engine::new(MemoryStore::new());
    assert!(engine.store().seed_if_empty(&demo_records(today)));
    assert!(!engine.store().seed_if_empty(&demo_records(today)));

    let account = BorrowerId::new(DEMO_ACCOUNT);
    assert_eq!(engine.active_loans(&account).len(), 2);
    assert_eq!(engine.history(&account).len(), 3);

    let next = engine
        .borrow(&account, BookId(4), UserRole::Student, today)
        .unwrap();
    assert_eq!(next.id().0, 1004);
}
