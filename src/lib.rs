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

//! # Lending Demo
//!
//! This library provides a borrow-record lifecycle engine for a library
//! lending service: borrowing, returning, and renewing books, with due dates,
//! derived overdue status, renewal caps, and role-based borrowing limits.
//!
//! ## Core Components
//!
//! - [`Engine`]: Applies the lending rules and persists the record collection
//! - [`BorrowRecord`]: A single loan and its lifecycle
//! - [`RecordStore`]: Fail-soft persistence of the whole record collection
//! - [`KeyValueStore`]: Storage backend seam ([`MemoryStore`], [`FileStore`])
//! - [`SessionStore`]: Current user and role, fed into engine calls
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use lending_demo_rs::{BookId, BorrowerId, Engine, LoanStatus, MemoryStore, UserRole};
//!
//! let engine = Engine::new(MemoryStore::new());
//! let user = BorrowerId::new("U1");
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//!
//! let record = engine.borrow(&user, BookId(1), UserRole::Student, day(1, 1)).unwrap();
//! assert_eq!(record.due_date(), day(1, 31));
//!
//! let record = engine.renew(record.id(), day(1, 20)).unwrap();
//! assert_eq!(record.due_date(), day(2, 19));
//!
//! let record = engine.return_book(record.id(), day(2, 10)).unwrap();
//! assert_eq!(record.status(), LoanStatus::Returned);
//! assert!(engine.active_loans(&user).is_empty());
//! ```
//!
//! ## Time
//!
//! No operation reads the clock. Every call that depends on the date takes it
//! as a parameter.

pub mod backend;
mod base;
pub mod catalog;
pub mod demo;
mod engine;
pub mod error;
pub mod policy;
mod record;
mod session;
mod store;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use base::{BookId, BorrowerId, RecordId};
pub use catalog::{Book, BookCache};
pub use engine::Engine;
pub use error::{BorrowError, RenewError, ReturnError, StorageError};
pub use policy::{LendingPolicy, UserRole, borrow_limit};
pub use record::{BorrowRecord, LoanStatus, is_overdue, remaining_days};
pub use session::{Identity, SessionStore, UserInfo};
pub use store::RecordStore;
