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

//! Lending rules engine.
//!
//! The [`Engine`] applies the lending rules to the borrow-record collection
//! held by a [`RecordStore`].
//!
//! # Operations
//!
//! - **Borrow**: Opens a loan unless the borrower already holds the book or is
//!   at their role's borrowing limit.
//! - **Return**: Closes an active loan, stamping the return date.
//! - **Renew**: Restarts the loan period from today, at most
//!   [`LendingPolicy::max_renewals`] times and never for an overdue loan.
//!
//! Every mutation is one read-modify-write of the whole collection: load all
//! records, change one, save all records.

use crate::backend::KeyValueStore;
use crate::base::{BookId, BorrowerId, RecordId};
use crate::catalog::Book;
use crate::error::{BorrowError, RenewError, ReturnError};
use crate::policy::{LendingPolicy, UserRole, borrow_limit};
use crate::record::BorrowRecord;
use crate::session::UserInfo;
use crate::store::RecordStore;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::debug;

/// Lending engine over an injected key-value backend.
///
/// # Invariants
///
/// - At most one active loan per `(borrower, book)` pair.
/// - A borrower's active loans never exceed [`borrow_limit`] for their role.
/// - A record is renewed at most `max_renewals` times.
/// - Records are never removed; returned loans remain as history.
#[derive(Debug)]
pub struct Engine<S> {
    records: RecordStore<S>,
    policy: LendingPolicy,
    /// Held across each read-modify-write of the collection.
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Engine<S> {
    /// Creates an engine with the default lending policy.
    pub fn new(backend: S) -> Self {
        Self::with_policy(backend, LendingPolicy::default())
    }

    pub fn with_policy(backend: S, policy: LendingPolicy) -> Self {
        Engine {
            records: RecordStore::new(backend),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.records
    }

    /// Opens a loan of `book_id` for `borrower_id` starting on `now`.
    ///
    /// # Errors
    ///
    /// - [`BorrowError::AlreadyBorrowed`] - Borrower already holds this book.
    /// - [`BorrowError::LimitExceeded`] - Borrower is at the limit for `role`.
    /// - [`BorrowError::StorageUnavailable`] - The new record could not be saved.
    pub fn borrow(
        &self,
        borrower_id: &BorrowerId,
        book_id: BookId,
        role: UserRole,
        now: NaiveDate,
    ) -> Result<BorrowRecord, BorrowError> {
        self.open_loan(borrower_id, book_id, role, now, |record| record)
    }

    /// Like [`Engine::borrow`], also copying the book's title, author, and
    /// cover and the user's name onto the record for display.
    ///
    /// `role` is passed separately (usually from
    /// [`SessionStore::identity`](crate::SessionStore::identity)) because a
    /// stored profile may omit its user type.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::borrow`].
    pub fn borrow_book(
        &self,
        user: &UserInfo,
        role: UserRole,
        book: &Book,
        now: NaiveDate,
    ) -> Result<BorrowRecord, BorrowError> {
        self.open_loan(&user.account, book.id, role, now, |record| {
            record.with_book(book).with_borrower_name(&user.name)
        })
    }

    /// Closes the loan `record_id` on `now`.
    ///
    /// # Errors
    ///
    /// - [`ReturnError::NotFound`] - No record with this id.
    /// - [`ReturnError::AlreadyReturned`] - The loan is already closed.
    /// - [`ReturnError::StorageUnavailable`] - The update could not be saved.
    pub fn return_book(
        &self,
        record_id: RecordId,
        now: NaiveDate,
    ) -> Result<BorrowRecord, ReturnError> {
        let _guard = self.write_lock.lock();
        let mut records = self.records.load_all();

        let record = records
            .iter_mut()
            .find(|record| record.id() == record_id)
            .ok_or(ReturnError::NotFound)?;
        record.mark_returned(now)?;
        let updated = record.clone();

        if !self.records.save_all(&records) {
            return Err(ReturnError::StorageUnavailable);
        }
        debug!(record = %record_id, borrower = %updated.borrower_id(), "book returned");
        Ok(updated)
    }

    /// Renews the loan `record_id`, restarting its loan period from `now`.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    ///
    /// - [`RenewError::NotFound`] - No record with this id.
    /// - [`RenewError::AlreadyReturned`] - The loan is already closed.
    /// - [`RenewError::Overdue`] - The due date is before `now`.
    /// - [`RenewError::RenewalLimitReached`] - No renewals left.
    /// - [`RenewError::StorageUnavailable`] - The update could not be saved.
    pub fn renew(&self, record_id: RecordId, now: NaiveDate) -> Result<BorrowRecord, RenewError> {
        let _guard = self.write_lock.lock();
        let mut records = self.records.load_all();

        let record = records
            .iter_mut()
            .find(|record| record.id() == record_id)
            .ok_or(RenewError::NotFound)?;
        record.renew(now, &self.policy)?;
        let updated = record.clone();

        if !self.records.save_all(&records) {
            return Err(RenewError::StorageUnavailable);
        }
        debug!(
            record = %record_id,
            due = %updated.due_date(),
            renewals = updated.renewal_count(),
            "loan renewed"
        );
        Ok(updated)
    }

    /// Every stored record, in insertion order.
    pub fn records(&self) -> Vec<BorrowRecord> {
        self.records.load_all()
    }

    /// Active loans of `borrower_id`, in insertion order.
    pub fn active_loans(&self, borrower_id: &BorrowerId) -> Vec<BorrowRecord> {
        self.records
            .load_all()
            .into_iter()
            .filter(|record| record.borrower_id() == borrower_id && record.is_active())
            .collect()
    }

    /// Active loans of `borrower_id` that are overdue on `now`.
    pub fn overdue_loans(&self, borrower_id: &BorrowerId, now: NaiveDate) -> Vec<BorrowRecord> {
        self.active_loans(borrower_id)
            .into_iter()
            .filter(|record| record.is_overdue(now))
            .collect()
    }

    /// Every record of `borrower_id`, active and returned, in insertion order.
    pub fn history(&self, borrower_id: &BorrowerId) -> Vec<BorrowRecord> {
        self.records
            .load_all()
            .into_iter()
            .filter(|record| record.borrower_id() == borrower_id)
            .collect()
    }

    /// Whether `borrower_id` currently holds `book_id`.
    pub fn is_borrowed_by(&self, borrower_id: &BorrowerId, book_id: BookId) -> bool {
        self.records
            .load_all()
            .iter()
            .any(|record| is_active_loan_of(record, borrower_id, book_id))
    }

    fn open_loan(
        &self,
        borrower_id: &BorrowerId,
        book_id: BookId,
        role: UserRole,
        now: NaiveDate,
        decorate: impl FnOnce(BorrowRecord) -> BorrowRecord,
    ) -> Result<BorrowRecord, BorrowError> {
        let _guard = self.write_lock.lock();
        let mut records = self.records.load_all();

        if records
            .iter()
            .any(|record| is_active_loan_of(record, borrower_id, book_id))
        {
            return Err(BorrowError::AlreadyBorrowed);
        }

        let limit = borrow_limit(role);
        let active = records
            .iter()
            .filter(|record| record.borrower_id() == borrower_id && record.is_active())
            .count();
        if active >= limit {
            return Err(BorrowError::LimitExceeded { limit });
        }

        let id = next_record_id(&records);
        let record = decorate(BorrowRecord::open(
            id,
            book_id,
            borrower_id.clone(),
            now,
            &self.policy,
        ));
        records.push(record.clone());

        if !self.records.save_all(&records) {
            return Err(BorrowError::StorageUnavailable);
        }
        debug!(
            record = %id,
            borrower = %borrower_id,
            book = %book_id,
            due = %record.due_date(),
            "book borrowed"
        );
        Ok(record)
    }
}

/// One past the largest stored id, falling back to the smallest unused id
/// when the largest is `u64::MAX`.
fn next_record_id(records: &[BorrowRecord]) -> RecordId {
    let Some(max) = records.iter().map(BorrowRecord::id).max() else {
        return RecordId(1);
    };
    if let Some(next) = max.checked_next() {
        return next;
    }
    let mut used: Vec<u64> = records.iter().map(|record| record.id().0).collect();
    used.sort_unstable();
    let mut candidate = 1;
    for id in used {
        if id > candidate {
            break;
        }
        if id == candidate {
            candidate += 1;
        }
    }
    RecordId(candidate)
}

fn is_active_loan_of(record: &BorrowRecord, borrower_id: &BorrowerId, book_id: BookId) -> bool {
    record.is_active() && record.book_id() == book_id && record.borrower_id() == borrower_id
}
