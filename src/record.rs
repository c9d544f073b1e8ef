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

//! Borrow record lifecycle.
//!
//! A record is created `Borrowed`, may be renewed while it is still active and
//! not overdue, and ends `Returned`. Records are never deleted; returned ones
//! stay in the collection as history.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use lending_demo_rs::{BookId, BorrowerId, Engine, MemoryStore, UserRole};
//!
//! let engine = Engine::new(MemoryStore::new());
//! let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let record = engine
//!     .borrow(&BorrowerId::new("U1"), BookId(1), UserRole::Student, today)
//!     .unwrap();
//! assert_eq!(record.remaining_days(today), 30);
//! assert!(!record.is_overdue(today));
//! ```

use crate::base::{BookId, BorrowerId, RecordId};
use crate::catalog::Book;
use crate::error::{RenewError, ReturnError};
use crate::policy::LendingPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//  Borrowed ──renew (≤ max_renewals, not overdue)──► Borrowed
//     │
//     └──return──► Returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Older documents stored a derived `"overdue"` status; it is read back
    /// as an active loan.
    #[serde(alias = "overdue")]
    Borrowed,
    Returned,
}

/// A single loan of a book to a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    id: RecordId,
    book_id: BookId,
    borrower_id: BorrowerId,
    #[serde(deserialize_with = "calendar_date::deserialize")]
    borrow_date: NaiveDate,
    #[serde(deserialize_with = "calendar_date::deserialize")]
    due_date: NaiveDate,
    status: LoanStatus,
    #[serde(default, deserialize_with = "calendar_date::deserialize_option")]
    return_date: Option<NaiveDate>,
    #[serde(default)]
    renewal_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    borrower_name: Option<String>,
}

impl BorrowRecord {
    /// Opens a new active loan starting on `now`.
    pub(crate) fn open(
        id: RecordId,
        book_id: BookId,
        borrower_id: BorrowerId,
        now: NaiveDate,
        policy: &LendingPolicy,
    ) -> Self {
        let record = Self {
            id,
            book_id,
            borrower_id,
            borrow_date: now,
            due_date: policy.due_date_from(now),
            status: LoanStatus::Borrowed,
            return_date: None,
            renewal_count: 0,
            book_title: None,
            book_author: None,
            book_cover: None,
            borrower_name: None,
        };
        record.assert_invariants();
        record
    }

    /// Copies the catalog's display fields onto the record.
    pub(crate) fn with_book(mut self, book: &Book) -> Self {
        self.book_title = Some(book.title.clone());
        self.book_author = Some(book.author.clone());
        self.book_cover = book.cover.clone();
        self
    }

    pub(crate) fn with_borrower_name(mut self, name: &str) -> Self {
        self.borrower_name = Some(name.to_string());
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn borrower_id(&self) -> &BorrowerId {
        &self.borrower_id
    }

    pub fn borrow_date(&self) -> NaiveDate {
        self.borrow_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn renewal_count(&self) -> u32 {
        self.renewal_count
    }

    pub fn book_title(&self) -> Option<&str> {
        self.book_title.as_deref()
    }

    pub fn book_author(&self) -> Option<&str> {
        self.book_author.as_deref()
    }

    pub fn book_cover(&self) -> Option<&str> {
        self.book_cover.as_deref()
    }

    pub fn borrower_name(&self) -> Option<&str> {
        self.borrower_name.as_deref()
    }

    /// `true` while the loan has not been returned.
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Borrowed
    }

    /// `true` for an active loan whose due date is before `now`.
    pub fn is_overdue(&self, now: NaiveDate) -> bool {
        self.is_active() && self.due_date < now
    }

    /// Whole days until the due date; negative values count days overdue.
    pub fn remaining_days(&self, now: NaiveDate) -> i64 {
        self.due_date.signed_duration_since(now).num_days()
    }

    /// Closes the loan.
    ///
    /// A `now` earlier than the borrow date is clamped to the borrow date.
    pub(crate) fn mark_returned(&mut self, now: NaiveDate) -> Result<(), ReturnError> {
        if !self.is_active() {
            return Err(ReturnError::AlreadyReturned);
        }
        self.close(now);
        Ok(())
    }

    /// Builds an already returned record from a freshly opened one.
    pub(crate) fn returned_on(mut self, date: NaiveDate) -> Self {
        self.close(date);
        self
    }

    fn close(&mut self, date: NaiveDate) {
        self.status = LoanStatus::Returned;
        self.return_date = Some(date.max(self.borrow_date));
        self.assert_invariants();
    }

    /// Restarts the loan period from `now`.
    pub(crate) fn renew(
        &mut self,
        now: NaiveDate,
        policy: &LendingPolicy,
    ) -> Result<(), RenewError> {
        if !self.is_active() {
            return Err(RenewError::AlreadyReturned);
        }
        if self.is_overdue(now) {
            return Err(RenewError::Overdue);
        }
        if self.renewal_count >= policy.max_renewals {
            return Err(RenewError::RenewalLimitReached);
        }
        // `now` before the borrow date must not put the due date before it.
        self.due_date = policy.due_date_from(now).max(self.borrow_date);
        self.renewal_count += 1;
        self.assert_invariants();
        Ok(())
    }

    /// Describes the first invariant a stored record breaks, if any.
    pub(crate) fn violation(&self) -> Option<&'static str> {
        if self.due_date < self.borrow_date {
            return Some("due date precedes borrow date");
        }
        match (self.status, self.return_date) {
            (LoanStatus::Borrowed, Some(_)) => Some("active loan carries a return date"),
            (LoanStatus::Returned, None) => Some("returned loan lacks a return date"),
            (LoanStatus::Returned, Some(returned)) if returned < self.borrow_date => {
                Some("return date precedes borrow date")
            }
            _ => None,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.violation().is_none(),
            "Invariant violated on record {}: {:?}",
            self.id,
            self.violation()
        );
    }
}

/// Reads dates stored either as `YYYY-MM-DD` or as a full RFC 3339 timestamp
/// (`2024-01-01T08:00:00.000Z`), keeping the calendar date in the timestamp's
/// own offset. Dates are always written back as `YYYY-MM-DD`.
mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub(super) fn parse(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive()))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw:?}")))
    }

    pub(super) fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {raw:?}"))),
            None => Ok(None),
        }
    }
}

/// Free-function form of [`BorrowRecord::is_overdue`].
pub fn is_overdue(record: &BorrowRecord, now: NaiveDate) -> bool {
    record.is_overdue(now)
}

/// Free-function form of [`BorrowRecord::remaining_days`].
pub fn remaining_days(record: &BorrowRecord, now: NaiveDate) -> i64 {
    record.remaining_days(now)
}
