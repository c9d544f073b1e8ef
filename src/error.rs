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

//! Error types for lending operations and storage backends.

use thiserror::Error;

/// Key-value backend failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not be read or written
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Write would exceed the backend's capacity
    #[error("storage quota exceeded writing {key} ({needed} bytes, {quota} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// Key contains characters the backend cannot store
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Reasons a borrow is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BorrowError {
    /// Borrower already holds an active loan of this book
    #[error("book already borrowed by this user")]
    AlreadyBorrowed,

    /// Borrower is at their active-loan cap
    #[error("borrowing limit of {limit} active loans reached")]
    LimitExceeded { limit: usize },

    /// Updated records could not be persisted
    #[error("storage unavailable")]
    StorageUnavailable,
}

/// Reasons a return is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReturnError {
    /// No record with the given id
    #[error("borrow record not found")]
    NotFound,

    /// Record is already closed
    #[error("book already returned")]
    AlreadyReturned,

    /// Updated records could not be persisted
    #[error("storage unavailable")]
    StorageUnavailable,
}

/// Reasons a renewal is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenewError {
    /// No record with the given id
    #[error("borrow record not found")]
    NotFound,

    /// Record is already closed
    #[error("book already returned")]
    AlreadyReturned,

    /// Overdue loans cannot be renewed
    #[error("loan is overdue")]
    Overdue,

    /// Record has used all its renewals
    #[error("renewal limit reached")]
    RenewalLimitReached,

    /// Updated records could not be persisted
    #[error("storage unavailable")]
    StorageUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            BorrowError::AlreadyBorrowed.to_string(),
            "book already borrowed by this user"
        );
        assert_eq!(
            BorrowError::LimitExceeded { limit: 10 }.to_string(),
            "borrowing limit of 10 active loans reached"
        );
        assert_eq!(ReturnError::NotFound.to_string(), "borrow record not found");
        assert_eq!(ReturnError::AlreadyReturned.to_string(), "book already returned");
        assert_eq!(RenewError::Overdue.to_string(), "loan is overdue");
        assert_eq!(
            RenewError::RenewalLimitReached.to_string(),
            "renewal limit reached"
        );
        assert_eq!(RenewError::StorageUnavailable.to_string(), "storage unavailable");
        assert_eq!(
            StorageError::QuotaExceeded {
                key: "library_borrow_records".to_string(),
                needed: 12,
                quota: 8,
            }
            .to_string(),
            "storage quota exceeded writing library_borrow_records (12 bytes, 8 allowed)"
        );
        assert_eq!(
            StorageError::InvalidKey("../etc".to_string()).to_string(),
            "invalid storage key: \"../etc\""
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = RenewError::Overdue;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
