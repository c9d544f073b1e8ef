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

//! Demo borrowing data for a fresh store.

use crate::base::{BookId, BorrowerId, RecordId};
use crate::catalog::Book;
use crate::policy::LendingPolicy;
use crate::record::BorrowRecord;
use chrono::{Days, NaiveDate};

/// Account that owns the demo loans.
pub const DEMO_ACCOUNT: &str = "20220001";

const DEMO_NAME: &str = "Zhang San";

/// Books referenced by [`demo_records`].
pub fn demo_books() -> Vec<Book> {
    vec![
        Book {
            id: BookId(1),
            title: "To Live".to_string(),
            author: "Yu Hua".to_string(),
            cover: Some("https://picsum.photos/id/24/300/450".to_string()),
        },
        Book {
            id: BookId(2),
            title: "The Three-Body Problem".to_string(),
            author: "Liu Cixin".to_string(),
            cover: Some("https://picsum.photos/id/20/300/450".to_string()),
        },
        Book {
            id: BookId(3),
            title: "The Miracles of the Namiya General Store".to_string(),
            author: "Keigo Higashino".to_string(),
            cover: Some("https://picsum.photos/id/22/300/450".to_string()),
        },
    ]
}

/// Two active loans and one returned loan for [`DEMO_ACCOUNT`], dated
/// relative to `today`.
pub fn demo_records(today: NaiveDate) -> Vec<BorrowRecord> {
    let policy = LendingPolicy::default();
    let borrower = BorrowerId::new(DEMO_ACCOUNT);
    let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);

    // (id, borrowed days ago, returned days ago)
    let loans = [(1001, 10, None), (1002, 5, None), (1003, 40, Some(5))];

    demo_books()
        .iter()
        .zip(loans)
        .map(|(book, (id, borrowed, returned))| {
            let record = BorrowRecord::open(
                RecordId(id),
                book.id,
                borrower.clone(),
                days_ago(borrowed),
                &policy,
            )
            .with_book(book)
            .with_borrower_name(DEMO_NAME);
            match returned {
                Some(returned) => record.returned_on(days_ago(returned)),
                None => record,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LoanStatus;

    #[test]
    fn demo_records_are_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records = demo_records(today);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].remaining_days(today), 20);
        assert_eq!(records[1].remaining_days(today), 25);
        assert!(records.iter().take(2).all(BorrowRecord::is_active));

        let returned = &records[2];
        assert_eq!(returned.status(), LoanStatus::Returned);
        assert_eq!(returned.due_date(), NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        assert_eq!(returned.return_date(), NaiveDate::from_ymd_opt(2024, 2, 25));
        assert!(records.iter().all(|r| r.violation().is_none()));
    }
}
