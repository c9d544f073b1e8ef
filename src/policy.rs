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

//! Lending policy: loan period, renewal cap, and role-based borrowing limits.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days added to the borrow (or renewal) date to compute the due date.
pub const LOAN_PERIOD_DAYS: u32 = 30;

/// Renewals allowed per borrow record.
pub const MAX_RENEWALS: u32 = 1;

/// Maximum simultaneous active loans for a student.
pub const STUDENT_BORROW_LIMIT: usize = 10;

/// Maximum simultaneous active loans for a faculty member.
pub const FACULTY_BORROW_LIMIT: usize = 20;

/// Role of a library user, selecting their borrowing limit.
///
/// Stored as `"student"` or `"faculty"`. `"teacher"` is read as faculty and any
/// other value falls back to student, which carries the lower limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    Student,
    Faculty,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "faculty" | "teacher" => Self::Faculty,
            _ => Self::Student,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum number of simultaneous active loans for `role`.
pub fn borrow_limit(role: UserRole) -> usize {
    match role {
        UserRole::Faculty => FACULTY_BORROW_LIMIT,
        UserRole::Student => STUDENT_BORROW_LIMIT,
    }
}

/// Tunable loan rules applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    pub loan_period_days: u32,
    pub max_renewals: u32,
}

impl LendingPolicy {
    /// Due date for a loan (or renewal) starting on `start`.
    ///
    /// Saturates at the last representable date.
    pub fn due_date_from(&self, start: NaiveDate) -> NaiveDate {
        start
            .checked_add_days(Days::new(u64::from(self.loan_period_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: LOAN_PERIOD_DAYS,
            max_renewals: MAX_RENEWALS,
        }
    }
}
