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

//! Core identifier types for accounts, PINs and sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account (the card number).
///
/// Identifiers are opaque: no normalization is applied, so `"A1"` and `"a1"`
/// name different accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Personal identification number.
///
/// Compared as an exact, case-sensitive string. The value never appears in
/// `Debug` output or log events.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    /// Compares against a supplied PIN without normalization.
    ///
    /// Runs over every byte of the longer input so the comparison time does
    /// not depend on where the first mismatch is.
    pub fn matches(&self, supplied: &str) -> bool {
        let stored = self.0.as_bytes();
        let supplied = supplied.as_bytes();
        let len = stored.len().max(supplied.len());
        let mut diff = stored.len() ^ supplied.len();
        for i in 0..len {
            let a = stored.get(i).copied().unwrap_or(0);
            let b = supplied.get(i).copied().unwrap_or(0);
            diff |= usize::from(a ^ b);
        }
        diff == 0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl From<&str> for Pin {
    fn from(pin: &str) -> Self {
        Self(pin.to_owned())
    }
}

/// Unique identifier for an authenticated session.
///
/// Allocated from a process-wide counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
