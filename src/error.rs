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

//! Error types for account lookup, authentication and transaction processing.
//!
//! Every variant is a recoverable, caller-level condition: the front-end
//! decides whether to re-prompt.

use thiserror::Error;

/// Account store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No account exists for the identifier
    #[error("account not found")]
    NotFound,

    /// An account with this identifier was already provisioned
    #[error("duplicate account identifier")]
    DuplicateAccount,

    /// Opening balance is below zero
    #[error("opening balance must not be negative")]
    NegativeBalance,
}

/// Authentication errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No account exists for the identifier
    #[error("account not found")]
    NotFound,

    /// Account was locked before this attempt; no attempt is consumed
    #[error("card is blocked")]
    AlreadyLocked,

    /// Supplied PIN does not match
    #[error("incorrect PIN ({attempts_remaining} attempts remaining)")]
    IncorrectPin { attempts_remaining: u32 },

    /// This attempt exhausted the retry budget and locked the account
    #[error("card retained after too many incorrect PIN attempts")]
    CardRetained,
}

impl From<StoreError> for AuthError {
    fn from(_: StoreError) -> Self {
        AuthError::NotFound
    }
}

/// Transaction processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Session was invalidated (lockout) or issued by another engine
    #[error("session is not valid")]
    SessionInvalid,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Withdrawal would exceed the balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Old PIN supplied for a PIN change is wrong
    #[error("old PIN does not match")]
    PinMismatch,

    /// New PIN and its confirmation differ
    #[error("new PIN and confirmation do not match")]
    ConfirmationMismatch,
}

impl From<StoreError> for TransactionError {
    // Sessions only name accounts that existed when they were issued, so a
    // missing account means the session does not belong to this store.
    fn from(_: StoreError) -> Self {
        TransactionError::SessionInvalid
    }
}
