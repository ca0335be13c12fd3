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

//! Account state and its guarded mutations.
//!
//! All fields live behind a single per-account [`Mutex`], so every
//! check-then-act sequence (sufficiency check and debit, attempt increment
//! and lock) happens in one critical section.
//!
//! ```text
//!  Active ──wrong PIN (n < threshold)──► Active (n failed attempts)
//!    │  ▲                                    │
//!    │  └──────────correct PIN───────────────┘ (counter reset)
//!    └──wrong PIN (n == threshold)──► Locked (epoch bumped, sessions invalid)
//! ```
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use atm_ledger::{AccountId, AccountStore, Pin};
//!
//! let store = AccountStore::new();
//! store.provision(AccountId::from("A1"), Pin::new("1234"), dec!(100.00)).unwrap();
//! let account = store.lookup(&AccountId::from("A1")).unwrap();
//! assert_eq!(account.balance, dec!(100.00));
//! assert!(!account.locked);
//! ```

use crate::base::{AccountId, Pin};
use crate::error::{AuthError, TransactionError};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

#[derive(Debug)]
pub(crate) struct AccountData {
    pub(crate) id: AccountId,
    pin: Pin,
    pub(crate) balance: Decimal,
    pub(crate) failed_attempts: u32,
    pub(crate) locked: bool,
    /// Bumped on lockout; sessions remember the epoch they were issued in.
    pub(crate) epoch: u64,
}

impl AccountData {
    fn new(id: AccountId, pin: Pin, balance: Decimal) -> Self {
        Self {
            id,
            pin,
            balance,
            failed_attempts: 0,
            locked: false,
            epoch: 0,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub(crate) fn pin_matches(&self, supplied: &str) -> bool {
        self.pin.matches(supplied)
    }

    /// Clears the failed-attempt counter after a successful login.
    pub(crate) fn reset_attempts(&mut self) {
        self.failed_attempts = 0;
    }

    /// Counts a wrong PIN and locks the account once `threshold` is reached.
    ///
    /// Returns the error the caller should see for this attempt.
    pub(crate) fn record_failed_attempt(&mut self, threshold: u32) -> AuthError {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        if self.failed_attempts >= threshold {
            self.locked = true;
            self.epoch += 1;
            AuthError::CardRetained
        } else {
            AuthError::IncorrectPin {
                attempts_remaining: threshold - self.failed_attempts,
            }
        }
    }

    /// Increases the balance.
    ///
    /// An amount that would overflow the representable balance is rejected
    /// as invalid; the balance is left unchanged.
    pub(crate) fn credit(&mut self, amount: Decimal) -> Result<Decimal, TransactionError> {
        if amount <= Decimal::ZERO {
            return Err(TransactionError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TransactionError::InvalidAmount)?;
        self.assert_invariants();
        Ok(self.balance)
    }

    /// Decreases the balance; rejects rather than clamps on overdraw.
    pub(crate) fn debit(&mut self, amount: Decimal) -> Result<Decimal, TransactionError> {
        if amount <= Decimal::ZERO {
            return Err(TransactionError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(TransactionError::InsufficientFunds);
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(TransactionError::InvalidAmount)?;
        self.assert_invariants();
        Ok(self.balance)
    }

    /// Replaces the PIN after re-verifying the old one.
    ///
    /// Independent of the login attempt counter: a wrong old PIN here never
    /// counts toward lockout.
    pub(crate) fn replace_pin(
        &mut self,
        old_pin: &str,
        new_pin: &str,
        confirm_pin: &str,
    ) -> Result<(), TransactionError> {
        if !self.pin.matches(old_pin) {
            return Err(TransactionError::PinMismatch);
        }
        if new_pin != confirm_pin {
            return Err(TransactionError::ConfirmationMismatch);
        }
        self.pin = Pin::new(new_pin);
        Ok(())
    }

    fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id.clone(),
            balance: self.balance,
            failed_attempts: self.failed_attempts,
            locked: self.locked,
        }
    }
}

/// Point-in-time copy of an account's observable fields.
///
/// Never includes the PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub balance: Decimal,
    pub failed_attempts: u32,
    pub locked: bool,
}

/// ATM account.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 4;

    pub(crate) fn new(id: AccountId, pin: Pin, balance: Decimal) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(id, pin, balance)),
        }
    }

    pub fn id(&self) -> AccountId {
        self.inner.lock().id.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn failed_attempts(&self) -> u32 {
        self.inner.lock().failed_attempts
    }

    pub fn locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Reads all observable fields under one lock acquisition.
    pub fn snapshot(&self) -> AccountSnapshot {
        self.inner.lock().snapshot()
    }

    /// Runs `f` with exclusive access to the account's fields.
    ///
    /// The lock is held only for the duration of `f`.
    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&mut AccountData) -> R) -> R {
        let mut data = self.inner.lock();
        f(&mut data)
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 4)?;
        state.serialize_field("account", &data.id)?;
        state.serialize_field(
            "balance",
            &data.balance.round_dp(Account::DECIMAL_PRECISION),
        )?;
        state.serialize_field("failed_attempts", &data.failed_attempts)?;
        state.serialize_field("locked", &data.locked)?;
        state.end()
    }
}
