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

//! Transaction engine.
//!
//! The [`TransactionEngine`] is the in-process API a front-end talks to. It
//! owns the account store, the authentication guard and the audit log.
//!
//! # Operations
//!
//! - **Balance inquiry**: Reads the balance; never mutates.
//! - **Withdrawal**: Debits the balance; rejected if it would go negative.
//! - **Deposit**: Credits the balance.
//! - **PIN change**: Re-verifies the old PIN and replaces it.
//!
//! # Audit policy
//!
//! Every operation submitted with a session issued by this engine appends
//! exactly one [`TransactionRecord`], including early rejections such as a
//! non-positive amount or a session invalidated by lockout. Sessions issued
//! by a different engine are refused without a record, since they never
//! reach one of this engine's accounts.
//!
//! # Thread Safety
//!
//! Session validation, the balance or PIN update and the audit append all
//! happen under the account's lock. Operations on different accounts run in
//! parallel; operations on the same account are serialized.

use crate::account::{AccountData, AccountSnapshot};
use crate::audit::AuditLog;
use crate::base::{AccountId, Pin};
use crate::config::EngineConfig;
use crate::error::{AuthError, StoreError, TransactionError};
use crate::guard::AuthenticationGuard;
use crate::session::Session;
use crate::store::AccountStore;
use crate::transaction::{OperationKind, Outcome, Receipt, TransactionRecord};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// ATM transaction engine.
///
/// # Invariants
///
/// - A balance is never negative; overdrawing withdrawals are rejected, not clamped.
/// - Balance = opening balance + successful deposits - successful withdrawals.
/// - A locked account accepts no further logins and invalidates open sessions.
/// - The audit log order is consistent with operation completion order.
#[derive(Debug)]
pub struct TransactionEngine {
    store: Arc<AccountStore>,
    guard: AuthenticationGuard,
    log: AuditLog,
}

impl TransactionEngine {
    /// Creates an engine with no accounts and the default lockout threshold.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(AccountStore::new());
        let guard = AuthenticationGuard::new(Arc::clone(&store), config);
        Self {
            store,
            guard,
            log: AuditLog::new(),
        }
    }

    /// Registers an account with its PIN and opening balance.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateAccount`] - Identifier already provisioned.
    /// - [`StoreError::NegativeBalance`] - Opening balance below zero.
    pub fn provision(
        &self,
        id: impl Into<AccountId>,
        pin: &str,
        opening_balance: Decimal,
    ) -> Result<(), StoreError> {
        let id = id.into();
        self.store
            .provision(id.clone(), Pin::new(pin), opening_balance)?;
        info!(account = %id, %opening_balance, "account provisioned");
        Ok(())
    }

    /// Opens a session for `id` if `pin` is correct.
    ///
    /// See [`AuthenticationGuard::authenticate`] for the lockout rules.
    pub fn authenticate(&self, id: &AccountId, pin: &str) -> Result<Session, AuthError> {
        self.guard.authenticate(id, pin)
    }

    /// Ends a session. The session is consumed and cannot be used again.
    pub fn logout(&self, session: Session) {
        info!(account = %session.account_id(), session = %session.id(), "logged out");
    }

    /// Returns the current balance.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::SessionInvalid`] - Session locked out or foreign.
    pub fn inquire_balance(&self, session: &Session) -> Result<Decimal, TransactionError> {
        self.execute(session, OperationKind::BalanceInquiry, None, |data| {
            Ok(data.balance)
        })
    }

    /// Debits `amount` and returns the new balance.
    ///
    /// The sufficiency check and the debit are one atomic step.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::SessionInvalid`] - Session locked out or foreign.
    /// - [`TransactionError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`TransactionError::InsufficientFunds`] - `amount` exceeds the balance.
    pub fn withdraw(&self, session: &Session, amount: Decimal) -> Result<Decimal, TransactionError> {
        self.execute(session, OperationKind::Withdrawal, Some(amount), |data| {
            data.debit(amount)
        })
    }

    /// Credits `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::SessionInvalid`] - Session locked out or foreign.
    /// - [`TransactionError::InvalidAmount`] - `amount` is zero or negative, or
    ///   the new balance would not be representable.
    pub fn deposit(&self, session: &Session, amount: Decimal) -> Result<Decimal, TransactionError> {
        self.execute(session, OperationKind::Deposit, Some(amount), |data| {
            data.credit(amount)
        })
    }

    /// Replaces the PIN after re-verifying the old one.
    ///
    /// A wrong old PIN does not count toward the login lockout.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::SessionInvalid`] - Session locked out or foreign.
    /// - [`TransactionError::PinMismatch`] - `old_pin` is not the current PIN.
    /// - [`TransactionError::ConfirmationMismatch`] - `new_pin` and `confirm_pin` differ.
    pub fn change_pin(
        &self,
        session: &Session,
        old_pin: &str,
        new_pin: &str,
        confirm_pin: &str,
    ) -> Result<(), TransactionError> {
        self.execute(session, OperationKind::PinChange, None, |data| {
            data.replace_pin(old_pin, new_pin, confirm_pin)
        })
    }

    /// Audit records for one account, oldest first.
    pub fn audit_trail(&self, id: &AccountId) -> Vec<Arc<TransactionRecord>> {
        self.log.records_for(id)
    }

    /// Receipt for the session's latest successful inquiry, withdrawal or deposit.
    pub fn receipt(&self, session: &Session) -> Option<Receipt> {
        if !self.guard.issued(session) {
            return None;
        }
        let record = self.log.last_receipted(session.account_id())?;
        Receipt::from_record(&record)
    }

    /// Snapshot of one account.
    pub fn account(&self, id: &AccountId) -> Result<AccountSnapshot, StoreError> {
        self.store.lookup(id)
    }

    /// Snapshots of every account, ordered by identifier.
    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.store.snapshots()
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.log
    }

    pub fn max_pin_attempts(&self) -> u32 {
        self.guard.max_attempts()
    }

    /// Validates the session, runs `operation` and appends the outcome, all
    /// under the account's lock.
    fn execute<T>(
        &self,
        session: &Session,
        kind: OperationKind,
        amount: Option<Decimal>,
        operation: impl FnOnce(&mut AccountData) -> Result<T, TransactionError>,
    ) -> Result<T, TransactionError> {
        if !self.guard.issued(session) {
            warn!(session = %session.id(), %kind, "session issued by another engine");
            return Err(TransactionError::SessionInvalid);
        }

        let (result, balance) = self.store.mutate(session.account_id(), |data| {
            let result = self
                .guard
                .verify(session, data)
                .and_then(|()| operation(data));
            self.log.append(TransactionRecord::new(
                data.id.clone(),
                kind,
                amount,
                Outcome::from(&result),
                Some(data.balance),
            ));
            (result, data.balance)
        })?;

        match &result {
            Ok(_) => debug!(
                account = %session.account_id(),
                session = %session.id(),
                %kind,
                ?amount,
                %balance,
                "operation completed"
            ),
            Err(error) => warn!(
                account = %session.account_id(),
                session = %session.id(),
                %kind,
                ?amount,
                %error,
                "operation rejected"
            ),
        }
        result
    }
}

impl Default for TransactionEngine {
    fn default() -> Self {
        Self::new()
    }
}
