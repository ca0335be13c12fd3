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

//! PIN authentication with bounded retry.
//!
//! The lockout counter is read, incremented and compared inside the
//! account's critical section, so two concurrent wrong PINs can never both
//! observe `threshold - 1` and skip the lock.

use crate::account::AccountData;
use crate::base::AccountId;
use crate::config::EngineConfig;
use crate::error::{AuthError, TransactionError};
use crate::session::Session;
use crate::store::AccountStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

static NEXT_ISSUER: AtomicU64 = AtomicU64::new(1);

/// Gates access to accounts behind PIN verification.
///
/// The guard keeps no reference to the sessions it issues.
#[derive(Debug)]
pub struct AuthenticationGuard {
    store: Arc<AccountStore>,
    max_attempts: u32,
    issuer: u64,
}

impl AuthenticationGuard {
    /// Only the owning [`TransactionEngine`](crate::TransactionEngine) builds a
    /// guard, so every session it issues is accepted by that engine.
    pub(crate) fn new(store: Arc<AccountStore>, config: EngineConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_pin_attempts(),
            issuer: NEXT_ISSUER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Verifies `pin` against the account and opens a session on success.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] - Unknown identifier.
    /// - [`AuthError::AlreadyLocked`] - Account was already locked; no attempt consumed.
    /// - [`AuthError::IncorrectPin`] - Wrong PIN, with the attempts left before lockout.
    /// - [`AuthError::CardRetained`] - Wrong PIN that exhausted the attempts; account now locked.
    pub fn authenticate(&self, id: &AccountId, pin: &str) -> Result<Session, AuthError> {
        let max_attempts = self.max_attempts;
        let issuer = self.issuer;

        let result = self.store.mutate(id, |data| {
            if data.locked {
                return Err(AuthError::AlreadyLocked);
            }
            if data.pin_matches(pin) {
                data.reset_attempts();
                Ok(Session::issue(data.id.clone(), issuer, data.epoch))
            } else {
                Err(data.record_failed_attempt(max_attempts))
            }
        })?;

        match &result {
            Ok(session) => info!(account = %id, session = %session.id(), "authenticated"),
            Err(AuthError::IncorrectPin { attempts_remaining }) => {
                warn!(account = %id, attempts_remaining, "incorrect PIN")
            }
            Err(AuthError::CardRetained) => warn!(account = %id, "card retained, account locked"),
            Err(error) => warn!(account = %id, %error, "authentication refused"),
        }
        result
    }

    /// Checks that `session` was issued here and still matches the account.
    ///
    /// Must be called with the account's lock held, i.e. from inside
    /// [`AccountStore::mutate`].
    pub(crate) fn verify(
        &self,
        session: &Session,
        data: &AccountData,
    ) -> Result<(), TransactionError> {
        if session.issuer() != self.issuer
            || data.locked
            || data.epoch != session.epoch()
            || &data.id != session.account_id()
        {
            return Err(TransactionError::SessionInvalid);
        }
        Ok(())
    }

    /// Whether `session` came from this guard at all.
    pub(crate) fn issued(&self, session: &Session) -> bool {
        session.issuer() == self.issuer
    }
}
