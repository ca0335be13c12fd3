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

//! Account storage.
//!
//! The store maps identifiers to accounts and is the only path to account
//! fields. Each account is its own unit of mutual exclusion: the map hands
//! out a shared handle and releases its shard lock before the account's own
//! lock is taken, so operations on different accounts never contend.

use crate::account::{Account, AccountData, AccountSnapshot};
use crate::base::{AccountId, Pin};
use crate::error::StoreError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Concurrent account map.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Creates an account with an opening balance and a fresh attempt counter.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateAccount`] - The identifier is already taken.
    /// - [`StoreError::NegativeBalance`] - `balance` is below zero.
    pub fn provision(&self, id: AccountId, pin: Pin, balance: Decimal) -> Result<(), StoreError> {
        if balance < Decimal::ZERO {
            return Err(StoreError::NegativeBalance);
        }
        // Entry API keeps check-and-insert atomic across concurrent provisioning.
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateAccount),
            Entry::Vacant(entry) => {
                let id = entry.key().clone();
                entry.insert(Arc::new(Account::new(id, pin, balance)));
                Ok(())
            }
        }
    }

    /// Returns a consistent snapshot of one account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown identifier.
    pub fn lookup(&self, id: &AccountId) -> Result<AccountSnapshot, StoreError> {
        Ok(self.handle(id)?.snapshot())
    }

    /// Applies `update` to the account's fields as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown identifier; `update`
    /// is not called in that case.
    pub(crate) fn mutate<R>(
        &self,
        id: &AccountId,
        update: impl FnOnce(&mut AccountData) -> R,
    ) -> Result<R, StoreError> {
        let account = self.handle(id)?;
        Ok(account.with_data(update))
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Snapshots of every account, ordered by identifier.
    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let handles: Vec<Arc<Account>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut snapshots: Vec<AccountSnapshot> =
            handles.iter().map(|account| account.snapshot()).collect();
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    /// Clones the account handle out of the map, dropping the shard guard.
    fn handle(&self, id: &AccountId) -> Result<Arc<Account>, StoreError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(StoreError::NotFound)
    }
}
