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

//! Append-only audit log.
//!
//! Records are kept in one global sequence plus a per-account index. The
//! index is updated under the same write lock that assigns the sequence
//! number, so a per-account read is always a subsequence of the global order.

use crate::base::AccountId;
use crate::transaction::{OperationKind, TransactionRecord};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered, append-only history of transaction outcomes.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: RwLock<Vec<Arc<TransactionRecord>>>,
    by_account: DashMap<AccountId, Vec<Arc<TransactionRecord>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            by_account: DashMap::new(),
        }
    }

    /// Stamps `record` with the next sequence number and appends it.
    pub fn append(&self, mut record: TransactionRecord) -> Arc<TransactionRecord> {
        let mut entries = self.entries.write();
        record.set_sequence(entries.len() as u64);
        let record = Arc::new(record);
        entries.push(Arc::clone(&record));
        self.by_account
            .entry(record.account_id().clone())
            .or_default()
            .push(Arc::clone(&record));
        record
    }

    /// Records for one account, oldest first.
    ///
    /// Each call returns a fresh copy reflecting every append that finished
    /// before the call.
    pub fn records_for(&self, id: &AccountId) -> Vec<Arc<TransactionRecord>> {
        self.by_account
            .get(id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Every record in global order.
    pub fn records(&self) -> Vec<Arc<TransactionRecord>> {
        self.entries.read().clone()
    }

    /// Latest successful inquiry, withdrawal or deposit for the account.
    pub fn last_receipted(&self, id: &AccountId) -> Option<Arc<TransactionRecord>> {
        let records = self.by_account.get(id)?;
        records
            .iter()
            .rev()
            .find(|record| {
                record.outcome().is_success() && record.kind() != OperationKind::PinChange
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
