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

//! Audit records.
//!
//! One [`TransactionRecord`] is produced per submitted operation and is never
//! mutated afterwards.

use crate::base::AccountId;
use crate::error::TransactionError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::fmt;

const DECIMAL_PRECISION: u32 = 4;

/// The closed set of operations an authenticated session can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    BalanceInquiry,
    Withdrawal,
    Deposit,
    PinChange,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BalanceInquiry => "balance_inquiry",
            Self::Withdrawal => "withdrawal",
            Self::Deposit => "deposit",
            Self::PinChange => "pin_change",
        };
        f.write_str(name)
    }
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected(TransactionError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl<T> From<&Result<T, TransactionError>> for Outcome {
    fn from(result: &Result<T, TransactionError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(error) => Outcome::Rejected(error.clone()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// Immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    sequence: u64,
    timestamp: DateTime<Utc>,
    account_id: AccountId,
    kind: OperationKind,
    amount: Option<Decimal>,
    outcome: Outcome,
    balance: Option<Decimal>,
}

impl TransactionRecord {
    /// Builds a record; `balance` is kept only for successful outcomes.
    ///
    /// The sequence number is assigned by [`AuditLog::append`](crate::AuditLog::append).
    pub(crate) fn new(
        account_id: AccountId,
        kind: OperationKind,
        amount: Option<Decimal>,
        outcome: Outcome,
        balance: Option<Decimal>,
    ) -> Self {
        let balance = if outcome.is_success() { balance } else { None };
        Self {
            sequence: 0,
            timestamp: Utc::now(),
            account_id,
            kind,
            amount,
            outcome,
            balance,
        }
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Position in the global log order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// `None` for inquiries and PIN changes.
    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Balance after the operation, present only on success.
    pub fn balance(&self) -> Option<Decimal> {
        self.balance
    }
}

impl Serialize for TransactionRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TransactionRecord", 7)?;
        state.serialize_field("sequence", &self.sequence)?;
        state.serialize_field("timestamp", &self.timestamp.to_rfc3339())?;
        state.serialize_field("account", &self.account_id)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field(
            "amount",
            &self.amount.map(|amount| amount.round_dp(DECIMAL_PRECISION)),
        )?;
        state.serialize_field("outcome", &self.outcome.to_string())?;
        state.serialize_field(
            "balance",
            &self.balance.map(|balance| balance.round_dp(DECIMAL_PRECISION)),
        )?;
        state.end()
    }
}

/// Receipt data for the latest successful operation on an account.
///
/// Text layout is left to the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub timestamp: DateTime<Utc>,
    pub account_id: AccountId,
    pub kind: OperationKind,
    pub amount: Option<Decimal>,
    pub remaining_balance: Decimal,
}

impl Receipt {
    /// Returns `None` for rejected records and for PIN changes.
    pub fn from_record(record: &TransactionRecord) -> Option<Self> {
        if record.kind == OperationKind::PinChange {
            return None;
        }
        let remaining_balance = record.balance?;
        Some(Self {
            timestamp: record.timestamp,
            account_id: record.account_id.clone(),
            kind: record.kind,
            amount: record.amount,
            remaining_balance,
        })
    }
}
