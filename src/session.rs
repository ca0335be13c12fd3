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

//! Authenticated sessions.
//!
//! A [`Session`] can only be minted by the authentication guard and is
//! neither `Clone` nor `Copy`; ending it with
//! [`TransactionEngine::logout`](crate::TransactionEngine::logout) consumes it.

use crate::base::{AccountId, SessionId};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Ephemeral handle to one authenticated account.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    account_id: AccountId,
    /// Identity of the engine that issued this session.
    issuer: u64,
    /// Account lockout epoch at issue time.
    epoch: u64,
}

impl Session {
    pub(crate) fn issue(account_id: AccountId, issuer: u64, epoch: u64) -> Self {
        Self {
            id: SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)),
            account_id,
            issuer,
            epoch,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub(crate) fn issuer(&self) -> u64 {
        self.issuer
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}
