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

//! # ATM Ledger
//!
//! This library provides the account transaction engine behind an ATM
//! front-end: account lookup, PIN authentication with lockout, atomic
//! withdraw/deposit/PIN-change operations, and an append-only audit trail.
//!
//! ## Core Components
//!
//! - [`TransactionEngine`]: Entry point; executes operations for authenticated sessions
//! - [`AuthenticationGuard`]: PIN verification with bounded retry
//! - [`AccountStore`]: Concurrent account map with per-account atomic mutation
//! - [`AuditLog`]: Ordered record of every submitted operation
//! - [`TransactionError`] / [`AuthError`]: Distinguishable rejection kinds
//!
//! ## Example
//!
//! ```
//! use atm_ledger::{AccountId, AuthError, TransactionEngine, TransactionError};
//! use rust_decimal_macros::dec;
//!
//! let engine = TransactionEngine::new();
//! engine.provision("A1", "1234", dec!(1000)).unwrap();
//! let id = AccountId::from("A1");
//!
//! assert_eq!(
//!     engine.authenticate(&id, "0000").unwrap_err(),
//!     AuthError::IncorrectPin { attempts_remaining: 2 }
//! );
//!
//! let session = engine.authenticate(&id, "1234").unwrap();
//! assert_eq!(engine.withdraw(&session, dec!(400)), Ok(dec!(600)));
//! assert_eq!(
//!     engine.withdraw(&session, dec!(1000)),
//!     Err(TransactionError::InsufficientFunds)
//! );
//! assert_eq!(engine.deposit(&session, dec!(50)), Ok(dec!(650)));
//! assert_eq!(engine.audit_trail(&id).len(), 3);
//! ```
//!
//! ## Thread Safety
//!
//! Each account is guarded by its own lock, so operations on different
//! accounts proceed in parallel while operations on one account are
//! serialized.

pub mod account;
mod audit;
mod base;
mod config;
mod engine;
pub mod error;
mod guard;
mod session;
mod store;
mod transaction;

pub use account::{Account, AccountSnapshot};
pub use audit::AuditLog;
pub use base::{AccountId, Pin, SessionId};
pub use config::EngineConfig;
pub use engine::TransactionEngine;
pub use error::{AuthError, StoreError, TransactionError};
pub use guard::AuthenticationGuard;
pub use session::Session;
pub use store::AccountStore;
pub use transaction::{OperationKind, Outcome, Receipt, TransactionRecord};
