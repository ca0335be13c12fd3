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

//! Property-based tests for the transaction engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! operations.

use atm_ledger::{
    AccountId, AuthError, EngineConfig, OperationKind, Outcome, TransactionEngine,
    TransactionError,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount (0.0001 to 1000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate an amount that may be zero or negative.
fn arb_any_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

#[derive(Debug, Clone)]
enum Op {
    Inquire,
    Withdraw(Decimal),
    Deposit(Decimal),
    ChangePin(String, String, String),
}

fn arb_pin() -> impl Strategy<Value = String> {
    "[0-9]{4}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Inquire),
        arb_any_amount().prop_map(Op::Withdraw),
        arb_amount().prop_map(Op::Deposit),
        (arb_pin(), arb_pin(), arb_pin()).prop_map(|(a, b, c)| Op::ChangePin(a, b, c)),
    ]
}

fn provisioned(balance: Decimal) -> (TransactionEngine, AccountId) {
    let engine = TransactionEngine::new();
    engine.provision("A1", "1234", balance).unwrap();
    (engine, AccountId::from("A1"))
}

// =============================================================================
// Balance Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Balance = opening + successful deposits - successful withdrawals, never negative.
    #[test]
    fn balance_is_conserved(
        opening in arb_amount(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let (engine, id) = provisioned(opening);
        let session = engine.authenticate(&id, "1234").unwrap();
        let mut expected = opening;

        for op in &ops {
            match op {
                Op::Inquire => {
                    prop_assert_eq!(engine.inquire_balance(&session), Ok(expected));
                }
                Op::Withdraw(amount) => {
                    if engine.withdraw(&session, *amount).is_ok() {
                        expected -= *amount;
                    }
                }
                Op::Deposit(amount) => {
                    if engine.deposit(&session, *amount).is_ok() {
                        expected += *amount;
                    }
                }
                Op::ChangePin(old, new, confirm) => {
                    let _ = engine.change_pin(&session, old, new, confirm);
                }
            }
            let balance = engine.account(&id).unwrap().balance;
            prop_assert_eq!(balance, expected);
            prop_assert!(balance >= Decimal::ZERO);
        }
    }

    /// Withdrawals succeed exactly when 0 < amount <= balance.
    #[test]
    fn withdrawal_sufficiency(
        opening in arb_amount(),
        amount in arb_any_amount(),
    ) {
        let (engine, id) = provisioned(opening);
        let session = engine.authenticate(&id, "1234").unwrap();

        let result = engine.withdraw(&session, amount);
        if amount <= Decimal::ZERO {
            prop_assert_eq!(result, Err(TransactionError::InvalidAmount));
        } else if amount > opening {
            prop_assert_eq!(result, Err(TransactionError::InsufficientFunds));
        } else {
            prop_assert_eq!(result, Ok(opening - amount));
        }
    }
}

// =============================================================================
// Audit Log Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// One record per submitted operation, with matching outcome.
    #[test]
    fn audit_matches_results(
        ops in prop::collection::vec(arb_op(), 0..30),
    ) {
        let (engine, id) = provisioned(Decimal::new(5000, 0));
        let session = engine.authenticate(&id, "1234").unwrap();
        let mut outcomes = Vec::with_capacity(ops.len());

        for op in &ops {
            let (kind, outcome) = match op {
                Op::Inquire => (
                    OperationKind::BalanceInquiry,
                    Outcome::from(&engine.inquire_balance(&session)),
                ),
                Op::Withdraw(amount) => (
                    OperationKind::Withdrawal,
                    Outcome::from(&engine.withdraw(&session, *amount)),
                ),
                Op::Deposit(amount) => (
                    OperationKind::Deposit,
                    Outcome::from(&engine.deposit(&session, *amount)),
                ),
                Op::ChangePin(old, new, confirm) => (
                    OperationKind::PinChange,
                    Outcome::from(&engine.change_pin(&session, old, new, confirm)),
                ),
            };
            outcomes.push((kind, outcome));
        }

        let trail = engine.audit_trail(&id);
        prop_assert_eq!(trail.len(), ops.len());
        for (record, (kind, outcome)) in trail.iter().zip(&outcomes) {
            prop_assert_eq!(record.kind(), *kind);
            prop_assert_eq!(record.outcome(), outcome);
            prop_assert_eq!(record.balance().is_some(), outcome.is_success());
        }
    }
}

// =============================================================================
// Authentication Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Fewer than `threshold` failures followed by the right PIN succeeds and resets.
    #[test]
    fn correct_pin_before_threshold_resets(
        threshold in 1u32..8,
        failures in 0u32..8,
    ) {
        prop_assume!(failures < threshold);
        let engine = TransactionEngine::with_config(
            EngineConfig::new().with_max_pin_attempts(threshold),
        );
        engine.provision("A1", "1234", Decimal::ZERO).unwrap();
        let id = AccountId::from("A1");

        for n in 1..=failures {
            prop_assert_eq!(
                engine.authenticate(&id, "wrong").unwrap_err(),
                AuthError::IncorrectPin { attempts_remaining: threshold - n }
            );
        }
        prop_assert!(engine.authenticate(&id, "1234").is_ok());
        prop_assert_eq!(engine.account(&id).unwrap().failed_attempts, 0);
    }

    /// Exactly `threshold` consecutive failures lock the account for good.
    #[test]
    fn threshold_failures_lock_permanently(
        threshold in 1u32..8,
        retries in 1usize..5,
    ) {
        let engine = TransactionEngine::with_config(
            EngineConfig::new().with_max_pin_attempts(threshold),
        );
        engine.provision("A1", "1234", Decimal::ZERO).unwrap();
        let id = AccountId::from("A1");

        for _ in 1..threshold {
            let _ = engine.authenticate(&id, "wrong");
        }
        prop_assert_eq!(
            engine.authenticate(&id, "wrong").unwrap_err(),
            AuthError::CardRetained
        );
        for _ in 0..retries {
            prop_assert_eq!(
                engine.authenticate(&id, "1234").unwrap_err(),
                AuthError::AlreadyLocked
            );
        }
        prop_assert_eq!(engine.account(&id).unwrap().failed_attempts, threshold);
    }

    /// A successful PIN change swaps which PIN authenticates.
    #[test]
    fn pin_change_takes_effect(new_pin in "[0-9]{4,6}") {
        prop_assume!(new_pin != "1234");
        let (engine, id) = provisioned(Decimal::ZERO);
        let session = engine.authenticate(&id, "1234").unwrap();

        prop_assert_eq!(engine.change_pin(&session, "1234", &new_pin, &new_pin), Ok(()));
        prop_assert!(engine.authenticate(&id, &new_pin).is_ok());
        let is_incorrect = matches!(
            engine.authenticate(&id, "1234"),
            Err(AuthError::IncorrectPin { .. })
        );
        prop_assert!(is_incorrect);
    }
}
