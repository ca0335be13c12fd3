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

//! Account and account store public API integration tests.

use atm_ledger::{AccountId, AccountStore, Pin, StoreError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

// === Basic Account Tests ===

#[test]
fn provisioned_account_is_unlocked_with_zero_attempts() {
    let store = AccountStore::new();
    store
        .provision(AccountId::from("A1"), Pin::new("1234"), dec!(75.25))
        .unwrap();
    let account = store.lookup(&AccountId::from("A1")).unwrap();
    assert_eq!(account.id, AccountId::from("A1"));
    assert_eq!(account.balance, dec!(75.25));
    assert_eq!(account.failed_attempts, 0);
    assert!(!account.locked);
}

#[test]
fn provisioned_account_accepts_maximum_balance() {
    let store = AccountStore::new();
    store
        .provision(AccountId::from("A1"), Pin::new("1234"), Decimal::MAX)
        .unwrap();
    assert_eq!(
        store.lookup(&AccountId::from("A1")).unwrap().balance,
        Decimal::MAX
    );
}

// === Store Tests ===

#[test]
fn store_starts_empty() {
    let store = AccountStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.snapshots().is_empty());
}

#[test]
fn store_provision_and_lookup() {
    let store = AccountStore::new();
    store
        .provision(AccountId::from("A1"), Pin::new("1234"), dec!(1000))
        .unwrap();

    assert!(store.contains(&AccountId::from("A1")));
    assert!(!store.contains(&AccountId::from("a1")));

    let snapshot = store.lookup(&AccountId::from("A1")).unwrap();
    assert_eq!(snapshot.balance, dec!(1000));
    assert!(!snapshot.locked);
}

#[test]
fn store_lookup_missing() {
    let store = AccountStore::new();
    assert_eq!(
        store.lookup(&AccountId::from("A1")),
        Err(StoreError::NotFound)
    );
}

#[test]
fn store_accepts_zero_opening_balance() {
    let store = AccountStore::new();
    store
        .provision(AccountId::from("A1"), Pin::new("1234"), Decimal::ZERO)
        .unwrap();
    assert_eq!(
        store.lookup(&AccountId::from("A1")).unwrap().balance,
        Decimal::ZERO
    );
}

#[test]
fn store_rejects_negative_opening_balance() {
    let store = AccountStore::new();
    assert_eq!(
        store.provision(AccountId::from("A1"), Pin::new("1234"), dec!(-1)),
        Err(StoreError::NegativeBalance)
    );
}

// === Multi-threading Tests ===

#[test]
fn concurrent_provisioning_same_id_admits_one() {
    let store = Arc::new(AccountStore::new());
    let successes = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for i in 0..16 {
        let store = Arc::clone(&store);
        let successes = Arc::clone(&successes);
        handles.push(thread::spawn(move || {
            let balance = Decimal::from(i);
            match store.provision(AccountId::from("shared"), Pin::new("1"), balance) {
                Ok(()) => {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
                Err(error) => assert_eq!(error, StoreError::DuplicateAccount),
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_provisioning_distinct_ids() {
    let store = Arc::new(AccountStore::new());
    let mut handles = vec![];

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let id = AccountId::new(format!("T{t}-{i}"));
                store.provision(id, Pin::new("0000"), dec!(1)).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 400);
    let total: Decimal = store.snapshots().iter().map(|s| s.balance).sum();
    assert_eq!(total, dec!(400));
}
