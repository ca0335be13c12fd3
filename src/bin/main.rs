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

use anyhow::{Context, Result};
use atm_ledger::{AccountId, EngineConfig, Session, TransactionEngine};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// ATM Ledger - Replay ATM sessions against provisioned accounts
///
/// Loads accounts from a CSV file, replays a CSV script of ATM operations
/// and writes the resulting audit trail to stdout.
#[derive(Parser, Debug)]
#[command(name = "atm-ledger")]
#[command(about = "Replays ATM operation scripts and prints the audit trail", long_about = None)]
struct Args {
    /// Path to CSV file with accounts
    ///
    /// Expected format: account,pin,balance
    #[arg(long, value_name = "FILE")]
    accounts: PathBuf,

    /// Consecutive wrong PINs before a card is retained
    #[arg(long, env = "ATM_MAX_PIN_ATTEMPTS", default_value_t = EngineConfig::DEFAULT_MAX_PIN_ATTEMPTS)]
    max_pin_attempts: u32,

    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,pin,amount,new_pin[,confirm_pin]
    /// Example: cargo run -- --accounts accounts.csv ops.csv > audit.csv
    #[arg(value_name = "FILE")]
    operations: PathBuf,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the CSV report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let engine = TransactionEngine::with_config(
        EngineConfig::new().with_max_pin_attempts(args.max_pin_attempts),
    );

    let accounts = File::open(&args.accounts)
        .with_context(|| format!("Failed to open `{}`", args.accounts.display()))?;
    load_accounts(&engine, BufReader::new(accounts)).context("Failed to load accounts")?;

    let operations = File::open(&args.operations)
        .with_context(|| format!("Failed to open `{}`", args.operations.display()))?;
    replay_operations(&engine, BufReader::new(operations))
        .context("Failed to replay operations")?;

    write_audit_trail(&engine, std::io::stdout()).context("Failed to write output")?;
    Ok(())
}

/// Raw CSV record for account provisioning.
///
/// Fields: `account, pin, balance`
#[derive(Debug, Deserialize)]
struct AccountRecord {
    account: String,
    pin: String,
    balance: Decimal,
}

/// Raw CSV record matching the operation script format.
///
/// Fields: `op, account, pin, amount, new_pin, confirm_pin`
///
/// `confirm_pin` is optional and falls back to `new_pin` when empty or absent.
#[derive(Debug, Deserialize)]
struct OperationRecord {
    op: String,
    account: String,
    #[serde(default)]
    pin: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    new_pin: Option<String>,
    #[serde(default)]
    confirm_pin: Option<String>,
}

#[derive(Debug)]
enum Command {
    Login { pin: String },
    Balance,
    Withdraw { amount: Decimal },
    Deposit { amount: Decimal },
    ChangePin {
        old_pin: String,
        new_pin: String,
        confirm_pin: String,
    },
    Logout,
}

impl OperationRecord {
    /// Converts a CSV record into a command.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_command(self) -> Option<(AccountId, Command)> {
        let command = match self.op.to_lowercase().as_str() {
            "login" => Command::Login { pin: self.pin? },
            "balance" => Command::Balance,
            "withdraw" => Command::Withdraw {
                amount: self.amount?,
            },
            "deposit" => Command::Deposit {
                amount: self.amount?,
            },
            "change_pin" => {
                let new_pin = self.new_pin?;
                let confirm_pin = self.confirm_pin.unwrap_or_else(|| new_pin.clone());
                Command::ChangePin {
                    old_pin: self.pin?,
                    new_pin,
                    confirm_pin,
                }
            }
            "logout" => Command::Logout,
            _ => return None,
        };
        Some((AccountId::new(self.account), command))
    }
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Provisions every well-formed account row; returns how many were added.
///
/// Malformed rows and duplicate identifiers are skipped with a warning.
pub fn load_accounts<R: Read>(engine: &TransactionEngine, input: R) -> Result<usize, csv::Error> {
    let mut added = 0;
    for result in reader(input).deserialize::<AccountRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, "skipping malformed account row");
                continue;
            }
        };
        match engine.provision(record.account.as_str(), &record.pin, record.balance) {
            Ok(()) => added += 1,
            Err(error) => warn!(account = %record.account, %error, "skipping account"),
        }
    }
    Ok(added)
}

/// Replays an operation script against the engine.
///
/// Each account has at most one open session; a `login` replaces it.
/// Business rejections are already in the audit trail, so they only produce
/// a warning here.
pub fn replay_operations<R: Read>(engine: &TransactionEngine, input: R) -> Result<(), csv::Error> {
    let mut sessions: HashMap<AccountId, Session> = HashMap::new();

    for result in reader(input).deserialize::<OperationRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, "skipping malformed operation row");
                continue;
            }
        };
        let Some((account, command)) = record.into_command() else {
            warn!("skipping invalid operation record");
            continue;
        };

        if let Command::Login { pin } = &command {
            match engine.authenticate(&account, pin) {
                Ok(session) => {
                    if let Some(previous) = sessions.insert(account, session) {
                        engine.logout(previous);
                    }
                }
                Err(error) => warn!(%account, %error, "login failed"),
            }
            continue;
        }

        if let Command::Logout = command {
            if let Some(session) = sessions.remove(&account) {
                engine.logout(session);
            }
            continue;
        }

        let Some(session) = sessions.get(&account) else {
            warn!(%account, "no open session");
            continue;
        };

        let outcome = match command {
            Command::Balance => engine.inquire_balance(session).map(|_| ()),
            Command::Withdraw { amount } => engine.withdraw(session, amount).map(|_| ()),
            Command::Deposit { amount } => engine.deposit(session, amount).map(|_| ()),
            Command::ChangePin {
                old_pin,
                new_pin,
                confirm_pin,
            } => engine.change_pin(session, &old_pin, &new_pin, &confirm_pin),
            Command::Login { .. } | Command::Logout => Ok(()),
        };
        if let Err(error) = outcome {
            warn!(%account, %error, "operation rejected");
        }
    }

    Ok(())
}

/// Writes the audit trail as CSV, in global order.
///
/// # CSV Format
///
/// Columns: `sequence, timestamp, account, kind, amount, outcome, balance`
pub fn write_audit_trail<W: Write>(engine: &TransactionEngine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for record in engine.audit_log().records() {
        wtr.serialize(&*record)?;
    }
    wtr.flush()?;
    Ok(())
}
