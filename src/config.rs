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

//! Engine configuration.

/// Tunable policy for a [`TransactionEngine`](crate::TransactionEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_pin_attempts: u32,
}

impl EngineConfig {
    pub const DEFAULT_MAX_PIN_ATTEMPTS: u32 = 3;

    pub fn new() -> Self {
        Self {
            max_pin_attempts: Self::DEFAULT_MAX_PIN_ATTEMPTS,
        }
    }

    /// Consecutive wrong PINs that lock an account. Clamped to at least 1.
    pub fn with_max_pin_attempts(mut self, attempts: u32) -> Self {
        self.max_pin_attempts = attempts.max(1);
        self
    }

    pub fn max_pin_attempts(&self) -> u32 {
        self.max_pin_attempts
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
