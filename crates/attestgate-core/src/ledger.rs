// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::clock::Clock;

/// Challenges are consumable for five minutes after issuance.
pub const CHALLENGE_TTL_MS: u64 = 1000 * 60 * 5;

/// Express tokens stay live for eight hours.
pub const EXPRESS_TOKEN_TTL_MS: u64 = 1000 * 60 * 60 * 8;

/// Challenge values carry 16 bytes of entropy, hex-encoded to 32 chars.
pub const CHALLENGE_BYTE_LEN: usize = 16;

/// Default express-token entropy, matching the challenge width.
pub const DEFAULT_EXPRESS_TOKEN_BYTE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub value: String,
    pub issued_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    Expired,
    NotFound,
}

/// Single-use, time-bounded random value ledger.
///
/// One parameterized type backs both the challenge ledger and the
/// express-token ledger; the two differ only in TTL and value width and
/// never share entries.
///
/// `consume` removes a matching entry before classifying expiry, so a value
/// can never be accepted twice, and the remove happens in one mutex critical
/// section so concurrent consumes of the same value resolve to exactly one
/// winner.
///
/// Entries that are issued but never consumed are not swept; they only leave
/// the live set through `consume`.
pub struct TokenLedger {
    ttl_ms: u64,
    value_byte_len: usize,
    clock: Arc<dyn Clock>,
    live: Mutex<HashMap<String, u64>>,
}

impl TokenLedger {
    pub fn new(ttl_ms: u64, value_byte_len: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_ms,
            value_byte_len,
            clock,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn challenges(clock: Arc<dyn Clock>) -> Self {
        Self::new(CHALLENGE_TTL_MS, CHALLENGE_BYTE_LEN, clock)
    }

    pub fn express_tokens(value_byte_len: usize, clock: Arc<dyn Clock>) -> Self {
        Self::new(EXPRESS_TOKEN_TTL_MS, value_byte_len, clock)
    }

    /// Generates a fresh random value, stamps it and appends it to the live
    /// set. Collisions among live entries are ruled out by entropy width,
    /// not by an explicit check.
    pub fn issue(&self) -> LedgerEntry {
        let mut bytes = vec![0u8; self.value_byte_len];
        OsRng.fill_bytes(&mut bytes);
        let value = hex::encode(bytes);
        let issued_at_ms = self.clock.now_ms();
        self.live.lock().insert(value.clone(), issued_at_ms);
        tracing::debug!(byte_len = self.value_byte_len, "issued ledger entry");
        LedgerEntry {
            value,
            issued_at_ms,
        }
    }

    /// Removes the entry for `value` if present, then classifies it against
    /// the TTL. An expired match is still removed, so replay of an expired
    /// value reports `NotFound` from then on.
    pub fn consume(&self, value: &str) -> Lookup {
        let issued_at_ms = self.live.lock().remove(value);
        match issued_at_ms {
            None => Lookup::NotFound,
            Some(issued_at_ms) => {
                let age_ms = self.clock.now_ms().saturating_sub(issued_at_ms);
                if age_ms < self.ttl_ms {
                    Lookup::Found
                } else {
                    tracing::debug!(age_ms, ttl_ms = self.ttl_ms, "consumed expired entry");
                    Lookup::Expired
                }
            }
        }
    }

    pub fn live_len(&self) -> usize {
        self.live.lock().len()
    }
}
