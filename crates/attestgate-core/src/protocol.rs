// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! Command protocol orchestrator behind the two request handlers.
//!
//! `handle_perform_command` resolves a proof string that could be either a
//! live express token or an opaque attestation token; the express ledger is
//! consulted first and only a miss falls through to the decode service.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::AttestResult;
use crate::ledger::{LedgerEntry, Lookup, TokenLedger, CHALLENGE_BYTE_LEN};
use crate::nonce;
use crate::verdict::{self, AttestationVerdict};

/// Seam to the trusted third-party verification service. The implementation
/// owns its transport, credentials and timeout; a failure is surfaced to the
/// caller and never retried here, since the consumed challenge cannot be
/// reused anyway.
#[async_trait]
pub trait TokenDecoder: Send + Sync {
    async fn decode(&self, token: &str, package_id: &str) -> AttestResult<AttestationVerdict>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateResult {
    Success,
    IntegrityFail,
    NonceMismatch,
    NonceExpired,
    NonceNotFound,
}

impl ValidateResult {
    pub const fn diagnostic(self) -> &'static str {
        match self {
            Self::Success => "command validated",
            Self::IntegrityFail => "integrity verdict failed policy",
            Self::NonceMismatch => "nonce hash does not match command",
            Self::NonceExpired => "nonce expired",
            Self::NonceNotFound => "nonce not found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub diagnostic_message: String,
    pub command_success: bool,
    pub express_token: String,
}

impl CommandResult {
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic_message: diagnostic.into(),
            command_success: false,
            express_token: String::new(),
        }
    }
}

pub struct CommandProtocol {
    package_id: String,
    challenges: TokenLedger,
    express_tokens: TokenLedger,
    decoder: Arc<dyn TokenDecoder>,
}

impl CommandProtocol {
    pub fn new(
        package_id: impl Into<String>,
        express_token_byte_len: usize,
        clock: Arc<dyn Clock>,
        decoder: Arc<dyn TokenDecoder>,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            challenges: TokenLedger::challenges(Arc::clone(&clock)),
            express_tokens: TokenLedger::express_tokens(express_token_byte_len, clock),
            decoder,
        }
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// Issues a fresh single-use challenge. Every call produces an
    /// independent entry.
    pub fn handle_get_random(&self) -> LedgerEntry {
        self.challenges.issue()
    }

    /// Validates a command against an authenticated verdict.
    ///
    /// The challenge embedded in the nonce is consumed before the hash and
    /// policy checks run, so a replayed or tampered nonce is burned exactly
    /// once regardless of the downstream outcome. A malformed nonce resolves
    /// to `NonceNotFound`, same as an unknown challenge.
    pub fn validate_command(&self, command: &str, verdict: &AttestationVerdict) -> ValidateResult {
        let Some(nonce_str) = verdict.request_details.nonce.as_deref() else {
            return ValidateResult::NonceNotFound;
        };
        let Ok((challenge, claimed_digest)) = nonce::decode(nonce_str, CHALLENGE_BYTE_LEN) else {
            return ValidateResult::NonceNotFound;
        };
        match self.challenges.consume(&challenge) {
            Lookup::NotFound => ValidateResult::NonceNotFound,
            Lookup::Expired => ValidateResult::NonceExpired,
            Lookup::Found => {
                if !verdict::validate_hash(command, &claimed_digest) {
                    ValidateResult::NonceMismatch
                } else if !verdict::validate_policy(verdict, &self.package_id) {
                    ValidateResult::IntegrityFail
                } else {
                    ValidateResult::Success
                }
            }
        }
    }

    /// Resolves a command request. The proof is tried as an express token
    /// first; an expired or unknown proof falls through to attestation
    /// decode rather than failing, since the server cannot tell the two
    /// proof kinds apart without a lookup.
    pub async fn handle_perform_command(&self, command: &str, proof: &str) -> CommandResult {
        match self.express_tokens.consume(proof) {
            Lookup::Found => {
                let next = self.express_tokens.issue();
                tracing::info!("express token accepted");
                return CommandResult {
                    diagnostic_message: "express token accepted".to_string(),
                    command_success: true,
                    express_token: next.value,
                };
            }
            Lookup::Expired | Lookup::NotFound => {}
        }

        let verdict = match self.decoder.decode(proof, &self.package_id).await {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(error = %err, "attestation token decode failed");
                return CommandResult::failure(format!("attestation decode failed: {err}"));
            }
        };

        match self.validate_command(command, &verdict) {
            ValidateResult::Success => {
                let next = self.express_tokens.issue();
                tracing::info!("command validated");
                CommandResult {
                    diagnostic_message: verdict::summarize(&verdict, &self.package_id),
                    command_success: true,
                    express_token: next.value,
                }
            }
            outcome => {
                tracing::info!(outcome = outcome.diagnostic(), "command rejected");
                CommandResult::failure(outcome.diagnostic())
            }
        }
    }
}
