// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! Nonce codec binding a server challenge to a command digest.
//!
//! The nonce is `challenge || hex(sha256(command))`. Both halves are
//! lowercase hex, which is a subset of the URL-safe base64 alphabet, so the
//! composite travels as an unpadded web-safe string without any base64
//! transform.

use sha2::{Digest, Sha256};

use crate::error::{AttestError, AttestResult};

/// Lowercase hex SHA-256 digest of the command text (64 chars).
pub fn command_digest_hex(command: &str) -> String {
    hex::encode(Sha256::digest(command.as_bytes()))
}

pub fn encode(command: &str, challenge_value: &str) -> String {
    format!("{challenge_value}{}", command_digest_hex(command))
}

/// Splits a nonce back into `(challenge_value, claimed_digest_hex)`.
///
/// Transport layers sometimes re-pad base64-looking strings; trailing `=`
/// is stripped before splitting. The split is at the fixed offset
/// `2 * challenge_byte_len`, never by delimiter search, since the digest
/// half is unstructured hex.
pub fn decode(nonce: &str, challenge_byte_len: usize) -> AttestResult<(String, String)> {
    let stripped = nonce.trim_end_matches('=');
    let offset = challenge_byte_len * 2;
    if stripped.len() < offset || !stripped.is_char_boundary(offset) {
        return Err(AttestError::MalformedNonce(format!(
            "nonce shorter than challenge offset {offset}"
        )));
    }
    let (challenge, digest) = stripped.split_at(offset);
    Ok((challenge.to_string(), digest.to_string()))
}
