// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! Decode client for the trusted third-party verification service.
//!
//! The attestation token is an opaque signed blob; this client hands it to
//! the verification service over an authenticated channel and receives an
//! already-authenticated verdict document back. A failed or timed-out call
//! is surfaced to the protocol layer and never retried: the challenge
//! embedded in the nonce is single-use, so a retry would need a fresh
//! challenge anyway.

use std::time::Duration;

use async_trait::async_trait;
use attestgate_core::error::{AttestError, AttestResult};
use attestgate_core::protocol::TokenDecoder;
use attestgate_core::verdict::{AttestationVerdict, VerdictPayload};
use serde_json::json;

pub struct HttpTokenDecoder {
    client: reqwest::Client,
    decode_url: String,
    credential: Option<String>,
}

impl HttpTokenDecoder {
    pub fn new(
        decode_url: impl Into<String>,
        credential: Option<String>,
        timeout_ms: u64,
    ) -> AttestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| AttestError::Internal(format!("decode client build failed: {err}")))?;
        Ok(Self {
            client,
            decode_url: decode_url.into(),
            credential,
        })
    }

    fn request_url(&self, package_id: &str) -> String {
        self.decode_url.replace("{package}", package_id)
    }
}

#[async_trait]
impl TokenDecoder for HttpTokenDecoder {
    async fn decode(&self, token: &str, package_id: &str) -> AttestResult<AttestationVerdict> {
        let url = self.request_url(package_id);
        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "integrityToken": token }));
        if let Some(credential) = self.credential.as_deref() {
            request = request.bearer_auth(credential);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AttestError::DecodeFailure(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttestError::DecodeFailure(format!(
                "decode service returned {status}"
            )));
        }
        let payload: VerdictPayload = response
            .json()
            .await
            .map_err(|err| AttestError::DecodeFailure(format!("invalid verdict payload: {err}")))?;
        tracing::debug!("decoded attestation token");
        Ok(payload.token_payload_external)
    }
}
