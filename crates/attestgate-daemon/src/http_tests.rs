use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use attestgate_core::clock::SystemClock;
use attestgate_core::error::{AttestError, AttestResult};
use attestgate_core::nonce;
use attestgate_core::protocol::{CommandProtocol, TokenDecoder};
use attestgate_core::verdict::{
    AccountDetails, AppIntegrity, AttestationVerdict, DeviceIntegrity, RequestDetails,
    VERDICT_LICENSED, VERDICT_MEETS_DEVICE_INTEGRITY, VERDICT_VERSION_RECOGNIZED,
};

use crate::http::{perform_command_impl, AppState};

const PACKAGE_ID: &str = "com.example.attestgate.demo";
const COMMAND: &str = "TRANSFER FROM alice TO bob CURRENCY gems QUANTITY 1000";

#[derive(Default)]
struct StubDecoder {
    verdicts: Mutex<Vec<AttestationVerdict>>,
}

#[async_trait]
impl TokenDecoder for StubDecoder {
    async fn decode(&self, _token: &str, _package_id: &str) -> AttestResult<AttestationVerdict> {
        self.verdicts
            .lock()
            .pop()
            .ok_or_else(|| AttestError::DecodeFailure("decode service unavailable".to_string()))
    }
}

fn verdict_for(nonce: &str) -> AttestationVerdict {
    AttestationVerdict {
        request_details: RequestDetails {
            request_package_name: Some(PACKAGE_ID.to_string()),
            timestamp_millis: 1_700_000_000_000,
            nonce: Some(nonce.to_string()),
        },
        app_integrity: AppIntegrity {
            app_recognition_verdict: Some(VERDICT_VERSION_RECOGNIZED.to_string()),
            package_name: Some(PACKAGE_ID.to_string()),
            certificate_sha256_digest: None,
            version_code: 7,
        },
        device_integrity: DeviceIntegrity {
            device_recognition_verdict: Some(vec![VERDICT_MEETS_DEVICE_INTEGRITY.to_string()]),
        },
        account_details: AccountDetails {
            app_licensing_verdict: Some(VERDICT_LICENSED.to_string()),
        },
    }
}

fn state_with_decoder(decoder: Arc<StubDecoder>) -> AppState {
    AppState {
        protocol: Arc::new(CommandProtocol::new(
            PACKAGE_ID,
            16,
            Arc::new(SystemClock),
            decoder,
        )),
        max_body_bytes: 65_536,
    }
}

#[tokio::test]
async fn invalid_json_body_rejected() {
    let st = state_with_decoder(Arc::new(StubDecoder::default()));
    let err = perform_command_impl(&st, b"not json")
        .await
        .expect_err("must reject");
    assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    assert!(!err.result.command_success);
    assert_eq!(err.result.diagnostic_message, "invalid JSON body");
}

#[tokio::test]
async fn empty_command_rejected() {
    let st = state_with_decoder(Arc::new(StubDecoder::default()));
    let body = json!({"command": "", "token": "t"}).to_string();
    let err = perform_command_impl(&st, body.as_bytes())
        .await
        .expect_err("must reject");
    assert_eq!(err.result.diagnostic_message, "invalid command");
}

#[tokio::test]
async fn missing_token_rejected() {
    let st = state_with_decoder(Arc::new(StubDecoder::default()));
    let body = json!({"command": COMMAND, "token": ""}).to_string();
    let err = perform_command_impl(&st, body.as_bytes())
        .await
        .expect_err("must reject");
    assert_eq!(err.result.diagnostic_message, "missing token");
}

#[tokio::test]
async fn oversized_body_rejected() {
    let mut st = state_with_decoder(Arc::new(StubDecoder::default()));
    st.max_body_bytes = 8;
    let body = json!({"command": COMMAND, "token": "t"}).to_string();
    let err = perform_command_impl(&st, body.as_bytes())
        .await
        .expect_err("must reject");
    assert_eq!(err.result.diagnostic_message, "request body too large");
}

#[tokio::test]
async fn attestation_path_end_to_end_over_impl() {
    let decoder = Arc::new(StubDecoder::default());
    let st = state_with_decoder(Arc::clone(&decoder));

    let challenge = st.protocol.handle_get_random();
    decoder
        .verdicts
        .lock()
        .push(verdict_for(&nonce::encode(COMMAND, &challenge.value)));

    let body = json!({"command": COMMAND, "token": "opaque-attestation-token"}).to_string();
    let result = perform_command_impl(&st, body.as_bytes())
        .await
        .expect("must resolve");
    assert!(result.command_success);
    assert!(!result.express_token.is_empty());

    // Replay of the same attestation token: the challenge is burned, and the
    // stub has no verdict queued, so the decode failure is surfaced.
    let replay = perform_command_impl(&st, body.as_bytes())
        .await
        .expect("must resolve");
    assert!(!replay.command_success);
}

#[tokio::test]
async fn express_token_round_trips_through_http_layer() {
    let decoder = Arc::new(StubDecoder::default());
    let st = state_with_decoder(Arc::clone(&decoder));

    let challenge = st.protocol.handle_get_random();
    decoder
        .verdicts
        .lock()
        .push(verdict_for(&nonce::encode(COMMAND, &challenge.value)));
    let body = json!({"command": COMMAND, "token": "opaque-attestation-token"}).to_string();
    let first = perform_command_impl(&st, body.as_bytes())
        .await
        .expect("must resolve");
    assert!(first.command_success);

    let body = json!({"command": "STATUS QUERY", "token": first.express_token.clone()}).to_string();
    let second = perform_command_impl(&st, body.as_bytes())
        .await
        .expect("must resolve");
    assert!(second.command_success);
    assert_eq!(second.diagnostic_message, "express token accepted");
    assert_ne!(second.express_token, first.express_token);
}
