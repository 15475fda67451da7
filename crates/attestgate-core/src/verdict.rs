// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! Attestation verdict document and policy validation.
//!
//! The verdict is produced by a trusted third-party decode service and
//! arrives here already authenticated; this module only evaluates its
//! contents against policy.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// Signal values carried by the verdict document.
pub const VERDICT_MEETS_BASIC_INTEGRITY: &str = "MEETS_BASIC_INTEGRITY";
pub const VERDICT_MEETS_DEVICE_INTEGRITY: &str = "MEETS_DEVICE_INTEGRITY";
pub const VERDICT_MEETS_STRONG_INTEGRITY: &str = "MEETS_STRONG_INTEGRITY";
pub const VERDICT_MEETS_VIRTUAL_INTEGRITY: &str = "MEETS_VIRTUAL_INTEGRITY";
pub const VERDICT_VERSION_RECOGNIZED: &str = "PLAY_RECOGNIZED";
pub const VERDICT_VERSION_UNRECOGNIZED: &str = "UNRECOGNIZED_VERSION";
pub const VERDICT_LICENSED: &str = "LICENSED";
pub const VERDICT_UNLICENSED: &str = "UNLICENSED";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestDetails {
    pub request_package_name: Option<String>,
    pub timestamp_millis: i64,
    pub nonce: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppIntegrity {
    pub app_recognition_verdict: Option<String>,
    pub package_name: Option<String>,
    pub certificate_sha256_digest: Option<Vec<String>>,
    pub version_code: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceIntegrity {
    pub device_recognition_verdict: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountDetails {
    pub app_licensing_verdict: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttestationVerdict {
    pub request_details: RequestDetails,
    pub app_integrity: AppIntegrity,
    pub device_integrity: DeviceIntegrity,
    pub account_details: AccountDetails,
}

/// Envelope shape returned by the decode service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerdictPayload {
    pub token_payload_external: AttestationVerdict,
}

/// Recomputes the command digest and compares it against the claimed hex
/// digest in constant time.
pub fn validate_hash(command: &str, claimed_digest_hex: &str) -> bool {
    let expected = Sha256::digest(command.as_bytes());
    let Ok(claimed) = hex::decode(claimed_digest_hex) else {
        return false;
    };
    constant_time_eq(expected.as_slice(), claimed.as_slice())
}

/// Policy gate over an authenticated verdict. All four checks must pass,
/// evaluated in order with short-circuit:
/// 1. at least one positive device integrity signal
/// 2. app recognition in {PLAY_RECOGNIZED, UNRECOGNIZED_VERSION}
/// 3. licensing verdict LICENSED
/// 4. exact package identifier match
pub fn validate_policy(verdict: &AttestationVerdict, package_id: &str) -> bool {
    if !has_device_integrity_signal(verdict) {
        return false;
    }
    // Unrecognized versions are accepted alongside recognized ones, so
    // sideloaded builds of a licensed install still pass.
    match verdict.app_integrity.app_recognition_verdict.as_deref() {
        Some(VERDICT_VERSION_RECOGNIZED) | Some(VERDICT_VERSION_UNRECOGNIZED) => {}
        _ => return false,
    }
    if verdict.account_details.app_licensing_verdict.as_deref() != Some(VERDICT_LICENSED) {
        return false;
    }
    verdict.request_details.request_package_name.as_deref() == Some(package_id)
}

fn has_device_integrity_signal(verdict: &AttestationVerdict) -> bool {
    verdict
        .device_integrity
        .device_recognition_verdict
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|signal| {
            matches!(
                signal.as_str(),
                VERDICT_MEETS_BASIC_INTEGRITY
                    | VERDICT_MEETS_DEVICE_INTEGRITY
                    | VERDICT_MEETS_STRONG_INTEGRITY
                    | VERDICT_MEETS_VIRTUAL_INTEGRITY
            )
        })
}

/// Human-readable verdict summary for diagnostics. Presentation only; never
/// consulted for authorization.
pub fn summarize(verdict: &AttestationVerdict, package_id: &str) -> String {
    let mut summary = String::from("Device integrity: ");
    let mut found_signal = false;
    for signal in verdict
        .device_integrity
        .device_recognition_verdict
        .as_deref()
        .unwrap_or_default()
    {
        let label = match signal.as_str() {
            VERDICT_MEETS_BASIC_INTEGRITY => "Basic ",
            VERDICT_MEETS_DEVICE_INTEGRITY => "Device ",
            VERDICT_MEETS_STRONG_INTEGRITY => "Strong ",
            VERDICT_MEETS_VIRTUAL_INTEGRITY => "Virtual ",
            _ => continue,
        };
        found_signal = true;
        summary.push_str(label);
    }
    if !found_signal {
        summary = String::from("Not found");
    }

    match verdict.app_integrity.app_recognition_verdict.as_deref() {
        Some(VERDICT_VERSION_RECOGNIZED) => summary.push_str("\nApp version recognized"),
        Some(VERDICT_VERSION_UNRECOGNIZED) => summary.push_str("\nApp version unrecognized"),
        _ => summary.push_str("\nApp version unevaluated"),
    }

    match verdict.account_details.app_licensing_verdict.as_deref() {
        Some(VERDICT_LICENSED) => summary.push_str("\nApp licensed"),
        Some(VERDICT_UNLICENSED) => summary.push_str("\nApp unlicensed"),
        _ => summary.push_str("\nApp license unevaluated"),
    }

    if verdict.request_details.request_package_name.as_deref() == Some(package_id) {
        summary.push_str("\nPackage name match");
    } else {
        summary.push_str("\nPackage name mismatch");
    }

    summary
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (&x, &y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::testutil::{passing_verdict, PACKAGE_ID};
    use super::*;
    use crate::nonce::command_digest_hex;

    #[test]
    fn hash_matches_for_recomputed_digest() {
        let command = "TRANSFER FROM alice TO bob CURRENCY gems QUANTITY 1000";
        assert!(validate_hash(command, &command_digest_hex(command)));
    }

    #[test]
    fn hash_rejects_wrong_length_and_non_hex() {
        assert!(!validate_hash("cmd", "abcd"));
        assert!(!validate_hash("cmd", "zz"));
        assert!(!validate_hash("cmd", ""));
    }

    #[test]
    fn policy_accepts_all_positive_signals() {
        let verdict = passing_verdict("ignored");
        assert!(validate_policy(&verdict, PACKAGE_ID));
    }

    #[test]
    fn policy_accepts_each_device_signal_value() {
        for signal in [
            VERDICT_MEETS_BASIC_INTEGRITY,
            VERDICT_MEETS_DEVICE_INTEGRITY,
            VERDICT_MEETS_STRONG_INTEGRITY,
            VERDICT_MEETS_VIRTUAL_INTEGRITY,
        ] {
            let mut verdict = passing_verdict("ignored");
            verdict.device_integrity.device_recognition_verdict = Some(vec![signal.to_string()]);
            assert!(validate_policy(&verdict, PACKAGE_ID), "signal {signal}");
        }
    }

    #[test]
    fn policy_accepts_unrecognized_version() {
        let mut verdict = passing_verdict("ignored");
        verdict.app_integrity.app_recognition_verdict =
            Some(VERDICT_VERSION_UNRECOGNIZED.to_string());
        assert!(validate_policy(&verdict, PACKAGE_ID));
    }

    #[test]
    fn policy_rejects_missing_device_signal() {
        let mut verdict = passing_verdict("ignored");
        verdict.device_integrity.device_recognition_verdict = Some(vec![]);
        assert!(!validate_policy(&verdict, PACKAGE_ID));
        verdict.device_integrity.device_recognition_verdict = None;
        assert!(!validate_policy(&verdict, PACKAGE_ID));
    }

    #[test]
    fn policy_rejects_unlicensed_account() {
        let mut verdict = passing_verdict("ignored");
        verdict.account_details.app_licensing_verdict = Some(VERDICT_UNLICENSED.to_string());
        assert!(!validate_policy(&verdict, PACKAGE_ID));
    }

    #[test]
    fn policy_rejects_package_mismatch() {
        let verdict = passing_verdict("ignored");
        assert!(!validate_policy(&verdict, "com.other.app"));
    }

    #[test]
    fn summarize_names_device_signals_and_checks() {
        let mut verdict = passing_verdict("ignored");
        verdict.device_integrity.device_recognition_verdict = Some(vec![
            VERDICT_MEETS_BASIC_INTEGRITY.to_string(),
            VERDICT_MEETS_STRONG_INTEGRITY.to_string(),
        ]);
        let summary = summarize(&verdict, PACKAGE_ID);
        assert!(summary.starts_with("Device integrity: Basic Strong "));
        assert!(summary.contains("App version recognized"));
        assert!(summary.contains("App licensed"));
        assert!(summary.contains("Package name match"));
    }

    #[test]
    fn summarize_reports_missing_device_signal() {
        let mut verdict = passing_verdict("ignored");
        verdict.device_integrity.device_recognition_verdict = None;
        let summary = summarize(&verdict, PACKAGE_ID);
        assert!(summary.starts_with("Not found"));
        assert!(summary.contains("Package name match"));
    }

    #[test]
    fn verdict_parses_camel_case_wire_document() {
        let doc = serde_json::json!({
            "requestDetails": {
                "requestPackageName": PACKAGE_ID,
                "timestampMillis": 1700000000000i64,
                "nonce": "ab12"
            },
            "appIntegrity": {
                "appRecognitionVerdict": "PLAY_RECOGNIZED",
                "packageName": PACKAGE_ID,
                "certificateSha256Digest": ["6a6a1474"],
                "versionCode": 7
            },
            "deviceIntegrity": {
                "deviceRecognitionVerdict": ["MEETS_DEVICE_INTEGRITY"]
            },
            "accountDetails": {
                "appLicensingVerdict": "LICENSED"
            }
        });
        let verdict: AttestationVerdict = serde_json::from_value(doc).unwrap();
        assert!(validate_policy(&verdict, PACKAGE_ID));
        assert_eq!(verdict.request_details.nonce.as_deref(), Some("ab12"));
    }

    #[test]
    fn verdict_tolerates_absent_sections() {
        let verdict: AttestationVerdict = serde_json::from_str("{}").unwrap();
        assert!(!validate_policy(&verdict, PACKAGE_ID));
    }

    proptest! {
        #[test]
        fn mutated_digest_never_matches(command in ".+", bit in 0usize..256) {
            let digest = command_digest_hex(&command);
            let mut bytes = hex::decode(&digest).unwrap();
            bytes[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(!validate_hash(&command, &hex::encode(bytes)));
        }
    }
}
