#![no_main]

use attestgate_core::ledger::CHALLENGE_BYTE_LEN;
use attestgate_core::nonce;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = nonce::decode(s, CHALLENGE_BYTE_LEN);
    }
});
