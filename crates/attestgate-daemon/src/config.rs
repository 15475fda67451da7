use std::fs;
use std::path::{Path, PathBuf};

use attestgate_core::ledger::DEFAULT_EXPRESS_TOKEN_BYTE_LEN;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: String,
    /// Application identifier the verdict's package name must match exactly.
    pub package_id: String,
    /// Endpoint of the trusted decode service. A `{package}` placeholder is
    /// substituted with `package_id`.
    pub decode_url: String,
    pub decode_credential_path: Option<PathBuf>,
    pub decode_timeout_ms: u64,
    pub max_body_bytes: usize,
    pub express_token_byte_len: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            package_id: "com.example.attestgate.demo".to_string(),
            decode_url: String::new(),
            decode_credential_path: None,
            decode_timeout_ms: 10_000,
            max_body_bytes: 65_536,
            express_token_byte_len: DEFAULT_EXPRESS_TOKEN_BYTE_LEN,
        }
    }
}

impl DaemonConfig {
    /// Reads the bearer credential for the decode service, if configured.
    /// Service-account style: one opaque token per file, surrounding
    /// whitespace ignored.
    pub fn load_decode_credential(&self) -> std::io::Result<Option<String>> {
        match self.decode_credential_path.as_deref() {
            None => Ok(None),
            Some(path) => Ok(Some(read_credential(path)?)),
        }
    }
}

fn read_credential(path: &Path) -> std::io::Result<String> {
    let raw = fs::read_to_string(path)?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "decode credential file is empty",
        ));
    }
    Ok(token.to_string())
}
