// Copyright [2026] [attestgate contributors]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use attestgate_core::clock::SystemClock;
use attestgate_core::protocol::{CommandProtocol, TokenDecoder};
use attestgate_daemon::config::DaemonConfig;
use attestgate_daemon::decode::HttpTokenDecoder;
use attestgate_daemon::http::{self, AppState};

#[derive(Debug, Parser)]
#[command(name = "attestgate-daemon")]
#[command(about = "Challenge-response command attestation server")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Application identifier the attestation verdict must name.
    #[arg(long)]
    package_id: String,

    /// Decode service endpoint; `{package}` is replaced by --package-id.
    #[arg(long)]
    decode_url: String,

    /// File holding the bearer credential for the decode service.
    #[arg(long)]
    decode_credential: Option<PathBuf>,

    #[arg(long, default_value_t = 10_000)]
    decode_timeout_ms: u64,

    #[arg(long, default_value_t = 65_536)]
    max_body_bytes: usize,

    #[arg(long, default_value_t = 16)]
    express_token_bytes: usize,

    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log))
        .init();

    let cfg = DaemonConfig {
        listen: args.listen,
        package_id: args.package_id,
        decode_url: args.decode_url,
        decode_credential_path: args.decode_credential,
        decode_timeout_ms: args.decode_timeout_ms,
        max_body_bytes: args.max_body_bytes,
        express_token_byte_len: args.express_token_bytes,
    };

    let credential = cfg.load_decode_credential()?;
    let decoder: Arc<dyn TokenDecoder> = Arc::new(HttpTokenDecoder::new(
        cfg.decode_url.clone(),
        credential,
        cfg.decode_timeout_ms,
    )?);
    let protocol = Arc::new(CommandProtocol::new(
        cfg.package_id.clone(),
        cfg.express_token_byte_len,
        Arc::new(SystemClock),
        decoder,
    ));

    let listener = tokio::net::TcpListener::bind(&cfg.listen).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, package_id = %cfg.package_id, "starting attestgate HTTP server");

    let state = AppState {
        protocol,
        max_body_bytes: cfg.max_body_bytes,
    };
    http::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;

    Ok(())
}
