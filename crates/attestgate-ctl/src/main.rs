// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! Thin client shell for an attestgate server.
//!
//! Drives the sequential protocol flow one step per invocation: fetch a
//! challenge, bind it to a command as a nonce (the attestation token itself
//! comes from the platform attestation client, outside this tool), then post
//! the command with either an attestation token or a previously earned
//! express token. Transport failures exit nonzero; no step is retried.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use attestgate_core::nonce;

#[derive(Parser)]
#[command(name = "attestgate-ctl")]
#[command(about = "Client for the attestgate command attestation server")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a fresh single-use challenge from the server.
    GetRandom,
    /// Print the nonce binding a command to a challenge value.
    Nonce {
        #[arg(long)]
        command: String,
        #[arg(long)]
        random: String,
    },
    /// Post a command with an attestation token or express token.
    Perform {
        #[arg(long)]
        command: String,
        #[arg(long)]
        token: String,
    },
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    random: String,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandResult {
    diagnostic_message: String,
    command_success: bool,
    express_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .context("building HTTP client")?;

    match cli.cmd {
        Command::GetRandom => {
            let challenge: ChallengeResponse = client
                .get(format!("{}/getRandom", cli.server))
                .send()
                .await
                .context("server unreachable")?
                .error_for_status()
                .context("getRandom failed")?
                .json()
                .await
                .context("invalid challenge response")?;
            println!("random: {}", challenge.random);
            println!("timestamp: {}", challenge.timestamp);
        }
        Command::Nonce { command, random } => {
            println!("{}", nonce::encode(&command, &random));
        }
        Command::Perform { command, token } => {
            let result: CommandResult = client
                .post(format!("{}/performCommand", cli.server))
                .json(&json!({ "command": command, "token": token }))
                .send()
                .await
                .context("server unreachable")?
                .error_for_status()
                .context("performCommand failed")?
                .json()
                .await
                .context("invalid command result")?;
            println!("{}", result.diagnostic_message);
            if !result.express_token.is_empty() {
                println!("express token: {}", result.express_token);
            }
            if !result.command_success {
                bail!("command rejected");
            }
        }
    }

    Ok(())
}
