// Copyright (c) 2026 attestgate contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface of the attestation protocol.
//!
//! Protocol outcomes (bad nonce, failed policy, decode failure) are
//! application results: they travel as `200` with `commandSuccess: false`.
//! Only malformed transport input (invalid JSON, oversized body) maps to a
//! `400`, still carrying a failed `CommandResult` body so clients have one
//! shape to parse.

use std::sync::Arc;

use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use attestgate_core::protocol::{CommandProtocol, CommandResult};

const MAX_COMMAND_CHARS: usize = 4_096;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub random: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    /// Either a live express-token value or an opaque attestation token;
    /// the server decides by ledger lookup.
    pub token: String,
}

#[derive(Clone)]
pub struct AppState {
    pub protocol: Arc<CommandProtocol>,
    pub max_body_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/getRandom", get(get_random))
        .route("/performCommand", post(perform_command))
        .layer(RequestBodyLimitLayer::new(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_random(State(state): State<AppState>) -> impl IntoResponse {
    let entry = state.protocol.handle_get_random();
    tracing::debug!("issued challenge");
    Json(ChallengeResponse {
        random: entry.value,
        timestamp: entry.issued_at_ms,
    })
}

async fn perform_command(
    State(state): State<AppState>,
    body: Result<axum::body::Bytes, BytesRejection>,
) -> impl IntoResponse {
    // The body-limit layer rejects oversized bodies while buffering; fold
    // that into the same 400 + CommandResult shape as the handler checks.
    let body = match body {
        Ok(body) => body,
        Err(_) => {
            let err = HttpErr::bad_request("request body too large");
            return (err.status, Json(err.result)).into_response();
        }
    };
    match perform_command_impl(&state, &body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => (err.status, Json(err.result)).into_response(),
    }
}

#[derive(Debug)]
pub struct HttpErr {
    pub status: StatusCode,
    pub result: CommandResult,
}

impl HttpErr {
    fn bad_request(diagnostic: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            result: CommandResult::failure(diagnostic),
        }
    }
}

pub async fn perform_command_impl(
    state: &AppState,
    body: &[u8],
) -> Result<CommandResult, HttpErr> {
    if body.len() > state.max_body_bytes {
        return Err(HttpErr::bad_request("request body too large"));
    }
    let request: CommandRequest = serde_json::from_slice(body)
        .map_err(|_| HttpErr::bad_request("invalid JSON body"))?;
    if request.command.is_empty() || request.command.chars().count() > MAX_COMMAND_CHARS {
        return Err(HttpErr::bad_request("invalid command"));
    }
    if request.token.is_empty() {
        return Err(HttpErr::bad_request("missing token"));
    }

    Ok(state
        .protocol
        .handle_perform_command(&request.command, &request.token)
        .await)
}
