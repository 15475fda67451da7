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

//! attestgate-core
//!
//! Server-side core of a challenge-response command attestation protocol.
//!
//! A client asks the server for a single-use random challenge, binds it to a
//! command via a SHA-256 nonce, obtains a third-party attestation token over
//! that nonce, and posts the command plus token. This crate implements:
//! - single-use, time-bounded value ledgers (challenges and express tokens)
//! - the nonce codec binding a challenge to a command digest
//! - attestation-verdict policy validation
//! - the `CommandProtocol` orchestrator behind the two request handlers

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod clock;
pub mod error;
pub mod ledger;
pub mod nonce;
pub mod protocol;
pub mod verdict;

pub use crate::error::{AttestError, AttestResult};
pub use crate::protocol::{CommandProtocol, CommandResult, TokenDecoder, ValidateResult};
