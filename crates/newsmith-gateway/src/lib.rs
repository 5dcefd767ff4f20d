// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference HTTP surface for the Newsmith pipeline: workflow execution,
//! status, cancellation, health, metrics, and the SSE progress tail.

pub mod handlers;
pub mod server;
pub mod stream;

pub use server::{router, start_server, GatewayState, ServerConfig};
pub use stream::ProgressHub;
