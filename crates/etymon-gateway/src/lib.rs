// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for etymon.
//!
//! Exposes the rate limiter and autocomplete index over a small JSON API,
//! plus health and Prometheus endpoints.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, build_router, start_server};
