// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`expensa-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP/SSE (Axum) | Chat endpoint, resource API, notification stream |

pub mod api;

pub use api::{app, AppState};
