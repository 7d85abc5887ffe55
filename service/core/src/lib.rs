// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Expensa Core
//!
//! Provides the conversational intent dispatcher, the domain operations on
//! expense lists and the notification fan-out.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain, application, infrastructure and HTTP layers of the
//!   Expensa service

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
