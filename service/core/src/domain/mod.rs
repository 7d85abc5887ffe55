// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Provides the aggregates, value objects and ports of the service.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Entities and the interfaces infrastructure implements

pub mod user;
pub mod expenses_list;
pub mod expense;
pub mod notification;
pub mod events;
pub mod intent;
pub mod nlu;
pub mod repository;
pub mod service_config;
