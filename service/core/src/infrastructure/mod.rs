// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod event_bus;
pub mod nlu;

pub use event_bus::EventBus;
