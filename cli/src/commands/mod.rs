// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Expensa CLI

pub mod chat;
pub mod config;
pub mod seed;
pub mod serve;

pub use self::chat::ChatArgs;
pub use self::config::ConfigCommand;
pub use self::seed::SeedArgs;
