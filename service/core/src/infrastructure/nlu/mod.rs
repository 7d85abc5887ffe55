// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

// NLU Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain `NluProvider` interface and an
// external intent-classification service.

pub mod dialogflow;
pub mod keyword;
pub mod session_registry;

pub use dialogflow::DialogflowAdapter;
pub use keyword::KeywordNluProvider;
pub use session_registry::SessionRegistry;

use std::sync::Arc;
use tracing::info;

use crate::domain::nlu::NluProvider;
use crate::domain::service_config::{resolve_secret, NluConfig, NluProviderType};

/// Create the configured NLU provider
pub fn create_provider(config: &NluConfig) -> anyhow::Result<Arc<dyn NluProvider>> {
    let provider: Arc<dyn NluProvider> = match config.provider_type {
        NluProviderType::Dialogflow => {
            let project_id = resolve_secret(&config.project_id)?
                .ok_or_else(|| anyhow::anyhow!("No Dialogflow project id configured"))?;
            let access_token = resolve_secret(&config.access_token)?;
            info!("Using Dialogflow NLU provider for project {}", project_id);
            Arc::new(DialogflowAdapter::new(
                config.endpoint.clone(),
                project_id,
                access_token,
                config.language_code.clone(),
            ))
        }
        NluProviderType::Keyword => {
            info!("Using built-in keyword NLU provider");
            Arc::new(KeywordNluProvider::new())
        }
    };
    Ok(provider)
}
