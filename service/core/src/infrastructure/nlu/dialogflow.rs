// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

// Dialogflow NLU Provider Adapter
//
// Anti-Corruption Layer for the Dialogflow ES `detectIntent` REST API.
// Translates an utterance into a RecognizedIntent with a typed parameter bag.

use crate::domain::intent::{ParameterBag, RecognizedIntent};
use crate::domain::nlu::{NluError, NluProvider, NluSession, Utterance};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct DialogflowAdapter {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    access_token: Option<String>,
    language_code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest<'a> {
    query_input: QueryInput<'a>,
}

#[derive(Serialize)]
struct QueryInput<'a> {
    text: TextInput<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextInput<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    query_result: Option<QueryResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    intent: Option<DialogflowIntent>,
    #[serde(default)]
    parameters: Value,
    fulfillment_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DialogflowIntent {
    #[serde(default)]
    display_name: String,
}

impl DialogflowAdapter {
    pub fn new(
        endpoint: String,
        project_id: String,
        access_token: Option<String>,
        language_code: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            project_id,
            access_token,
            language_code,
        }
    }

    pub fn session_path(&self, session: &NluSession) -> String {
        format!(
            "projects/{}/agent/sessions/{}",
            self.project_id, session.session_id
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a `detectIntent` response body to our domain type
fn translate(body: DetectIntentResponse) -> Result<RecognizedIntent, NluError> {
    // A response without a queryResult means the agent produced nothing at all.
    let result = body.query_result.ok_or(NluError::NoMatch)?;

    // Fallback or unmatched queries carry no intent; they dispatch as unknown.
    let name = result
        .intent
        .map(|i| i.display_name)
        .unwrap_or_default();

    let mut recognized = RecognizedIntent::new(&name, ParameterBag::from_json(&result.parameters));
    recognized.fulfillment_text = result.fulfillment_text.filter(|t| !t.is_empty());
    Ok(recognized)
}

#[async_trait]
impl NluProvider for DialogflowAdapter {
    async fn detect_intent(
        &self,
        session: &NluSession,
        utterance: &Utterance,
    ) -> Result<RecognizedIntent, NluError> {
        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text: &utterance.text,
                    language_code: &self.language_code,
                },
            },
        };

        let url = format!(
            "{}/v2/{}:detectIntent",
            self.endpoint.trim_end_matches('/'),
            self.session_path(session)
        );
        tracing::debug!(session = %session.session_id, "Sending utterance to Dialogflow");

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| NluError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                NluError::Authentication(error_text)
            } else if status == 429 {
                NluError::RateLimit
            } else {
                NluError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        let body: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| NluError::Provider(format!("Failed to parse response: {}", e)))?;

        translate(body)
    }

    async fn health_check(&self) -> Result<(), NluError> {
        let url = format!(
            "{}/v2/projects/{}/agent",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        );

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| NluError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status() == 401 || response.status() == 403 {
            Err(NluError::Authentication("Invalid access token".into()))
        } else {
            Err(NluError::Network(format!("HTTP {}", response.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::IntentName;
    use serde_json::json;

    fn parse(value: Value) -> Result<RecognizedIntent, NluError> {
        translate(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_translate_matched_intent() {
        let recognized = parse(json!({
            "responseId": "r-1",
            "queryResult": {
                "queryText": "add lunch 12.5 to trip",
                "intent": { "name": "projects/p/agent/intents/1", "displayName": "create_expense" },
                "parameters": { "expenseName": "lunch", "amount": 12.5 },
                "fulfillmentText": "Adding it"
            }
        }))
        .unwrap();

        assert_eq!(recognized.name, IntentName::CreateExpense);
        assert_eq!(
            recognized.parameters.get("amount").and_then(|v| v.as_number()),
            Some(12.5)
        );
        assert_eq!(recognized.fulfillment_text.as_deref(), Some("Adding it"));
    }

    #[test]
    fn test_unmatched_intent_is_unknown() {
        let recognized = parse(json!({ "queryResult": { "queryText": "hmm", "parameters": {} } })).unwrap();
        assert!(!recognized.name.is_known());
        assert!(recognized.parameters.is_empty());
    }

    #[test]
    fn test_missing_query_result_is_no_match() {
        assert!(matches!(parse(json!({ "responseId": "r-2" })), Err(NluError::NoMatch)));
    }

    #[test]
    fn test_session_path() {
        let adapter = DialogflowAdapter::new(
            "https://dialogflow.googleapis.com".into(),
            "expenses-bot".into(),
            None,
            "en-US".into(),
        );
        let session = NluSession::new(crate::domain::user::UserId::new());
        assert_eq!(
            adapter.session_path(&session),
            format!("projects/expenses-bot/agent/sessions/{}", session.session_id)
        );
    }
}
