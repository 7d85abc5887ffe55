// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Recognized intents and their loosely-typed parameter bag
//!
//! The NLU provider returns parameters as a map of name to typed value. Two
//! encodings are accepted: plain JSON (`{"amount": 12.5}`) as returned by the
//! REST API, and the discriminated protobuf-`Struct` encoding
//! (`{"amount": {"kind": "numberValue", "numberValue": 12.5}}`) produced by
//! gRPC clients. Both decode to the same `ParamValue`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Conversational intents understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentName {
    CreateList,
    UpdateList,
    DeleteList,
    ReadList,
    CreateExpense,
    UpdateExpense,
    DeleteExpense,
    ReadExpense,
    /// Anything else, keeping the raw name for logging.
    Unknown(String),
}

impl IntentName {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "create_list" => Self::CreateList,
            "update_list" => Self::UpdateList,
            "delete_list" => Self::DeleteList,
            "read_list" => Self::ReadList,
            "create_expense" => Self::CreateExpense,
            "update_expense" => Self::UpdateExpense,
            "delete_expense" => Self::DeleteExpense,
            "read_expense" => Self::ReadExpense,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateList => "create_list",
            Self::UpdateList => "update_list",
            Self::DeleteList => "delete_list",
            Self::ReadList => "read_list",
            Self::CreateExpense => "create_expense",
            Self::UpdateExpense => "update_expense",
            Self::DeleteExpense => "delete_expense",
            Self::ReadExpense => "read_expense",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether a successful dispatch of this intent changes stored state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::CreateList
                | Self::UpdateList
                | Self::DeleteList
                | Self::CreateExpense
                | Self::UpdateExpense
                | Self::DeleteExpense
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for IntentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown({})", raw),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A single slot value as produced by the NLU provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ParamValue>),
    Struct(BTreeMap<String, ParamValue>),
}

const DISCRIMINATORS: [&str; 6] = [
    "stringValue",
    "numberValue",
    "boolValue",
    "nullValue",
    "structValue",
    "listValue",
];

impl ParamValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                if let Some(decoded) = Self::from_discriminated(map) {
                    return decoded;
                }
                Self::Struct(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Self::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// Decode `{"kind": "stringValue", "stringValue": "..."}` style values.
    fn from_discriminated(map: &serde_json::Map<String, Value>) -> Option<Self> {
        let keys: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "kind")
            .collect();
        if keys.len() != 1 || !DISCRIMINATORS.contains(&keys[0]) {
            return None;
        }
        let inner = map.get(keys[0])?;
        let decoded = match keys[0] {
            "stringValue" => Self::Text(inner.as_str()?.to_string()),
            "numberValue" => Self::Number(inner.as_f64()?),
            "boolValue" => Self::Bool(inner.as_bool()?),
            "nullValue" => Self::Null,
            "structValue" => {
                let fields = inner.get("fields").unwrap_or(inner).as_object()?;
                Self::Struct(
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), Self::from_json(v)))
                        .collect(),
                )
            }
            "listValue" => {
                let values = inner.get("values").unwrap_or(inner).as_array()?;
                Self::List(values.iter().map(Self::from_json).collect())
            }
            _ => return None,
        };
        Some(decoded)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Struct(fields) => fields.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

/// Parameter name to raw slot value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(BTreeMap<String, ParamValue>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from a JSON object; any other JSON shape yields an empty bag.
    pub fn from_json(value: &Value) -> Self {
        let fields = value
            .get("fields")
            .filter(|f| f.is_object())
            .unwrap_or(value);
        match fields.as_object() {
            Some(map) => Self(
                map.iter()
                    .map(|(k, v)| (k.clone(), ParamValue::from_json(v)))
                    .collect(),
            ),
            None => Self::default(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, ParamValue::Text(value.into()))
    }

    pub fn with_number(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, ParamValue::Number(value))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Structured result of understanding one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedIntent {
    pub name: IntentName,
    pub parameters: ParameterBag,
    /// Provider's own reply text, if any
    pub fulfillment_text: Option<String>,
}

impl RecognizedIntent {
    pub fn new(name: &str, parameters: ParameterBag) -> Self {
        Self {
            name: IntentName::parse(name),
            parameters,
            fulfillment_text: None,
        }
    }
}
