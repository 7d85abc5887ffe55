// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

// Keyword NLU Provider
//
// Offline intent matcher for development and demos. Understands a small
// fixed command grammar and emits the same intent names and parameter
// names as the hosted agent:
//
//   create list <name>
//   rename list <list-id> to <name>
//   delete list <list-id>
//   show lists
//   add expense <name> <amount> to <list-id>
//   update expense <expense-id> to <name> <amount>
//   delete expense <expense-id> [from <list-id>]
//   show expenses <list-id>
//
// Anything else is returned as an unmatched (unknown) intent.

use async_trait::async_trait;

use crate::domain::intent::{ParameterBag, RecognizedIntent};
use crate::domain::nlu::{NluError, NluProvider, NluSession, Utterance};

#[derive(Debug, Default, Clone)]
pub struct KeywordNluProvider;

impl KeywordNluProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn recognize(&self, text: &str) -> RecognizedIntent {
        let words: Vec<&str> = text.split_whitespace().collect();
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let head: Vec<&str> = lowered.iter().take(2).map(String::as_str).collect();

        let matched = match head.as_slice() {
            ["create" | "new", "list"] => rest(&words, 2).map(|name| {
                RecognizedIntent::new("create_list", ParameterBag::new().with_text("listName", name))
            }),
            ["rename", "list"] => split_on(&words[2..], "to").and_then(|(id, name)| {
                Some(RecognizedIntent::new(
                    "update_list",
                    ParameterBag::new()
                        .with_text("listId", single(&id)?)
                        .with_text("newListName", name.join(" ")),
                ))
            }),
            ["delete", "list"] => words.get(2).map(|id| {
                RecognizedIntent::new("delete_list", ParameterBag::new().with_text("listId", *id))
            }),
            ["show" | "read", "lists"] => {
                Some(RecognizedIntent::new("read_list", ParameterBag::new()))
            }
            ["add", "expense"] => split_on(&words[2..], "to").and_then(|(item, target)| {
                let (name, amount) = name_and_amount(&item)?;
                Some(RecognizedIntent::new(
                    "create_expense",
                    ParameterBag::new()
                        .with_text("expenseName", name)
                        .with_text("amount", amount)
                        .with_text("listId", single(&target)?),
                ))
            }),
            ["update", "expense"] => split_on(&words[2..], "to").and_then(|(id, item)| {
                let (name, amount) = name_and_amount(&item)?;
                Some(RecognizedIntent::new(
                    "update_expense",
                    ParameterBag::new()
                        .with_text("expenseId", single(&id)?)
                        .with_text("expenseName", name)
                        .with_text("amount", amount),
                ))
            }),
            ["delete", "expense"] => words.get(2).map(|id| {
                let mut bag = ParameterBag::new().with_text("expenseId", *id);
                if lowered.get(3).map(String::as_str) == Some("from") {
                    if let Some(list_id) = words.get(4) {
                        bag = bag.with_text("listId", *list_id);
                    }
                }
                RecognizedIntent::new("delete_expense", bag)
            }),
            ["show" | "read", "expenses"] => words.get(2).map(|id| {
                RecognizedIntent::new("read_expense", ParameterBag::new().with_text("listId", *id))
            }),
            _ => None,
        };

        matched.unwrap_or_else(|| RecognizedIntent::new("", ParameterBag::new()))
    }
}

fn rest(words: &[&str], from: usize) -> Option<String> {
    let joined = words.get(from..)?.join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Split at the last standalone `keyword`, e.g. "to"
fn split_on<'a>(words: &[&'a str], keyword: &str) -> Option<(Vec<&'a str>, Vec<&'a str>)> {
    let pos = words.iter().rposition(|w| w.eq_ignore_ascii_case(keyword))?;
    let (left, right) = words.split_at(pos);
    Some((left.to_vec(), right[1..].to_vec()))
}

fn single(words: &[&str]) -> Option<String> {
    match words {
        [one] => Some(one.to_string()),
        _ => None,
    }
}

/// "Team lunch 12.5" -> ("Team lunch", "12.5")
fn name_and_amount(words: &[&str]) -> Option<(String, String)> {
    let (amount, name) = words.split_last()?;
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), amount.trim_start_matches('$').to_string()))
}

#[async_trait]
impl NluProvider for KeywordNluProvider {
    async fn detect_intent(
        &self,
        _session: &NluSession,
        utterance: &Utterance,
    ) -> Result<RecognizedIntent, NluError> {
        Ok(self.recognize(&utterance.text))
    }
}
