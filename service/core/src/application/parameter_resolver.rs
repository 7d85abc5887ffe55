// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Parameter Resolver
//!
//! Provides typed extraction of slot values from the NLU parameter bag.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Turn a loosely typed `ParameterBag` into a `ResolvedParams`
//!   record, or report every slot that is missing or malformed
//!
//! Resolution is pure. A slot is looked up under its canonical camelCase name
//! and then under its snake_case alias.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::intent::{ParamValue, ParameterBag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Non-empty string after trimming
    Text,
    /// Finite number, or a string that parses as one
    Number,
    /// `Number` that must also be non-negative
    Amount,
    /// UUID string
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: &'static str,
    pub kind: SlotKind,
}

impl SlotSpec {
    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: SlotKind::Text }
    }

    pub const fn number(name: &'static str) -> Self {
        Self { name, kind: SlotKind::Number }
    }

    pub const fn amount(name: &'static str) -> Self {
        Self { name, kind: SlotKind::Amount }
    }

    pub const fn id(name: &'static str) -> Self {
        Self { name, kind: SlotKind::Id }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Text(String),
    Number(f64),
    Id(Uuid),
}

/// Slots that failed resolution, in the order they were requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing or invalid slots: {}", .0.join(", "))]
pub struct MissingSlots(pub Vec<String>);

/// Type-checked slot values, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: HashMap<&'static str, ResolvedValue>,
}

impl ResolvedParams {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ResolvedValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ResolvedValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn id(&self, name: &str) -> Option<Uuid> {
        match self.values.get(name) {
            Some(ResolvedValue::Id(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// snake_case spelling accepted for each canonical slot name
fn alias(name: &str) -> Option<&'static str> {
    match name {
        "listName" => Some("list_name"),
        "newListName" => Some("new_list_name"),
        "listId" => Some("list_id"),
        "expenseName" => Some("expense_name"),
        "expenseId" => Some("expense_id"),
        _ => None,
    }
}

fn lookup<'a>(bag: &'a ParameterBag, name: &str) -> Option<&'a ParamValue> {
    let canonical = bag.get(name).filter(|v| !v.is_empty());
    canonical.or_else(|| {
        alias(name)
            .and_then(|a| bag.get(a))
            .filter(|v| !v.is_empty())
    })
}

fn coerce(value: &ParamValue, kind: SlotKind) -> Option<ResolvedValue> {
    match kind {
        SlotKind::Text => value
            .as_text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| ResolvedValue::Text(s.to_string())),
        SlotKind::Number => as_finite(value).map(ResolvedValue::Number),
        SlotKind::Amount => as_finite(value)
            .filter(|n| *n >= 0.0)
            .map(ResolvedValue::Number),
        SlotKind::Id => value
            .as_text()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(ResolvedValue::Id),
    }
}

fn as_finite(value: &ParamValue) -> Option<f64> {
    let n = match value {
        ParamValue::Number(n) => Some(*n),
        ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Resolve every slot in `specs`, or return all that failed.
pub fn resolve(bag: &ParameterBag, specs: &[SlotSpec]) -> Result<ResolvedParams, MissingSlots> {
    let mut resolved = ResolvedParams::default();
    let mut missing = Vec::new();

    for spec in specs {
        match lookup(bag, spec.name).and_then(|v| coerce(v, spec.kind)) {
            Some(value) => {
                resolved.values.insert(spec.name, value);
            }
            None => missing.push(spec.name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(MissingSlots(missing))
    }
}

/// Resolve a single optional slot; absent or malformed yields `None`.
pub fn resolve_optional(bag: &ParameterBag, spec: SlotSpec) -> Option<ResolvedValue> {
    lookup(bag, spec.name).and_then(|v| coerce(v, spec.kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_all_kinds() {
        let list_id = Uuid::new_v4();
        let bag = ParameterBag::new()
            .with_text("expenseName", "  Lunch ")
            .with_text("amount", "12.5")
            .with_text("listId", list_id.to_string());

        let params = resolve(
            &bag,
            &[
                SlotSpec::text("expenseName"),
                SlotSpec::amount("amount"),
                SlotSpec::id("listId"),
            ],
        )
        .unwrap();

        assert_eq!(params.text("expenseName"), Some("Lunch"));
        assert_eq!(params.number("amount"), Some(12.5));
        assert_eq!(params.id("listId"), Some(list_id));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_reports_every_missing_slot() {
        let bag = ParameterBag::new()
            .with_text("expenseName", "   ")
            .with_number("amount", -4.0)
            .with_text("listId", "not-a-uuid");

        let err = resolve(
            &bag,
            &[
                SlotSpec::text("expenseName"),
                SlotSpec::amount("amount"),
                SlotSpec::id("listId"),
            ],
        )
        .unwrap_err();

        assert_eq!(err.0, vec!["expenseName", "amount", "listId"]);
    }

    #[test]
    fn test_snake_case_alias() {
        let bag = ParameterBag::new().with_text("list_name", "Trip");
        let params = resolve(&bag, &[SlotSpec::text("listName")]).unwrap();
        assert_eq!(params.text("listName"), Some("Trip"));
    }

    #[test]
    fn test_number_slot_allows_negative_but_not_nan() {
        let bag = ParameterBag::new()
            .with_number("delta", -2.0)
            .with_text("bad", "NaN");
        assert_eq!(
            resolve(&bag, &[SlotSpec::number("delta")]).unwrap().number("delta"),
            Some(-2.0)
        );
        assert!(resolve(&bag, &[SlotSpec::number("bad")]).is_err());
    }

    #[test]
    fn test_wrong_shapes_are_missing_not_panics() {
        let bag = ParameterBag::new()
            .with("listName", ParamValue::Number(3.0))
            .with("amount", ParamValue::List(vec![]))
            .with("expenseId", ParamValue::Null);

        let err = resolve(
            &bag,
            &[
                SlotSpec::text("listName"),
                SlotSpec::amount("amount"),
                SlotSpec::id("expenseId"),
            ],
        )
        .unwrap_err();
        assert_eq!(err.0.len(), 3);
    }

    #[test]
    fn test_optional_slot() {
        let bag = ParameterBag::new();
        assert_eq!(resolve_optional(&bag, SlotSpec::id("listId")), None);
    }
}
