// ABOUTME: Tool scenario schemas and payload construction for CRM capture
// ABOUTME: Validates billing_query payloads and builds them from turn data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use serde_json::{json, Map, Value};
use voxloom_core::constants::limits::ACCOUNT_ID_PREFIX_LEN;
use voxloom_core::constants::scenarios::{
    BILLING_QUERY, BILLING_QUERY_REQUIRED_FIELDS, PRIORITIES,
};
use voxloom_core::models::Session;

use crate::intent::BillingIntent;

/// Fields of a `billing_query` payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingQuery {
    /// Customer name
    pub name: String,
    /// Optional phone or email
    pub contact: Option<String>,
    /// Billing account
    pub account_id: String,
    /// Customer query text
    pub query: String,
    /// Intent tag
    pub intent: String,
    /// Handling priority
    pub priority: String,
}

/// Validate a tool payload against its scenario schema.
///
/// On failure returns every offending field name in schema order. An unknown
/// scenario is reported as the single field `scenario`.
///
/// # Errors
///
/// Returns the list of missing or invalid fields
pub fn validate_payload(scenario: &str, payload: &Value) -> Result<BillingQuery, Vec<String>> {
    if scenario != BILLING_QUERY {
        return Err(vec!["scenario".to_owned()]);
    }

    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);
    let mut invalid = Vec::new();

    let mut required = |name: &str| -> String {
        match fields.get(name).and_then(Value::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => value.to_owned(),
            _ => {
                invalid.push(name.to_owned());
                String::new()
            }
        }
    };
    let [name, account_id, query, intent, priority] = BILLING_QUERY_REQUIRED_FIELDS.map(&mut required);

    if !priority.is_empty() && !PRIORITIES.contains(&priority.as_str()) {
        invalid.push("priority".to_owned());
    }

    // `phone` is the legacy name of the contact field
    let contact_field = ["contact", "phone"]
        .into_iter()
        .find(|key| fields.get(*key).is_some_and(|value| !value.is_null()));
    let contact = match contact_field.and_then(|key| fields.get(key)) {
        None => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            invalid.push("contact".to_owned());
            None
        }
    };

    if invalid.is_empty() {
        Ok(BillingQuery {
            name,
            contact,
            account_id,
            query,
            intent,
            priority,
        })
    } else {
        Err(invalid)
    }
}

/// Account identifier derived from a session: `acc_` plus the first characters of its ID
#[must_use]
pub fn account_id_for(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(ACCOUNT_ID_PREFIX_LEN).collect();
    format!("acc_{prefix}")
}

/// Build the `billing_query` payload captured automatically at the end of a turn
#[must_use]
pub fn billing_query_payload(session: &Session, query: &str, intent: BillingIntent) -> Value {
    json!({
        "name": session.customer_id,
        "account_id": account_id_for(&session.id),
        "query": query,
        "intent": intent.as_str(),
        "priority": intent.priority(),
    })
}
