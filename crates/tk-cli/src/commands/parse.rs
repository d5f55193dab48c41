//! Argument parsing shared by command handlers.

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tk_core::ids::{PROJECT_KEY, TRACE_KEY, parse_id};
use uuid::Uuid;

pub fn trace_id(text: &str) -> anyhow::Result<Uuid> {
    Ok(parse_id(text, TRACE_KEY)?)
}

pub fn project_id(text: &str) -> anyhow::Result<Uuid> {
    Ok(parse_id(text, PROJECT_KEY)?)
}

pub fn timestamp(text: &str, flag: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("--{flag} must be an RFC 3339 timestamp, got '{text}'"))
}

pub fn optional_timestamp(text: Option<&str>, flag: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
    text.map(|t| timestamp(t, flag)).transpose()
}

pub fn optional_json(text: Option<&str>, flag: &str) -> anyhow::Result<Option<serde_json::Value>> {
    text.map(|t| {
        serde_json::from_str(t).with_context(|| format!("--{flag} must be valid JSON"))
    })
    .transpose()
}

pub fn tags(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
