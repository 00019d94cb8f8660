//! Reads the headers the broker attaches to dead-lettered messages.

use chrono::{DateTime, Utc};
use lapin::{
    types::{AMQPValue, FieldTable},
    BasicProperties,
};

/// Where and why a message was dead-lettered, as recorded by the broker.
///
/// Every field describes the most recent death, i.e. the first entry of the
/// `x-death` header. When that header is missing the `x-first-death-*`
/// headers are used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterInfo {
    /// The queue the message was dead-lettered from.
    pub source_queue: String,
    /// `rejected`, `expired`, `maxlen` or `delivery_limit`.
    pub reason: String,
    /// How many times the message was dead-lettered from `source_queue` for `reason`.
    pub count: u64,
    pub dead_lettered_at: Option<DateTime<Utc>>,
}

impl DeadLetterInfo {
    /// Extracts dead-letter details from delivery properties.
    ///
    /// Returns `None` for messages that were never dead-lettered.
    pub fn from_properties(properties: &BasicProperties) -> Option<Self> {
        let headers = properties.headers().as_ref()?;

        match headers.inner().get("x-death").and_then(latest_death_entry) {
            Some(entry) => Self::from_death_entry(entry),
            None => Some(Self {
                source_queue: long_string(headers, "x-first-death-queue")?,
                reason: long_string(headers, "x-first-death-reason").unwrap_or_else(|| "unknown".to_string()),
                count: 1,
                dead_lettered_at: None,
            }),
        }
    }

    fn from_death_entry(entry: &FieldTable) -> Option<Self> {
        let dead_lettered_at = entry.inner().get("time").and_then(|value| match value {
            AMQPValue::Timestamp(secs) => DateTime::from_timestamp(i64::try_from(*secs).ok()?, 0),
            _ => None,
        });

        Some(Self {
            source_queue: long_string(entry, "queue")?,
            reason: long_string(entry, "reason").unwrap_or_else(|| "unknown".to_string()),
            count: entry.inner().get("count").and_then(as_count).unwrap_or(1),
            dead_lettered_at,
        })
    }
}

// The broker keeps the most recent death first in `x-death`.
fn latest_death_entry(value: &AMQPValue) -> Option<&FieldTable> {
    match value {
        AMQPValue::FieldArray(entries) => entries.as_slice().iter().find_map(|entry| match entry {
            AMQPValue::FieldTable(table) => Some(table),
            _ => None,
        }),
        _ => None,
    }
}

fn long_string(table: &FieldTable, key: &str) -> Option<String> {
    table
        .inner()
        .get(key)
        .and_then(|v| v.as_long_string())
        .map(|s| s.to_string())
}

fn as_count(value: &AMQPValue) -> Option<u64> {
    match value {
        AMQPValue::LongLongInt(n) => u64::try_from(*n).ok(),
        AMQPValue::LongInt(n) => u64::try_from(*n).ok(),
        AMQPValue::LongUInt(n) => Some(u64::from(*n)),
        AMQPValue::ShortInt(n) => u64::try_from(*n).ok(),
        _ => None,
    }
}
