use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fmt;

/// Severity reported by the server. Only `INFO` and `ERROR` carry meaning
/// for classification; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Level {
    Info,
    Error,
    Other(String),
}

impl From<String> for Level {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "INFO" => Level::Info,
            "ERROR" => Level::Error,
            _ => Level::Other(raw),
        }
    }
}

impl From<&str> for Level {
    fn from(raw: &str) -> Self {
        Level::from(raw.to_string())
    }
}

impl Level {
    pub fn as_str(&self) -> &str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single log line as returned by the dashboard's log endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    /// ISO 8601 timestamp; older servers omit it entirely
    #[serde(rename = "CreatedAt", alias = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "Level", alias = "level")]
    pub level: Level,
    /// Raw message, usually `[ServerName] body`
    #[serde(rename = "Message", alias = "message", default)]
    pub message: String,
}

#[cfg(test)]
impl LogRecord {
    pub fn new(created_at: impl Into<String>, level: impl Into<Level>, message: impl Into<String>) -> Self {
        Self {
            created_at: created_at.into(),
            level: level.into(),
            message: message.into(),
        }
    }
}

/// A log record split into its source server and message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogRecord {
    pub created_at: String,
    /// `None` when `created_at` is not a valid instant
    pub created_at_ms: Option<i64>,
    pub level: Level,
    pub server_name: String,
    pub body: String,
}

/// Entry of the dashboard's `/servers` listing. Only the name is used here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}

/// Parses a server timestamp into epoch milliseconds.
///
/// RFC 3339 is tried first; naive date-times without an offset are taken as UTC.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
