use crate::types::{parse_timestamp_ms, LogRecord, ParsedLogRecord};

/// Server name shown for messages without a `[Server]` prefix.
pub const UNKNOWN_SERVER: &str = "-";

/// Splits `"[Server] body"` into `("Server", "body")`.
///
/// The tag ends at the first `"] "` on the first line, where either `\n` or
/// `\r` ends a line. Anything that does not match falls through to
/// `(UNKNOWN_SERVER, message)`.
pub fn split_server_tag(message: &str) -> (&str, &str) {
    message
        .strip_prefix('[')
        .and_then(|rest| {
            let first_line = rest.split(['\n', '\r']).next().unwrap_or(rest);
            let close = first_line.find("] ")?;
            Some((&rest[..close], &rest[close + 2..]))
        })
        .unwrap_or((UNKNOWN_SERVER, message))
}

pub fn parse_record(record: LogRecord) -> ParsedLogRecord {
    let (server_name, body) = split_server_tag(&record.message);
    let server_name = server_name.to_string();
    let body = body.to_string();

    ParsedLogRecord {
        created_at_ms: parse_timestamp_ms(&record.created_at),
        created_at: record.created_at,
        level: record.level,
        server_name,
        body,
    }
}
