use crate::types::{Level, ParsedLogRecord};
use chrono::{Local, TimeZone};
use log::error;
use std::io::Write;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Where the log table ends up. Each `render` replaces the previous table.
pub trait RenderSink: Send {
    fn render(&mut self, rows: &[ParsedLogRecord]);
    fn clear(&mut self);
}

/// Plain-text table written to any `io::Write`, normally stdout.
pub struct TableSink<W: Write + Send> {
    out: W,
    color: bool,
}

impl<W: Write + Send> TableSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_table(&mut self, rows: &[ParsedLogRecord]) -> std::io::Result<()> {
        writeln!(self.out, "{:-<100}", "")?;
        writeln!(self.out, "{:<19}  {:<16}  {:<8}  MESSAGE", "TIME", "SERVER", "LEVEL")?;
        for row in rows {
            let line = format_row(row);
            match (self.color, &row.level) {
                (true, Level::Error) => writeln!(self.out, "{}{}{}", RED, line, RESET)?,
                (true, Level::Other(level)) if level == "WARN" => {
                    writeln!(self.out, "{}{}{}", YELLOW, line, RESET)?
                }
                _ => writeln!(self.out, "{}", line)?,
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> RenderSink for TableSink<W> {
    fn render(&mut self, rows: &[ParsedLogRecord]) {
        if let Err(e) = self.write_table(rows) {
            error!("Failed to render log table: {}", e);
        }
    }

    fn clear(&mut self) {
        if let Err(e) = writeln!(self.out, "{:-<100}\n(cleared)", "").and_then(|_| self.out.flush()) {
            error!("Failed to clear log table: {}", e);
        }
    }
}

/// Local wall-clock time, the raw server text when it did not parse, or `-`.
pub fn format_time(created_at_ms: Option<i64>, raw: &str) -> String {
    match created_at_ms.and_then(|ms| Local.timestamp_millis_opt(ms).single()) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None if !raw.trim().is_empty() => raw.trim().to_string(),
        None => "-".to_string(),
    }
}

pub fn format_row(row: &ParsedLogRecord) -> String {
    format!(
        "{:<19}  {:<16}  {:<8}  {}",
        format_time(row.created_at_ms, &row.created_at),
        row.server_name,
        row.level,
        row.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_record;
    use crate::types::LogRecord;

    fn rendered(sink: TableSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn renders_one_line_per_row() {
        let mut sink = TableSink::new(Vec::new(), false);
        sink.render(&[
            parse_record(LogRecord::new("2024-05-01T10:00:00Z", "INFO", "[Srv1] /videos/1/stream.mp4")),
            parse_record(LogRecord::new("bogus", "ERROR", "untagged failure")),
        ]);
        let text = rendered(sink);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("Srv1"));
        assert!(lines[2].ends_with("/videos/1/stream.mp4"));
        assert!(lines[3].starts_with("bogus "));
        assert!(lines[3].contains("ERROR"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn colors_error_rows_when_enabled() {
        let mut sink = TableSink::new(Vec::new(), true);
        sink.render(&[parse_record(LogRecord::new("", "ERROR", "[A] boom"))]);
        let text = rendered(sink);
        assert!(text.contains(&format!("{}-", RED)));
    }

    #[test]
    fn invalid_time_renders_dash() {
        assert_eq!(format_time(None, ""), "-");
        assert_eq!(format_time(None, "soon"), "soon");
        assert_eq!(format_time(Some(0), "1970-01-01T00:00:00Z").len(), 19);
    }
}
