use crate::types::ParsedLogRecord;
use chrono::Utc;
use log::debug;

/// Tracks the newest timestamp seen so far and the cutoff set by "clear".
///
/// Lives as long as the log view instance; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct WatermarkTracker {
    cutoff_ms: Option<i64>,
    high_water_ms: Option<i64>,
}

impl WatermarkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn cutoff_ms(&self) -> Option<i64> {
        self.cutoff_ms
    }

    #[cfg(test)]
    pub fn high_water_ms(&self) -> Option<i64> {
        self.high_water_ms
    }

    /// Advances the high-water mark from the classified batch, then drops
    /// records at or before the cutoff. Order is preserved.
    ///
    /// Records with an invalid timestamp are never suppressed and never
    /// advance the mark.
    pub fn apply(&mut self, records: Vec<ParsedLogRecord>) -> Vec<ParsedLogRecord> {
        self.observe(&records);

        let Some(cutoff) = self.cutoff_ms else {
            return records;
        };

        let before = records.len();
        let visible: Vec<_> = records
            .into_iter()
            .filter(|record| record.created_at_ms.map_or(true, |ms| ms > cutoff))
            .collect();

        if visible.len() < before {
            debug!("Suppressed {} records at or before cutoff {}", before - visible.len(), cutoff);
        }

        visible
    }

    /// Raises the high-water mark to the newest valid timestamp in `records`.
    pub fn observe(&mut self, records: &[ParsedLogRecord]) {
        let latest = records.iter().filter_map(|record| record.created_at_ms).max();

        if let Some(latest) = latest {
            self.high_water_ms = Some(self.high_water_ms.map_or(latest, |hw| hw.max(latest)));
        }
    }

    /// Hides everything seen so far. Falls back to the wall clock when no
    /// valid timestamp has been observed yet.
    pub fn clear(&mut self) -> i64 {
        self.clear_at(Utc::now().timestamp_millis())
    }

    pub fn clear_at(&mut self, now_ms: i64) -> i64 {
        let cutoff = self.high_water_ms.unwrap_or(now_ms);
        self.cutoff_ms = Some(cutoff);
        cutoff
    }
}
