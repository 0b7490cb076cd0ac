use crate::classifier::{Category, FilterCriteria, ServerScope};
use crate::parser::{parse_record, UNKNOWN_SERVER};
use crate::render::RenderSink;
use crate::types::{LogRecord, ParsedLogRecord};
use crate::watermark::WatermarkTracker;
use log::debug;
use std::collections::BTreeSet;

/// State owned by one active log view: filters, watermark, server
/// directory and the table it renders into.
pub struct LogView<S: RenderSink> {
    criteria: FilterCriteria,
    watermark: WatermarkTracker,
    configured_servers: BTreeSet<String>,
    observed_servers: BTreeSet<String>,
    issued_cycles: u64,
    rendered_cycle: u64,
    sink: S,
}

impl<S: RenderSink> LogView<S> {
    pub fn new(criteria: FilterCriteria, sink: S) -> Self {
        Self {
            criteria,
            watermark: WatermarkTracker::new(),
            configured_servers: BTreeSet::new(),
            observed_servers: BTreeSet::new(),
            issued_cycles: 0,
            rendered_cycle: 0,
            sink,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    #[cfg(test)]
    pub fn watermark(&self) -> &WatermarkTracker {
        &self.watermark
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn set_category(&mut self, category: Category) {
        self.criteria.category = category;
    }

    pub fn set_server_scope(&mut self, scope: ServerScope) {
        self.criteria.server_scope = scope;
    }

    pub fn set_configured_servers<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.configured_servers = names.into_iter().collect();
    }

    /// `All` followed by every known server name, sorted.
    pub fn server_scope_options(&self) -> Vec<ServerScope> {
        let names: BTreeSet<&String> = self
            .configured_servers
            .iter()
            .chain(self.observed_servers.iter())
            .collect();

        std::iter::once(ServerScope::All)
            .chain(names.into_iter().map(|name| ServerScope::Server(name.clone())))
            .collect()
    }

    /// Runs parse, classify and cutoff suppression over one fetched batch.
    pub fn process(&mut self, records: Vec<LogRecord>) -> Vec<ParsedLogRecord> {
        let parsed: Vec<ParsedLogRecord> = records.into_iter().map(parse_record).collect();

        for record in &parsed {
            if record.server_name != UNKNOWN_SERVER && !self.observed_servers.contains(&record.server_name) {
                self.observed_servers.insert(record.server_name.clone());
            }
        }

        let classified: Vec<ParsedLogRecord> = parsed
            .into_iter()
            .filter(|record| self.criteria.accepts(record))
            .collect();

        self.watermark.apply(classified)
    }

    /// Numbers a poll cycle at dispatch time.
    pub fn begin_cycle(&mut self) -> u64 {
        self.issued_cycles += 1;
        self.issued_cycles
    }

    /// Processes the response of `cycle` and renders it, unless a newer
    /// cycle has already been rendered. Returns whether it rendered.
    pub fn complete_cycle(&mut self, cycle: u64, records: Vec<LogRecord>) -> bool {
        let rows = self.process(records);

        if cycle < self.rendered_cycle {
            debug!(
                "Dropping stale response of poll #{} (already showing #{})",
                cycle, self.rendered_cycle
            );
            return false;
        }

        self.rendered_cycle = cycle;
        self.sink.render(&rows);
        true
    }

    /// Hides everything seen so far and empties the table.
    pub fn clear(&mut self) -> i64 {
        self.sink.clear();
        self.watermark.clear()
    }
}
