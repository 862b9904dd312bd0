// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diagnostics sink that keeps events in memory.

use std::cell::RefCell;

use vista_viewport::{DiagnosticsSink, Field, Severity};

/// One captured diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Severity.
    pub severity: Severity,
    /// Message.
    pub message: String,
    /// Rendered `key=value` parameters.
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Value of the field named `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Records diagnostics, applying the same trace/info gate as
/// [`vista_viewport::TracingSink`].
#[derive(Debug)]
pub struct RecordingSink {
    verbose: bool,
    records: RefCell<Vec<Record>>,
}

impl RecordingSink {
    /// Sink keeping trace/info only when `verbose`.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            records: RefCell::new(Vec::new()),
        }
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    /// Records at `severity`.
    pub fn at(&self, severity: Severity) -> Vec<Record> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.severity == severity)
            .cloned()
            .collect()
    }

    /// Error records.
    pub fn errors(&self) -> Vec<Record> {
        self.at(Severity::Error)
    }

    /// Whether any record at `severity` contains `needle` in its message.
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| r.severity == severity && r.message.contains(needle))
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, severity: Severity, message: &str, fields: &[Field<'_>]) {
        if severity.is_verbose() && !self.verbose {
            return;
        }
        self.records.borrow_mut().push(Record {
            severity,
            message: message.to_owned(),
            fields: fields
                .iter()
                .map(|f| (f.key.to_owned(), f.value.to_string()))
                .collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_sink_keeps_only_warn_and_error() {
        let sink = RecordingSink::new(false);
        sink.trace("50% loaded", &[]);
        sink.info("mounted", &[]);
        sink.warn("busy", &[]);
        sink.error("boom", &[Field::new("url", &"a.glb")]);
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(sink.errors()[0].field("url"), Some("a.glb"));
    }
}
