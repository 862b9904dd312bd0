// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diagnostics to the browser console.

use vista_viewport::{DiagnosticsSink, Field, FieldList, Severity};
use wasm_bindgen::JsValue;

/// Writes diagnostics with `console.debug/info/warn/error`.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    /// Sink emitting trace/info only when `verbose`.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// `message key=value ...`, or just the message without fields.
pub(crate) fn format_line(message: &str, fields: &[Field<'_>]) -> String {
    if fields.is_empty() {
        message.to_owned()
    } else {
        format!("{message} {}", FieldList(fields))
    }
}

impl DiagnosticsSink for ConsoleSink {
    fn emit(&self, severity: Severity, message: &str, fields: &[Field<'_>]) {
        if severity.is_verbose() && !self.verbose {
            return;
        }
        let line = JsValue::from_str(&format_line(message, fields));
        match severity {
            Severity::Trace => web_sys::console::debug_1(&line),
            Severity::Info => web_sys::console::info_1(&line),
            Severity::Warn => web_sys::console::warn_1(&line),
            Severity::Error => web_sys::console::error_1(&line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_append_fields() {
        let url = "/models/a.glb";
        assert_eq!(format_line("50% loaded", &[]), "50% loaded");
        assert_eq!(
            format_line("50% loaded", &[Field::new("url", &url)]),
            "50% loaded url=/models/a.glb"
        );
    }
}
