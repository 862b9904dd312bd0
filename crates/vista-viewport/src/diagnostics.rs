// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diagnostics sink: structured trace/info/warn/error events.
//!
//! Sinks never return values and never fail; emitting a diagnostic has no
//! effect on control flow. Trace and info are gated by a verbosity flag,
//! warnings and errors are always emitted.

use std::fmt;

use vista_app_core::prefs::ViewportPrefs;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Fine-grained progress (load percentages, discarded results).
    Trace,
    /// Lifecycle milestones.
    Info,
    /// Degraded but recovered.
    Warn,
    /// Failure; the viewport falls back to placeholder content.
    Error,
}

impl Severity {
    /// Whether this severity is suppressed when verbose output is off.
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Trace | Self::Info)
    }
}

/// One structured parameter attached to a diagnostic.
#[derive(Clone, Copy)]
pub struct Field<'a> {
    /// Parameter name.
    pub key: &'static str,
    /// Parameter value.
    pub value: &'a dyn fmt::Display,
}

impl<'a> Field<'a> {
    /// Build a field.
    pub fn new(key: &'static str, value: &'a dyn fmt::Display) -> Self {
        Self { key, value }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Renders fields as `key=value` pairs separated by spaces.
pub struct FieldList<'a, 'b>(pub &'a [Field<'b>]);

impl fmt::Display for FieldList<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", field.key, field.value)?;
        }
        Ok(())
    }
}

/// Receiver of diagnostic events.
pub trait DiagnosticsSink {
    /// Emit one event.
    fn emit(&self, severity: Severity, message: &str, fields: &[Field<'_>]);

    /// Emit at [`Severity::Trace`].
    fn trace(&self, message: &str, fields: &[Field<'_>]) {
        self.emit(Severity::Trace, message, fields);
    }

    /// Emit at [`Severity::Info`].
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.emit(Severity::Info, message, fields);
    }

    /// Emit at [`Severity::Warn`].
    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        self.emit(Severity::Warn, message, fields);
    }

    /// Emit at [`Severity::Error`].
    fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.emit(Severity::Error, message, fields);
    }
}

/// Forwards diagnostics to `tracing` under the `vista` target.
#[derive(Clone, Copy, Debug)]
pub struct TracingSink {
    verbose: bool,
}

impl TracingSink {
    /// Sink emitting trace/info only when `verbose`.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Sink configured from `log_enable`.
    pub fn from_prefs(prefs: &ViewportPrefs) -> Self {
        Self::new(prefs.log_enable)
    }

    /// Whether trace/info are emitted.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl DiagnosticsSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str, fields: &[Field<'_>]) {
        if severity.is_verbose() && !self.verbose {
            return;
        }
        let fields = FieldList(fields);
        match severity {
            Severity::Trace => tracing::trace!(target: "vista", fields = %fields, "{message}"),
            Severity::Info => tracing::info!(target: "vista", fields = %fields, "{message}"),
            Severity::Warn => tracing::warn!(target: "vista", fields = %fields, "{message}"),
            Severity::Error => tracing::error!(target: "vista", fields = %fields, "{message}"),
        }
    }
}
