// src/utils/diag.rs
use serde::Serialize;

/// One recoverable data-quality finding: a disclosed value was absent,
/// a cross-check failed numerically, a date range was implausible, etc.
/// The document itself is still processable; `context` names the
/// questionnaire section the finding belongs to (e.g. "C6.1 Scope 1").
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub context: String,
    pub message: String,
}

/// Collector for the recoverable tier of the error taxonomy. Extractors
/// record findings here and carry on with a null/sentinel value; the
/// caller gets the full list back instead of scraping a log stream.
/// Every finding is also emitted through `tracing::warn!` as it lands.
#[derive(Debug, Default, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, context: impl Into<String>, message: impl Into<String>) {
        let warning = Warning {
            context: context.into(),
            message: message.into(),
        };
        tracing::warn!("{}: {}", warning.context, warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Moves all findings out, leaving the collector empty. Used by the
    /// batch loop to bank one document's findings before the next run.
    pub fn drain(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}
