//! Named numeric traces recorded by the color stages.

use std::fmt;

/// One named value recorded while a stage ran.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugEntry {
    pub name: &'static str,
    pub value: f64,
}

/// Append-only trace of intermediate values, kept beside the return value
/// of a stage so callers can inspect how it reached its result.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    entries: Vec<DebugEntry>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, value: impl Into<f64>) {
        let value = value.into();
        tracing::debug!(entry = name, value, "trace");
        self.entries.push(DebugEntry { name, value });
    }

    pub fn entries(&self) -> &[DebugEntry] {
        &self.entries
    }

    /// Last value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| e.value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DebugLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}: {}", entry.name, entry.value)?;
        }
        Ok(())
    }
}
