//! Run summary
//!
//! Counters accumulate across every language in a run. The rendered
//! summary has a fixed line order so callers (CLI, scripts) can rely on it.

use std::fmt;

use colored::Colorize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub strings_translated: usize,
    pub languages_processed: usize,
    pub warnings: Vec<String>,
}

impl ChangeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Fold one language's results into the run total
    pub fn absorb(&mut self, other: ChangeReport) {
        self.nodes_created += other.nodes_created;
        self.nodes_updated += other.nodes_updated;
        self.strings_translated += other.strings_translated;
        self.languages_processed += other.languages_processed;
        self.warnings.extend(other.warnings);
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Did the run change the graph at all?
    pub fn has_changes(&self) -> bool {
        self.nodes_created > 0 || self.nodes_updated > 0
    }

    /// Plain `label: value` lines in fixed order
    pub fn lines(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Nodes created", self.nodes_created),
            ("Nodes updated", self.nodes_updated),
            ("Strings translated", self.strings_translated),
            ("Languages processed", self.languages_processed),
            ("Warnings", self.warning_count()),
        ]
    }

    /// Colored summary for terminals, followed by each warning
    pub fn render(&self, dry_run: bool) -> String {
        let mode = if dry_run {
            "DRY RUN (nothing persisted)".yellow().bold()
        } else {
            "WRITE".green().bold()
        };
        let mut out = format!("{} {}\n", "Localization summary:".bold(), mode);
        for (label, value) in self.lines() {
            out.push_str(&format!("  {:<20} {}\n", format!("{}:", label), value));
        }
        for warning in &self.warnings {
            out.push_str(&format!("  {} {}\n", "⚠".yellow(), warning));
        }
        out
    }
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.lines() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}
