//! End-of-run summary: console rendering and the JSON artifact.

use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::time::Duration;

use crate::messages::{Language, Msg};
use crate::models::RunStatistics;

const SHOWN_UPDATED: usize = 10;
const SHOWN_REMOVED: usize = 5;
const SHOWN_WARNINGS: usize = 5;

/// `H:MM:SS`, hours unbounded.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Human-readable summary body, one entry per console line.
pub fn render(lang: Language, stats: &RunStatistics, duration: Duration, log_file: &Utf8Path) -> Vec<String> {
    let mut lines = Vec::new();
    let duration = format_duration(duration);
    lines.push(Msg::SummaryDuration { duration: &duration }.text(lang));
    lines.push(String::new());

    if !stats.gentoo_mirrors().is_empty() {
        lines.push(Msg::SummaryMirrors.text(lang));
        lines.extend(stats.gentoo_mirrors().iter().map(|m| format!("  * {m}")));
        if let Some(primary) = stats.used_mirror() {
            lines.push(Msg::PrimaryMirror { mirror: primary }.text(lang));
        }
        lines.push(String::new());
    }

    push_list(
        &mut lines,
        lang,
        Msg::SummaryUpdated { count: stats.packages_updated().len() },
        stats.packages_updated(),
        SHOWN_UPDATED,
    );
    push_list(
        &mut lines,
        lang,
        Msg::SummaryRemoved { count: stats.packages_removed().len() },
        stats.packages_removed(),
        SHOWN_REMOVED,
    );

    if stats.kernel_updated() {
        lines.push(Msg::SummaryKernelUpdated.text(lang));
        lines.push(String::new());
    }
    if stats.modules_rebuilt() {
        lines.push(Msg::SummaryModulesRebuilt.text(lang));
        lines.push(String::new());
    }

    if !stats.warnings().is_empty() {
        lines.push(Msg::SummaryWarnings { count: stats.warnings().len() }.text(lang));
        lines.extend(
            stats
                .warnings()
                .iter()
                .take(SHOWN_WARNINGS)
                .map(|w| format!("  ! {w}")),
        );
        lines.push(String::new());
    }

    // Errors are never truncated.
    if !stats.errors().is_empty() {
        lines.push(Msg::SummaryErrors { count: stats.errors().len() }.text(lang));
        lines.extend(stats.errors().iter().map(|e| format!("  x {e}")));
        lines.push(String::new());
    }

    lines.push(Msg::SummaryLogFile { path: log_file.as_str() }.text(lang));
    lines
}

fn push_list(lines: &mut Vec<String>, lang: Language, header: Msg<'_>, items: &[String], shown: usize) {
    if items.is_empty() {
        return;
    }
    lines.push(header.text(lang));
    lines.extend(items.iter().take(shown).map(|p| format!("  * {p}")));
    if items.len() > shown {
        lines.push(Msg::SummaryMore { count: items.len() - shown }.text(lang));
    }
    lines.push(String::new());
}

/// Structured summary persisted next to the log file.
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub timestamp: String,
    pub duration: String,
    pub success: bool,
    pub mirrors: &'a [String],
    pub primary_mirror: Option<&'a str>,
    pub stats: &'a RunStatistics,
}

impl<'a> SummaryDocument<'a> {
    pub fn new(stats: &'a RunStatistics, finished: DateTime<Local>, duration: Duration, success: bool) -> Self {
        Self {
            timestamp: finished.to_rfc3339(),
            duration: format_duration(duration),
            success,
            mirrors: stats.gentoo_mirrors(),
            primary_mirror: stats.used_mirror(),
            stats,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run summary")
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create summary directory: {}", parent))?;
        }
        fs::write(path, self.to_json()?).with_context(|| format!("Failed to write summary: {}", path))?;
        tracing::info!("Summary saved: {}", path);
        Ok(())
    }
}
