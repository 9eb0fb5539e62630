//! Severity-tagged operator output.
//!
//! Every line printed here is also emitted as a `tracing` event, so the
//! per-run log file mirrors what the operator saw. Warnings and errors are
//! additionally appended to the run's [`RunStatistics`].

use owo_colors::OwoColorize;

use crate::messages::{Language, Msg};
use crate::models::RunStatistics;

#[derive(Debug, Clone, Copy)]
pub struct Console {
    lang: Language,
    color: bool,
}

impl Console {
    pub fn new(lang: Language, color: bool) -> Self {
        Self { lang, color }
    }

    /// Uncoloured console, used by tests and non-TTY runs.
    pub fn plain(lang: Language) -> Self {
        Self::new(lang, false)
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// Render a catalog message in this console's language.
    pub fn t(&self, msg: &Msg<'_>) -> String {
        msg.text(self.lang)
    }

    pub fn banner(&self, version: &str) {
        let title = format!("GENTOO SYSTEM UPDATER v{version}");
        let rule = "=".repeat(70);
        tracing::info!("{}", title);
        if self.color {
            println!("\n{}\n{:^70}\n{}\n", rule.cyan().bold(), title.cyan().bold(), rule.cyan().bold());
        } else {
            println!("\n{rule}\n{title:^70}\n{rule}\n");
        }
    }

    pub fn section(&self, msg: &Msg<'_>) {
        let text = self.t(msg);
        let rule = "=".repeat(70);
        tracing::info!("=== {} ===", text);
        if self.color {
            println!("\n{}\n{}\n{}", rule.blue().bold(), text.blue().bold(), rule.blue().bold());
        } else {
            println!("\n{rule}\n{text}\n{rule}");
        }
    }

    pub fn info(&self, msg: &Msg<'_>) {
        let text = self.t(msg);
        tracing::info!("{}", text);
        if self.color {
            println!("{} {}", "[INFO]".cyan(), text);
        } else {
            println!("[INFO] {text}");
        }
    }

    pub fn success(&self, msg: &Msg<'_>) {
        let text = self.t(msg);
        tracing::info!("{}", text);
        if self.color {
            println!("{} {}", "[ OK ]".green(), text.green());
        } else {
            println!("[ OK ] {text}");
        }
    }

    /// Print and record a warning.
    pub fn warning(&self, stats: &mut RunStatistics, msg: &Msg<'_>) {
        let text = self.t(msg);
        tracing::warn!("{}", text);
        if self.color {
            println!("{} {}", "[WARN]".yellow(), text.yellow());
        } else {
            println!("[WARN] {text}");
        }
        stats.record_warning(text);
    }

    /// Print and record an error.
    pub fn error(&self, stats: &mut RunStatistics, msg: &Msg<'_>) {
        let text = self.t(msg);
        tracing::error!("{}", text);
        if self.color {
            eprintln!("{} {}", "[FAIL]".red().bold(), text.red());
        } else {
            eprintln!("[FAIL] {text}");
        }
        stats.record_error(text);
    }

    /// Print a warning-styled line without recording it.
    pub fn notice(&self, msg: &Msg<'_>) {
        let text = self.t(msg);
        tracing::info!("{}", text);
        if self.color {
            println!("{} {}", "[SKIP]".yellow(), text.yellow());
        } else {
            println!("[SKIP] {text}");
        }
    }

    /// Echo free text, such as captured tool output, verbatim.
    pub fn raw(&self, text: &str) {
        tracing::debug!("{}", text.trim_end());
        println!("{}", text.trim_end());
    }

    /// Echo an indented list item.
    pub fn item(&self, text: &str) {
        tracing::info!("  - {}", text);
        println!("  - {text}");
    }
}
