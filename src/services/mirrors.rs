use camino::Utf8Path;
use regex::{NoExpand, Regex};
use std::fs;
use std::io;
use std::time::Duration;

use crate::messages::Msg;
use crate::models::RunStatistics;
use crate::services::runner::{CommandExecutor, CommandRunner, ExecError, Invocation};

/// Built-in distfile mirrors, in preference order.
pub const DEFAULT_DISTFILE_MIRRORS: [&str; 3] = [
    "https://ftp.halifax.rwth-aachen.de/gentoo/",
    "https://mirror.init7.net/gentoo/",
    "http://linux.rz.ruhr-uni-bochum.de/download/gentoo-mirror/",
];

/// Built-in primary rsync mirror for the repository tree.
pub const DEFAULT_SYNC_MIRROR: &str = "rsync://rsync.de.gentoo.org/gentoo-portage";

pub const MIRRORSELECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Exit status mirrorselect reports when the operator aborts the dialog.
const MIRRORSELECT_CANCELLED: i32 = 130;

/// Mirrors chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSet {
    /// `GENTOO_MIRRORS` entries for source downloads. Never contains empty strings.
    pub distfiles: Vec<String>,
    /// `sync-uri` for the repository tree.
    pub sync: String,
}

impl Default for MirrorSet {
    fn default() -> Self {
        Self {
            distfiles: DEFAULT_DISTFILE_MIRRORS.iter().map(|m| m.to_string()).collect(),
            sync: DEFAULT_SYNC_MIRROR.to_string(),
        }
    }
}

/// Decides which mirrors to use and writes them into `make.conf` and
/// `repos.conf`.
///
/// Nothing here is fatal: every read or write problem is a warning and the
/// run carries on with whatever configuration portage already has.
pub struct MirrorResolver<'a, E> {
    runner: &'a CommandRunner<E>,
    make_conf: &'a Utf8Path,
    repos_conf: &'a Utf8Path,
    custom: &'a [String],
    /// Offer mirrorselect's dialog before falling back to the defaults.
    interactive: bool,
    distfile_pattern: Regex,
    distfile_value_pattern: Regex,
    sync_pattern: Regex,
}

impl<'a, E: CommandExecutor> MirrorResolver<'a, E> {
    pub fn new(
        runner: &'a CommandRunner<E>,
        make_conf: &'a Utf8Path,
        repos_conf: &'a Utf8Path,
        custom: &'a [String],
        interactive: bool,
    ) -> Self {
        Self {
            runner,
            make_conf,
            repos_conf,
            custom,
            interactive,
            // Assignments only count at the start of an uncommented line.
            distfile_pattern: Regex::new(r#"(?m)^[ \t]*GENTOO_MIRRORS[ \t]*=[ \t]*"[^"]*""#)
                .expect("Invalid GENTOO_MIRRORS regex"),
            distfile_value_pattern: Regex::new(r#"(?m)^[ \t]*GENTOO_MIRRORS[ \t]*=[ \t]*"([^"]*)""#)
                .expect("Invalid GENTOO_MIRRORS value regex"),
            sync_pattern: Regex::new(r"(?m)^[ \t]*sync-uri[ \t]*=[ \t]*([^\n]*)")
                .expect("Invalid sync-uri regex"),
        }
    }

    /// Pick the mirrors for this run.
    ///
    /// Interactive selection wins when enabled and successful, then explicit
    /// custom mirrors, then the built-in list.
    pub async fn select_mirrors(&self, stats: &mut RunStatistics) -> MirrorSet {
        let mut set = MirrorSet::default();

        let custom: Vec<String> = self
            .custom
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !custom.is_empty() {
            set.distfiles = custom;
            return set;
        }

        if !self.interactive {
            return set;
        }

        let console = self.runner.console();
        console.info(&Msg::MirrorselectOpening);
        console.info(&Msg::MirrorselectHint);

        let distfiles = Invocation::new("mirrorselect", ["-i", "-o"])
            .selection()
            .with_timeout(MIRRORSELECT_TIMEOUT);
        if let Some(output) = self.run_mirrorselect(stats, distfiles).await {
            let chosen = self.parse_gentoo_mirrors(&output);
            if !chosen.is_empty() {
                let shown = chosen.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
                console.success(&Msg::MirrorsSelected { mirrors: &shown });
                console.success(&Msg::UsingSelectedMirrors);
                set.distfiles = chosen;
            }
        }

        let rsync = Invocation::new("mirrorselect", ["-i", "-r", "-o"])
            .selection()
            .with_timeout(MIRRORSELECT_TIMEOUT);
        let chosen_sync = self
            .run_mirrorselect(stats, rsync)
            .await
            .and_then(|output| self.parse_sync_uri(&output));
        if let Some(uri) = chosen_sync {
            console.success(&Msg::MirrorsSelected { mirrors: &uri });
            set.sync = uri;
        }

        set
    }

    async fn run_mirrorselect(&self, stats: &mut RunStatistics, invocation: Invocation) -> Option<String> {
        let console = self.runner.console();
        match self.runner.probe(invocation).await {
            Ok(out) if out.success() => Some(out.output),
            Ok(out) if out.status == Some(MIRRORSELECT_CANCELLED) => {
                console.info(&Msg::MirrorselectCancelled);
                None
            }
            Ok(out) => {
                let detail = format!("exit code {}", out.code_label());
                console.warning(stats, &Msg::MirrorselectFailed { detail: &detail });
                None
            }
            Err(ExecError::Timeout { .. }) => {
                console.warning(stats, &Msg::MirrorselectFailed { detail: "timeout" });
                None
            }
            Err(e) => {
                let detail = e.to_string();
                console.warning(stats, &Msg::MirrorselectFailed { detail: &detail });
                None
            }
        }
    }

    /// Point `GENTOO_MIRRORS` in make.conf at `mirrors`. Returns true when the
    /// file was rewritten.
    pub fn configure_distfile_mirrors(&self, stats: &mut RunStatistics, mirrors: &[String]) -> bool {
        let mirrors: Vec<&str> = mirrors
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();
        if mirrors.is_empty() {
            return false;
        }
        self.update_file(stats, self.make_conf, |content| {
            self.rewrite_distfile_mirrors(content, &mirrors)
        })
    }

    /// Point `sync-uri` in repos.conf at `uri`. Returns true when the file
    /// was rewritten.
    pub fn configure_sync_mirror(&self, stats: &mut RunStatistics, uri: &str) -> bool {
        let written = self.update_file(stats, self.repos_conf, |content| self.rewrite_sync_uri(content, uri));
        if written {
            tracing::info!("Primary rsync mirror: {}", uri);
        }
        written
    }

    /// Fresh read of `GENTOO_MIRRORS` from make.conf.
    pub fn read_configured_mirrors(&self, stats: &mut RunStatistics) -> Vec<String> {
        match fs::read_to_string(self.make_conf) {
            Ok(content) => {
                if !self.distfile_value_pattern.is_match(&content) {
                    self.runner.console().warning(
                        stats,
                        &Msg::MirrorKeyMissing {
                            key: "GENTOO_MIRRORS",
                            path: self.make_conf.as_str(),
                        },
                    );
                }
                self.parse_gentoo_mirrors(&content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist", self.make_conf);
                Vec::new()
            }
            Err(e) => {
                let error = e.to_string();
                self.runner.console().warning(
                    stats,
                    &Msg::MirrorReadFailed {
                        path: self.make_conf.as_str(),
                        error: &error,
                    },
                );
                Vec::new()
            }
        }
    }

    /// Replace the `GENTOO_MIRRORS` assignment, or append one.
    pub fn rewrite_distfile_mirrors(&self, content: &str, mirrors: &[&str]) -> String {
        let assignment = format!("GENTOO_MIRRORS=\"{}\"", mirrors.join(" "));
        if self.distfile_pattern.is_match(content) {
            self.distfile_pattern
                .replace_all(content, NoExpand(&assignment))
                .into_owned()
        } else {
            append_block(content, &format!("# Gentoo mirrors (distfiles)\n{assignment}"), true)
        }
    }

    /// Replace the `sync-uri` line, or append one.
    pub fn rewrite_sync_uri(&self, content: &str, uri: &str) -> String {
        let assignment = format!("sync-uri = {uri}");
        if self.sync_pattern.is_match(content) {
            self.sync_pattern
                .replace_all(content, NoExpand(&assignment))
                .into_owned()
        } else {
            append_block(content, &assignment, false)
        }
    }

    /// Mirror URLs from a `GENTOO_MIRRORS="..."` assignment. Backslash line
    /// continuations are tolerated.
    pub fn parse_gentoo_mirrors(&self, content: &str) -> Vec<String> {
        self.distfile_value_pattern
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|value| {
                value
                    .as_str()
                    .replace('\\', " ")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parse_sync_uri(&self, content: &str) -> Option<String> {
        self.sync_pattern
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|uri| !uri.is_empty())
    }

    fn update_file<F>(&self, stats: &mut RunStatistics, path: &Utf8Path, rewrite: F) -> bool
    where
        F: FnOnce(&str) -> String,
    {
        let console = self.runner.console();

        let current = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                console.warning(stats, &Msg::MirrorFileMissing { path: path.as_str() });
                return false;
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(
                    stats,
                    &Msg::MirrorReadFailed {
                        path: path.as_str(),
                        error: &error,
                    },
                );
                return false;
            }
        };

        let updated = rewrite(&current);
        if updated == current {
            tracing::info!("{}", console.t(&Msg::MirrorFileUnchanged { path: path.as_str() }));
            return false;
        }

        if self.runner.is_dry_run() {
            console.warning(stats, &Msg::MirrorWriteSkippedDryRun { path: path.as_str() });
            return false;
        }

        match fs::write(path, updated) {
            Ok(()) => {
                console.success(&Msg::MirrorFileUpdated { path: path.as_str() });
                true
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(
                    stats,
                    &Msg::MirrorWriteFailed {
                        path: path.as_str(),
                        error: &error,
                    },
                );
                false
            }
        }
    }
}

fn append_block(content: &str, block: &str, blank_line: bool) -> String {
    let trimmed = content.trim_end();
    if trimmed.is_empty() {
        format!("{block}\n")
    } else if blank_line {
        format!("{trimmed}\n\n{block}\n")
    } else {
        format!("{trimmed}\n{block}\n")
    }
}
