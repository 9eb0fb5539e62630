use camino::Utf8PathBuf;
use chrono::{DateTime, Local};
use std::future::Future;
use std::time::{Duration, Instant};

use super::{PipelineError, StagePlan};
use crate::console::Console;
use crate::messages::Msg;
use crate::models::{RunConfig, RunMode, RunOptions, RunStatistics, SystemPaths};
use crate::services::classifier::OutputClassifier;
use crate::services::notify::Notifier;
use crate::services::runner::{CommandExecutor, CommandRunner};
use crate::services::system::SystemProbe;
use crate::summary::{self, SummaryDocument};

/// Outcome of one run, handed back to `main` for the exit status.
#[derive(Debug)]
pub struct RunReport {
    pub success: bool,
    pub error: Option<PipelineError>,
    pub duration: Duration,
    /// `None` when the summary could not be written.
    pub summary_path: Option<Utf8PathBuf>,
    pub stats: RunStatistics,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, PipelineError::exit_code)
    }
}

/// Owns everything a run needs and sequences it.
///
/// Statistics live on the stack of [`Updater::run`]; stages borrow them
/// mutably one at a time, and the summary reads them once at the end.
pub struct Updater<E, P> {
    pub(super) runner: CommandRunner<E>,
    pub(super) probe: P,
    pub(super) config: RunConfig,
    pub(super) options: RunOptions,
    pub(super) paths: SystemPaths,
    pub(super) classifier: OutputClassifier,
    pub(super) started_at: DateTime<Local>,
    startup_warnings: Vec<String>,
}

impl<E: CommandExecutor, P: SystemProbe> Updater<E, P> {
    pub fn new(
        executor: E,
        probe: P,
        config: RunConfig,
        options: RunOptions,
        paths: SystemPaths,
        console: Console,
    ) -> Self {
        Self {
            runner: CommandRunner::new(executor, console, options.dry_run),
            probe,
            config,
            options,
            paths,
            classifier: OutputClassifier::new(),
            started_at: Local::now(),
            startup_warnings: Vec::new(),
        }
    }

    /// Pin the run's timestamp, which names the log, summary and backup.
    pub fn with_start_time(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Problems found before the run started (such as an unusable config
    /// file), recorded as warnings of the run.
    pub fn with_startup_warnings<I: IntoIterator<Item = String>>(mut self, warnings: I) -> Self {
        self.startup_warnings.extend(warnings);
        self
    }

    pub fn executor(&self) -> &E {
        self.runner.executor()
    }

    pub fn log_file(&self) -> Utf8PathBuf {
        self.paths.log_file(self.started_at)
    }

    pub fn summary_file(&self) -> Utf8PathBuf {
        self.paths.summary_file(self.started_at)
    }

    pub(super) fn console(&self) -> &Console {
        self.runner.console()
    }

    /// Run `mode` to completion or until `interrupt` resolves.
    ///
    /// Whatever happens, the summary is rendered, saved and sent exactly once
    /// before this returns.
    pub async fn run<F>(&self, mode: RunMode, interrupt: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut stats = RunStatistics::with_limits(
            self.config.retry_count,
            self.config.timeout,
            self.config.max_packages,
        );
        tracing::info!(?mode, dry_run = self.options.dry_run, "Starting run");
        for warning in &self.startup_warnings {
            self.console().warning(&mut stats, &Msg::ConfigLoadFailed { error: warning });
        }

        let outcome = {
            let work = self.execute(mode, &mut stats);
            tokio::select! {
                result = work => result,
                _ = interrupt => Err(PipelineError::Interrupted),
            }
        };

        if let Err(PipelineError::Interrupted) = outcome {
            self.console().error(&mut stats, &Msg::Interrupted);
        }
        if let Err(e) = &outcome {
            tracing::error!("Run aborted: {}", e);
        }

        let success = outcome.is_ok();
        let duration = started.elapsed();
        let summary_path = self.finalize(&mut stats, mode, success, duration).await;

        RunReport {
            success,
            error: outcome.err(),
            duration,
            summary_path,
            stats,
        }
    }

    async fn execute(&self, mode: RunMode, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        let plan = StagePlan::new(mode, &self.options, &self.config);
        self.preflight(mode, &plan, stats).await?;

        match mode {
            RunMode::ModulesOnly => {
                self.run_modules_only(stats).await;
                Ok(())
            }
            _ => self.run_stages(&plan, stats).await,
        }
    }

    /// Summary, artifact and notifications. Called from exactly one place.
    async fn finalize(
        &self,
        stats: &mut RunStatistics,
        mode: RunMode,
        success: bool,
        duration: Duration,
    ) -> Option<Utf8PathBuf> {
        let console = self.console();
        let log_file = self.log_file();

        console.section(&Msg::StageSummary);
        for line in summary::render(console.language(), stats, duration, &log_file) {
            console.raw(&line);
        }

        let summary_file = self.summary_file();
        let document = SummaryDocument::new(stats, Local::now(), duration, success);
        let payload = document.to_json();
        let saved = document.save(&summary_file);

        let summary_path = match saved {
            Ok(()) => {
                console.info(&Msg::SummarySaved {
                    path: summary_file.as_str(),
                });
                Some(summary_file)
            }
            Err(e) => {
                let error = format!("{e:#}");
                console.warning(stats, &Msg::SummarySaveFailed { error: &error });
                None
            }
        };

        let notifier = Notifier::new(&self.runner);
        let formatted = summary::format_duration(duration);
        if self.config.enable_notifications && !self.config.notification_email.is_empty() {
            notifier
                .send_mail(
                    stats,
                    &self.config.notification_email,
                    success,
                    &formatted,
                    log_file.as_str(),
                )
                .await;
        }
        if let Some(url) = &self.options.webhook {
            match payload {
                Ok(body) => notifier.post_webhook(stats, url, &body).await,
                Err(e) => {
                    let error = format!("{e:#}");
                    console.warning(stats, &Msg::NotificationFailed { error: &error });
                }
            }
        }

        if success && mode == RunMode::Full {
            console.info(&Msg::CheckManually);
        }
        console.info(&Msg::TotalDuration { duration: &formatted });

        summary_path
    }
}
