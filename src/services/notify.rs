use std::time::Duration;

use crate::messages::Msg;
use crate::models::RunStatistics;
use crate::services::runner::{CommandExecutor, CommandRunner, Invocation};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Mail invocation; the body is fed on stdin.
pub fn mail(subject: &str, recipient: &str, body: &str) -> Invocation {
    Invocation::new("mail", ["-s", subject, recipient])
        .captured()
        .with_stdin(body)
}

/// POST `payload` as JSON to `url` through curl.
pub fn webhook(url: &str, payload: &str) -> Invocation {
    Invocation::new(
        "curl",
        [
            "--fail",
            "--silent",
            "--show-error",
            "-X",
            "POST",
            "-H",
            "Content-Type: application/json",
            "--data-binary",
            "@-",
            url,
        ],
    )
    .captured()
    .with_stdin(payload)
    .with_timeout(WEBHOOK_TIMEOUT)
}

/// End-of-run notifications. Delivery problems are warnings only.
pub struct Notifier<'a, E> {
    runner: &'a CommandRunner<E>,
}

impl<'a, E: CommandExecutor> Notifier<'a, E> {
    pub fn new(runner: &'a CommandRunner<E>) -> Self {
        Self { runner }
    }

    pub async fn send_mail(
        &self,
        stats: &mut RunStatistics,
        recipient: &str,
        success: bool,
        duration: &str,
        log_file: &str,
    ) {
        let console = self.runner.console();
        let subject = console.t(&Msg::MailSubject { success });
        let body = console.t(&Msg::MailBody {
            success,
            duration,
            updated: stats.packages_updated().len(),
            errors: stats.errors().len(),
            log: log_file,
        });

        self.deliver(stats, mail(&subject, recipient, &body), recipient).await;
    }

    pub async fn post_webhook(&self, stats: &mut RunStatistics, url: &str, payload: &str) {
        self.deliver(stats, webhook(url, payload), url).await;
    }

    async fn deliver(&self, stats: &mut RunStatistics, invocation: Invocation, target: &str) {
        let console = self.runner.console();
        match self.runner.executor().execute(&invocation).await {
            Ok(out) if out.success() => console.info(&Msg::NotificationSent { target }),
            Ok(out) => {
                let error = format!("{} exited with {}: {}", invocation.program, out.code_label(), out.output.trim());
                console.warning(stats, &Msg::NotificationFailed { error: &error });
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::NotificationFailed { error: &error });
            }
        }
    }
}
