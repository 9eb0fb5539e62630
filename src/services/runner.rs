use std::cell::RefCell;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::console::Console;
use crate::messages::Msg;
use crate::models::RunStatistics;

/// How a child process's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Echo each stdout/stderr line as it arrives and keep a copy.
    Streamed,
    /// Collect stdout and stderr silently until exit.
    Captured,
    /// Hand the terminal to the child; nothing is collected.
    Interactive,
    /// Terminal UI on stdin/stderr, result read back from stdout.
    Selection,
}

/// One external command, fully described before it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Overrides merged over the inherited environment.
    pub env: Vec<(String, String)>,
    pub mode: OutputMode,
    pub stdin: Option<String>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            mode: OutputMode::Streamed,
            stdin: None,
            timeout: None,
        }
    }

    pub fn captured(mut self) -> Self {
        self.mode = OutputMode::Captured;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.mode = OutputMode::Interactive;
        self
    }

    pub fn selection(mut self) -> Self {
        self.mode = OutputMode::Selection;
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_stdin(mut self, body: impl Into<String>) -> Self {
        self.stdin = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// The command line as the operator would type it.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished child process left behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn code_label(&self) -> String {
        self.status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

/// Spawn-level failures, distinct from a non-zero exit.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("{program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Seam between the pipeline and real processes.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError>;
}

/// Runs invocations as real child processes via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError> {
        let started = Instant::now();
        let program = invocation.program.clone();

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true);

        let stdin = if invocation.stdin.is_some() {
            Stdio::piped()
        } else if invocation.mode == OutputMode::Captured {
            Stdio::null()
        } else {
            Stdio::inherit()
        };
        cmd.stdin(stdin);

        match invocation.mode {
            OutputMode::Streamed | OutputMode::Captured => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Interactive => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Selection => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
            }
        }

        let child = cmd.spawn().map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ExecError::NotFound(program.clone()),
            _ => ExecError::Io {
                program: program.clone(),
                source,
            },
        })?;

        let waiting = wait_for(child, invocation);
        let result = match invocation.timeout {
            Some(limit) => timeout(limit, waiting).await.map_err(|_| {
                tracing::warn!("{} timed out after {:?}", program, limit);
                ExecError::Timeout {
                    program: program.clone(),
                    after: limit,
                }
            })?,
            None => waiting.await,
        };
        let output = result.map_err(|source| ExecError::Io {
            program: program.clone(),
            source,
        })?;

        tracing::debug!(
            "{} finished in {:.2}s with status {}",
            program,
            started.elapsed().as_secs_f32(),
            output.code_label()
        );

        Ok(output)
    }
}

async fn wait_for(mut child: Child, invocation: &Invocation) -> io::Result<ProcessOutput> {
    if let (Some(body), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
        stdin.write_all(body.as_bytes()).await?;
        // Dropping the handle closes the pipe so the child sees EOF.
    }

    if invocation.mode != OutputMode::Streamed {
        let finished = child.wait_with_output().await?;
        let mut output = String::from_utf8_lossy(&finished.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&finished.stderr));
        return Ok(ProcessOutput {
            status: finished.status.code(),
            output,
        });
    }

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(io::Error::other("child output pipes were not captured"));
    };
    let output = RefCell::new(String::new());
    tokio::try_join!(
        echo_lines(stdout, &output, Echo::Stdout),
        echo_lines(stderr, &output, Echo::Stderr)
    )?;

    let status = child.wait().await?;
    Ok(ProcessOutput {
        status: status.code(),
        output: output.into_inner(),
    })
}

#[derive(Clone, Copy)]
enum Echo {
    Stdout,
    Stderr,
}

/// Echo `stream` line by line and append each line to `output`.
///
/// Build logs are not guaranteed to be UTF-8; invalid bytes are replaced
/// rather than ending the read, which would kill the child.
async fn echo_lines<R>(stream: R, output: &RefCell<String>, echo: Echo) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.strip_suffix('\n').unwrap_or(&text);
        match echo {
            Echo::Stdout => println!("{line}"),
            Echo::Stderr => eprintln!("{line}"),
        }
        let mut collected = output.borrow_mut();
        collected.push_str(line);
        collected.push('\n');
    }
}

/// Outcome handed back to a stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
}

/// A command that failed where the caller did not allow failure.
///
/// Returned up the stack instead of exiting the process; the driver decides
/// what a failure means for the run.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{description} failed (exit code: {code})")]
    Failed {
        description: String,
        code: String,
        output: String,
    },

    #[error("command not found: {0}")]
    NotFound(String),

    #[error("{description}: {source}")]
    Exec {
        description: String,
        #[source]
        source: ExecError,
    },
}

impl CommandError {
    /// Output collected before the failure, if any.
    pub fn output(&self) -> &str {
        match self {
            CommandError::Failed { output, .. } => output,
            _ => "",
        }
    }
}

/// Executes commands on behalf of the pipeline stages.
///
/// Applies dry-run suppression, announces each command, and maps exit status
/// to success. Failures are printed and recorded in the run statistics.
pub struct CommandRunner<E> {
    executor: E,
    console: Console,
    dry_run: bool,
}

impl<E: CommandExecutor> CommandRunner<E> {
    pub fn new(executor: E, console: Console, dry_run: bool) -> Self {
        Self {
            executor,
            console,
            dry_run,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a command whose failure the caller handles itself.
    pub async fn run_allow_fail(
        &self,
        stats: &mut RunStatistics,
        invocation: Invocation,
        description: &str,
    ) -> CommandResult {
        allow_fail(self.run(stats, invocation, description).await)
    }

    /// Run a command that must succeed. In dry-run mode nothing is spawned.
    pub async fn run(
        &self,
        stats: &mut RunStatistics,
        invocation: Invocation,
        description: &str,
    ) -> Result<CommandResult, CommandError> {
        self.console.info(&Msg::Running { description });
        let command = invocation.display();
        tracing::debug!("Executing: {}", command);

        if self.dry_run {
            self.console.warning(stats, &Msg::DryRun { command: &command });
            return Ok(CommandResult {
                success: true,
                output: String::new(),
            });
        }

        match self.executor.execute(&invocation).await {
            Ok(finished) if finished.success() => {
                self.console.success(&Msg::CommandOk { description });
                Ok(CommandResult {
                    success: true,
                    output: finished.output,
                })
            }
            Ok(finished) => {
                let code = finished.code_label();
                self.console.error(
                    stats,
                    &Msg::CommandFailed {
                        description,
                        code: &code,
                    },
                );
                Err(CommandError::Failed {
                    description: description.to_string(),
                    code,
                    output: finished.output,
                })
            }
            Err(ExecError::NotFound(program)) => {
                self.console.error(stats, &Msg::CommandNotFound { program: &program });
                Err(CommandError::NotFound(program))
            }
            Err(source) => {
                let error = source.to_string();
                self.console.error(
                    stats,
                    &Msg::CommandError {
                        description,
                        error: &error,
                    },
                );
                Err(CommandError::Exec {
                    description: description.to_string(),
                    source,
                })
            }
        }
    }

    /// Run a read-only query. Executes even in dry-run mode and prints nothing.
    pub async fn probe(&self, invocation: Invocation) -> Result<ProcessOutput, ExecError> {
        tracing::debug!("Probing: {}", invocation.display());
        self.executor.execute(&invocation).await
    }
}

fn allow_fail(result: Result<CommandResult, CommandError>) -> CommandResult {
    match result {
        Ok(result) => result,
        Err(CommandError::Failed { output, .. }) => CommandResult {
            success: false,
            output,
        },
        Err(err) => CommandResult {
            success: false,
            output: err.to_string(),
        },
    }
}
