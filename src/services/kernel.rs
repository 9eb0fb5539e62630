use crate::messages::Msg;
use crate::models::RunStatistics;
use crate::services::emerge;
use crate::services::runner::{CommandExecutor, CommandRunner};

/// Reduce `eselect kernel show` output to the selected kernel's name.
///
/// Strips `*` markers, then takes the text after the last `:` when there is
/// one, otherwise the last whitespace-separated token.
///
/// `"Current: linux-6.12.63-gentoo-dist"` becomes `"linux-6.12.63-gentoo-dist"`.
pub fn normalize_selected_kernel(raw: &str) -> String {
    let cleaned = raw.replace('*', "");
    let cleaned = cleaned.trim();

    match cleaned.rsplit_once(':') {
        Some((_, tail)) => tail.trim().to_string(),
        None => cleaned
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Whether out-of-tree modules must be rebuilt for the selected kernel.
///
/// Containment, not equality: the selected name usually carries a prefix
/// and suffix (`linux-`, `-dist`) that `uname -r` lacks. An empty selection
/// never triggers a rebuild.
pub fn needs_rebuild_for(running: &str, selected: &str) -> bool {
    !selected.is_empty() && !selected.contains(running)
}

/// Compares the running kernel with the one `eselect` has selected.
pub struct KernelModuleGuard<'a, E> {
    runner: &'a CommandRunner<E>,
}

impl<'a, E: CommandExecutor> KernelModuleGuard<'a, E> {
    pub fn new(runner: &'a CommandRunner<E>) -> Self {
        Self { runner }
    }

    /// Query both kernels and decide. Any query failure is a warning and
    /// means "no rebuild".
    pub async fn needs_rebuild(&self, stats: &mut RunStatistics) -> bool {
        let console = self.runner.console();
        console.info(&Msg::CheckingModules);

        let running = match self.runner.probe(emerge::running_kernel()).await {
            Ok(out) if out.success() => out.output.trim().to_string(),
            Ok(out) => {
                let error = format!("uname -r exited with {}", out.code_label());
                console.warning(stats, &Msg::ModulesCheckFailed { error: &error });
                return false;
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::ModulesCheckFailed { error: &error });
                return false;
            }
        };

        let selected = match self.runner.probe(emerge::kernel_show()).await {
            Ok(out) if out.success() => normalize_selected_kernel(&out.output),
            Ok(out) => {
                let error = format!("eselect kernel show exited with {}", out.code_label());
                console.warning(stats, &Msg::ModulesCheckFailed { error: &error });
                return false;
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::ModulesCheckFailed { error: &error });
                return false;
            }
        };

        tracing::debug!("Running kernel {:?}, selected kernel {:?}", running, selected);

        if needs_rebuild_for(&running, &selected) {
            console.warning(
                stats,
                &Msg::ModulesStale {
                    running: &running,
                    installed: &selected,
                },
            );
            console.info(&Msg::ModulesAfterUpdate);
            true
        } else {
            console.success(&Msg::ModulesCurrentKernel);
            false
        }
    }
}
