//! Command lines for the portage tools the pipeline drives.
//!
//! Builders only: nothing here spawns a process. Keeping every verb and flag
//! combination in one place lets the stages and the tests agree on exactly
//! what would run.

use crate::models::EtcUpdateMode;
use crate::services::runner::Invocation;

/// Flags inserted right after `emerge` for the one-shot autounmask pass.
pub const AUTOUNMASK_FLAGS: [&str; 4] = [
    "--autounmask=y",
    "--autounmask-write",
    "--autounmask-continue",
    "--ask=n",
];

pub fn sync() -> Invocation {
    Invocation::new("emerge", ["--sync"])
}

pub fn eix_update() -> Invocation {
    Invocation::new("eix-update", Vec::<String>::new())
}

/// Pretend run shared by the blocker check and the availability probe.
pub fn world_pretend() -> Invocation {
    Invocation::new("emerge", ["--update", "--deep", "--newuse", "--pretend", "@world"]).captured()
}

/// Pretend run including build dependencies, scanned for kernel sources.
pub fn world_pretend_with_bdeps() -> Invocation {
    Invocation::new(
        "emerge",
        ["--update", "--deep", "--newuse", "--with-bdeps=y", "--pretend", "@world"],
    )
    .captured()
}

/// The real world upgrade.
pub fn world_update(jobs: u32, load_average: f64) -> Invocation {
    Invocation::new(
        "emerge",
        [
            "--update".to_string(),
            "--deep".to_string(),
            "--newuse".to_string(),
            "--with-bdeps=y".to_string(),
            format!("--jobs={jobs}"),
            format!("--load-average={load_average}"),
            "@world".to_string(),
        ],
    )
}

/// `base` with the autounmask flags spliced in after the program name.
pub fn with_autounmask(base: &Invocation) -> Invocation {
    let mut invocation = base.clone();
    invocation.args = AUTOUNMASK_FLAGS
        .iter()
        .map(|flag| flag.to_string())
        .chain(base.args.iter().cloned())
        .collect();
    invocation
}

pub fn module_rebuild_pretend() -> Invocation {
    Invocation::new("emerge", ["--pretend", "@module-rebuild"]).captured()
}

pub fn module_rebuild() -> Invocation {
    Invocation::new("emerge", ["@module-rebuild"])
}

pub fn depclean_pretend() -> Invocation {
    Invocation::new("emerge", ["--depclean", "--pretend"]).captured()
}

pub fn depclean() -> Invocation {
    Invocation::new("emerge", ["--depclean", "--ask=n"])
}

pub fn revdep_rebuild() -> Invocation {
    Invocation::new("revdep-rebuild", Vec::<String>::new())
}

pub fn kernel_show() -> Invocation {
    Invocation::new("eselect", ["kernel", "show"]).captured()
}

pub fn kernel_list() -> Invocation {
    Invocation::new("eselect", ["kernel", "list"]).captured()
}

pub fn running_kernel() -> Invocation {
    Invocation::new("uname", ["-r"]).captured()
}

/// Tool used to merge `._cfg` files after autounmask wrote them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeTool {
    EtcUpdate,
    DispatchConf,
}

impl MergeTool {
    pub fn program(self) -> &'static str {
        match self {
            MergeTool::EtcUpdate => "etc-update",
            MergeTool::DispatchConf => "dispatch-conf",
        }
    }

    /// Non-interactive merge-all for this tool.
    pub fn merge_all(self) -> Invocation {
        match self {
            MergeTool::EtcUpdate => Invocation::new("etc-update", ["-a"]),
            MergeTool::DispatchConf => Invocation::new("dispatch-conf", ["--replace-unmodified"]),
        }
    }
}

/// Reconciliation command for pending `._cfg` files, `None` for skip mode.
pub fn config_merge(mode: EtcUpdateMode) -> Option<Invocation> {
    match mode {
        EtcUpdateMode::Skip => None,
        EtcUpdateMode::Auto => Some(MergeTool::EtcUpdate.merge_all()),
        EtcUpdateMode::Interactive => {
            Some(Invocation::new("etc-update", Vec::<String>::new()).interactive())
        }
    }
}
