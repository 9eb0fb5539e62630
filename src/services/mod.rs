//! Collaborators the pipeline drives.
//!
//! Everything that spawns a process goes through [`CommandRunner`], so dry-run
//! suppression and error recording happen in one place. Everything that reads
//! emerge output goes through [`OutputClassifier`].
//!
//! - [`runner`]: process execution, dry-run handling, the executor seam
//! - [`classifier`]: pattern matching over emerge output
//! - [`emerge`]: the fixed command lines
//! - [`mirrors`]: mirror selection and `make.conf`/`repos.conf` rewriting
//! - [`kernel`]: running-versus-selected kernel comparison
//! - [`backup`]: configuration snapshots and pruning
//! - [`system`]: host facts (root, free space, tools, connectivity)
//! - [`notify`]: mail and webhook delivery

pub mod backup;
pub mod classifier;
pub mod emerge;
pub mod kernel;
pub mod mirrors;
pub mod notify;
pub mod runner;
pub mod system;

pub use backup::BackupManager;
pub use classifier::OutputClassifier;
pub use kernel::KernelModuleGuard;
pub use mirrors::{MirrorResolver, MirrorSet};
pub use notify::Notifier;
pub use runner::{
    CommandError, CommandExecutor, CommandResult, CommandRunner, ExecError, Invocation, OutputMode,
    ProcessOutput, SystemExecutor,
};
pub use system::{HostSystem, SystemProbe};
