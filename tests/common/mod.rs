//! Shared fakes for the pipeline integration tests.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use gentoo_updater::models::{RunConfig, RunOptions, SystemPaths};
use gentoo_updater::services::{CommandExecutor, ExecError, Invocation, ProcessOutput, SystemProbe};
use gentoo_updater::{Console, Language, Updater};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

pub type Responder = Box<dyn Fn(&Invocation) -> Result<ProcessOutput, ExecError>>;

/// Records every invocation and answers from a closure. Never spawns.
pub struct ScriptedExecutor {
    calls: RefCell<Vec<Invocation>>,
    responder: Responder,
    /// Command line that never finishes; reaching it fires `reached`.
    hang_on: Option<String>,
    reached: Rc<Notify>,
}

impl ScriptedExecutor {
    pub fn new(responder: impl Fn(&Invocation) -> Result<ProcessOutput, ExecError> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            responder: Box::new(responder),
            hang_on: None,
            reached: Rc::new(Notify::new()),
        }
    }

    pub fn hanging_on(mut self, command: &str) -> Self {
        self.hang_on = Some(command.to_string());
        self
    }

    pub fn reached(&self) -> Rc<Notify> {
        Rc::clone(&self.reached)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::display).collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }

    pub fn count_containing(&self, fragment: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(fragment)).count()
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput, ExecError> {
        self.calls.borrow_mut().push(invocation.clone());
        if self.hang_on.as_deref() == Some(invocation.display().as_str()) {
            self.reached.notify_one();
            std::future::pending::<()>().await;
        }
        (self.responder)(invocation)
    }
}

pub fn ok(output: &str) -> Result<ProcessOutput, ExecError> {
    Ok(ProcessOutput {
        status: Some(0),
        output: output.to_string(),
    })
}

pub fn fail(code: i32, output: &str) -> Result<ProcessOutput, ExecError> {
    Ok(ProcessOutput {
        status: Some(code),
        output: output.to_string(),
    })
}

/// Host facts under test control.
pub struct FakeProbe {
    pub root: bool,
    /// `Err` makes the disk check itself fail.
    pub free_bytes: Result<u64, String>,
    pub tools: Vec<&'static str>,
    pub cpus: usize,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            root: true,
            free_bytes: Ok(100 * 1024 * 1024 * 1024),
            tools: vec!["eix-update", "revdep-rebuild", "etc-update"],
            cpus: 4,
        }
    }
}

impl SystemProbe for FakeProbe {
    fn is_root(&self) -> bool {
        self.root
    }

    fn free_space_bytes(&self, _path: &Utf8Path) -> io::Result<u64> {
        self.free_bytes.clone().map_err(io::Error::other)
    }

    fn has_tool(&self, program: &str) -> bool {
        self.tools.contains(&program)
    }

    fn cpu_count(&self) -> usize {
        self.cpus
    }
}

pub const MAKE_CONF: &str = "COMMON_FLAGS=\"-O2 -pipe\"\nGENTOO_MIRRORS=\"https://old.example/gentoo/\"\n";
pub const REPOS_CONF: &str = "[gentoo]\nlocation = /var/db/repos/gentoo\nsync-type = rsync\nsync-uri = rsync://old.example/gentoo-portage\n";

/// A throwaway filesystem laid out like a Gentoo host.
pub struct Sandbox {
    _temp: TempDir,
    pub root: Utf8PathBuf,
    pub paths: SystemPaths,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let paths = SystemPaths::rooted_at(&root);

        fs::create_dir_all(paths.make_conf.parent().unwrap()).unwrap();
        fs::create_dir_all(paths.repos_conf.parent().unwrap()).unwrap();
        fs::create_dir_all(&paths.disk_check).unwrap();
        fs::write(&paths.make_conf, MAKE_CONF).unwrap();
        fs::write(&paths.repos_conf, REPOS_CONF).unwrap();

        Self {
            _temp: temp,
            root,
            paths,
        }
    }

    pub fn config(&self) -> RunConfig {
        RunConfig {
            backup_dir: self.root.join("var/backups/gentoo-updater").into_string(),
            ..RunConfig::default()
        }
    }

    pub fn add_config_update(&self, relative: &str) {
        let path = self.paths.etc_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "proposed\n").unwrap();
    }

    /// Every JSON summary in the log directory.
    pub fn summaries(&self) -> Vec<Utf8PathBuf> {
        let Ok(entries) = fs::read_dir(&self.paths.log_dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|e| Utf8PathBuf::from_path_buf(e.path()).ok())
            .filter(|p| p.extension() == Some("json"))
            .collect()
    }
}

pub fn options() -> RunOptions {
    RunOptions {
        skip_internet_check: true,
        retry_delay: Duration::ZERO,
        ..RunOptions::default()
    }
}

pub fn updater(
    executor: ScriptedExecutor,
    probe: FakeProbe,
    config: RunConfig,
    options: RunOptions,
    sandbox: &Sandbox,
) -> Updater<ScriptedExecutor, FakeProbe> {
    Updater::new(
        executor,
        probe,
        config,
        options,
        sandbox.paths.clone(),
        Console::plain(Language::En),
    )
}

/// Canned emerge output for a host with two pending updates.
pub const PRETEND_TWO_UPDATES: &str = "\
These are the packages that would be merged, in order:

[ebuild     U  ] dev-lang/python-3.12.1 [3.11.8]
[ebuild     U  ] app-editors/vim-9.1.0 [9.0.2]

Total: 2 packages (2 upgrades), Size of downloads: 24,512 KiB
";

pub const PRETEND_NOTHING: &str = "\nTotal: 0 packages, Size of downloads: 0 KiB\n";

/// Answers every read-only query a full run makes with a healthy host.
pub fn healthy_host(invocation: &Invocation) -> Result<ProcessOutput, ExecError> {
    match invocation.display().as_str() {
        "emerge --update --deep --newuse --pretend @world" => ok(PRETEND_TWO_UPDATES),
        "emerge --update --deep --newuse --with-bdeps=y --pretend @world" => ok(PRETEND_TWO_UPDATES),
        "uname -r" => ok("6.12.63-gentoo\n"),
        "eselect kernel show" => ok("Current kernel symlink:\n  linux-6.12.63-gentoo-dist\n"),
        "emerge --pretend @module-rebuild" => ok(PRETEND_NOTHING),
        "emerge --depclean --pretend" => ok("\nAll selected packages: =dev-libs/old-1.0 =sys-apps/gone-2.1\n"),
        "eselect kernel list" => ok("Available kernel symlink targets:\n  [1]   linux-6.12.63-gentoo-dist *\n"),
        _ => ok(""),
    }
}
