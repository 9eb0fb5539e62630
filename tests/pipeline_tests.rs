mod common;

use common::*;
use gentoo_updater::models::{EtcUpdateMode, RunMode, RunOptions};
use gentoo_updater::services::emerge;
use gentoo_updater::{PipelineError, RunReport};
use std::cell::RefCell;
use std::fs;
use std::future;
use std::rc::Rc;

const SYNC: &str = "emerge --sync";
const WORLD_UPDATE: &str = "emerge --update --deep --newuse --with-bdeps=y --jobs=4 --load-average=4 @world";

async fn run_to_end(
    executor: ScriptedExecutor,
    probe: FakeProbe,
    options: RunOptions,
    sandbox: &Sandbox,
    mode: RunMode,
) -> (RunReport, Vec<String>) {
    let updater = updater(executor, probe, sandbox.config(), options, sandbox);
    let report = updater.run(mode, future::pending()).await;
    let calls = updater.executor().calls();
    (report, calls)
}

#[tokio::test]
async fn test_healthy_full_run_touches_every_stage() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::Full).await;

    assert!(report.success, "errors: {:?}", report.stats.errors());
    assert_eq!(report.exit_code(), 0);
    for expected in [
        SYNC,
        "eix-update",
        WORLD_UPDATE,
        "emerge --depclean --ask=n",
        "revdep-rebuild",
        "eselect kernel list",
    ] {
        assert!(calls.iter().any(|c| c == expected), "missing {expected}: {calls:?}");
    }
    assert_eq!(
        report.stats.packages_updated(),
        ["dev-lang/python-3.12.1".to_string(), "app-editors/vim-9.1.0".to_string()]
    );
    assert_eq!(
        report.stats.packages_removed(),
        ["=dev-libs/old-1.0".to_string(), "=sys-apps/gone-2.1".to_string()]
    );
    assert!(
        report
            .stats
            .warnings()
            .iter()
            .any(|w| w.trim() == "- dev-lang/python")
    );
    assert_eq!(sandbox.summaries().len(), 1);
    assert_eq!(report.summary_path.as_ref(), sandbox.summaries().first());
}

#[tokio::test]
async fn test_mirrors_are_written_and_reread() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);

    let (report, _) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::SyncOnly).await;

    let make_conf = fs::read_to_string(&sandbox.paths.make_conf).unwrap();
    assert!(make_conf.contains("COMMON_FLAGS=\"-O2 -pipe\""));
    assert!(!make_conf.contains("old.example"));
    assert_eq!(report.stats.gentoo_mirrors().len(), 3);
    assert_eq!(report.stats.used_mirror(), Some(report.stats.gentoo_mirrors()[0].as_str()));

    let repos_conf = fs::read_to_string(&sandbox.paths.repos_conf).unwrap();
    assert!(repos_conf.contains("sync-uri = rsync://rsync.de.gentoo.org/gentoo-portage"));
}

#[tokio::test]
async fn test_sync_retries_once_with_quarantine_cleanup_then_aborts() {
    let sandbox = Sandbox::new();
    let quarantine = sandbox.paths.quarantine.clone();
    fs::create_dir_all(&quarantine).unwrap();

    // Each failing sync leaves a fresh quarantine behind.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_by_sync = Rc::clone(&seen);
    let executor = ScriptedExecutor::new(move |invocation| {
        if invocation.display() == SYNC {
            seen_by_sync.borrow_mut().push(quarantine.exists());
            fs::create_dir_all(&quarantine).unwrap();
            return fail(1, "!!! Manifest verification failed");
        }
        healthy_host(invocation)
    });

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::Full).await;

    assert_eq!(calls.iter().filter(|c| *c == SYNC).count(), 2);
    assert_eq!(*seen.borrow(), vec![false, false]);
    assert!(sandbox.paths.quarantine.exists(), "no cleanup after the final attempt");
    assert_eq!(report.error, Some(PipelineError::SyncFailed { attempts: 2 }));
    assert_eq!(report.exit_code(), 1);
    assert!(!calls.iter().any(|c| c.contains("@world")));
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_dry_run_spawns_only_read_only_queries() {
    let sandbox = Sandbox::new();
    sandbox.add_config_update("conf.d/._cfg0000_hostname");
    let executor = ScriptedExecutor::new(healthy_host);
    let options = RunOptions {
        dry_run: true,
        ..options()
    };
    let probe = FakeProbe {
        root: false,
        ..FakeProbe::default()
    };

    let (report, calls) = run_to_end(executor, probe, options, &sandbox, RunMode::Full).await;

    let read_only = [
        "emerge --update --deep --newuse --pretend @world",
        "emerge --update --deep --newuse --with-bdeps=y --pretend @world",
        "uname -r",
        "eselect kernel show",
        "eselect kernel list",
    ];
    for call in &calls {
        assert!(read_only.contains(&call.as_str()), "mutating command spawned: {call}");
    }

    let warnings = report.stats.warnings();
    for command in [
        SYNC,
        "eix-update",
        WORLD_UPDATE,
        "emerge --depclean --pretend",
        "emerge --depclean --ask=n",
        "revdep-rebuild",
        "etc-update",
    ] {
        let expected = format!("DRY-RUN: Would execute: {command}");
        assert!(warnings.contains(&expected), "missing {expected:?} in {warnings:?}");
    }

    assert_eq!(fs::read_to_string(&sandbox.paths.make_conf).unwrap(), MAKE_CONF);
    assert_eq!(fs::read_to_string(&sandbox.paths.repos_conf).unwrap(), REPOS_CONF);
    assert!(report.success);
    assert!(!report.stats.modules_rebuilt());
    assert!(report.stats.packages_removed().is_empty());
}

#[tokio::test]
async fn test_autounmask_recovery_is_attempted_once() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| {
        let command = invocation.display();
        if command.contains("--autounmask-write") {
            return fail(1, "!!! write failed");
        }
        if command == WORLD_UPDATE {
            return fail(
                1,
                "The following USE changes are necessary to proceed:\n\
                 (see \"package.use\" in the portage(5) man page for more details)\n",
            );
        }
        healthy_host(invocation)
    });

    let updater = updater(executor, FakeProbe::default(), sandbox.config(), options(), &sandbox);
    let report = updater.run(RunMode::Full, future::pending()).await;
    let executor = updater.executor();

    assert_eq!(executor.count_containing("--autounmask-write"), 1);
    assert_eq!(executor.count(WORLD_UPDATE), 1);
    assert_eq!(executor.count("etc-update -a"), 0);
    assert_eq!(report.error, Some(PipelineError::UpdateFailed));
    assert!(report.stats.errors().contains(&"System update failed".to_string()));
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_autounmask_recovery_retries_update_after_merge() {
    let sandbox = Sandbox::new();
    let attempts = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&attempts);
    let executor = ScriptedExecutor::new(move |invocation| {
        if invocation.display() == WORLD_UPDATE {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 1 {
                return fail(1, "Use --autounmask-write to write changes to config files");
            }
        }
        healthy_host(invocation)
    });

    let updater = updater(executor, FakeProbe::default(), sandbox.config(), options(), &sandbox);
    let report = updater.run(RunMode::UpdateOnly, future::pending()).await;

    assert!(report.success, "errors: {:?}", report.stats.errors());
    assert_eq!(*attempts.borrow(), 2);
    assert_eq!(updater.executor().count("etc-update -a"), 1);
    let autounmask = emerge::with_autounmask(&emerge::world_update(4, 4.0)).display();
    assert_eq!(updater.executor().count(&autounmask), 1);
}

#[tokio::test]
async fn test_autounmask_disabled_keeps_original_failure() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| {
        if invocation.display() == WORLD_UPDATE {
            return fail(1, "Use --autounmask-write to write changes to config files");
        }
        healthy_host(invocation)
    });
    let config = gentoo_updater::RunConfig {
        auto_autounmask: false,
        ..sandbox.config()
    };

    let updater = updater(executor, FakeProbe::default(), config, options(), &sandbox);
    let report = updater.run(RunMode::UpdateOnly, future::pending()).await;

    assert_eq!(updater.executor().count_containing("--autounmask-write"), 0);
    assert_eq!(report.error, Some(PipelineError::UpdateFailed));
}

#[tokio::test]
async fn test_interrupt_still_produces_one_summary() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host).hanging_on(WORLD_UPDATE);
    let reached = executor.reached();

    let updater = updater(executor, FakeProbe::default(), sandbox.config(), options(), &sandbox);
    let report = updater
        .run(RunMode::Full, async move { reached.notified().await })
        .await;

    assert_eq!(report.error, Some(PipelineError::Interrupted));
    assert_eq!(report.exit_code(), 130);
    assert!(report.stats.errors().contains(&"Update interrupted by user".to_string()));
    // Contributions recorded before the interrupt survive.
    assert_eq!(report.stats.packages_updated().len(), 2);
    assert_eq!(report.stats.gentoo_mirrors().len(), 3);
    assert_eq!(sandbox.summaries().len(), 1);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sandbox.summaries()[0]).unwrap()).unwrap();
    assert_eq!(summary["success"], false);
}

#[tokio::test]
async fn test_low_disk_space_aborts_before_any_command() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);
    let probe = FakeProbe {
        free_bytes: Ok(1024 * 1024 * 1024),
        ..FakeProbe::default()
    };

    let (report, calls) = run_to_end(executor, probe, options(), &sandbox, RunMode::Full).await;

    assert!(calls.is_empty(), "unexpected commands: {calls:?}");
    assert!(matches!(
        report.error,
        Some(PipelineError::InsufficientDiskSpace { required_gb: 5, .. })
    ));
    assert_eq!(fs::read_to_string(&sandbox.paths.make_conf).unwrap(), MAKE_CONF);
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_disk_check_error_proceeds_with_warning() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);
    let probe = FakeProbe {
        free_bytes: Err("statvfs failed".to_string()),
        ..FakeProbe::default()
    };

    let (report, calls) = run_to_end(executor, probe, options(), &sandbox, RunMode::SyncOnly).await;

    assert!(report.success);
    assert!(calls.iter().any(|c| c == SYNC));
    assert!(
        report
            .stats
            .warnings()
            .iter()
            .any(|w| w.starts_with("Could not check disk space") && w.contains("statvfs failed"))
    );
}

#[tokio::test]
async fn test_missing_root_aborts() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);
    let probe = FakeProbe {
        root: false,
        ..FakeProbe::default()
    };

    let (report, calls) = run_to_end(executor, probe, options(), &sandbox, RunMode::Full).await;

    assert_eq!(report.error, Some(PipelineError::NotRoot));
    assert!(calls.is_empty());
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_up_to_date_short_circuits_but_checks_config() {
    let sandbox = Sandbox::new();
    sandbox.add_config_update("ssh/._cfg0000_sshd_config");
    let executor = ScriptedExecutor::new(|invocation| {
        if invocation.display() == "emerge --update --deep --newuse --pretend @world" {
            return ok(PRETEND_NOTHING);
        }
        healthy_host(invocation)
    });
    let config = gentoo_updater::RunConfig {
        etc_update_mode: EtcUpdateMode::Auto,
        ..sandbox.config()
    };

    let updater = updater(executor, FakeProbe::default(), config, options(), &sandbox);
    let report = updater.run(RunMode::Full, future::pending()).await;
    let executor = updater.executor();

    assert!(report.success);
    assert_eq!(executor.count(WORLD_UPDATE), 0);
    assert_eq!(executor.count("emerge --depclean --ask=n"), 0);
    assert_eq!(executor.count("etc-update -a"), 1);
    assert!(report.stats.packages_updated().is_empty());
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_blocked_packages_abort_the_run() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| {
        if invocation.display() == "emerge --update --deep --newuse --pretend @world" {
            return ok("[blocks B      ] sys-apps/foo (\"sys-apps/foo\" is blocking sys-apps/bar-1.0)\n");
        }
        healthy_host(invocation)
    });

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::Full).await;

    assert_eq!(report.error, Some(PipelineError::BlockedPackages));
    assert!(!calls.iter().any(|c| c == WORLD_UPDATE));
}

#[tokio::test]
async fn test_kernel_sources_update_rebuilds_modules_without_guard() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| match invocation.display().as_str() {
        "emerge --update --deep --newuse --with-bdeps=y --pretend @world" => {
            ok("[ebuild  NS   ] sys-kernel/gentoo-sources-6.12.64 [6.12.63]\nTotal: 1 package\n")
        }
        "emerge --pretend @module-rebuild" => ok("[ebuild   R   ] x11-drivers/nvidia-drivers-550.1\nTotal: 1 package\n"),
        _ => healthy_host(invocation),
    });

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::UpdateOnly).await;

    assert!(report.success);
    assert!(report.stats.kernel_updated());
    // Update-only runs stop after the update; modules belong to full runs.
    assert!(!calls.iter().any(|c| c == "emerge @module-rebuild"));

    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| match invocation.display().as_str() {
        "emerge --update --deep --newuse --with-bdeps=y --pretend @world" => {
            ok("[ebuild  NS   ] sys-kernel/gentoo-sources-6.12.64 [6.12.63]\nTotal: 1 package\n")
        }
        "emerge --pretend @module-rebuild" => ok("[ebuild   R   ] x11-drivers/nvidia-drivers-550.1\nTotal: 1 package\n"),
        _ => healthy_host(invocation),
    });

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::Full).await;

    assert!(report.stats.kernel_updated());
    assert!(report.stats.modules_rebuilt());
    assert!(calls.iter().any(|c| c == "emerge @module-rebuild"));
    assert!(!calls.iter().any(|c| c == "uname -r"));
}

#[tokio::test]
async fn test_stale_modules_detected_by_guard() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| match invocation.display().as_str() {
        "uname -r" => ok("6.12.60-gentoo\n"),
        "emerge --pretend @module-rebuild" => ok("[ebuild   R   ] app-emulation/virtualbox-modules-7.1\n"),
        _ => healthy_host(invocation),
    });

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options(), &sandbox, RunMode::Full).await;

    assert!(calls.iter().any(|c| c == "emerge @module-rebuild"));
    assert!(report.stats.modules_rebuilt());
}

#[tokio::test]
async fn test_modules_only_always_rebuilds() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(|invocation| match invocation.display().as_str() {
        "emerge --pretend @module-rebuild" => ok("[ebuild   R   ] net-wireless/broadcom-sta-6.30\n"),
        _ => healthy_host(invocation),
    });
    let options = RunOptions {
        force_module_rebuild: true,
        ..options()
    };

    let (report, calls) = run_to_end(executor, FakeProbe::default(), options, &sandbox, RunMode::ModulesOnly).await;

    assert!(report.success);
    assert_eq!(
        calls,
        vec![
            "uname -r".to_string(),
            "eselect kernel show".to_string(),
            "emerge --pretend @module-rebuild".to_string(),
            "emerge @module-rebuild".to_string(),
        ]
    );
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_skip_flags_and_missing_tools() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);
    let options = RunOptions {
        skip_sync: true,
        skip_cleanup: true,
        ..options()
    };
    let probe = FakeProbe {
        tools: Vec::new(),
        ..FakeProbe::default()
    };

    let (report, calls) = run_to_end(executor, probe, options, &sandbox, RunMode::Full).await;

    assert!(report.success);
    assert!(!calls.iter().any(|c| c == SYNC || c == "eix-update" || c == "revdep-rebuild"));
    assert!(!calls.iter().any(|c| c.starts_with("emerge --depclean")));
    let warnings = report.stats.warnings();
    assert!(warnings.iter().any(|w| w.contains("eix is not installed")));
    assert!(warnings.iter().any(|w| w.contains("revdep-rebuild")));
}

#[tokio::test]
async fn test_startup_warning_is_recorded_once() {
    let sandbox = Sandbox::new();
    let executor = ScriptedExecutor::new(healthy_host);
    let updater = updater(executor, FakeProbe::default(), sandbox.config(), options(), &sandbox)
        .with_startup_warnings(Some("Failed to parse config /etc/gentoo-updater.conf".to_string()));

    let report = updater.run(RunMode::SyncOnly, future::pending()).await;

    let matching: Vec<_> = report
        .stats
        .warnings()
        .iter()
        .filter(|w| w.starts_with("Failed to parse config"))
        .collect();
    assert_eq!(matching.len(), 1);
}

fn notifying(sandbox: &Sandbox) -> (gentoo_updater::RunConfig, RunOptions) {
    let config = gentoo_updater::RunConfig {
        enable_notifications: true,
        notification_email: "root@localhost".to_string(),
        ..sandbox.config()
    };
    let options = RunOptions {
        webhook: Some("https://hooks.example/gentoo".to_string()),
        ..options()
    };
    (config, options)
}

fn deliveries(calls: &[String]) -> (usize, usize) {
    let mail = calls.iter().filter(|c| c.starts_with("mail -s ")).count();
    let webhook = calls.iter().filter(|c| c.starts_with("curl ")).count();
    (mail, webhook)
}

#[tokio::test]
async fn test_notifications_sent_once_after_fatal_abort() {
    let sandbox = Sandbox::new();
    let (config, options) = notifying(&sandbox);
    let executor = ScriptedExecutor::new(|invocation| {
        if invocation.display() == SYNC {
            return fail(1, "rsync error");
        }
        healthy_host(invocation)
    });

    let updater = updater(executor, FakeProbe::default(), config, options, &sandbox);
    let report = updater.run(RunMode::Full, future::pending()).await;
    let calls = updater.executor().calls();

    assert_eq!(report.error, Some(PipelineError::SyncFailed { attempts: 2 }));
    assert_eq!(deliveries(&calls), (1, 1));
    assert!(calls.iter().any(|c| c.ends_with("root@localhost")));
    assert!(calls.iter().any(|c| c.ends_with("https://hooks.example/gentoo")));
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_notifications_sent_once_after_interrupt() {
    let sandbox = Sandbox::new();
    let (config, options) = notifying(&sandbox);
    let executor = ScriptedExecutor::new(healthy_host).hanging_on(SYNC);
    let reached = executor.reached();

    let updater = updater(executor, FakeProbe::default(), config, options, &sandbox);
    let report = updater
        .run(RunMode::Full, async move { reached.notified().await })
        .await;

    assert_eq!(report.error, Some(PipelineError::Interrupted));
    assert_eq!(deliveries(&updater.executor().calls()), (1, 1));
    assert_eq!(sandbox.summaries().len(), 1);
}

#[tokio::test]
async fn test_failed_mail_is_only_a_warning() {
    let sandbox = Sandbox::new();
    let (config, options) = notifying(&sandbox);
    let executor = ScriptedExecutor::new(|invocation| {
        if invocation.program == "mail" {
            return fail(1, "send-mail: cannot connect");
        }
        healthy_host(invocation)
    });

    let updater = updater(executor, FakeProbe::default(), config, options, &sandbox);
    let report = updater.run(RunMode::SyncOnly, future::pending()).await;

    assert!(report.success, "errors: {:?}", report.stats.errors());
    assert_eq!(report.exit_code(), 0);
    assert!(report.stats.errors().is_empty());
    assert!(
        report
            .stats
            .warnings()
            .iter()
            .any(|w| w.starts_with("Could not send notification: mail exited with 1"))
    );
    assert_eq!(deliveries(&updater.executor().calls()), (1, 1));
}
