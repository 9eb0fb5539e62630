//! Operator-facing message catalog.
//!
//! The language is resolved once at start-up (from `--lang` or the locale
//! environment) and carried by [`crate::console::Console`]. Nothing here is
//! global or mutable.

use std::fmt;
use std::str::FromStr;

/// Output language for console and notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    /// Resolve the language from `LC_ALL`, `LC_MESSAGES` and `LANG`, in that order.
    pub fn detect() -> Self {
        let vars = ["LC_ALL", "LC_MESSAGES", "LANG"];
        let locale = vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());
        Self::from_locale(locale.as_deref())
    }

    /// Map a POSIX locale string such as `de_DE.UTF-8` to a language.
    pub fn from_locale(locale: Option<&str>) -> Self {
        match locale {
            Some(value) if value.to_ascii_lowercase().starts_with("de") => Language::De,
            _ => Language::En,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "de" => Ok(Language::De),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::De => "de",
        })
    }
}

/// Every message the pipeline prints, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg<'a> {
    // Preflight
    RootRequired,
    RootHint,
    RootSkippedForDryRun,
    CheckingConnectivity,
    ConnectivityOk,
    NoConnectivity,
    ConnectivityHint,
    DiskSpace { free_gb: f64 },
    DiskSpaceLow { required_gb: u64 },
    DiskCheckFailed { error: &'a str },
    BackupCreated { path: &'a str },
    BackupFailed { error: &'a str },
    BackupSkippedDryRun,
    BackupPruned { name: &'a str },
    BackupPruneFailed { error: &'a str },
    QuarantineCleanup { path: &'a str },
    QuarantineRemoved,
    QuarantineRemoveFailed { error: &'a str },
    MirrorselectAvailable,
    MirrorselectMissing,
    MirrorselectTip,
    TimeoutAdvisory { seconds: u64 },
    RetryAdvisory { count: u32 },
    MaxPackagesAdvisory { max: usize },

    // Stage headers
    StageSync { attempt: u32, max: u32 },
    StageIndex,
    StageProbe,
    StageUpdate,
    StageModules,
    StageDepclean,
    StageRevdep,
    StageKernel,
    StageConfig,
    StageSummary,
    SkippingStage { stage: &'a str },

    // Command runner
    Running { description: &'a str },
    DryRun { command: &'a str },
    CommandOk { description: &'a str },
    CommandFailed { description: &'a str, code: &'a str },
    CommandNotFound { program: &'a str },
    CommandError { description: &'a str, error: &'a str },

    // Mirrors
    ConfiguredMirrors,
    PrimaryMirror { mirror: &'a str },
    NoMirrors,
    MirrorselectOpening,
    MirrorselectHint,
    MirrorselectCancelled,
    MirrorselectFailed { detail: &'a str },
    MirrorsSelected { mirrors: &'a str },
    UsingSelectedMirrors,
    MirrorFileMissing { path: &'a str },
    MirrorKeyMissing { key: &'a str, path: &'a str },
    MirrorFileUpdated { path: &'a str },
    MirrorFileUnchanged { path: &'a str },
    MirrorWriteFailed { path: &'a str, error: &'a str },
    MirrorReadFailed { path: &'a str, error: &'a str },
    MirrorWriteSkippedDryRun { path: &'a str },

    // Sync and index
    SyncRetry,
    SyncFailed { attempts: u32 },
    IndexToolMissing,
    IndexRefreshFailed,

    // Probe and update
    CheckingBlockers,
    BlockedPackages,
    BlockedHint,
    ProbeFailed { error: &'a str },
    NoUpdates,
    UpdatesAvailable,
    CriticalPackages,
    CriticalPackage { name: &'a str },
    CriticalHint,
    MaxPackagesExceeded { pending: usize, max: usize },
    AnalyzingUpdate,
    KernelUpdateDetected,
    Performance { jobs: u32, load: f64 },
    UpdateFailed,
    AutounmaskStart,
    AutounmaskWriteFailed,
    AutounmaskNoMergeTool,
    AutounmaskMergeFailed,
    AutounmaskRecovered,
    AutounmaskRetry,
    AutounmaskDisabled,

    // Kernel modules
    CheckingModules,
    ModulesStale { running: &'a str, installed: &'a str },
    ModulesAfterUpdate,
    ModulesCurrentKernel,
    ModulesCheckFailed { error: &'a str },
    ModulesToRebuild,
    NoExternalModules,
    ModulesRebuilt,
    ModulesRebuildTip,
    ModulesRebuildFailed,
    ModulesUpToDate,

    // Cleanup and repair
    DepcleanSkipped,
    DepcleanFailed,
    RevdepSkipped,
    RevdepMissing,
    RevdepFailed,

    // Kernel advisory
    AvailableKernels,
    KernelManual,
    KernelSteps,
    KernelCheckFailed { error: &'a str },

    // Configuration drift
    ConfigUpdatesFound,
    ConfigUpdateFiles,
    NoConfigUpdates,
    ConfigCheckFailed { error: &'a str },
    ConfigModeSkip,
    ConfigModeAuto,
    ConfigModeInteractive,
    ConfigInteractiveHint,
    ConfigAutoDone,
    ConfigAutoFailed,
    ConfigInteractiveDone,
    ConfigInteractiveFailed,

    // End of run
    Interrupted,
    Unexpected { error: &'a str },
    CheckManually,
    ModulesOnlyDone,
    TotalDuration { duration: &'a str },
    NotificationSent { target: &'a str },
    NotificationFailed { error: &'a str },
    MailSubject { success: bool },
    MailBody { success: bool, duration: &'a str, updated: usize, errors: usize, log: &'a str },
    SummaryDuration { duration: &'a str },
    SummaryMirrors,
    SummaryUpdated { count: usize },
    SummaryRemoved { count: usize },
    SummaryMore { count: usize },
    SummaryKernelUpdated,
    SummaryModulesRebuilt,
    SummaryWarnings { count: usize },
    SummaryErrors { count: usize },
    SummaryLogFile { path: &'a str },
    SummarySaved { path: &'a str },
    SummarySaveFailed { error: &'a str },

    // Start-up
    ConfigCreated { path: &'a str },
    ConfigLoadFailed { error: &'a str },
}

impl Msg<'_> {
    /// Render the message in `lang`.
    pub fn text(&self, lang: Language) -> String {
        match lang {
            Language::En => self.english(),
            Language::De => self.german(),
        }
    }

    fn english(&self) -> String {
        use Msg::*;
        match self {
            RootRequired => "This script requires root privileges.".into(),
            RootHint => "Please run with sudo: sudo gentoo-updater".into(),
            RootSkippedForDryRun => "Not running as root - continuing because this is a dry run".into(),
            CheckingConnectivity => "Checking internet connection...".into(),
            ConnectivityOk => "Internet connection available".into(),
            NoConnectivity => "No internet connection available!".into(),
            ConnectivityHint => "This script requires an active internet connection for repository synchronization and package downloads.".into(),
            DiskSpace { free_gb } => format!("Free disk space: {free_gb:.2} GB"),
            DiskSpaceLow { required_gb } => format!("Not enough disk space! At least {required_gb} GB required."),
            DiskCheckFailed { error } => format!("Could not check disk space: {error}"),
            BackupCreated { path } => format!("Backup created: {path}"),
            BackupFailed { error } => format!("Backup failed: {error}"),
            BackupSkippedDryRun => "DRY-RUN: Skipping backup of configuration files".into(),
            BackupPruned { name } => format!("Old backup deleted: {name}"),
            BackupPruneFailed { error } => format!("Could not delete old backups: {error}"),
            QuarantineCleanup { path } => format!("Cleaning up: {path}"),
            QuarantineRemoved => "Quarantine directory deleted".into(),
            QuarantineRemoveFailed { error } => format!("Could not delete quarantine directory: {error}"),
            MirrorselectAvailable => "mirrorselect is available for interactive mirror selection (--use-mirrorselect)".into(),
            MirrorselectMissing => "mirrorselect is not installed".into(),
            MirrorselectTip => "  Tip: sudo emerge -a app-portage/mirrorselect".into(),
            TimeoutAdvisory { seconds } => format!("Timeout: {seconds} seconds (advisory)"),
            RetryAdvisory { count } => format!("Retry-Count: {count} (advisory)"),
            MaxPackagesAdvisory { max } => format!("Max Packages: {max} (advisory)"),

            StageSync { attempt, max } => format!("STEP 1: Repository synchronisation (attempt {attempt}/{max})"),
            StageIndex => "STEP 2: Update eix database".into(),
            StageProbe => "STEP 3: Check for available updates".into(),
            StageUpdate => "STEP 4: System update".into(),
            StageModules => "STEP 5: Rebuild kernel modules".into(),
            StageDepclean => "STEP 6: Remove orphaned packages".into(),
            StageRevdep => "STEP 7: Check and repair reverse dependencies".into(),
            StageKernel => "STEP 8: Kernel update check".into(),
            StageConfig => "STEP 9: Update configuration files".into(),
            StageSummary => "UPDATE SUMMARY".into(),
            SkippingStage { stage } => format!("Skipping {stage}"),

            Running { description } => format!("{description}..."),
            DryRun { command } => format!("DRY-RUN: Would execute: {command}"),
            CommandOk { description } => format!("{description} completed successfully"),
            CommandFailed { description, code } => format!("{description} failed (exit code: {code})"),
            CommandNotFound { program } => format!("Command not found: {program}"),
            CommandError { description, error } => format!("Error in {description}: {error}"),

            ConfiguredMirrors => "Configured Gentoo Mirrors:".into(),
            PrimaryMirror { mirror } => format!("Primary mirror: {mirror}"),
            NoMirrors => "No Gentoo mirrors configured!".into(),
            MirrorselectOpening => "Opening mirrorselect for mirror selection...".into(),
            MirrorselectHint => "(Space to select, Enter to confirm)".into(),
            MirrorselectCancelled => "Mirror selection cancelled - using default mirrors".into(),
            MirrorselectFailed { detail } => format!("mirrorselect failed ({detail}) - using default mirrors"),
            MirrorsSelected { mirrors } => format!("Mirrors selected: {mirrors}"),
            UsingSelectedMirrors => "Using interactively selected mirrors".into(),
            MirrorFileMissing { path } => format!("Mirror configuration file not found: {path}"),
            MirrorKeyMissing { key, path } => format!("{key} not found in {path}"),
            MirrorFileUpdated { path } => format!("{path} updated with mirror configuration"),
            MirrorFileUnchanged { path } => format!("{path} already has the requested mirror configuration"),
            MirrorWriteFailed { path, error } => format!("Could not update {path}: {error}"),
            MirrorReadFailed { path, error } => format!("Could not read {path}: {error}"),
            MirrorWriteSkippedDryRun { path } => format!("DRY-RUN: Would update mirror configuration in {path}"),

            SyncRetry => "Sync failed - cleaning up and retrying...".into(),
            SyncFailed { attempts } => format!("Repository synchronisation failed after {attempts} attempts"),
            IndexToolMissing => "eix is not installed, skipping...".into(),
            IndexRefreshFailed => "eix database update failed".into(),

            CheckingBlockers => "Checking for blocked packages...".into(),
            BlockedPackages => "Blocked packages found!".into(),
            BlockedHint => "Please resolve the blocking packages manually.".into(),
            ProbeFailed { error } => format!("Could not check for updates: {error}"),
            NoUpdates => "No updates available - system is up to date!".into(),
            UpdatesAvailable => "Updates available:".into(),
            CriticalPackages => "WARNING: Critical packages will be updated!".into(),
            CriticalPackage { name } => format!("  - {name}"),
            CriticalHint => "These updates may require system restarts or rebuilds.".into(),
            MaxPackagesExceeded { pending, max } => format!("{pending} packages pending, more than the declared maximum of {max} (not enforced)"),
            AnalyzingUpdate => "Analyzing packages to update...".into(),
            KernelUpdateDetected => "Kernel update detected! Modules will be rebuilt after the update.".into(),
            Performance { jobs, load } => format!("Performance: {jobs} parallel jobs, Load Average: {load}"),
            UpdateFailed => "System update failed".into(),
            AutounmaskStart => "Portage requires configuration/USE changes. Starting automatic autounmask recovery...".into(),
            AutounmaskWriteFailed => "Autounmask changes could not be written automatically".into(),
            AutounmaskNoMergeTool => "Neither etc-update nor dispatch-conf found - automatic recovery not possible".into(),
            AutounmaskMergeFailed => "Configuration merge after autounmask failed".into(),
            AutounmaskRecovered => "Autounmask recovery completed successfully".into(),
            AutounmaskRetry => "Restarting emerge after automatic autounmask recovery...".into(),
            AutounmaskDisabled => "Autounmask recovery needed but disabled (--no-auto-autounmask)".into(),

            CheckingModules => "Checking kernel module status...".into(),
            ModulesStale { running, installed } => format!("Running kernel ({running}) != installed kernel ({installed})"),
            ModulesAfterUpdate => "Modules need to be rebuilt for the new kernel".into(),
            ModulesCurrentKernel => "Running kernel is up to date - modules do not need to be rebuilt".into(),
            ModulesCheckFailed { error } => format!("Could not check module status: {error}"),
            ModulesToRebuild => "The following modules will be rebuilt:".into(),
            NoExternalModules => "No external kernel modules found (or already up to date)".into(),
            ModulesRebuilt => "All kernel modules successfully rebuilt".into(),
            ModulesRebuildTip => "Tip: The new modules will be used after a restart".into(),
            ModulesRebuildFailed => "Kernel module rebuild failed".into(),
            ModulesUpToDate => "Kernel modules are up to date - no rebuild needed".into(),

            DepcleanSkipped => "Depclean skipped (disabled in config)".into(),
            DepcleanFailed => "Removing orphaned packages failed".into(),
            RevdepSkipped => "revdep-rebuild skipped (disabled in config)".into(),
            RevdepMissing => "revdep-rebuild not found (install gentoolkit?)".into(),
            RevdepFailed => "revdep-rebuild reported errors".into(),

            AvailableKernels => "Available kernels:".into(),
            KernelManual => "Kernel updates must be performed manually!".into(),
            KernelSteps => "Steps for kernel update:".into(),
            KernelCheckFailed { error } => format!("Kernel check failed: {error}"),

            ConfigUpdatesFound => "Configuration updates found!".into(),
            ConfigUpdateFiles => "Configuration files with updates:".into(),
            NoConfigUpdates => "No configuration updates pending".into(),
            ConfigCheckFailed { error } => format!("Configuration check failed: {error}"),
            ConfigModeSkip => "Mode: skip - configuration files are not updated".into(),
            ConfigModeAuto => "Mode: auto - updating all configuration files automatically".into(),
            ConfigModeInteractive => "Mode: interactive - starting interactive etc-update".into(),
            ConfigInteractiveHint => "Press 'q' to quit, '-' to skip a file".into(),
            ConfigAutoDone => "All configuration files were updated automatically".into(),
            ConfigAutoFailed => "Automatic configuration file update failed".into(),
            ConfigInteractiveDone => "Interactive etc-update finished".into(),
            ConfigInteractiveFailed => "Interactive etc-update failed".into(),

            Interrupted => "Update interrupted by user".into(),
            Unexpected { error } => format!("Unexpected error: {error}"),
            CheckManually => "Please check kernel updates and configuration changes manually".into(),
            ModulesOnlyDone => "Module rebuild finished".into(),
            TotalDuration { duration } => format!("Total duration: {duration}"),
            NotificationSent { target } => format!("Notification sent to {target}"),
            NotificationFailed { error } => format!("Could not send notification: {error}"),
            MailSubject { success } => format!(
                "Gentoo update completed {}",
                if *success { "successfully" } else { "with errors" }
            ),
            MailBody { success, duration, updated, errors, log } => format!(
                "Update status: {}\nDuration: {duration}\nPackages updated: {updated}\nErrors: {errors}\n\nDetails: {log}\n",
                if *success { "successful" } else { "with errors" }
            ),
            SummaryDuration { duration } => format!("Duration: {duration}"),
            SummaryMirrors => "Gentoo mirrors:".into(),
            SummaryUpdated { count } => format!("Updated packages ({count}):"),
            SummaryRemoved { count } => format!("Removed packages ({count}):"),
            SummaryMore { count } => format!("  ... and {count} more"),
            SummaryKernelUpdated => "Kernel was updated".into(),
            SummaryModulesRebuilt => "Kernel modules rebuilt".into(),
            SummaryWarnings { count } => format!("Warnings ({count}):"),
            SummaryErrors { count } => format!("Errors ({count}):"),
            SummaryLogFile { path } => format!("Log file: {path}"),
            SummarySaved { path } => format!("Summary saved: {path}"),
            SummarySaveFailed { error } => format!("Could not save summary: {error}"),
            ConfigCreated { path } => format!("Default configuration written to {path}"),
            ConfigLoadFailed { error } => format!("{error} - using default settings"),
        }
    }

    fn german(&self) -> String {
        use Msg::*;
        match self {
            RootRequired => "Dieses Skript benötigt Root-Rechte.".into(),
            RootHint => "Bitte mit sudo ausführen: sudo gentoo-updater".into(),
            RootSkippedForDryRun => "Keine Root-Rechte - Fortsetzung, da Dry-Run".into(),
            CheckingConnectivity => "Prüfe Internetverbindung...".into(),
            ConnectivityOk => "Internetverbindung verfügbar".into(),
            NoConnectivity => "Keine Internetverbindung verfügbar!".into(),
            ConnectivityHint => "Dieses Skript benötigt eine aktive Internetverbindung für Repository-Synchronisation und Paket-Downloads.".into(),
            DiskSpace { free_gb } => format!("Freier Speicherplatz: {free_gb:.2} GB"),
            DiskSpaceLow { required_gb } => format!("Nicht genug Speicherplatz! Mindestens {required_gb} GB erforderlich."),
            DiskCheckFailed { error } => format!("Konnte Speicherplatz nicht prüfen: {error}"),
            BackupCreated { path } => format!("Backup erstellt: {path}"),
            BackupFailed { error } => format!("Backup fehlgeschlagen: {error}"),
            BackupSkippedDryRun => "DRY-RUN: Backup der Konfigurationsdateien übersprungen".into(),
            BackupPruned { name } => format!("Altes Backup gelöscht: {name}"),
            BackupPruneFailed { error } => format!("Konnte alte Backups nicht löschen: {error}"),
            QuarantineCleanup { path } => format!("Räume auf: {path}"),
            QuarantineRemoved => "Quarantine-Verzeichnis gelöscht".into(),
            QuarantineRemoveFailed { error } => format!("Konnte Quarantine nicht löschen: {error}"),
            MirrorselectAvailable => "mirrorselect ist für die interaktive Mirror-Auswahl verfügbar (--use-mirrorselect)".into(),
            MirrorselectMissing => "mirrorselect ist nicht installiert".into(),
            MirrorselectTip => "  Tipp: sudo emerge -a app-portage/mirrorselect".into(),
            TimeoutAdvisory { seconds } => format!("Timeout: {seconds} Sekunden (Hinweis)"),
            RetryAdvisory { count } => format!("Retry-Count: {count} (Hinweis)"),
            MaxPackagesAdvisory { max } => format!("Max Pakete: {max} (Hinweis)"),

            StageSync { attempt, max } => format!("SCHRITT 1: Repository-Synchronisation (Versuch {attempt}/{max})"),
            StageIndex => "SCHRITT 2: eix-Datenbank aktualisieren".into(),
            StageProbe => "SCHRITT 3: Prüfe verfügbare Updates".into(),
            StageUpdate => "SCHRITT 4: System-Update".into(),
            StageModules => "SCHRITT 5: Kernel-Module neu kompilieren".into(),
            StageDepclean => "SCHRITT 6: Bereinige verwaiste Pakete".into(),
            StageRevdep => "SCHRITT 7: Prüfe und repariere Abhängigkeiten".into(),
            StageKernel => "SCHRITT 8: Kernel-Update-Prüfung".into(),
            StageConfig => "SCHRITT 9: Konfigurationsdateien aktualisieren".into(),
            StageSummary => "UPDATE-ZUSAMMENFASSUNG".into(),
            SkippingStage { stage } => format!("Überspringe {stage}"),

            Running { description } => format!("{description}..."),
            DryRun { command } => format!("DRY-RUN: Würde ausführen: {command}"),
            CommandOk { description } => format!("{description} erfolgreich abgeschlossen"),
            CommandFailed { description, code } => format!("{description} fehlgeschlagen (Exit Code: {code})"),
            CommandNotFound { program } => format!("Befehl nicht gefunden: {program}"),
            CommandError { description, error } => format!("Fehler bei {description}: {error}"),

            ConfiguredMirrors => "Konfigurierte Gentoo Mirrors:".into(),
            PrimaryMirror { mirror } => format!("Primärer Mirror: {mirror}"),
            NoMirrors => "Keine Gentoo Mirrors konfiguriert!".into(),
            MirrorselectOpening => "Öffne mirrorselect zur Mirror-Auswahl...".into(),
            MirrorselectHint => "(Leertaste zum Auswählen, Enter zum Bestätigen)".into(),
            MirrorselectCancelled => "Mirror-Auswahl abgebrochen - verwende Standard-Mirror".into(),
            MirrorselectFailed { detail } => format!("mirrorselect fehlgeschlagen ({detail}) - verwende Standard-Mirror"),
            MirrorsSelected { mirrors } => format!("Mirror ausgewählt: {mirrors}"),
            UsingSelectedMirrors => "Verwende interaktiv ausgewählte Mirror".into(),
            MirrorFileMissing { path } => format!("Mirror-Konfigurationsdatei nicht gefunden: {path}"),
            MirrorKeyMissing { key, path } => format!("{key} nicht in {path} gefunden"),
            MirrorFileUpdated { path } => format!("{path} mit Mirror-Konfiguration aktualisiert"),
            MirrorFileUnchanged { path } => format!("{path} ist bereits wie gewünscht konfiguriert"),
            MirrorWriteFailed { path, error } => format!("Konnte {path} nicht aktualisieren: {error}"),
            MirrorReadFailed { path, error } => format!("Konnte {path} nicht lesen: {error}"),
            MirrorWriteSkippedDryRun { path } => format!("DRY-RUN: Würde Mirror-Konfiguration in {path} aktualisieren"),

            SyncRetry => "Sync fehlgeschlagen - räume auf und versuche erneut...".into(),
            SyncFailed { attempts } => format!("Repository-Synchronisation fehlgeschlagen nach {attempts} Versuchen"),
            IndexToolMissing => "eix ist nicht installiert, überspringe...".into(),
            IndexRefreshFailed => "Aktualisierung der eix-Datenbank fehlgeschlagen".into(),

            CheckingBlockers => "Prüfe auf blockierte Pakete...".into(),
            BlockedPackages => "Blockierte Pakete gefunden!".into(),
            BlockedHint => "Bitte die blockierenden Pakete manuell auflösen.".into(),
            ProbeFailed { error } => format!("Fehler beim Prüfen der Updates: {error}"),
            NoUpdates => "Keine Updates verfügbar - System ist aktuell!".into(),
            UpdatesAvailable => "Updates verfügbar:".into(),
            CriticalPackages => "WARNUNG: Kritische Pakete werden aktualisiert!".into(),
            CriticalPackage { name } => format!("  - {name}"),
            CriticalHint => "Diese Updates können Neustarts oder Rebuilds erfordern.".into(),
            MaxPackagesExceeded { pending, max } => format!("{pending} Pakete ausstehend, mehr als das angegebene Maximum von {max} (nicht erzwungen)"),
            AnalyzingUpdate => "Analysiere zu aktualisierende Pakete...".into(),
            KernelUpdateDetected => "Kernel-Update erkannt! Module werden nach dem Update neu gebaut.".into(),
            Performance { jobs, load } => format!("Performance: {jobs} parallele Jobs, Load Average: {load}"),
            UpdateFailed => "System-Update fehlgeschlagen".into(),
            AutounmaskStart => "Portage verlangt Konfigurations-/USE-Änderungen. Starte automatische Autounmask-Recovery...".into(),
            AutounmaskWriteFailed => "Autounmask-Änderungen konnten nicht automatisch geschrieben werden".into(),
            AutounmaskNoMergeTool => "Weder etc-update noch dispatch-conf gefunden - automatische Recovery nicht möglich".into(),
            AutounmaskMergeFailed => "Konfigurations-Merge nach autounmask fehlgeschlagen".into(),
            AutounmaskRecovered => "Autounmask-Recovery erfolgreich abgeschlossen".into(),
            AutounmaskRetry => "Starte emerge nach automatischer autounmask-Recovery erneut...".into(),
            AutounmaskDisabled => "Autounmask-Recovery erkannt, aber deaktiviert (--no-auto-autounmask)".into(),

            CheckingModules => "Prüfe Kernel-Modul-Status...".into(),
            ModulesStale { running, installed } => format!("Laufender Kernel ({running}) != installierter Kernel ({installed})"),
            ModulesAfterUpdate => "Module müssen für den neuen Kernel neu gebaut werden".into(),
            ModulesCurrentKernel => "Laufender Kernel ist aktuell - Module müssen nicht neu gebaut werden".into(),
            ModulesCheckFailed { error } => format!("Konnte Modul-Status nicht prüfen: {error}"),
            ModulesToRebuild => "Folgende Module werden neu gebaut:".into(),
            NoExternalModules => "Keine externen Kernel-Module gefunden (oder bereits aktuell)".into(),
            ModulesRebuilt => "Alle Kernel-Module erfolgreich neu gebaut".into(),
            ModulesRebuildTip => "Tipp: Die neuen Module werden nach einem Neustart verwendet".into(),
            ModulesRebuildFailed => "Neubau der Kernel-Module fehlgeschlagen".into(),
            ModulesUpToDate => "Kernel-Module sind aktuell - keine Neucompilierung nötig".into(),

            DepcleanSkipped => "Depclean übersprungen (in Konfiguration deaktiviert)".into(),
            DepcleanFailed => "Entfernen verwaister Pakete fehlgeschlagen".into(),
            RevdepSkipped => "revdep-rebuild übersprungen (in Konfiguration deaktiviert)".into(),
            RevdepMissing => "revdep-rebuild nicht gefunden (gentoolkit installieren?)".into(),
            RevdepFailed => "revdep-rebuild meldete Fehler".into(),

            AvailableKernels => "Verfügbare Kernel:".into(),
            KernelManual => "Kernel-Updates müssen manuell durchgeführt werden!".into(),
            KernelSteps => "Schritte für ein Kernel-Update:".into(),
            KernelCheckFailed { error } => format!("Kernel-Prüfung fehlgeschlagen: {error}"),

            ConfigUpdatesFound => "Konfigurations-Updates gefunden!".into(),
            ConfigUpdateFiles => "Konfigurationsdateien mit Updates:".into(),
            NoConfigUpdates => "Keine Konfigurations-Updates ausstehend".into(),
            ConfigCheckFailed { error } => format!("Konfigurationsprüfung fehlgeschlagen: {error}"),
            ConfigModeSkip => "Modus: skip - Konfigurationsdateien werden nicht aktualisiert".into(),
            ConfigModeAuto => "Modus: auto - Aktualisiere alle Konfigurationsdateien automatisch".into(),
            ConfigModeInteractive => "Modus: interactive - Starte interaktives etc-update".into(),
            ConfigInteractiveHint => "Drücke 'q' zum Beenden, '-' um eine Datei zu überspringen".into(),
            ConfigAutoDone => "Alle Konfigurationsdateien wurden automatisch aktualisiert".into(),
            ConfigAutoFailed => "Fehler beim automatischen Update von Konfigurationsdateien".into(),
            ConfigInteractiveDone => "Interaktives etc-update abgeschlossen".into(),
            ConfigInteractiveFailed => "Fehler bei interaktivem etc-update".into(),

            Interrupted => "Update durch Benutzer abgebrochen".into(),
            Unexpected { error } => format!("Unerwarteter Fehler: {error}"),
            CheckManually => "Bitte Kernel-Updates und Konfigurations-Änderungen manuell prüfen".into(),
            ModulesOnlyDone => "Modul-Rebuild abgeschlossen".into(),
            TotalDuration { duration } => format!("Gesamtdauer: {duration}"),
            NotificationSent { target } => format!("Benachrichtigung gesendet an {target}"),
            NotificationFailed { error } => format!("Konnte Benachrichtigung nicht senden: {error}"),
            MailSubject { success } => format!(
                "Gentoo Update {} abgeschlossen",
                if *success { "erfolgreich" } else { "mit Fehlern" }
            ),
            MailBody { success, duration, updated, errors, log } => format!(
                "Update-Status: {}\nDauer: {duration}\nPakete aktualisiert: {updated}\nFehler: {errors}\n\nDetails siehe: {log}\n",
                if *success { "erfolgreich" } else { "mit Fehlern" }
            ),
            SummaryDuration { duration } => format!("Dauer: {duration}"),
            SummaryMirrors => "Gentoo Mirrors:".into(),
            SummaryUpdated { count } => format!("Aktualisierte Pakete ({count}):"),
            SummaryRemoved { count } => format!("Entfernte Pakete ({count}):"),
            SummaryMore { count } => format!("  ... und {count} weitere"),
            SummaryKernelUpdated => "Kernel wurde aktualisiert".into(),
            SummaryModulesRebuilt => "Kernel-Module neu gebaut".into(),
            SummaryWarnings { count } => format!("Warnungen ({count}):"),
            SummaryErrors { count } => format!("Fehler ({count}):"),
            SummaryLogFile { path } => format!("Log-Datei: {path}"),
            SummarySaved { path } => format!("Zusammenfassung gespeichert: {path}"),
            SummarySaveFailed { error } => format!("Konnte Zusammenfassung nicht speichern: {error}"),
            ConfigCreated { path } => format!("Standard-Konfiguration geschrieben nach {path}"),
            ConfigLoadFailed { error } => format!("{error} - verwende Standardeinstellungen"),
        }
    }
}
