use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Timestamped snapshots of the portage configuration.
///
/// Each run gets its own `<backup_dir>/<YYYYMMDD-HHMMSS>/` directory. Files
/// are copied flat into it; directory sources keep their inner structure
/// under their own name.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: Utf8PathBuf,
    sources: Vec<Utf8PathBuf>,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<Utf8PathBuf>, sources: Vec<Utf8PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            sources,
        }
    }

    pub fn backup_dir(&self) -> &Utf8Path {
        &self.backup_dir
    }

    /// Copy every existing source into a new snapshot named `stamp`.
    ///
    /// Missing sources are skipped. The first copy error aborts the snapshot;
    /// whatever was copied before it stays on disk.
    pub fn backup_critical_files(&self, stamp: &str) -> Result<Utf8PathBuf> {
        let snapshot = self.backup_dir.join(stamp);
        fs::create_dir_all(&snapshot)
            .with_context(|| format!("Failed to create backup directory: {}", snapshot))?;

        for source in &self.sources {
            if !source.exists() {
                tracing::debug!("Backup source missing, skipping: {}", source);
                continue;
            }
            let Some(name) = source.file_name() else {
                continue;
            };

            if source.is_dir() {
                copy_tree(source, &snapshot.join(name))?;
            } else {
                let target = snapshot.join(name);
                fs::copy(source, &target)
                    .with_context(|| format!("Failed to copy {} to {}", source, target))?;
            }
        }

        tracing::info!("Backup snapshot written to {}", snapshot);
        Ok(snapshot)
    }

    /// Delete snapshot directories last modified more than `days` ago,
    /// except the snapshot named `keep` (the one this run just wrote).
    ///
    /// Returns the names of the removed snapshots.
    pub fn prune_older_than(&self, days: u64, keep: &str) -> Result<Vec<String>> {
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(days.saturating_mul(86_400)))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = Vec::new();

        if !self.backup_dir.exists() {
            return Ok(removed);
        }

        let entries = fs::read_dir(&self.backup_dir)
            .with_context(|| format!("Failed to list backup directory: {}", self.backup_dir))?;

        for entry in entries {
            let entry = entry.context("Failed to read backup directory entry")?;
            let metadata = entry.metadata().context("Failed to stat backup entry")?;
            if !metadata.is_dir() || entry.file_name() == keep {
                continue;
            }
            let modified = metadata.modified().context("Failed to read backup mtime")?;
            if modified >= cutoff {
                continue;
            }

            let path = entry.path();
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove old backup: {}", path.display()))?;
            removed.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(removed)
    }
}

fn copy_tree(source: &Utf8Path, target: &Utf8Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("Unexpected path outside {}", source))?;
        let destination = target.as_std_path().join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)
                .with_context(|| format!("Failed to create {}", destination.display()))?;
        } else {
            fs::copy(entry.path(), &destination).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), destination.display())
            })?;
        }
    }
    Ok(())
}
