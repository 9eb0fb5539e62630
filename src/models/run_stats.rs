use serde::Serialize;

/// Accumulator for everything a run did.
///
/// Owned by the driver for the lifetime of one run and lent mutably to each
/// stage. The warning and error lists only ever grow; there is no way to
/// remove or rewrite an entry once recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    packages_updated: Vec<String>,
    packages_removed: Vec<String>,
    kernel_updated: bool,
    modules_rebuilt: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    gentoo_mirrors: Vec<String>,
    used_mirror: Option<String>,
    sync_mirror: Option<String>,
    retry_count: u32,
    timeout: Option<u64>,
    max_packages: Option<usize>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the advisory limits the run was started with.
    pub fn with_limits(retry_count: u32, timeout: Option<u64>, max_packages: Option<usize>) -> Self {
        Self {
            retry_count,
            timeout,
            max_packages,
            ..Self::default()
        }
    }

    pub fn add_updated<I: IntoIterator<Item = String>>(&mut self, packages: I) {
        self.packages_updated.extend(packages);
    }

    pub fn add_removed<I: IntoIterator<Item = String>>(&mut self, packages: I) {
        self.packages_removed.extend(packages);
    }

    pub fn mark_kernel_updated(&mut self) {
        self.kernel_updated = true;
    }

    pub fn mark_modules_rebuilt(&mut self) {
        self.modules_rebuilt = true;
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Replace the snapshot of configured distfile mirrors. The first entry
    /// becomes the primary mirror; empty entries are dropped.
    pub fn set_mirrors(&mut self, mirrors: &[String]) {
        self.gentoo_mirrors = mirrors
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        self.used_mirror = self.gentoo_mirrors.first().cloned();
    }

    pub fn set_sync_mirror(&mut self, uri: impl Into<String>) {
        self.sync_mirror = Some(uri.into());
    }

    pub fn packages_updated(&self) -> &[String] {
        &self.packages_updated
    }

    pub fn packages_removed(&self) -> &[String] {
        &self.packages_removed
    }

    pub fn kernel_updated(&self) -> bool {
        self.kernel_updated
    }

    pub fn modules_rebuilt(&self) -> bool {
        self.modules_rebuilt
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn gentoo_mirrors(&self) -> &[String] {
        &self.gentoo_mirrors
    }

    pub fn used_mirror(&self) -> Option<&str> {
        self.used_mirror.as_deref()
    }

    pub fn sync_mirror(&self) -> Option<&str> {
        self.sync_mirror.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn max_packages(&self) -> Option<usize> {
        self.max_packages
    }
}
