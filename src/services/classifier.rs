use regex::Regex;

/// Marker emerge prints when a pretend run plans no changes.
pub const NO_CHANGES_MARKER: &str = "Total: 0 packages";

/// Substrings (matched case-insensitively) that mean emerge stopped because
/// it wants USE or keyword changes written to the configuration.
pub const AUTOUNMASK_INDICATORS: [&str; 4] = [
    "use --autounmask-write to write changes to config files",
    "the following use changes are necessary to proceed",
    "autounmask change(s)",
    "no ebuilds built with use flags to satisfy",
];

/// Best-effort reading of emerge's free-text output.
///
/// Every pattern the pipeline relies on to infer state from tool output is
/// compiled here, so a change in emerge's wording touches this file only.
///
/// - `ebuild_pattern`: package identifier after an action marker,
///   e.g. `[ebuild     U  ] dev-lang/python-3.12.1`
/// - `total_pattern`: the `Total: N packages` line of a pretend run
/// - `kernel_sources_pattern`: a `sys-kernel/*-sources` atom
/// - `selected_pattern`: depclean's `All selected packages:` line
pub struct OutputClassifier {
    ebuild_pattern: Regex,
    total_pattern: Regex,
    kernel_sources_pattern: Regex,
    selected_pattern: Regex,
}

impl OutputClassifier {
    pub fn new() -> Self {
        Self {
            ebuild_pattern: Regex::new(r"\[ebuild.*?\]\s+(\S+)").expect("Invalid ebuild regex"),
            total_pattern: Regex::new(r"Total:\s+(\d+)\s+packages?").expect("Invalid total regex"),
            kernel_sources_pattern: Regex::new(r"sys-kernel/\S*-sources")
                .expect("Invalid kernel sources regex"),
            selected_pattern: Regex::new(r"(?m)^\s*All selected packages:\s*(.*)$")
                .expect("Invalid selected packages regex"),
        }
    }

    /// True when a pretend run reports zero planned changes.
    pub fn is_up_to_date(&self, output: &str) -> bool {
        output.contains(NO_CHANGES_MARKER)
    }

    /// True when the output mentions a blocking conflict.
    pub fn has_blockers(&self, output: &str) -> bool {
        let lower = output.to_lowercase();
        lower.contains("blocked by") || lower.contains("blocking")
    }

    pub fn needs_autounmask(&self, output: &str) -> bool {
        if output.is_empty() {
            return false;
        }
        let lower = output.to_lowercase();
        AUTOUNMASK_INDICATORS
            .iter()
            .any(|indicator| lower.contains(indicator))
    }

    /// True when a kernel sources package is part of the plan.
    pub fn kernel_sources_pending(&self, output: &str) -> bool {
        self.kernel_sources_pattern.is_match(output)
    }

    /// Package identifiers from `[ebuild ...] <atom>` lines, in input order,
    /// duplicates kept.
    pub fn extract_packages(&self, output: &str) -> Vec<String> {
        self.ebuild_pattern
            .captures_iter(output)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Packages a depclean pretend run would remove.
    ///
    /// Reads the `All selected packages:` line when present and falls back to
    /// ebuild lines otherwise.
    pub fn extract_removals(&self, output: &str) -> Vec<String> {
        let selected: Vec<String> = self
            .selected_pattern
            .captures_iter(output)
            .filter_map(|caps| caps.get(1))
            .flat_map(|m| m.as_str().split_whitespace())
            .filter(|atom| *atom != "none")
            .map(str::to_string)
            .collect();

        if selected.is_empty() {
            self.extract_packages(output)
        } else {
            selected
        }
    }

    /// The `N` of `Total: N packages`, if emerge printed one.
    pub fn pending_count(&self, output: &str) -> Option<usize> {
        self.total_pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Configured critical package names that appear in the output, in
    /// configuration order.
    pub fn critical_matches<'a>(&self, output: &str, critical: &'a [String]) -> Vec<&'a str> {
        critical
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty() && output.contains(name))
            .collect()
    }
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self::new()
    }
}
