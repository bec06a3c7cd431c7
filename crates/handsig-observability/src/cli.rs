// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Crates are enabled by name, from `--debug <crate>[,<crate>]` values, the
//! `HANDSIG_DEBUG` environment variable, or `--debug-<crate>` style
//! arguments. `all` enables every crate in [`KNOWN_CRATES`].

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable holding comma separated crate names
pub const DEBUG_ENV: &str = "HANDSIG_DEBUG";

/// Crates whose logs should be raised to debug level
///
/// # Example
/// ```rust
/// use handsig_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_names(["handsig-session"]);
/// assert!(flags.is_enabled("handsig-session"));
/// assert_eq!(flags.to_filter_string("info"), "handsig_session=debug,info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Enable the named crates. `all` expands to every known crate.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for name in names {
            flags.enable(name.as_ref());
        }
        flags
    }

    /// Parse `--debug-{crate}` and `--debug-all` arguments
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Enable one crate (or all of them)
    pub fn enable(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if name == "all" {
            self.enabled_crates
                .extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
        } else {
            self.enabled_crates.insert(name.to_string());
        }
    }

    /// Add crates from a comma separated list such as `HANDSIG_DEBUG`
    pub fn merge_list(&mut self, list: &str) {
        for name in list.split(',') {
            self.enable(name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build an `EnvFilter` directive string
    ///
    /// Crate names are converted to their target form (`handsig-session` ->
    /// `handsig_session`); `base_level` applies to everything else.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(base_level.to_string());
        filters.join(",")
    }
}

/// Flags from explicit names plus the `HANDSIG_DEBUG` environment variable
pub fn parse_debug_flags<S: AsRef<str>>(names: &[S]) -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_names(names);
    if let Ok(list) = env::var(DEBUG_ENV) {
        flags.merge_list(&list);
    }
    flags
}

/// Help text listing the debug flag syntax and known crates
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug all                      Enable debug logging for all crates
  --debug <crate>[,<crate>]        Enable debug logging for specific crates

Available crates:
  {}

Environment Variable:
  {env}=<crate>[,<crate>]
  {env}=all
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-handsig-session".to_string()]);
        assert!(flags.is_enabled("handsig-session"));
        assert!(!flags.is_enabled("handsig-pipeline"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_names(["all"]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_merge_list() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_list("handsig-gesture, ,handsig-config");
        assert!(flags.is_enabled("handsig-gesture"));
        assert!(flags.is_enabled("handsig-config"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_names(["handsig-session", "handsig-pipeline"]);
        assert_eq!(
            flags.to_filter_string("warn"),
            "handsig_pipeline=debug,handsig_session=debug,warn"
        );
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_names(["handsig-session"]);
        assert_eq!(flags.log_level("handsig-session"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("handsig-gesture"), tracing::Level::INFO);
    }
}
