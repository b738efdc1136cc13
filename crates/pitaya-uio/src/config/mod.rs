// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Runtime configuration.
//!
//! The defaults describe a stock Linux system: sysfs mounted at `/sys` and
//! the kernel's page size used for map offsets. Both can be overridden,
//! either from the environment or programmatically, which is how the test
//! suite points discovery at a fake sysfs tree.

#[cfg(test)]
mod config_test;

use std::env;
use std::path::{Path, PathBuf};

use crate::types::system_page_size;

/// Default sysfs mount point.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Environment variable overriding the sysfs mount point.
pub const ENV_SYSFS_ROOT: &str = "PITAYA_SYSFS_ROOT";

/// Environment variable overriding the page size (decimal or `0x` hex).
pub const ENV_PAGE_SIZE: &str = "PITAYA_PAGE_SIZE";

/// Settings for discovery and mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UioConfig {
    sysfs_root: PathBuf,
    page_size: Option<usize>,
}

impl Default for UioConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            page_size: None,
        }
    }
}

impl UioConfig {
    /// Builds a configuration from `PITAYA_SYSFS_ROOT` and `PITAYA_PAGE_SIZE`.
    ///
    /// Unset variables keep their defaults. A page size that does not parse
    /// or is not a power of two is ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup(ENV_SYSFS_ROOT).filter(|root| !root.is_empty()) {
            config.sysfs_root = PathBuf::from(root);
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            if let Some(size) = parse_page_size(&raw) {
                config.page_size = Some(size);
            } else {
                tracing::warn!(value = %raw, "ignoring invalid {ENV_PAGE_SIZE}");
            }
        }
        config
    }

    /// Uses `root` as the sysfs mount point.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Uses `size` as the page size for map offsets instead of asking the
    /// kernel.
    ///
    /// Sizes that are not a power of two are ignored with a warning, keeping
    /// the previous setting.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        if size.is_power_of_two() {
            self.page_size = Some(size);
        } else {
            tracing::warn!(size, "ignoring page size that is not a power of two");
        }
        self
    }

    /// The sysfs mount point.
    #[must_use]
    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }

    /// The page size used for map offsets.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or_else(system_page_size)
    }
}

/// Parses a page size given in decimal or `0x`-prefixed hex.
fn parse_page_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let size = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok()?,
        None => raw.parse().ok()?,
    };
    size.is_power_of_two().then_some(size)
}
