// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Discovery of a UIO device's memory maps.
//!
//! Discovery is split behind two narrow traits so the device logic never
//! touches sysfs directly:
//!
//! - [`NodeResolver`] turns a device node into the sysfs directory that
//!   describes it.
//! - [`MapSource`] produces the descriptors for a device node.
//!
//! [`SysfsMaps`] is the production [`MapSource`]; tests use the in-memory
//! `MockMaps` instead.

mod descriptor;

#[cfg(test)]
mod sysfs_test;

pub use descriptor::{ATTR_ADDR, ATTR_NAME, ATTR_OFFSET, ATTR_SIZE, MapDescriptor, parse_hex};

use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::config::UioConfig;
use crate::error::DiscoveryError;

/// Name of the directory listing a device's maps.
pub const MAPS_DIR: &str = "maps";

// =============================================================================
// Traits
// =============================================================================

/// Fetches the map descriptors for a device node.
pub trait MapSource {
    /// Returns the device's descriptors in enumeration order.
    ///
    /// Implementations must not cache: every call reflects the platform's
    /// current state.
    fn descriptors(&self, node: &Path) -> Result<Vec<MapDescriptor>, DiscoveryError>;
}

/// Resolves a device node to the directory holding its metadata.
pub trait NodeResolver {
    /// Returns the metadata directory for `node`. The directory is expected
    /// to contain a [`MAPS_DIR`] subdirectory.
    fn resolve(&self, node: &Path) -> Result<PathBuf, DiscoveryError>;
}

// =============================================================================
// Sysfs Resolver
// =============================================================================

/// Resolves device nodes through sysfs.
///
/// A character device is looked up by its device number under
/// `<root>/dev/char/<major>:<minor>`, which the kernel links to the UIO
/// device directory. Anything else (a renamed node, or a plain file
/// standing in for one) is looked up by file name under
/// `<root>/class/uio/<name>`.
#[derive(Debug, Clone)]
pub struct SysfsResolver {
    root: PathBuf,
}

impl SysfsResolver {
    /// Creates a resolver for sysfs mounted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn candidate(&self, node: &Path) -> Result<PathBuf, DiscoveryError> {
        let meta = fs::metadata(node).map_err(|source| DiscoveryError::Resolve {
            node: node.to_path_buf(),
            source,
        })?;

        if meta.file_type().is_char_device() {
            let (major, minor) = split_dev(meta.rdev());
            return Ok(self.root.join("dev/char").join(format!("{major}:{minor}")));
        }

        let name = node.file_name().ok_or_else(|| DiscoveryError::Resolve {
            node: node.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "device path has no file name"),
        })?;
        Ok(self.root.join("class/uio").join(name))
    }
}

impl NodeResolver for SysfsResolver {
    fn resolve(&self, node: &Path) -> Result<PathBuf, DiscoveryError> {
        let entry = self.candidate(node)?;
        match fs::metadata(&entry) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(node = %node.display(), entry = %entry.display(), "resolved");
                Ok(entry)
            }
            Ok(_) => Err(DiscoveryError::Resolve {
                node: node.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not a directory", entry.display()),
                ),
            }),
            Err(source) => Err(DiscoveryError::Resolve {
                node: node.to_path_buf(),
                source,
            }),
        }
    }
}

/// Splits a Linux `dev_t` into major and minor numbers.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "both values are masked to 32 bits"
)]
pub const fn split_dev(rdev: u64) -> (u32, u32) {
    let major = ((rdev >> 32) & 0xffff_f000) | ((rdev >> 8) & 0x0000_0fff);
    let minor = ((rdev >> 12) & 0xffff_ff00) | (rdev & 0x0000_00ff);
    (major as u32, minor as u32)
}

// =============================================================================
// Sysfs Map Source
// =============================================================================

/// Reads map descriptors from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsMaps<R = SysfsResolver> {
    resolver: R,
}

impl SysfsMaps {
    /// Creates a map source for the sysfs root in `config`.
    #[must_use]
    pub fn from_config(config: &UioConfig) -> Self {
        Self::with_resolver(SysfsResolver::new(config.sysfs_root()))
    }
}

impl<R: NodeResolver> SysfsMaps<R> {
    /// Creates a map source using a custom resolver.
    #[must_use]
    pub const fn with_resolver(resolver: R) -> Self {
        Self { resolver }
    }
}

impl<R: NodeResolver> MapSource for SysfsMaps<R> {
    fn descriptors(&self, node: &Path) -> Result<Vec<MapDescriptor>, DiscoveryError> {
        let entry = self.resolver.resolve(node)?;
        read_maps_dir(&entry.join(MAPS_DIR))
    }
}

/// Reads every map under a `maps` directory, in directory listing order.
pub fn read_maps_dir(dir: &Path) -> Result<Vec<MapDescriptor>, DiscoveryError> {
    let listing = fs::read_dir(dir).map_err(|source| DiscoveryError::MissingMaps {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut maps = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|source| DiscoveryError::MissingMaps {
            dir: dir.to_path_buf(),
            source,
        })?;
        let map = MapDescriptor::from_sysfs(&entry.path())?;
        tracing::debug!(
            index = map.index().as_u32(),
            name = map.name(),
            addr = %map.addr(),
            offset = map.offset(),
            size = map.size(),
            "found map"
        );
        maps.push(map);
    }

    if maps.is_empty() {
        return Err(DiscoveryError::NoMaps {
            dir: dir.to_path_buf(),
        });
    }
    Ok(maps)
}
