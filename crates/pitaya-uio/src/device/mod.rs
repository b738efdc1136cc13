// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Exclusive handles on UIO devices.
//!
//! Opening a device:
//!
//! 1. Opens the node read-write
//! 2. Takes a non-blocking exclusive `flock`, failing at once if held
//! 3. Discovers the device's maps
//! 4. Maps every map, in discovery order, at `index * page_size`
//!
//! Any failure releases everything acquired so far before the error is
//! returned, so a caller only ever sees a fully mapped handle or an error.
//! Releasing a handle unmaps every region and then closes the file, which
//! drops the lock.


use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

use crate::config::UioConfig;
use crate::error::{Result, TeardownError, TeardownFailure, UioError};
use crate::region::MappedRegion;
use crate::sysfs::{MapSource, SysfsMaps};
use crate::types::MapIndex;

/// An open, exclusively locked UIO device with all of its maps mapped.
///
/// The handle is the sole owner of the device file and of every region.
/// Dropping it (or calling [`close`](Self::close)) unmaps the regions and
/// then closes the file.
#[derive(Debug)]
pub struct DeviceHandle {
    path: PathBuf,
    // Declared before `file`: regions must be unmapped before the file closes.
    regions: Vec<MappedRegion>,
    file: Option<File>,
}

impl DeviceHandle {
    /// Opens `path` using sysfs discovery and settings from the environment
    /// (see [`UioConfig::from_env`]).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let config = UioConfig::from_env();
        Self::open_with(path, &SysfsMaps::from_config(&config), &config)
    }

    /// Opens `path`, discovering its maps through `discovery`.
    pub fn open_with(
        path: impl AsRef<Path>,
        discovery: &impl MapSource,
        config: &UioConfig,
    ) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| UioError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        try_lock_exclusive(&file).map_err(|source| UioError::Lock {
            path: path.to_path_buf(),
            source,
        })?;

        // From here on, returning drops `file`, which also drops the lock.
        let maps = discovery
            .descriptors(path)
            .map_err(|source| UioError::Discovery {
                path: path.to_path_buf(),
                source,
            })?;

        let page_size = config.page_size();
        let mut regions = Vec::with_capacity(maps.len());
        for map in &maps {
            match MappedRegion::map(file.as_fd(), map, page_size) {
                Ok(region) => regions.push(region),
                Err(source) => {
                    release_quietly(path, regions);
                    return Err(UioError::Map {
                        path: path.to_path_buf(),
                        name: map.name().to_owned(),
                        index: map.index(),
                        size: map.size(),
                        source,
                    });
                }
            }
        }

        tracing::info!(
            device = %path.display(),
            regions = regions.len(),
            "acquired"
        );

        Ok(Self {
            path: path.to_path_buf(),
            regions,
            file: Some(file),
        })
    }

    /// The device node this handle holds.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All regions, in discovery order.
    #[must_use]
    pub fn regions(&self) -> &[MappedRegion] {
        &self.regions
    }

    /// All regions, mutably, in discovery order.
    #[must_use]
    pub fn regions_mut(&mut self) -> &mut [MappedRegion] {
        &mut self.regions
    }

    /// The first region named `name`.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&MappedRegion> {
        self.regions.iter().find(|r| r.name() == name)
    }

    /// The first region named `name`, mutably.
    #[must_use]
    pub fn region_mut(&mut self, name: &str) -> Option<&mut MappedRegion> {
        self.regions.iter_mut().find(|r| r.name() == name)
    }

    /// The region built from map `index`.
    #[must_use]
    pub fn region_by_index(&self, index: MapIndex) -> Option<&MappedRegion> {
        self.regions.iter().find(|r| r.index() == index)
    }

    /// The region built from map `index`, mutably.
    #[must_use]
    pub fn region_by_index_mut(&mut self, index: MapIndex) -> Option<&mut MappedRegion> {
        self.regions.iter_mut().find(|r| r.index() == index)
    }

    /// Blocks until the device raises an interrupt and returns the
    /// interrupt count.
    ///
    /// Not implemented: always fails with
    /// [`UioError::InterruptUnsupported`]. Interrupt delivery through the
    /// UIO `read`/`write` protocol is a known gap.
    pub fn wait_for_interrupt(&self) -> Result<u32> {
        Err(UioError::InterruptUnsupported {
            path: self.path.clone(),
        })
    }

    /// Releases the device, reporting every failure.
    ///
    /// Every region is unmapped, then the file is closed. A failing step
    /// does not stop the ones after it.
    pub fn close(mut self) -> core::result::Result<(), TeardownError> {
        let mut failures = Vec::new();

        for region in self.regions.drain(..) {
            if let Err(failure) = region.unmap() {
                failures.push(failure);
            }
        }
        if let Some(file) = self.file.take() {
            if let Err(source) = close_file(file) {
                failures.push(TeardownFailure::Close { source });
            }
        }

        if failures.is_empty() {
            tracing::debug!(device = %self.path.display(), "released");
            Ok(())
        } else {
            Err(TeardownError::new(self.path.clone(), failures))
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.regions.is_empty() && self.file.is_none() {
            return;
        }
        // Each region logs its own unmap failure.
        self.regions.clear();
        drop(self.file.take());
        tracing::debug!(device = %self.path.display(), "released");
    }
}

/// Takes a non-blocking exclusive advisory lock on `file`.
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    // SAFETY: flock only inspects the descriptor, which `file` keeps open.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Closes `file`, surfacing the error that `Drop for File` would discard.
fn close_file(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released from `file`, so nothing else owns or
    // closes it.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Unmaps regions after a failed open. Errors are dropped in favour of the
/// error that caused the open to fail.
fn release_quietly(path: &Path, regions: Vec<MappedRegion>) {
    for region in regions {
        if let Err(failure) = region.unmap() {
            tracing::debug!(device = %path.display(), "ignoring cleanup failure: {failure}");
        }
    }
}
