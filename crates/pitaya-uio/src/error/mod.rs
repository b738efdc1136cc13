// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Error types for device acquisition, discovery, mapping and teardown.
//!
//! Every error carries the device path, and region errors also carry the
//! region's name, index and size, so a failure can be diagnosed from the
//! message alone.


use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::types::MapIndex;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a [`UioError`], for matching without fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Device node missing, unreadable or unwritable.
    Open,
    /// Device already locked by another holder.
    Lock,
    /// Region metadata missing or malformed.
    Discovery,
    /// `mmap` failed for a specific region.
    Map,
    /// Unmapping or closing failed during release.
    Teardown,
    /// Interrupt waiting is not available.
    InterruptUnsupported,
}

// =============================================================================
// Discovery Errors
// =============================================================================

/// Failure while reading a device's region metadata.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The device node could not be resolved to a sysfs entry.
    Resolve {
        /// Device node being resolved.
        node: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The `maps` directory does not exist or cannot be listed.
    MissingMaps {
        /// The `maps` directory.
        dir: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The `maps` directory has no entries.
    NoMaps {
        /// The `maps` directory.
        dir: PathBuf,
    },
    /// An attribute file is missing or unreadable.
    Attribute {
        /// The attribute file.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// An attribute that must be hexadecimal is not.
    InvalidHex {
        /// The attribute file.
        path: PathBuf,
        /// Its (trimmed) content.
        value: String,
    },
    /// A map entry's name has no trailing index.
    InvalidIndex {
        /// The map entry.
        entry: PathBuf,
    },
    /// A map declares a size of zero.
    ZeroSize {
        /// The map entry.
        entry: PathBuf,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve { node, source } => write!(
                f,
                "cannot resolve {} to a UIO device: {source}",
                node.display()
            ),
            Self::MissingMaps { dir, source } => {
                write!(f, "cannot list {}: {source}", dir.display())
            }
            Self::NoMaps { dir } => write!(f, "{} has no maps", dir.display()),
            Self::Attribute { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::InvalidHex { path, value } => {
                write!(f, "{} is not hexadecimal: {value:?}", path.display())
            }
            Self::InvalidIndex { entry } => write!(f, "{} has no map index", entry.display()),
            Self::ZeroSize { entry } => write!(f, "{} has size 0", entry.display()),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve { source, .. }
            | Self::MissingMaps { source, .. }
            | Self::Attribute { source, .. } => Some(source),
            Self::NoMaps { .. }
            | Self::InvalidHex { .. }
            | Self::InvalidIndex { .. }
            | Self::ZeroSize { .. } => None,
        }
    }
}

// =============================================================================
// Teardown Errors
// =============================================================================

/// A single step that failed while releasing a device.
#[derive(Debug)]
pub enum TeardownFailure {
    /// `munmap` failed for a region.
    Unmap {
        /// Region name.
        name: String,
        /// Region index.
        index: MapIndex,
        /// Mapping length.
        size: u64,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Closing the device file failed.
    Close {
        /// Underlying OS error.
        source: io::Error,
    },
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmap {
                name,
                index,
                size,
                source,
            } => write!(f, "unmapping {index} ({name}, {size:#x} bytes): {source}"),
            Self::Close { source } => write!(f, "closing: {source}"),
        }
    }
}

/// Failures collected while releasing a device.
///
/// Release is best effort: every step is attempted, and every failure is
/// recorded here in the order it happened.
#[derive(Debug)]
pub struct TeardownError {
    path: PathBuf,
    failures: Vec<TeardownFailure>,
}

impl TeardownError {
    /// Creates a teardown error for `path` from the failed steps.
    #[must_use]
    pub const fn new(path: PathBuf, failures: Vec<TeardownFailure>) -> Self {
        Self { path, failures }
    }

    /// The device whose release failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The failed steps, in the order they were attempted.
    #[must_use]
    pub fn failures(&self) -> &[TeardownFailure] {
        &self.failures
    }
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "releasing {}: ", self.path.display())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TeardownError {}

// =============================================================================
// Access Errors
// =============================================================================

/// A volatile access that falls outside a mapped region or is misaligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The access extends past the end of the region.
    OutOfBounds {
        /// Byte offset of the access.
        offset: usize,
        /// Access width in bytes.
        len: usize,
        /// Region length.
        size: usize,
    },
    /// The offset is not a multiple of the access width.
    Misaligned {
        /// Byte offset of the access.
        offset: usize,
        /// Required alignment.
        align: usize,
    },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset, len, size } => write!(
                f,
                "access of {len} bytes at {offset:#x} exceeds region size {size:#x}"
            ),
            Self::Misaligned { offset, align } => {
                write!(f, "offset {offset:#x} is not {align}-byte aligned")
            }
        }
    }
}

impl std::error::Error for AccessError {}

// =============================================================================
// Top-level Error
// =============================================================================

/// Error returned by device operations.
#[derive(Debug)]
pub enum UioError {
    /// The device node could not be opened read-write.
    Open {
        /// Device node.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The exclusive lock could not be taken immediately.
    Lock {
        /// Device node.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Region metadata could not be discovered.
    Discovery {
        /// Device node.
        path: PathBuf,
        /// What went wrong.
        source: DiscoveryError,
    },
    /// A region could not be mapped.
    Map {
        /// Device node.
        path: PathBuf,
        /// Region name.
        name: String,
        /// Region index.
        index: MapIndex,
        /// Requested mapping length.
        size: u64,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Releasing the device failed.
    Teardown(TeardownError),
    /// Waiting for interrupts is not implemented.
    InterruptUnsupported {
        /// Device node.
        path: PathBuf,
    },
}

impl UioError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Open { .. } => ErrorKind::Open,
            Self::Lock { .. } => ErrorKind::Lock,
            Self::Discovery { .. } => ErrorKind::Discovery,
            Self::Map { .. } => ErrorKind::Map,
            Self::Teardown(_) => ErrorKind::Teardown,
            Self::InterruptUnsupported { .. } => ErrorKind::InterruptUnsupported,
        }
    }

    /// The device node this error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. }
            | Self::Lock { path, .. }
            | Self::Discovery { path, .. }
            | Self::Map { path, .. }
            | Self::InterruptUnsupported { path } => path,
            Self::Teardown(err) => err.path(),
        }
    }

    /// Raw OS error code, when the failure came from a system call.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Open { source, .. } | Self::Lock { source, .. } | Self::Map { source, .. } => {
                source.raw_os_error()
            }
            Self::Discovery { .. } | Self::Teardown(_) | Self::InterruptUnsupported { .. } => None,
        }
    }
}

impl fmt::Display for UioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => write!(f, "opening {}: {source}", path.display()),
            Self::Lock { path, source } => {
                if source.kind() == io::ErrorKind::WouldBlock {
                    write!(f, "locking {}: already locked", path.display())
                } else {
                    write!(f, "locking {}: {source}", path.display())
                }
            }
            Self::Discovery { path, source } => {
                write!(f, "cannot discover regions of {}: {source}", path.display())
            }
            Self::Map {
                path,
                name,
                index,
                size,
                source,
            } => write!(
                f,
                "mapping {} {index} ({name}) size {size:#x}: {source}",
                path.display()
            ),
            Self::Teardown(err) => write!(f, "{err}"),
            Self::InterruptUnsupported { path } => write!(
                f,
                "waiting for interrupts on {} is not implemented",
                path.display()
            ),
        }
    }
}

impl std::error::Error for UioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Lock { source, .. } | Self::Map { source, .. } => {
                Some(source)
            }
            Self::Discovery { source, .. } => Some(source),
            Self::Teardown(err) => Some(err),
            Self::InterruptUnsupported { .. } => None,
        }
    }
}

impl From<TeardownError> for UioError {
    fn from(err: TeardownError) -> Self {
        Self::Teardown(err)
    }
}

/// Result alias for device operations.
pub type Result<T, E = UioError> = core::result::Result<T, E>;
