// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Map descriptors and their sysfs attribute format.
//!
//! Each UIO map is a directory `maps/mapN` holding four attribute files:
//!
//! | File     | Content                    |
//! |----------|----------------------------|
//! | `name`   | plain text                 |
//! | `addr`   | hex, e.g. `0x40000000`     |
//! | `offset` | hex, e.g. `0x0`            |
//! | `size`   | hex, e.g. `0x1000`         |

use std::fs;
use std::path::Path;

use crate::error::DiscoveryError;
use crate::types::{MapIndex, PhysAddr};

/// Attribute holding the map name.
pub const ATTR_NAME: &str = "name";
/// Attribute holding the physical base address.
pub const ATTR_ADDR: &str = "addr";
/// Attribute holding the offset within the device.
pub const ATTR_OFFSET: &str = "offset";
/// Attribute holding the map length.
pub const ATTR_SIZE: &str = "size";

/// Immutable description of one memory region of a UIO device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDescriptor {
    index: MapIndex,
    name: String,
    addr: PhysAddr,
    offset: u64,
    size: u64,
}

impl MapDescriptor {
    /// Creates a descriptor.
    ///
    /// Returns `None` if `size` is zero.
    #[must_use]
    pub fn new(
        index: MapIndex,
        name: impl Into<String>,
        addr: PhysAddr,
        offset: u64,
        size: u64,
    ) -> Option<Self> {
        (size > 0).then(|| Self {
            index,
            name: name.into(),
            addr,
            offset,
            size,
        })
    }

    /// Reads a descriptor from a sysfs map directory such as
    /// `/sys/class/uio/uio0/maps/map0`.
    pub fn from_sysfs(entry: &Path) -> Result<Self, DiscoveryError> {
        let index = entry
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(MapIndex::from_entry_name)
            .ok_or_else(|| DiscoveryError::InvalidIndex {
                entry: entry.to_path_buf(),
            })?;

        let name = read_attribute(entry, ATTR_NAME)?.trim().to_owned();
        let addr = read_hex_attribute(entry, ATTR_ADDR)?;
        let offset = read_hex_attribute(entry, ATTR_OFFSET)?;
        let size = read_hex_attribute(entry, ATTR_SIZE)?;

        Self::new(index, name, PhysAddr::new(addr), offset, size).ok_or_else(|| {
            DiscoveryError::ZeroSize {
                entry: entry.to_path_buf(),
            }
        })
    }

    /// Position among the device's maps.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> MapIndex {
        self.index
    }

    /// Symbolic name supplied by the platform.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical base address (informational).
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> PhysAddr {
        self.addr
    }

    /// Offset of the region within the device (informational).
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Length in bytes. Never zero.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// Parses a sysfs hex attribute.
///
/// Surrounding whitespace and an optional `0x`/`0X` prefix are accepted;
/// anything else must be hex digits.
#[must_use]
pub fn parse_hex(text: &str) -> Option<u64> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn read_attribute(entry: &Path, attr: &str) -> Result<String, DiscoveryError> {
    let path = entry.join(attr);
    fs::read_to_string(&path).map_err(|source| DiscoveryError::Attribute { path, source })
}

fn read_hex_attribute(entry: &Path, attr: &str) -> Result<u64, DiscoveryError> {
    let text = read_attribute(entry, attr)?;
    parse_hex(&text).ok_or_else(|| DiscoveryError::InvalidHex {
        path: entry.join(attr),
        value: text.trim().to_owned(),
    })
}
