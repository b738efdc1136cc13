// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! UIO map index.

use core::fmt;

/// Position of a memory map among a UIO device's maps.
///
/// The kernel selects map `N` by the `mmap` offset `N * page_size`, so the
/// index is also the page slot the map occupies in the device file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct MapIndex(u32);

impl MapIndex {
    /// Create a map index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Byte offset into the device file that selects this map.
    ///
    /// No check is made that the map's size fits inside one page slot;
    /// the kernel only uses the offset to pick the map.
    ///
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn file_offset(self, page_size: usize) -> Option<u64> {
        (self.0 as u64).checked_mul(page_size as u64)
    }

    /// Parse the index from a sysfs map directory name such as `map3`.
    ///
    /// All trailing ASCII digits form the index. Returns `None` if the name
    /// has no trailing digits or the number does not fit.
    #[must_use]
    pub fn from_entry_name(name: &str) -> Option<Self> {
        let digits_start = name
            .char_indices()
            .rev()
            .take_while(|&(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        name[digits_start..].parse().ok().map(Self)
    }
}

impl fmt::Display for MapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map{}", self.0)
    }
}

impl From<u32> for MapIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}
