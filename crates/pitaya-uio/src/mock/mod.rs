// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! In-memory map source for testing.
//!
//! [`MockMaps`] answers discovery from a list held in memory, so device
//! logic can be exercised against an ordinary file without a sysfs tree.


use std::cell::Cell;
use std::path::Path;

use crate::error::DiscoveryError;
use crate::sysfs::{MapDescriptor, MapSource};
use crate::types::{MapIndex, PhysAddr};

/// One map as the fake platform reports it.
#[derive(Debug, Clone)]
struct MockMap {
    index: MapIndex,
    name: String,
    addr: u64,
    offset: u64,
    size: u64,
}

/// A [`MapSource`] serving a fixed list of maps for any device node.
///
/// Maps are reported in insertion order. A zero size is reported as a
/// discovery error, exactly as the sysfs source would.
#[derive(Debug, Default)]
pub struct MockMaps {
    maps: Vec<MockMap>,
    failure: Option<String>,
    calls: Cell<usize>,
}

impl MockMaps {
    /// Creates a source with no maps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a map.
    #[must_use]
    pub fn with_map(
        mut self,
        index: u32,
        name: impl Into<String>,
        addr: u64,
        offset: u64,
        size: u64,
    ) -> Self {
        self.maps.push(MockMap {
            index: MapIndex::new(index),
            name: name.into(),
            addr,
            offset,
            size,
        });
        self
    }

    /// Makes every discovery fail as if the first map's `size` attribute
    /// held `value`.
    #[must_use]
    pub fn failing_with_invalid_hex(mut self, value: impl Into<String>) -> Self {
        self.failure = Some(value.into());
        self
    }

    /// Number of times discovery has run.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MapSource for MockMaps {
    fn descriptors(&self, node: &Path) -> Result<Vec<MapDescriptor>, DiscoveryError> {
        self.calls.set(self.calls.get() + 1);

        let entry = |index: MapIndex| node.join("maps").join(index.to_string());

        if let Some(value) = &self.failure {
            return Err(DiscoveryError::InvalidHex {
                path: entry(MapIndex::new(0)).join("size"),
                value: value.clone(),
            });
        }
        if self.maps.is_empty() {
            return Err(DiscoveryError::NoMaps {
                dir: node.join("maps"),
            });
        }

        self.maps
            .iter()
            .map(|map| {
                MapDescriptor::new(
                    map.index,
                    map.name.clone(),
                    PhysAddr::new(map.addr),
                    map.offset,
                    map.size,
                )
                .ok_or_else(|| DiscoveryError::ZeroSize {
                    entry: entry(map.index),
                })
            })
            .collect()
    }
}
