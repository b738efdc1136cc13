// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared test infrastructure for integration tests.
//!
//! [`FakeBoard`] lays out, in a scratch directory:
//! - `dev/<name>`: a regular file standing in for the UIO device node
//! - `sys/class/uio/<name>/maps/mapN/{name,addr,offset,size}`: its metadata
//!
//! Pointing [`UioConfig`] at `sys/` lets the real sysfs discovery run
//! against it.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use pitaya_uio::UioConfig;
use pitaya_uio::types::system_page_size;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A fake board with one UIO device, removed on drop.
pub struct FakeBoard {
    root: PathBuf,
    node: PathBuf,
    maps: PathBuf,
}

impl FakeBoard {
    /// Creates a device `name` whose file holds `pages` page slots.
    pub fn new(tag: &str, name: &str, pages: usize) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "pitaya-uio-it-{tag}-{}-{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);

        let node = root.join("dev").join(name);
        let maps = root.join("sys/class/uio").join(name).join("maps");
        fs::create_dir_all(node.parent().unwrap()).unwrap();
        fs::create_dir_all(&maps).unwrap();
        fs::write(&node, vec![0u8; pages * system_page_size()]).unwrap();

        Self { root, node, maps }
    }

    /// Adds a well-formed map entry `mapN`.
    pub fn with_map(self, index: u32, name: &str, addr: u64, offset: u64, size: u64) -> Self {
        self.with_raw_map(
            &format!("map{index}"),
            &[
                ("name", name),
                ("addr", format!("{addr:#x}").as_str()),
                ("offset", format!("{offset:#x}").as_str()),
                ("size", format!("{size:#x}").as_str()),
            ],
        )
    }

    /// Adds a map entry with arbitrary attribute files.
    pub fn with_raw_map(self, entry: &str, attrs: &[(&str, &str)]) -> Self {
        let dir = self.maps.join(entry);
        fs::create_dir_all(&dir).unwrap();
        for (attr, value) in attrs {
            fs::write(dir.join(attr), format!("{value}\n")).unwrap();
        }
        self
    }

    /// The fake device node.
    pub fn node(&self) -> &Path {
        &self.node
    }

    /// The `maps` directory.
    pub fn maps_dir(&self) -> &Path {
        &self.maps
    }

    /// Configuration pointing discovery at this board's sysfs tree.
    pub fn config(&self) -> UioConfig {
        UioConfig::default().with_sysfs_root(self.root.join("sys"))
    }

    /// Number of live mappings of the device file in this process.
    pub fn live_mappings(&self) -> usize {
        let needle = self.node.to_str().unwrap();
        fs::read_to_string("/proc/self/maps")
            .unwrap()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Current contents of the device file.
    pub fn contents(&self) -> Vec<u8> {
        fs::read(&self.node).unwrap()
    }
}

impl Drop for FakeBoard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
