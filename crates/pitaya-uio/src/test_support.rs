// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Scratch directories and fake sysfs trees for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A directory under the system temp dir, removed on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(tag: &str) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "pitaya-uio-{tag}-{}-{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Writes one `maps/<entry>` directory with the given raw attribute texts.
/// `None` leaves the attribute file out.
pub fn write_map(
    maps: &Path,
    entry: &str,
    name: Option<&str>,
    addr: Option<&str>,
    offset: Option<&str>,
    size: Option<&str>,
) -> PathBuf {
    let dir = maps.join(entry);
    fs::create_dir_all(&dir).unwrap();
    for (attr, value) in [("name", name), ("addr", addr), ("offset", offset), ("size", size)] {
        if let Some(value) = value {
            fs::write(dir.join(attr), format!("{value}\n")).unwrap();
        }
    }
    dir
}
