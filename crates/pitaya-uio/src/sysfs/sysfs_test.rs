// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for node resolution and map enumeration through sysfs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::test_support::{ScratchDir, write_map};

/// Fake sysfs root with `class/uio/<name>/maps` and a plain file standing in
/// for the device node.
struct FakeTree {
    scratch: ScratchDir,
    node: PathBuf,
    maps: PathBuf,
}

impl FakeTree {
    fn new(tag: &str, name: &str) -> Self {
        let scratch = ScratchDir::new(tag);
        let node = scratch.path().join("dev").join(name);
        fs::create_dir_all(node.parent().unwrap()).unwrap();
        fs::write(&node, b"").unwrap();
        let maps = scratch.path().join("sys/class/uio").join(name).join(MAPS_DIR);
        fs::create_dir_all(&maps).unwrap();
        Self {
            scratch,
            node,
            maps,
        }
    }

    fn sys(&self) -> PathBuf {
        self.scratch.path().join("sys")
    }

    fn source(&self) -> SysfsMaps {
        SysfsMaps::from_config(&UioConfig::default().with_sysfs_root(self.sys()))
    }
}

// =============================================================================
// Device numbers
// =============================================================================

#[test]
fn split_dev_small_numbers() {
    // makedev(243, 0)
    assert_eq!(split_dev(243 << 8), (243, 0));
    // makedev(1, 3) is /dev/null
    assert_eq!(split_dev((1 << 8) | 3), (1, 3));
}

#[test]
fn split_dev_large_numbers() {
    // makedev(0x1234, 0x56789): minor high bits live above bit 20
    let major: u64 = 0x1234;
    let minor: u64 = 0x5_6789;
    let rdev = ((major & 0xffff_f000) << 32)
        | ((major & 0x0fff) << 8)
        | ((minor & 0xffff_ff00) << 12)
        | (minor & 0xff);
    assert_eq!(split_dev(rdev), (0x1234, 0x5_6789));
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn resolve_plain_file_by_name() {
    let tree = FakeTree::new("resolve-name", "uio0");
    let resolver = SysfsResolver::new(tree.sys());
    let entry = resolver.resolve(&tree.node).unwrap();
    assert_eq!(entry, tree.sys().join("class/uio/uio0"));
}

#[test]
fn resolve_char_device_by_number() {
    let null = Path::new("/dev/null");
    let meta = fs::metadata(null).unwrap();
    let (major, minor) = split_dev(meta.rdev());

    let scratch = ScratchDir::new("resolve-char");
    let entry = scratch.path().join(format!("dev/char/{major}:{minor}"));
    fs::create_dir_all(&entry).unwrap();

    let resolver = SysfsResolver::new(scratch.path());
    assert_eq!(resolver.resolve(null).unwrap(), entry);
}

#[test]
fn resolve_missing_node() {
    let scratch = ScratchDir::new("resolve-missing");
    let resolver = SysfsResolver::new(scratch.path());
    let err = resolver.resolve(&scratch.path().join("uio9")).unwrap_err();
    match err {
        DiscoveryError::Resolve { source, .. } => {
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn resolve_node_without_sysfs_entry() {
    let tree = FakeTree::new("resolve-noentry", "uio0");
    let other = tree.scratch.path().join("dev/uio1");
    fs::write(&other, b"").unwrap();

    let resolver = SysfsResolver::new(tree.sys());
    assert!(matches!(
        resolver.resolve(&other),
        Err(DiscoveryError::Resolve { .. })
    ));
}

// =============================================================================
// Enumeration
// =============================================================================

#[test]
fn single_map_example() {
    let tree = FakeTree::new("enum-one", "uio0");
    write_map(
        &tree.maps,
        "map0",
        Some("ctrl"),
        Some("0x40000000"),
        Some("0x0"),
        Some("0x1000"),
    );

    let maps = tree.source().descriptors(&tree.node).unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0].name(), "ctrl");
    assert_eq!(maps[0].size(), 4096);
}

#[test]
fn enumeration_follows_directory_listing() {
    let tree = FakeTree::new("enum-order", "uio3");
    for (entry, name) in [("map0", "a"), ("map1", "b"), ("map2", "c")] {
        write_map(
            &tree.maps,
            entry,
            Some(name),
            Some("0x40000000"),
            Some("0x0"),
            Some("0x1000"),
        );
    }

    let listed: Vec<String> = fs::read_dir(&tree.maps)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    let found: Vec<String> = tree
        .source()
        .descriptors(&tree.node)
        .unwrap()
        .iter()
        .map(|m| m.index().to_string())
        .collect();
    assert_eq!(found, listed);
}

#[test]
fn missing_maps_dir() {
    let tree = FakeTree::new("enum-nodir", "uio0");
    fs::remove_dir(&tree.maps).unwrap();
    assert!(matches!(
        tree.source().descriptors(&tree.node),
        Err(DiscoveryError::MissingMaps { .. })
    ));
}

#[test]
fn empty_maps_dir() {
    let tree = FakeTree::new("enum-empty", "uio0");
    assert!(matches!(
        tree.source().descriptors(&tree.node),
        Err(DiscoveryError::NoMaps { .. })
    ));
}

#[test]
fn one_bad_map_fails_discovery() {
    let tree = FakeTree::new("enum-bad", "uio0");
    write_map(
        &tree.maps,
        "map0",
        Some("ctrl"),
        Some("0x40000000"),
        Some("0x0"),
        Some("0x1000"),
    );
    write_map(
        &tree.maps,
        "map1",
        Some("data"),
        Some("not-hex"),
        Some("0x0"),
        Some("0x1000"),
    );

    assert!(matches!(
        tree.source().descriptors(&tree.node),
        Err(DiscoveryError::InvalidHex { .. })
    ));
}

#[test]
fn discovery_is_not_cached() {
    let tree = FakeTree::new("enum-fresh", "uio0");
    write_map(
        &tree.maps,
        "map0",
        Some("ctrl"),
        Some("0x40000000"),
        Some("0x0"),
        Some("0x1000"),
    );
    let source = tree.source();
    assert_eq!(source.descriptors(&tree.node).unwrap().len(), 1);

    write_map(
        &tree.maps,
        "map1",
        Some("data"),
        Some("0x40100000"),
        Some("0x0"),
        Some("0x2000"),
    );
    assert_eq!(source.descriptors(&tree.node).unwrap().len(), 2);
}
