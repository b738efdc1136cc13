// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for configuration.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|&(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults() {
    let config = UioConfig::default();
    assert_eq!(config.sysfs_root(), Path::new("/sys"));
    assert_eq!(config.page_size(), system_page_size());
}

#[test]
fn empty_environment_keeps_defaults() {
    let config = UioConfig::from_lookup(lookup_from(&[]));
    assert_eq!(config, UioConfig::default());
}

#[test]
fn environment_overrides() {
    let config = UioConfig::from_lookup(lookup_from(&[
        (ENV_SYSFS_ROOT, "/tmp/fake-sys"),
        (ENV_PAGE_SIZE, "0x10000"),
    ]));
    assert_eq!(config.sysfs_root(), Path::new("/tmp/fake-sys"));
    assert_eq!(config.page_size(), 0x10000);
}

#[test]
fn decimal_page_size() {
    let config = UioConfig::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, " 16384\n")]));
    assert_eq!(config.page_size(), 16384);
}

#[test]
fn invalid_page_size_is_ignored() {
    for raw in ["", "abc", "3000", "0", "0x"] {
        let config = UioConfig::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, raw)]));
        assert_eq!(config.page_size(), system_page_size(), "input {raw:?}");
    }
}

#[test]
fn empty_sysfs_root_is_ignored() {
    let config = UioConfig::from_lookup(lookup_from(&[(ENV_SYSFS_ROOT, "")]));
    assert_eq!(config.sysfs_root(), Path::new(DEFAULT_SYSFS_ROOT));
}

#[test]
fn builder() {
    let config = UioConfig::default()
        .with_sysfs_root("/srv/sys")
        .with_page_size(8192)
        .with_page_size(1000);
    assert_eq!(config.sysfs_root(), Path::new("/srv/sys"));
    assert_eq!(config.page_size(), 8192);
}

#[test]
fn rejected_page_size_keeps_previous_setting() {
    let config = UioConfig::default().with_page_size(3000);
    assert_eq!(config.page_size(), system_page_size());

    let config = UioConfig::default().with_page_size(0x4000).with_page_size(0);
    assert_eq!(config.page_size(), 0x4000);
}
