// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use pitaya_uio::MapIndex;

/// Inspect UIO device maps and peek/poke their registers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Where sysfs is mounted (defaults to $PITAYA_SYSFS_ROOT or /sys)
    #[arg(long, global = true)]
    pub sysfs_root: Option<PathBuf>,

    /// Page size used for map offsets (defaults to the system page size)
    #[arg(long, global = true, value_parser = parse_page_size)]
    pub page_size: Option<usize>,

    /// Log more; repeat for more detail (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do with the device.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a device's maps without opening it
    Maps {
        /// Device node, e.g. /dev/uio0
        device: PathBuf,
    },
    /// Open a device and list its mapped regions
    Info {
        /// Device node, e.g. /dev/uio0
        device: PathBuf,
    },
    /// Read a 32-bit register
    Peek {
        /// Device node, e.g. /dev/uio0
        device: PathBuf,
        /// Map name or index
        region: RegionSelector,
        /// Byte offset within the region
        #[arg(value_parser = parse_number)]
        offset: usize,
    },
    /// Write a 32-bit register
    Poke {
        /// Device node, e.g. /dev/uio0
        device: PathBuf,
        /// Map name or index
        region: RegionSelector,
        /// Byte offset within the region
        #[arg(value_parser = parse_number)]
        offset: usize,
        /// Value to write
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
}

/// A region chosen by index (`0`, `0x1`) or by name (`ctrl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelector {
    /// By map index.
    Index(MapIndex),
    /// By map name.
    Name(String),
}

impl From<&str> for RegionSelector {
    fn from(raw: &str) -> Self {
        parse_number(raw)
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .map_or_else(
                || Self::Name(raw.to_owned()),
                |n| Self::Index(MapIndex::new(n)),
            )
    }
}

impl core::fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// Parses a decimal or `0x`-prefixed hex number.
pub fn parse_number(raw: &str) -> Result<usize, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|err| format!("{raw:?} is not a number: {err}"))
}

/// Parses a 32-bit register value.
pub fn parse_u32(raw: &str) -> Result<u32, String> {
    let value = parse_number(raw)?;
    u32::try_from(value).map_err(|_| format!("{raw:?} does not fit in 32 bits"))
}

/// Parses a page size, which must be a power of two.
pub fn parse_page_size(raw: &str) -> Result<usize, String> {
    let size = parse_number(raw)?;
    if size.is_power_of_two() {
        Ok(size)
    } else {
        Err(format!("{raw:?} is not a power of two"))
    }
}
