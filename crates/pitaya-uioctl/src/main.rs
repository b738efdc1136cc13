// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `uioctl`: inspect UIO device maps and peek/poke their registers.
//!
//! ```text
//! uioctl maps /dev/uio0
//! uioctl info /dev/uio0
//! uioctl peek /dev/uio0 ctrl 0x10
//! uioctl poke /dev/uio0 0 0x10 0xdeadbeef
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` or pass `-v` for more detail.

mod args;


use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use pitaya_uio::{DeviceHandle, MapSource, MappedRegion, SysfsMaps, UioConfig};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, RegionSelector};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn config(args: &Args) -> UioConfig {
    let mut config = UioConfig::from_env();
    if let Some(root) = &args.sysfs_root {
        config = config.with_sysfs_root(root);
    }
    if let Some(size) = args.page_size {
        config = config.with_page_size(size);
    }
    config
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = config(args);
    let mut out = io::stdout().lock();

    match &args.command {
        Command::Maps { device } => {
            let maps = SysfsMaps::from_config(&config).descriptors(device)?;
            writeln!(
                out,
                "MAP    NAME                     ADDR     OFFSET       SIZE"
            )?;
            for map in &maps {
                writeln!(
                    out,
                    "{:<6} {:<16} {:>12} {:>#10x} {:>#10x}",
                    map.index().to_string(),
                    map.name(),
                    map.addr().to_string(),
                    map.offset(),
                    map.size()
                )?;
            }
        }
        Command::Info { device } => {
            let dev = DeviceHandle::open_with(device, &SysfsMaps::from_config(&config), &config)?;
            writeln!(
                out,
                "{}: {} region(s), page size {:#x}",
                dev.path().display(),
                dev.regions().len(),
                config.page_size()
            )?;
            for region in dev.regions() {
                writeln!(
                    out,
                    "  {:<6} {:<16} {:>#10x} at {:p}",
                    region.index().to_string(),
                    region.name(),
                    region.len(),
                    region.as_ptr()
                )?;
            }
            dev.close()?;
        }
        Command::Peek {
            device,
            region,
            offset,
        } => {
            let dev = DeviceHandle::open_with(device, &SysfsMaps::from_config(&config), &config)?;
            let value = select(&dev, region)?.read_u32(*offset)?;
            writeln!(out, "{value:#010x}")?;
            dev.close()?;
        }
        Command::Poke {
            device,
            region,
            offset,
            value,
        } => {
            let mut dev =
                DeviceHandle::open_with(device, &SysfsMaps::from_config(&config), &config)?;
            select_mut(&mut dev, region)?.write_u32(*offset, *value)?;
            tracing::info!(region = %region, offset, value, "wrote");
            dev.close()?;
        }
    }

    Ok(())
}

fn select<'a>(
    dev: &'a DeviceHandle,
    selector: &RegionSelector,
) -> Result<&'a MappedRegion, String> {
    match selector {
        RegionSelector::Index(index) => dev.region_by_index(*index),
        RegionSelector::Name(name) => dev.region(name),
    }
    .ok_or_else(|| no_such_region(dev, selector))
}

fn select_mut<'a>(
    dev: &'a mut DeviceHandle,
    selector: &RegionSelector,
) -> Result<&'a mut MappedRegion, String> {
    // Looked up immutably first so the error message can list the regions.
    select(dev, selector)?;
    match selector {
        RegionSelector::Index(index) => dev.region_by_index_mut(*index),
        RegionSelector::Name(name) => dev.region_mut(name),
    }
    .ok_or_else(|| format!("no region {selector}"))
}

fn no_such_region(dev: &DeviceHandle, selector: &RegionSelector) -> String {
    let known: Vec<String> = dev
        .regions()
        .iter()
        .map(|r| format!("{} ({})", r.index(), r.name()))
        .collect();
    format!(
        "{} has no region {selector}; known: {}",
        dev.path().display(),
        known.join(", ")
    )
}
