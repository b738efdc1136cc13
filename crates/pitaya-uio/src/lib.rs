// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Pitaya UIO
//!
//! Exclusive, memory-mapped access to Linux userspace-I/O devices.
//!
//! On the FPGA boards this targets, every IP block in the programmable
//! logic is exposed by the kernel as a `/dev/uioN` node. This crate:
//! - Opens a node and takes an exclusive, non-blocking advisory lock on it
//! - Discovers the node's memory maps from sysfs (`maps/mapN`)
//! - Maps every map shared and read-write into the process
//! - Unmaps and unlocks deterministically when the handle is released
//!
//! ```no_run
//! use pitaya_uio::DeviceHandle;
//!
//! let mut dev = DeviceHandle::open("/dev/uio0")?;
//! let ctrl = dev.region_mut("ctrl").expect("board has a ctrl map");
//! ctrl.write_u32(0x0, 1)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`device`]: [`DeviceHandle`] acquisition and release
//! - [`region`]: [`MappedRegion`] volatile access
//! - [`sysfs`]: map discovery ([`MapSource`], [`MapDescriptor`])
//! - [`config`]: sysfs root and page size settings
//! - [`error`]: error taxonomy

pub mod config;
pub mod device;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod region;
pub mod sysfs;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root
pub use config::UioConfig;
pub use device::DeviceHandle;
pub use error::{AccessError, DiscoveryError, ErrorKind, TeardownError, UioError};
pub use region::MappedRegion;
pub use sysfs::{MapDescriptor, MapSource, NodeResolver, SysfsMaps, SysfsResolver};
pub use types::{MapIndex, PhysAddr};
