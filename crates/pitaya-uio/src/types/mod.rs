// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Small value types shared by discovery and mapping.
//!
//! These newtypes keep physical addresses, map indices and byte offsets
//! from being mixed up at compile time.

mod addr;
mod index;
mod page;


pub use addr::PhysAddr;
pub use index::MapIndex;
pub use page::system_page_size;
