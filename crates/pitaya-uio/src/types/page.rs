// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! System page size.

/// Page size assumed when the system refuses to report one.
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Returns the page size the kernel uses for `mmap` offsets.
#[must_use]
pub fn system_page_size() -> usize {
    // SAFETY: sysconf has no preconditions and only reads process state.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(raw)
        .ok()
        .filter(|size| size.is_power_of_two())
        .unwrap_or(FALLBACK_PAGE_SIZE)
}
