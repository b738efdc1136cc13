// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Live memory mappings of UIO maps.
//!
//! A [`MappedRegion`] aliases device memory: loads and stores through it
//! reach the hardware, may have side effects, and are never cached by the
//! compiler. Every access is volatile. Typed accesses are bounds-checked and
//! must be naturally aligned; byte copies are bounds-checked and move one
//! byte per access.


use core::ffi::c_void;
use core::mem::{align_of, size_of};
use core::ptr::{self, NonNull};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};

use crate::error::{AccessError, TeardownFailure};
use crate::sysfs::MapDescriptor;
use crate::types::MapIndex;

/// A shared, read-write mapping of one UIO map.
///
/// Regions are only reachable through their owning
/// [`DeviceHandle`](crate::DeviceHandle), so a region can never outlive the
/// device file it maps. The mapping is removed on drop.
pub struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
    index: MapIndex,
    name: String,
    live: bool,
}

// SAFETY: the region exclusively owns its mapping; nothing in it is tied to
// the creating thread. It is not `Sync`: stores need `&mut self`.
unsafe impl Send for MappedRegion {}

impl MappedRegion {
    /// Maps `map` from the device file `fd`.
    ///
    /// The file offset is `index * page_size`; the kernel uses it only to
    /// select the map. Sizes or offsets that do not fit this platform fail
    /// with `EOVERFLOW`.
    pub(crate) fn map(
        fd: BorrowedFd<'_>,
        map: &MapDescriptor,
        page_size: usize,
    ) -> io::Result<Self> {
        let overflow = || io::Error::from_raw_os_error(libc::EOVERFLOW);
        let len = usize::try_from(map.size()).map_err(|_| overflow())?;
        let offset = map
            .index()
            .file_offset(page_size)
            .and_then(|offset| libc::off_t::try_from(offset).ok())
            .ok_or_else(overflow)?;

        // SAFETY: a fresh shared mapping at a kernel-chosen address; it
        // aliases no Rust object. `fd` is open for the duration of the call.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                offset,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let ptr = adopt_mapping(addr, len)?;

        tracing::debug!(
            index = map.index().as_u32(),
            name = map.name(),
            len,
            offset,
            ptr = ?ptr,
            "mapped"
        );

        Ok(Self {
            ptr,
            len,
            index: map.index(),
            name: map.name().to_owned(),
            live: true,
        })
    }

    /// Index of the map this region was built from.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> MapIndex {
        self.index
    }

    /// Name of the map this region was built from.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapping length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: zero-sized maps are rejected during discovery.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mapping length as declared by the platform.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.len as u64
    }

    /// Start of the mapping.
    ///
    /// The pointer is valid for `len()` bytes while the owning device is
    /// open. Accesses through it are device accesses.
    #[inline]
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Mutable start of the mapping. See [`as_ptr`](Self::as_ptr).
    #[inline]
    #[must_use]
    pub const fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    // =========================================================================
    // Volatile access
    // =========================================================================

    fn check<T>(&self, offset: usize) -> Result<(), AccessError> {
        let len = size_of::<T>();
        self.check_span(offset, len)?;
        let align = align_of::<T>();
        if offset % align != 0 {
            return Err(AccessError::Misaligned { offset, align });
        }
        Ok(())
    }

    fn check_span(&self, offset: usize, len: usize) -> Result<(), AccessError> {
        if offset.checked_add(len).is_none_or(|end| end > self.len) {
            return Err(AccessError::OutOfBounds {
                offset,
                len,
                size: self.len,
            });
        }
        Ok(())
    }

    fn read<T: Copy>(&self, offset: usize) -> Result<T, AccessError> {
        self.check::<T>(offset)?;
        let src = self.ptr.as_ptr().wrapping_add(offset).cast::<T>();
        // SAFETY: bounds and alignment checked above; the mapping is page
        // aligned and live for `&self`.
        let value = unsafe { src.read_volatile() };
        Ok(value)
    }

    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "stores through the mapping need exclusive access"
    )]
    fn write<T: Copy>(&mut self, offset: usize, value: T) -> Result<(), AccessError> {
        self.check::<T>(offset)?;
        let dst = self.ptr.as_ptr().wrapping_add(offset).cast::<T>();
        // SAFETY: bounds and alignment checked above; `&mut self` excludes
        // other accesses through this region.
        unsafe { dst.write_volatile(value) };
        Ok(())
    }

    /// Reads a byte at `offset`.
    pub fn read_u8(&self, offset: usize) -> Result<u8, AccessError> {
        self.read(offset)
    }

    /// Reads a 16-bit word at `offset`.
    pub fn read_u16(&self, offset: usize) -> Result<u16, AccessError> {
        self.read(offset)
    }

    /// Reads a 32-bit register at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32, AccessError> {
        let value = self.read(offset)?;
        tracing::trace!(region = %self.name, "read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    /// Reads a 64-bit word at `offset`.
    pub fn read_u64(&self, offset: usize) -> Result<u64, AccessError> {
        self.read(offset)
    }

    /// Writes a byte at `offset`.
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), AccessError> {
        self.write(offset, value)
    }

    /// Writes a 16-bit word at `offset`.
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), AccessError> {
        self.write(offset, value)
    }

    /// Writes a 32-bit register at `offset`.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), AccessError> {
        tracing::trace!(region = %self.name, "write u32 @ {offset:#x} = {value:#x}");
        self.write(offset, value)
    }

    /// Writes a 64-bit word at `offset`.
    pub fn write_u64(&mut self, offset: usize, value: u64) -> Result<(), AccessError> {
        self.write(offset, value)
    }

    /// Copies `buf.len()` bytes starting at `offset` out of the region, one
    /// volatile byte load each.
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) -> Result<(), AccessError> {
        self.check_span(offset, buf.len())?;
        let base = self.ptr.as_ptr().wrapping_add(offset);
        for (i, byte) in buf.iter_mut().enumerate() {
            // SAFETY: `offset + i` lies inside the span checked above.
            *byte = unsafe { base.wrapping_add(i).read_volatile() };
        }
        Ok(())
    }

    /// Copies `data` into the region starting at `offset`, one volatile
    /// byte store each.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), AccessError> {
        self.check_span(offset, data.len())?;
        let base = self.ptr.as_ptr().wrapping_add(offset);
        for (i, &byte) in data.iter().enumerate() {
            // SAFETY: `offset + i` lies inside the span checked above, and
            // `&mut self` excludes other accesses through this region.
            unsafe { base.wrapping_add(i).write_volatile(byte) };
        }
        Ok(())
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Removes the mapping, reporting failure.
    pub fn unmap(mut self) -> Result<(), TeardownFailure> {
        self.release().map_err(|source| TeardownFailure::Unmap {
            name: self.name.clone(),
            index: self.index,
            size: self.size(),
            source,
        })
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.live {
            return Ok(());
        }
        self.live = false;
        // SAFETY: `ptr`/`len` are exactly what `mmap` returned, and the
        // mapping has not been removed yet (`live` was set).
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc == 0 {
            tracing::debug!(index = self.index.as_u32(), name = %self.name, "unmapped");
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// Takes ownership of a successful `mmap` result.
///
/// A mapping placed at address zero cannot be held in a `NonNull`; it is
/// unmapped again and reported as an error.
fn adopt_mapping(addr: *mut c_void, len: usize) -> io::Result<NonNull<u8>> {
    if let Some(ptr) = NonNull::new(addr.cast::<u8>()) {
        return Ok(ptr);
    }
    // SAFETY: `addr`/`len` describe the mapping `mmap` just created; nothing
    // else refers to it.
    let rc = unsafe { libc::munmap(addr, len) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        tracing::debug!("munmap of null mapping failed: {err}");
    }
    Err(io::Error::other("mmap placed the mapping at address zero"))
}

impl core::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("len", &format_args!("{:#x}", self.len))
            .field("ptr", &self.ptr)
            .field("live", &self.live)
            .finish()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(index = self.index.as_u32(), name = %self.name, "munmap failed: {err}");
        }
    }
}
