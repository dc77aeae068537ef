//! DMA-capable cache buffers handed to the engine.
//!
//! The buffers are built from 4-byte-aligned chunks of [`MIN_GRANULARITY`] bytes. The
//! derived cache size is always a power-of-two multiple of that granularity, so the
//! chunks tile the buffer exactly.

use alloc::vec::Vec;
use aligned::{A4, Aligned};

use crate::domain::value_objects::{Geometry, MIN_GRANULARITY};

const CHUNK: usize = MIN_GRANULARITY as usize;

type Chunk = Aligned<A4, [u8; CHUNK]>;

/// A word-aligned byte buffer suitable for DMA transfers.
pub struct DmaBuffer {
    chunks: Vec<Chunk>,
}

impl DmaBuffer {
    /// Try to allocate a zeroed buffer of `len` bytes, rounded up to the chunk size.
    ///
    /// Returns `None` if the allocation fails.
    pub fn try_new(len: usize) -> Option<Self> {
        let count = len.div_ceil(CHUNK);
        let mut chunks = Vec::new();
        chunks.try_reserve_exact(count).ok()?;
        for _ in 0..count {
            chunks.push(Aligned([0u8; CHUNK]));
        }
        Some(Self { chunks })
    }

    /// Buffer length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len() * CHUNK
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// View the buffer as bytes.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `Aligned<A4, [u8; CHUNK]>` is `repr(C)` with size `CHUNK` (a multiple
        // of its alignment), so the chunks are contiguous initialized bytes.
        unsafe { core::slice::from_raw_parts(self.chunks.as_ptr().cast::<u8>(), self.len()) }
    }

    /// View the buffer as mutable bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len();
        // SAFETY: see `as_slice`; the exclusive borrow covers every chunk.
        unsafe { core::slice::from_raw_parts_mut(self.chunks.as_mut_ptr().cast::<u8>(), len) }
    }
}

impl core::fmt::Debug for DmaBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaBuffer").field("len", &self.len()).finish()
    }
}

/// The engine's read and program caches.
///
/// Either buffer may be missing; the engine then allocates its own.
#[derive(Debug, Default)]
pub struct CacheBuffers {
    /// Read cache, `cache_size` bytes.
    pub read: Option<DmaBuffer>,
    /// Program cache, `cache_size` bytes.
    pub prog: Option<DmaBuffer>,
}

impl CacheBuffers {
    /// Allocate both caches for `geometry`, best effort.
    ///
    /// A failed allocation is logged and leaves that cache unset.
    pub fn allocate(geometry: &Geometry) -> Self {
        let size = geometry.cache_size() as usize;
        let read = DmaBuffer::try_new(size);
        let prog = DmaBuffer::try_new(size);

        match &read {
            Some(_) => log::info!(target: "lfs_vfs::geometry", "allocated a DMA-capable read cache ({} bytes)", size),
            None => log::warn!(target: "lfs_vfs::geometry", "no DMA-capable read cache; engine will allocate its own"),
        }
        match &prog {
            Some(_) => log::info!(target: "lfs_vfs::geometry", "allocated a DMA-capable program cache ({} bytes)", size),
            None => log::warn!(target: "lfs_vfs::geometry", "no DMA-capable program cache; engine will allocate its own"),
        }

        Self { read, prog }
    }

    /// No caches; the engine allocates internally.
    pub const fn none() -> Self {
        Self {
            read: None,
            prog: None,
        }
    }
}
