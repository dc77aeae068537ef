//! FsEngine port - the block-oriented filesystem engine.

use alloc::{string::String, sync::Arc};

use crate::domain::{
    cache_buffers::CacheBuffers,
    entities::{FileType, NAME_MAX},
    error::EngineError,
    ports::BlockDevice,
    value_objects::{EngineOpenFlags, EngineWhence, Geometry},
};

/// Information about one entry, as returned by `stat` and `dir_read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    /// Entry type.
    pub kind: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Entry name, without the parent path.
    pub name: String,
}

/// Everything the engine is configured with at format and mount time.
#[derive(Debug)]
pub struct EngineConfig {
    /// Derived device geometry.
    pub geometry: Geometry,
    /// Optional caller-provided read and program caches.
    pub buffers: CacheBuffers,
}

impl EngineConfig {
    /// Configuration for a geometry and its cache buffers.
    pub fn new(geometry: Geometry, buffers: CacheBuffers) -> Self {
        Self { geometry, buffers }
    }
}

/// Port for the filesystem engine.
///
/// The engine is an external component; this is the capability set the adapter calls.
/// Each operation returns the engine's own error, which the VFS adapter translates.
/// The engine is expected to take [`BlockDevice::lock`] around each logical operation.
pub trait FsEngine: Send + Sync + Sized + 'static {
    /// Open-file state, stored in a descriptor slot.
    type File: Send + 'static;
    /// Directory cursor, stored in a directory stream.
    type Dir: Send + 'static;

    /// Longest entry name the engine stores.
    const NAME_MAX: usize = NAME_MAX;

    /// Write an empty filesystem to the device.
    fn format(device: &dyn BlockDevice, config: &mut EngineConfig) -> Result<(), EngineError>;

    /// Mount the filesystem on the device. The engine keeps the device and the config.
    fn mount(device: Arc<dyn BlockDevice>, config: EngineConfig) -> Result<Self, EngineError>;

    /// Flush and release all engine state.
    fn unmount(&self) -> Result<(), EngineError>;

    /// Open a file.
    fn file_open(&self, path: &str, flags: EngineOpenFlags) -> Result<Self::File, EngineError>;

    /// Close a file, writing back any pending data.
    fn file_close(&self, file: Self::File) -> Result<(), EngineError>;

    /// Read from the current position; returns the number of bytes read.
    fn file_read(&self, file: &mut Self::File, dest: &mut [u8]) -> Result<usize, EngineError>;

    /// Write at the current position; returns the number of bytes written.
    fn file_write(&self, file: &mut Self::File, src: &[u8]) -> Result<usize, EngineError>;

    /// Move the file position; returns the new position.
    fn file_seek(
        &self,
        file: &mut Self::File,
        offset: i64,
        whence: EngineWhence,
    ) -> Result<u64, EngineError>;

    /// Write back pending data of an open file.
    fn file_sync(&self, file: &mut Self::File) -> Result<(), EngineError>;

    /// Open a directory cursor.
    fn dir_open(&self, path: &str) -> Result<Self::Dir, EngineError>;

    /// Read the next entry; `None` at the end of the directory.
    fn dir_read(&self, dir: &mut Self::Dir) -> Result<Option<EngineInfo>, EngineError>;

    /// Release a directory cursor.
    fn dir_close(&self, dir: Self::Dir) -> Result<(), EngineError>;

    /// Look up an entry.
    fn stat(&self, path: &str) -> Result<EngineInfo, EngineError>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &str) -> Result<(), EngineError>;

    /// Create a directory.
    fn mkdir(&self, path: &str) -> Result<(), EngineError>;
}
