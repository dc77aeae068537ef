//! VfsBackend port - the callback table registered with the dispatch layer.

use alloc::boxed::Box;

use crate::domain::{
    entities::{DirEntry, Stat},
    error::Errno,
    value_objects::{Descriptor, OpenFlags},
};
use bitflags::bitflags;

bitflags! {
    /// Optional entries a backend provides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// `write`
        const WRITE = 0x0001;
        /// `stat`
        const STAT = 0x0002;
        /// `unlink`
        const UNLINK = 0x0004;
        /// `mkdir`
        const MKDIR = 0x0008;
        /// `rmdir`
        const RMDIR = 0x0010;
        /// `opendir`, `readdir`, `closedir`
        const DIR = 0x0020;
    }
}

/// An open directory stream.
///
/// Owned by the caller between `opendir` and `closedir`; not shared across threads.
pub trait DirStream: Send {
    /// Read the next entry, `Ok(None)` at the end of the directory.
    fn read_entry(&mut self) -> Result<Option<&DirEntry>, Errno>;

    /// Release the stream and its engine cursor.
    fn close(self: Box<Self>) -> Result<(), Errno>;
}

/// The POSIX-call-shaped entry points a backend registers under a mount point.
///
/// Paths are relative to the mount point. Optional entries default to
/// `NotSupported`, which is what the dispatch layer reports for a missing callback.
pub trait VfsBackend: Send + Sync {
    /// Which optional entries this backend provides.
    fn capabilities(&self) -> Capabilities;

    /// `open(path, flags, mode)`
    fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<Descriptor, Errno>;

    /// `close(fd)`
    fn close(&self, fd: Descriptor) -> Result<(), Errno>;

    /// `read(fd, buf, len)`
    fn read(&self, fd: Descriptor, dest: &mut [u8]) -> Result<usize, Errno>;

    /// `write(fd, buf, len)`
    fn write(&self, fd: Descriptor, src: &[u8]) -> Result<usize, Errno> {
        let _ = (fd, src);
        Err(Errno::NotSupported)
    }

    /// `lseek(fd, offset, whence)`
    fn lseek(&self, fd: Descriptor, offset: i64, whence: i32) -> Result<u64, Errno>;

    /// `fsync(fd)`
    fn fsync(&self, fd: Descriptor) -> Result<(), Errno>;

    /// `stat(path)`
    fn stat(&self, path: &str) -> Result<Stat, Errno> {
        let _ = path;
        Err(Errno::NotSupported)
    }

    /// `unlink(path)`
    fn unlink(&self, path: &str) -> Result<(), Errno> {
        let _ = path;
        Err(Errno::NotSupported)
    }

    /// `mkdir(path, mode)`
    fn mkdir(&self, path: &str, mode: u32) -> Result<(), Errno> {
        let _ = (path, mode);
        Err(Errno::NotSupported)
    }

    /// `rmdir(path)`
    fn rmdir(&self, path: &str) -> Result<(), Errno> {
        let _ = path;
        Err(Errno::NotSupported)
    }

    /// `opendir(path)`
    fn opendir(&self, path: &str) -> Result<Box<dyn DirStream>, Errno> {
        let _ = path;
        Err(Errno::NotSupported)
    }

    /// `readdir(dir)`
    fn readdir<'d>(&self, dir: &'d mut dyn DirStream) -> Result<Option<&'d DirEntry>, Errno> {
        dir.read_entry()
    }

    /// `closedir(dir)`
    fn closedir(&self, dir: Box<dyn DirStream>) -> Result<(), Errno> {
        dir.close()
    }
}
