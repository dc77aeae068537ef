//! `embedded_io` stream over an open descriptor.
//!
//! Bridges a backend's descriptor entry points to the `embedded_io` ecosystem, so an
//! open file can be handed to anything that takes `Read + Write + Seek`.

use alloc::sync::Arc;
use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

use crate::domain::{
    error::Errno,
    ports::VfsBackend,
    value_objects::{Descriptor, OpenFlags},
};

const SEEK_SET: i32 = 0;
const SEEK_CUR: i32 = 1;
const SEEK_END: i32 = 2;

/// An open file as an `embedded_io` stream.
///
/// Dropping the stream closes the descriptor; use [`close`](Self::close) to observe the
/// result.
///
/// # Examples
///
/// ```ignore
/// use embedded_io::{Read, Write};
///
/// let mut file = FileStream::open(mount.backend().clone(), "/log.txt", OpenFlags::RDWR | OpenFlags::CREAT)?;
/// file.write_all(b"boot\n")?;
/// file.flush()?;
/// ```
pub struct FileStream<B: VfsBackend + ?Sized = dyn VfsBackend> {
    backend: Arc<B>,
    fd: Option<Descriptor>,
}

impl<B: VfsBackend + ?Sized> FileStream<B> {
    /// Open `path` on `backend`.
    pub fn open(backend: Arc<B>, path: &str, flags: OpenFlags) -> Result<Self, Errno> {
        let fd = backend.open(path, flags, 0)?;
        Ok(Self::from_descriptor(backend, fd))
    }

    /// Take ownership of a descriptor already open on `backend`.
    pub fn from_descriptor(backend: Arc<B>, fd: Descriptor) -> Self {
        Self {
            backend,
            fd: Some(fd),
        }
    }

    /// The descriptor behind the stream.
    pub fn descriptor(&self) -> Option<Descriptor> {
        self.fd
    }

    /// Close the descriptor.
    pub fn close(mut self) -> Result<(), Errno> {
        match self.fd.take() {
            Some(fd) => self.backend.close(fd),
            None => Ok(()),
        }
    }

    fn fd(&self) -> Result<Descriptor, Errno> {
        self.fd.ok_or(Errno::BadDescriptor)
    }
}

impl<B: VfsBackend + ?Sized> Drop for FileStream<B> {
    fn drop(&mut self) {
        if let Some(fd) = self.fd.take() {
            if let Err(err) = self.backend.close(fd) {
                log::warn!(target: "lfs_vfs::stream", "closing dropped stream {}: {}", fd, err);
            }
        }
    }
}

impl<B: VfsBackend + ?Sized> ErrorType for FileStream<B> {
    type Error = Errno;
}

impl<B: VfsBackend + ?Sized> Read for FileStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.backend.read(self.fd()?, buf)
    }
}

impl<B: VfsBackend + ?Sized> Write for FileStream<B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.backend.write(self.fd()?, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.backend.fsync(self.fd()?)
    }
}

impl<B: VfsBackend + ?Sized> Seek for FileStream<B> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let (offset, whence) = match pos {
            SeekFrom::Start(n) => (i64::try_from(n).map_err(|_| Errno::InvalidArgument)?, SEEK_SET),
            SeekFrom::Current(n) => (n, SEEK_CUR),
            SeekFrom::End(n) => (n, SEEK_END),
        };
        self.backend.lseek(self.fd()?, offset, whence)
    }
}
