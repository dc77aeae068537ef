//! Adapter exposing a mounted engine as a POSIX-shaped VFS backend.
//!
//! Every entry point resolves its descriptor through the [`DescriptorTable`], calls the
//! engine, and translates engine errors to [`Errno`] exactly once, on the way out.

use alloc::{boxed::Box, sync::Arc};

use crate::domain::{
    entities::{DirEntry, Stat, NAME_MAX},
    error::Errno,
    ports::{Capabilities, DirStream, FsEngine, RawLock, SpinRawMutex, VfsBackend},
    value_objects::{Descriptor, OpenFlags, Whence},
    DescriptorTable, MAX_FILES,
};

const TARGET: &str = "lfs_vfs::vfs";

/// Longest directory-entry name reported for engine `E`.
#[inline]
const fn name_limit<E: FsEngine>() -> usize {
    if E::NAME_MAX < NAME_MAX {
        E::NAME_MAX
    } else {
        NAME_MAX
    }
}

/// VFS backend over a mounted filesystem engine.
///
/// # Type Parameters
///
/// - `E`: The mounted engine (must implement [`FsEngine`])
/// - `N`: Maximum number of simultaneously open files
/// - `R`: Raw mutex guarding each descriptor slot, a spinlock by default
///
/// # Examples
///
/// ```ignore
/// let engine = Arc::new(MyEngine::mount(device, config)?);
/// let vfs = VfsAdapter::<_>::new(engine);
///
/// let fd = vfs.open("/hello.txt", OpenFlags::WRONLY | OpenFlags::CREAT, 0o644)?;
/// vfs.write(fd, b"hello")?;
/// vfs.close(fd)?;
/// ```
pub struct VfsAdapter<E: FsEngine, const N: usize = MAX_FILES, R: RawLock = SpinRawMutex> {
    engine: Arc<E>,
    files: DescriptorTable<E::File, N, R>,
}

impl<E: FsEngine, const N: usize, R: RawLock> VfsAdapter<E, N, R> {
    /// Wrap a mounted engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            files: DescriptorTable::with_raw_mutex(),
        }
    }

    /// The mounted engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Number of descriptors currently allocated.
    pub fn open_files(&self) -> usize {
        self.files.in_use()
    }

    /// Close every open descriptor, flushing its file through the engine.
    ///
    /// Descriptors stay closed even when the engine fails to close the file. Returns how
    /// many were closed.
    pub fn close_all(&self) -> usize {
        self.files.drain(|fd, file| {
            if let Err(err) = self.engine.file_close(file) {
                log::warn!(target: TARGET, "closing {} failed: {}", fd, err);
            }
        })
    }
}

impl<E: FsEngine, const N: usize, R: RawLock> VfsBackend for VfsAdapter<E, N, R> {
    fn capabilities(&self) -> Capabilities {
        #[cfg(not(feature = "readonly"))]
        {
            Capabilities::all()
        }
        #[cfg(feature = "readonly")]
        {
            Capabilities::STAT | Capabilities::DIR
        }
    }

    fn open(&self, path: &str, flags: OpenFlags, _mode: u32) -> Result<Descriptor, Errno> {
        let engine_flags = flags.to_engine()?;
        let fd = self.files.allocate()?;

        match self.engine.file_open(path, engine_flags) {
            Ok(file) => match self.files.install(fd, file) {
                Ok(()) => {
                    log::debug!(target: TARGET, "open {} as {}", path, fd);
                    Ok(fd)
                }
                Err(file) => {
                    log::warn!(target: TARGET, "{} was closed while {} was opening", fd, path);
                    self.engine.file_close(file)?;
                    Err(Errno::BadDescriptor)
                }
            },
            Err(err) => {
                self.files.release(fd)?;
                log::debug!(target: TARGET, "open {} failed: {}", path, err);
                Err(err.into())
            }
        }
    }

    fn close(&self, fd: Descriptor) -> Result<(), Errno> {
        let file = self.files.release(fd)?.ok_or(Errno::BadDescriptor)?;
        self.engine.file_close(file)?;
        log::debug!(target: TARGET, "close {}", fd);
        Ok(())
    }

    fn read(&self, fd: Descriptor, dest: &mut [u8]) -> Result<usize, Errno> {
        let read = self.files.resolve(fd, |file| self.engine.file_read(file, dest))??;
        Ok(read)
    }

    #[cfg(not(feature = "readonly"))]
    fn write(&self, fd: Descriptor, src: &[u8]) -> Result<usize, Errno> {
        let written = self.files.resolve(fd, |file| self.engine.file_write(file, src))??;
        Ok(written)
    }

    fn lseek(&self, fd: Descriptor, offset: i64, whence: i32) -> Result<u64, Errno> {
        let whence = Whence::from_raw(whence)?;
        let pos = self
            .files
            .resolve(fd, |file| self.engine.file_seek(file, offset, whence.into()))??;
        Ok(pos)
    }

    fn fsync(&self, fd: Descriptor) -> Result<(), Errno> {
        self.files.resolve(fd, |file| self.engine.file_sync(file))??;
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<Stat, Errno> {
        let info = self.engine.stat(path)?;
        Ok(Stat::new(info.kind, info.size))
    }

    #[cfg(not(feature = "readonly"))]
    fn unlink(&self, path: &str) -> Result<(), Errno> {
        self.engine.remove(path)?;
        Ok(())
    }

    #[cfg(not(feature = "readonly"))]
    fn mkdir(&self, path: &str, _mode: u32) -> Result<(), Errno> {
        self.engine.mkdir(path)?;
        Ok(())
    }

    #[cfg(not(feature = "readonly"))]
    fn rmdir(&self, path: &str) -> Result<(), Errno> {
        self.engine.remove(path)?;
        Ok(())
    }

    fn opendir(&self, path: &str) -> Result<Box<dyn DirStream>, Errno> {
        let dir = self.engine.dir_open(path)?;
        Ok(Box::new(LfsDirStream {
            engine: Arc::clone(&self.engine),
            dir: Some(dir),
            entry: DirEntry::new(),
        }))
    }
}

/// Directory stream over an engine directory cursor.
///
/// The entry buffer is reused by every `read_entry` call. Dropping the stream without
/// `close` still releases the cursor.
pub struct LfsDirStream<E: FsEngine> {
    engine: Arc<E>,
    dir: Option<E::Dir>,
    entry: DirEntry,
}

impl<E: FsEngine> DirStream for LfsDirStream<E> {
    fn read_entry(&mut self) -> Result<Option<&DirEntry>, Errno> {
        let dir = self.dir.as_mut().ok_or(Errno::BadDescriptor)?;
        match self.engine.dir_read(dir)? {
            Some(info) => {
                self.entry.fill(&info.name, info.kind, name_limit::<E>());
                Ok(Some(&self.entry))
            }
            None => Ok(None),
        }
    }

    fn close(mut self: Box<Self>) -> Result<(), Errno> {
        match self.dir.take() {
            Some(dir) => Ok(self.engine.dir_close(dir)?),
            None => Ok(()),
        }
    }
}

impl<E: FsEngine> Drop for LfsDirStream<E> {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(err) = self.engine.dir_close(dir) {
                log::warn!(target: TARGET, "closing dropped directory stream: {}", err);
            }
        }
    }
}
