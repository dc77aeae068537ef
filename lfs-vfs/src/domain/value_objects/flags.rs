//! Open, seek and mount flags in their POSIX and engine encodings.

use crate::domain::error::Errno;
use bitflags::bitflags;

bitflags! {
    /// POSIX `open()` flags as passed by the dispatch layer (newlib values).
    ///
    /// The access mode occupies the low two bits; read-only is `0`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// `O_WRONLY`
        const WRONLY = 0x0001;
        /// `O_RDWR`
        const RDWR = 0x0002;
        /// `O_APPEND`
        const APPEND = 0x0008;
        /// `O_CREAT`
        const CREAT = 0x0200;
        /// `O_TRUNC`
        const TRUNC = 0x0400;
        /// `O_EXCL`
        const EXCL = 0x0800;
    }
}

impl OpenFlags {
    /// `O_RDONLY`
    pub const RDONLY: Self = Self::empty();

    /// `O_ACCMODE` mask.
    pub const ACCMODE: u32 = 0x0003;

    /// Decode the access mode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when both access bits are set.
    pub const fn access_mode(self) -> Result<AccessMode, Errno> {
        match self.bits() & Self::ACCMODE {
            0 => Ok(AccessMode::ReadOnly),
            1 => Ok(AccessMode::WriteOnly),
            2 => Ok(AccessMode::ReadWrite),
            _ => Err(Errno::InvalidArgument),
        }
    }

    /// Translate to the engine's flag set.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfs_vfs::{EngineOpenFlags, OpenFlags};
    ///
    /// let flags = (OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::TRUNC).to_engine().unwrap();
    /// assert_eq!(flags, EngineOpenFlags::WRONLY | EngineOpenFlags::CREAT | EngineOpenFlags::TRUNC);
    /// ```
    pub fn to_engine(self) -> Result<EngineOpenFlags, Errno> {
        let mut flags = match self.access_mode()? {
            AccessMode::ReadOnly => EngineOpenFlags::RDONLY,
            AccessMode::WriteOnly => EngineOpenFlags::WRONLY,
            AccessMode::ReadWrite => EngineOpenFlags::RDWR,
        };
        flags.set(EngineOpenFlags::CREAT, self.contains(Self::CREAT));
        flags.set(EngineOpenFlags::EXCL, self.contains(Self::EXCL));
        flags.set(EngineOpenFlags::TRUNC, self.contains(Self::TRUNC));
        flags.set(EngineOpenFlags::APPEND, self.contains(Self::APPEND));
        Ok(flags)
    }
}

/// POSIX access mode of an open call.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `O_RDONLY`
    ReadOnly,
    /// `O_WRONLY`
    WriteOnly,
    /// `O_RDWR`
    ReadWrite,
}

bitflags! {
    /// The engine's native open flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EngineOpenFlags: u32 {
        /// Open a file as read only.
        const RDONLY = 0x0001;
        /// Open a file as write only.
        const WRONLY = 0x0002;
        /// Open a file as read and write.
        const RDWR = Self::RDONLY.bits() | Self::WRONLY.bits();
        /// Create a file if it does not exist.
        const CREAT = 0x0100;
        /// Fail if a file already exists.
        const EXCL = 0x0200;
        /// Truncate the existing file to zero size.
        const TRUNC = 0x0400;
        /// Move to end of file on every write.
        const APPEND = 0x0800;
    }
}

impl EngineOpenFlags {
    /// Whether the handle may be read from.
    #[inline]
    pub const fn readable(self) -> bool {
        self.contains(Self::RDONLY)
    }

    /// Whether the handle may be written to.
    #[inline]
    pub const fn writable(self) -> bool {
        self.contains(Self::WRONLY)
    }
}

bitflags! {
    /// Options for [`mount`](crate::mount).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MountFlags: u32 {
        /// Format the card before mounting.
        const FORMAT = 0x0001;
    }
}

/// POSIX seek anchor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// `SEEK_SET`
    Set,
    /// `SEEK_CUR`
    Current,
    /// `SEEK_END`
    End,
}

impl Whence {
    /// Decode a raw `whence` argument.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for anything but `SEEK_SET`, `SEEK_CUR` and `SEEK_END`.
    pub const fn from_raw(raw: i32) -> Result<Self, Errno> {
        match raw {
            0 => Ok(Self::Set),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            _ => Err(Errno::InvalidArgument),
        }
    }
}

/// The engine's seek anchor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineWhence {
    /// Seek relative to an absolute position.
    Set,
    /// Seek relative to the current file position.
    Cur,
    /// Seek relative to the end of the file.
    End,
}

impl From<Whence> for EngineWhence {
    fn from(whence: Whence) -> Self {
        match whence {
            Whence::Set => Self::Set,
            Whence::Current => Self::Cur,
            Whence::End => Self::End,
        }
    }
}
