//! Error domains and the translation between them.
//!
//! Three error domains meet in this crate:
//!
//! - [`DriverError`]: what the SD/MMC host driver reports for a sector transfer.
//! - [`EngineError`]: the filesystem engine's own error enum (littlefs numbering).
//! - [`Errno`]: the POSIX error surfaced to callers of the VFS entry points.
//!
//! Errors are translated exactly once at each boundary: driver → engine inside the
//! block device shim, engine → POSIX inside the VFS adapter.

use core::fmt;

/// POSIX error kinds surfaced by the VFS entry points.
///
/// Numeric values follow newlib, the C library used by the dispatch layer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Errno {
    /// `EIO`
    Io = 5,
    /// `ENOENT`
    NoEntry = 2,
    /// `EBADF`
    BadDescriptor = 9,
    /// `ENOMEM`
    OutOfMemory = 12,
    /// `EEXIST`
    Exists = 17,
    /// `ENOTDIR`
    NotADirectory = 20,
    /// `EISDIR`
    IsADirectory = 21,
    /// `EINVAL`
    InvalidArgument = 22,
    /// `ENFILE`
    TooManyOpenFiles = 23,
    /// `EFBIG`
    FileTooLarge = 27,
    /// `ENOSPC`
    NoSpace = 28,
    /// `ENOSYS`, returned by the dispatch layer for an entry the backend does not provide.
    NotSupported = 88,
    /// `ENOTEMPTY`
    DirectoryNotEmpty = 90,
    /// `ENAMETOOLONG`
    NameTooLong = 91,
    /// The engine reported something with no POSIX counterpart.
    Unmapped = 2500,
}

impl Errno {
    /// The raw errno value.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Io => "I/O error",
            Self::NoEntry => "no such file or directory",
            Self::BadDescriptor => "bad file descriptor",
            Self::OutOfMemory => "out of memory",
            Self::Exists => "file exists",
            Self::NotADirectory => "not a directory",
            Self::IsADirectory => "is a directory",
            Self::InvalidArgument => "invalid argument",
            Self::TooManyOpenFiles => "too many open files",
            Self::FileTooLarge => "file too large",
            Self::NoSpace => "no space left on device",
            Self::NotSupported => "function not implemented",
            Self::DirectoryNotEmpty => "directory not empty",
            Self::NameTooLong => "file name too long",
            Self::Unmapped => "unmapped engine error",
        };
        write!(f, "{} (errno {})", msg, self.code())
    }
}

impl core::error::Error for Errno {}

impl embedded_io::Error for Errno {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NoEntry => embedded_io::ErrorKind::NotFound,
            Self::Exists => embedded_io::ErrorKind::AlreadyExists,
            Self::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            Self::InvalidArgument | Self::BadDescriptor | Self::NameTooLong => {
                embedded_io::ErrorKind::InvalidInput
            }
            Self::NotSupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// Error codes of the filesystem engine.
///
/// The discriminants are the engine's negative return codes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineError {
    /// Error during device operation.
    Io,
    /// Corrupted metadata.
    Corrupt,
    /// No directory entry.
    NoEnt,
    /// Entry already exists.
    Exist,
    /// Entry is not a dir.
    NotDir,
    /// Entry is a dir.
    IsDir,
    /// Dir is not empty.
    NotEmpty,
    /// Bad file number.
    BadF,
    /// File too large.
    FBig,
    /// Invalid parameter.
    Inval,
    /// No space left on device.
    NoSpc,
    /// No more memory available.
    NoMem,
    /// No data/attr available.
    NoAttr,
    /// File name too long.
    NameTooLong,
    /// A code outside the engine's documented set.
    Unknown(i32),
}

impl EngineError {
    /// Decode a negative engine return code.
    pub const fn from_code(code: i32) -> Self {
        match code {
            -5 => Self::Io,
            -84 => Self::Corrupt,
            -2 => Self::NoEnt,
            -17 => Self::Exist,
            -20 => Self::NotDir,
            -21 => Self::IsDir,
            -39 => Self::NotEmpty,
            -9 => Self::BadF,
            -27 => Self::FBig,
            -22 => Self::Inval,
            -28 => Self::NoSpc,
            -12 => Self::NoMem,
            -61 => Self::NoAttr,
            -36 => Self::NameTooLong,
            other => Self::Unknown(other),
        }
    }

    /// The engine's raw return code for this error.
    pub const fn code(self) -> i32 {
        match self {
            Self::Io => -5,
            Self::Corrupt => -84,
            Self::NoEnt => -2,
            Self::Exist => -17,
            Self::NotDir => -20,
            Self::IsDir => -21,
            Self::NotEmpty => -39,
            Self::BadF => -9,
            Self::FBig => -27,
            Self::Inval => -22,
            Self::NoSpc => -28,
            Self::NoMem => -12,
            Self::NoAttr => -61,
            Self::NameTooLong => -36,
            Self::Unknown(code) => code,
        }
    }

    /// Translate into the POSIX error surfaced to VFS callers.
    pub const fn to_errno(self) -> Errno {
        match self {
            Self::Io | Self::Corrupt | Self::NoAttr => Errno::Io,
            Self::NoEnt => Errno::NoEntry,
            Self::Exist => Errno::Exists,
            Self::NotDir => Errno::NotADirectory,
            Self::IsDir => Errno::IsADirectory,
            Self::NotEmpty => Errno::DirectoryNotEmpty,
            Self::BadF => Errno::BadDescriptor,
            Self::FBig => Errno::FileTooLarge,
            Self::Inval => Errno::InvalidArgument,
            Self::NoSpc => Errno::NoSpace,
            Self::NoMem => Errno::OutOfMemory,
            Self::NameTooLong => Errno::NameTooLong,
            Self::Unknown(_) => Errno::Unmapped,
        }
    }
}

impl From<EngineError> for Errno {
    fn from(err: EngineError) -> Self {
        err.to_errno()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown engine error {}", code),
            other => write!(f, "engine error {:?} ({})", other, other.code()),
        }
    }
}

impl core::error::Error for EngineError {}

/// Check a raw engine return value.
///
/// Non-negative values are results and pass through untranslated; negative values are
/// decoded and translated to [`Errno`].
pub const fn check_code(code: i32) -> Result<u32, Errno> {
    if code >= 0 {
        Ok(code as u32)
    } else {
        Err(EngineError::from_code(code).to_errno())
    }
}

/// Errors reported by the SD/MMC host driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The driver could not allocate a transfer buffer.
    NoMem,
    /// A parameter was rejected (e.g. sector range beyond the card).
    InvalidArg,
    /// The card did not answer in time.
    Timeout,
    /// No card is present in the slot.
    NotFound,
    /// Any other driver status code.
    Other(i32),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMem => write!(f, "driver out of memory"),
            Self::InvalidArg => write!(f, "invalid driver argument"),
            Self::Timeout => write!(f, "card timeout"),
            Self::NotFound => write!(f, "no card present"),
            Self::Other(code) => write!(f, "driver error {}", code),
        }
    }
}

impl core::error::Error for DriverError {}

impl From<DriverError> for EngineError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NoMem => EngineError::NoMem,
            DriverError::InvalidArg => EngineError::Inval,
            _ => EngineError::Io,
        }
    }
}
