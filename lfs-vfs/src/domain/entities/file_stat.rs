//! File status and file type.

/// `S_IFDIR`
pub const S_IFDIR: u32 = 0o040000;
/// `S_IFREG`
pub const S_IFREG: u32 = 0o100000;
/// `S_IFMT`
pub const S_IFMT: u32 = 0o170000;
/// `S_IRWXU | S_IRWXG | S_IRWXO`
pub const S_IRWXUGO: u32 = 0o777;

/// Inode number reported for every entry; the engine has no inodes.
pub const PLACEHOLDER_INO: u32 = 123;

/// Type of a directory entry as reported by the engine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
}

impl FileType {
    /// The `S_IFMT` bits for this type.
    #[inline]
    pub const fn mode_bits(self) -> u32 {
        match self {
            Self::Regular => S_IFREG,
            Self::Directory => S_IFDIR,
        }
    }
}

/// Minimal `struct stat` synthesized from engine info.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Inode number (always [`PLACEHOLDER_INO`]).
    pub ino: u32,
    /// Hard link count (always 1).
    pub nlink: u32,
    /// Permission and type bits.
    pub mode: u32,
    /// Size in bytes.
    pub size: u64,
}

impl Stat {
    /// Build the status of an entry of the given type and size.
    pub const fn new(kind: FileType, size: u64) -> Self {
        Self {
            ino: PLACEHOLDER_INO,
            nlink: 1,
            mode: S_IRWXUGO | kind.mode_bits(),
            size,
        }
    }

    /// Whether the entry is a directory.
    #[inline]
    pub const fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    /// Whether the entry is a regular file.
    #[inline]
    pub const fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }
}
