//! POSIX-shaped directory entry.

use super::FileType;

/// Capacity of the `d_name` field, excluding the terminating NUL.
pub const NAME_MAX: usize = 255;

/// `DT_REG`
pub const DT_REG: u8 = 1;
/// `DT_DIR`
pub const DT_DIR: u8 = 2;

/// A `struct dirent` reused across `readdir` calls on one stream.
///
/// The name is always NUL-terminated. Names longer than the stream's limit are cut at
/// the last UTF-8 boundary that fits.
#[derive(Clone)]
pub struct DirEntry {
    ino: u32,
    kind: FileType,
    name: [u8; NAME_MAX + 1],
}

impl DirEntry {
    /// An empty entry.
    pub const fn new() -> Self {
        Self {
            ino: 0,
            kind: FileType::Regular,
            name: [0; NAME_MAX + 1],
        }
    }

    /// Overwrite the entry, copying at most `limit` bytes of `name`.
    ///
    /// `limit` is clamped to [`NAME_MAX`].
    pub fn fill(&mut self, name: &str, kind: FileType, limit: usize) {
        let limit = limit.min(NAME_MAX);
        let mut len = name.len().min(limit);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.name[len..].fill(0);
        self.kind = kind;
        self.ino = 0;
    }

    /// `d_ino` (always 0).
    #[inline]
    pub const fn ino(&self) -> u32 {
        self.ino
    }

    /// Entry type.
    #[inline]
    pub const fn kind(&self) -> FileType {
        self.kind
    }

    /// `d_type`
    #[inline]
    pub const fn d_type(&self) -> u8 {
        match self.kind {
            FileType::Regular => DT_REG,
            FileType::Directory => DT_DIR,
        }
    }

    /// The name bytes up to (not including) the NUL terminator.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
        &self.name[..end]
    }

    /// The NUL-terminated `d_name` buffer.
    #[inline]
    pub const fn raw_name(&self) -> &[u8; NAME_MAX + 1] {
        &self.name
    }

    /// The name as text.
    pub fn name(&self) -> &str {
        core::str::from_utf8(self.name_bytes()).unwrap_or("")
    }
}

impl Default for DirEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .finish()
    }
}
