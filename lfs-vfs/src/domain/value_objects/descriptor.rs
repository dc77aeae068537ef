//! Type-safe file descriptor value object.

use core::fmt;

/// Offset added to a slot index to form the externally visible descriptor.
///
/// Keeps every descriptor clear of 0/1/2 (stdin/stdout/stderr) and of the `-1`
/// failure sentinel.
pub const FD_OFFSET: i32 = 64;

/// A file descriptor handed out by the descriptor table.
///
/// The raw value is `slot index + FD_OFFSET`. Any `i32` can be wrapped; only the
/// descriptor table decides whether it refers to an open file.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Descriptor(i32);

impl Descriptor {
    /// The `-1` value returned by POSIX calls on failure.
    pub const INVALID: Self = Self(-1);

    /// Wrap a raw descriptor value.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfs_vfs::Descriptor;
    ///
    /// let fd = Descriptor::new(64);
    /// assert_eq!(fd.raw(), 64);
    /// assert_eq!(fd.slot_index(), Some(0));
    /// ```
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Encode a slot index.
    #[inline]
    pub(crate) const fn from_slot(index: usize) -> Self {
        Self(index as i32 + FD_OFFSET)
    }

    /// Get the raw descriptor value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Decode the slot index, or `None` if the value is below the offset.
    ///
    /// The upper bound is checked by the table, which knows its capacity.
    #[inline]
    pub const fn slot_index(self) -> Option<usize> {
        if self.0 >= FD_OFFSET {
            Some((self.0 - FD_OFFSET) as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd({})", self.0)
    }
}

impl From<i32> for Descriptor {
    fn from(raw: i32) -> Self {
        Self::new(raw)
    }
}

impl From<Descriptor> for i32 {
    fn from(fd: Descriptor) -> Self {
        fd.raw()
    }
}
