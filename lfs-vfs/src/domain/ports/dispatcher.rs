//! Dispatcher port - the host's path-prefix-routed VFS layer.

use alloc::sync::Arc;
use core::fmt;

use crate::domain::ports::VfsBackend;

/// Errors reported by the dispatch layer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Another backend is registered under the mount point.
    AlreadyRegistered,
    /// Nothing is registered under the mount point.
    NotRegistered,
    /// The dispatch table has no free entry.
    TableFull,
    /// The mount point is not an absolute, non-root path.
    InvalidMountPoint,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(f, "mount point already registered"),
            Self::NotRegistered => write!(f, "mount point not registered"),
            Self::TableFull => write!(f, "dispatch table full"),
            Self::InvalidMountPoint => write!(f, "invalid mount point"),
        }
    }
}

impl core::error::Error for DispatchError {}

/// Port for registering a backend under a mount point.
pub trait Dispatcher: Send + Sync {
    /// Route calls under `mount_point` to `backend`.
    fn register(&self, mount_point: &str, backend: Arc<dyn VfsBackend>)
        -> Result<(), DispatchError>;

    /// Stop routing calls under `mount_point`.
    fn unregister(&self, mount_point: &str) -> Result<(), DispatchError>;
}
