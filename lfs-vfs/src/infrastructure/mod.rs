//! Infrastructure layer - mount lifecycle, path routing and I/O streams built on the
//! adapters.

pub mod mount;
pub mod router;
pub mod stream;

pub use mount::{
    active_mount_point, mount, mount_with_raw_mutex, Mount, MountError, UnmountError,
};
pub use router::{is_valid_mount_point, PathRouter, MAX_ROUTES, MOUNT_POINT_MAX};
pub use stream::FileStream;
