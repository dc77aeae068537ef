//! Ports define the interfaces between the domain and the outside world.
//!
//! - **Driven ports** (what the adapter needs): [`BlockDevice`] as seen by the engine,
//!   [`FsEngine`], [`CardDriver`] and the host [`Dispatcher`].
//! - **Driving port** (what the adapter offers): [`VfsBackend`], the callback table the
//!   dispatch layer calls into.

mod block_device;
mod card_driver;
mod dispatcher;
mod fs_engine;
mod vfs_backend;

pub use block_device::{BlockDevice, DeviceLock, RawLock, SpinRawMutex};
pub use card_driver::CardDriver;
pub use dispatcher::{DispatchError, Dispatcher};
pub use fs_engine::{EngineConfig, EngineInfo, FsEngine};
pub use vfs_backend::{Capabilities, DirStream, VfsBackend};
