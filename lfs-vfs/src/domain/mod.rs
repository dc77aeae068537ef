//! Domain layer - pure adapter logic with no platform dependencies.
//!
//! - **Entities**: descriptor slot state, directory entries, file status
//! - **Value Objects**: `Descriptor`, `CardInfo`, `Geometry`, open/seek/mount flags
//! - **Domain Services**: `DescriptorTable`, `CacheBuffers`
//! - **Ports**: `BlockDevice`, `FsEngine`, `CardDriver`, `Dispatcher`, `VfsBackend`
//! - **Errors**: the driver, engine and POSIX error domains and their translation
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │      Domain Layer (Core)         │
//!     │                                  │
//!     │  ┌────────────────────────────┐  │
//!     │  │  Entities & Value Objects  │  │
//!     │  │  - Descriptor, Geometry    │  │
//!     │  └────────────────────────────┘  │
//!     │              ▲                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Domain Services         │  │
//!     │  │    - DescriptorTable       │  │
//!     │  └────────────────────────────┘  │
//!     │              ▼                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Ports (Interfaces)      │  │
//!     │  │    - FsEngine, CardDriver  │  │
//!     │  └────────────────────────────┘  │
//!     └──────────────────────────────────┘
//!                    ▲
//!                    │ implemented by
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │
//!     │  - SdmmcBlockDevice              │
//!     │  - VfsAdapter                    │
//!     └──────────────────────────────────┘
//! ```

pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

mod cache_buffers;
mod descriptor_table;

pub use cache_buffers::{CacheBuffers, DmaBuffer};
pub use descriptor_table::{DescriptorTable, MAX_FILES};
pub use entities::{DirEntry, FileType, SlotState, Stat, NAME_MAX};
pub use error::{check_code, DriverError, EngineError, Errno};
pub use ports::{
    BlockDevice, Capabilities, CardDriver, DeviceLock, DirStream, DispatchError, Dispatcher,
    EngineConfig, EngineInfo, FsEngine, RawLock, SpinRawMutex, VfsBackend,
};
pub use value_objects::{
    AccessMode, CardInfo, Descriptor, EngineOpenFlags, EngineWhence, Geometry, GeometryError,
    MountFlags, OpenFlags, Whence, FD_OFFSET,
};
