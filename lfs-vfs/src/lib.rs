//! VFS adapter mounting a littlefs-style filesystem engine on an SD/MMC card.
//!
//! The crate sits between three external components: the card's host driver, a
//! block-oriented filesystem engine and the host's path-routed VFS dispatch layer. It
//! derives the engine's block geometry from the card, translates engine block I/O into
//! card sector transfers, and exposes the mounted engine through POSIX-shaped entry
//! points with a bounded descriptor table.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! ## Domain Layer (`domain`)
//! Pure logic with no platform dependencies:
//! - **Entities**: descriptor slot state, `DirEntry`, `Stat`
//! - **Value Objects**: `Descriptor`, `CardInfo`, `Geometry`, open/seek/mount flags
//! - **Services**: `DescriptorTable`, `CacheBuffers`
//! - **Ports**: `CardDriver`, `BlockDevice`, `FsEngine`, `VfsBackend`, `Dispatcher`
//! - **Errors**: `DriverError` → `EngineError` → `Errno` translation
//!
//! ## Adapter Layer (`adapters`)
//! - **`SdmmcBlockDevice`**: engine block device over a `CardDriver`
//! - **`VfsAdapter`**: `VfsBackend` over a mounted `FsEngine`
//!
//! ## Infrastructure Layer (`infrastructure`)
//! - **`mount`** / **`Mount`**: staged bring-up with rollback, single active mount
//! - **`PathRouter`**: longest-prefix `Dispatcher`
//! - **`FileStream`**: `embedded_io` stream over an open descriptor
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lfs_vfs::{mount, MountFlags, OpenFlags, PathRouter, VfsBackend};
//!
//! let router = Arc::new(PathRouter::new());
//! let mount = mount::<MyEngine, _>("/sdcard", Arc::new(driver), &slot, MountFlags::empty(), router.clone())?;
//!
//! let (vfs, path) = router.resolve("/sdcard/hello.txt").unwrap();
//! let fd = vfs.open(path, OpenFlags::WRONLY | OpenFlags::CREAT, 0o644)?;
//! vfs.write(fd, b"hello")?;
//! vfs.close(fd)?;
//!
//! mount.unmount().map_err(|e| e.error)?;
//! ```
//!
//! # Features
//!
//! - `thread-safe` (default): per-mount device lock handed to the engine
//! - `readonly`: no write, unlink, mkdir or rmdir entries
//! - `defmt`: `defmt::Format` on value types
//!
//! # Locking
//!
//! The device lock and the descriptor slots lock with a [`lock_api::RawMutex`]. The
//! default is a spinlock; [`mount_with_raw_mutex`] takes a blocking mutex for RTOS
//! builds.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

// Core layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

pub use adapters::{LfsDirStream, SdmmcBlockDevice, SectorRange, VfsAdapter};
pub use domain::*;
pub use infrastructure::{
    active_mount_point, is_valid_mount_point, mount, mount_with_raw_mutex, FileStream, Mount,
    MountError, PathRouter, UnmountError, MAX_ROUTES, MOUNT_POINT_MAX,
};
