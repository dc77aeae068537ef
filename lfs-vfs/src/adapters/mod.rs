//! Adapter layer - Concrete implementations of the domain's ports.
//!
//! # Hexagonal Architecture
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │   Host dispatch layer (VFS)      │
//!     └────────────┬─────────────────────┘
//!                  │ calls VfsBackend
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │  ◄── This module
//!     │  - VfsAdapter                    │
//!     │  - SdmmcBlockDevice              │
//!     └────────────┬─────────────────────┘
//!                  │ uses FsEngine / CardDriver
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │  Filesystem engine, card driver  │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Available Adapters
//!
//! - **`VfsAdapter`**: Implements `VfsBackend` over a mounted `FsEngine`
//! - **`SdmmcBlockDevice`**: Implements the engine's `BlockDevice` over a `CardDriver`

mod sdmmc_block_device;
mod vfs_adapter;

pub use sdmmc_block_device::{SdmmcBlockDevice, SectorRange};
pub use vfs_adapter::{LfsDirStream, VfsAdapter};
