//! Card drivers for running `lfs-vfs` off-target.
//!
//! - [`StreamCard`]: any blocking `embedded_io` stream as a card of 512-byte sectors
//!   (`no_std`)
//! - [`ImageCard`]: a disk-image file as a card (feature `std`)

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

mod stream;

#[cfg(feature = "std")]
mod image;

pub use stream::{READ_BLOCK_LEN, SECTOR_SIZE, StreamCard};

#[cfg(feature = "std")]
pub use image::{ImageCard, create_image, open_image};
