//! Disk-image card driver (std only).
//!
//! A regular file plays the card: sector `n` is at byte `n * 512`. Used for host-side
//! tooling and tests.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use embedded_io_adapters::std::FromStd;

use lfs_vfs::CardInfo;

use crate::stream::{READ_BLOCK_LEN, SECTOR_SIZE, StreamCard};

/// A card backed by a disk-image file.
pub type ImageCard = StreamCard<FromStd<File>>;

fn image_info(sectors: u64) -> CardInfo {
    CardInfo::new(SECTOR_SIZE, READ_BLOCK_LEN, sectors).with_name("IMAGE")
}

/// Open an existing image. Trailing bytes short of a sector are ignored.
///
/// # Errors
///
/// Fails if the file cannot be opened read-write or is smaller than one sector.
pub fn open_image(path: impl AsRef<Path>) -> io::Result<ImageCard> {
    let path = path.as_ref();
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    let sectors = file.metadata()?.len() / SECTOR_SIZE as u64;
    if sectors == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is smaller than one sector", path.display()),
        ));
    }
    log::debug!(target: "lfs_vfs_platform::image", "opened {} ({} sectors)", path.display(), sectors);
    Ok(StreamCard::with_info(FromStd::new(file), image_info(sectors)))
}

/// Create (or truncate) an image of `sectors` zeroed sectors.
///
/// # Errors
///
/// Fails if the file cannot be created or sized.
pub fn create_image(path: impl AsRef<Path>, sectors: u64) -> io::Result<ImageCard> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(sectors * SECTOR_SIZE as u64)?;
    log::debug!(target: "lfs_vfs_platform::image", "created {} ({} sectors)", path.display(), sectors);
    Ok(StreamCard::with_info(FromStd::new(file), image_info(sectors)))
}
