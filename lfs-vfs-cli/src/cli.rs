//! Command definitions and handlers.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lfs_vfs::{CardDriver, CardInfo, Geometry};
use lfs_vfs_platform::{READ_BLOCK_LEN, SECTOR_SIZE, create_image, open_image};

use crate::size::parse_size;

/// Inspect how lfs-vfs would lay a filesystem over an SD/MMC card.
#[derive(Debug, Parser)]
#[command(name = "lfs-vfs", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive the block geometry for a card with the given parameters
    Geometry {
        /// Card capacity, e.g. `2G` or `8MiB`
        #[arg(long, value_parser = parse_size)]
        size: u64,
        /// Native sector size in bytes
        #[arg(long, default_value_t = SECTOR_SIZE)]
        sector_size: u32,
        /// log2 of the read block length (CSD READ_BL_LEN)
        #[arg(long, default_value_t = READ_BLOCK_LEN)]
        read_block_len: u8,
    },
    /// Probe a disk image as a card and report what a mount would use
    Probe {
        /// Path to the image
        image: PathBuf,
    },
    /// Create a zero-filled disk image
    CreateImage {
        /// Path to the image (truncated if it exists)
        path: PathBuf,
        /// Image size, a multiple of the sector size
        #[arg(long, value_parser = parse_size)]
        size: u64,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Geometry {
            size,
            sector_size,
            read_block_len,
        } => {
            if sector_size == 0 {
                bail!("sector size must be non-zero");
            }
            let card = CardInfo::new(sector_size, read_block_len, size / sector_size as u64);
            let geometry = Geometry::derive(&card)?;
            print_geometry(&geometry);
        }
        Command::Probe { image } => {
            let card = open_image(&image)
                .with_context(|| format!("failed to open {}", image.display()))?;
            card.init()?;
            let probed = card.probe_card();
            card.deinit();
            let info = probed?;
            println!("{info}");
            let geometry = Geometry::derive(&info)?;
            print_geometry(&geometry);
        }
        Command::CreateImage { path, size } => {
            if size == 0 || size % SECTOR_SIZE as u64 != 0 {
                bail!("image size must be a non-zero multiple of {SECTOR_SIZE} bytes");
            }
            let card = create_image(&path, size / SECTOR_SIZE as u64)
                .with_context(|| format!("failed to create {}", path.display()))?;
            log::info!("created {} ({} sectors)", path.display(), card.info().capacity);
            println!("{}: {} bytes", path.display(), size);
        }
    }
    Ok(())
}

fn print_geometry(geometry: &Geometry) {
    println!("read size:      {}", geometry.read_size());
    println!("prog size:      {}", geometry.prog_size());
    println!("block size:     {}", geometry.block_size());
    println!("block count:    {}", geometry.block_count());
    println!("block cycles:   {}", geometry.block_cycles());
    println!("cache size:     {}", geometry.cache_size());
    println!("lookahead size: {}", geometry.lookahead_size());
    println!("usable bytes:   {}", geometry.total_size());
}
