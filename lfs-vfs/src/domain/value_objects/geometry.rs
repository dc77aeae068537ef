//! Device geometry value object.

use super::CardInfo;

/// Smallest read or program granularity handed to the engine.
pub const MIN_GRANULARITY: u32 = 128;

/// Block size the derivation grows towards, to amortize per-block metadata.
pub const TARGET_BLOCK_SIZE: u32 = 8192;

/// Size of the engine's allocation lookahead bitmap, in bytes (multiple of 8).
pub const LOOKAHEAD_SIZE: u32 = 256;

/// Erase cycles before the engine moves metadata to another block.
pub const BLOCK_CYCLES: i32 = 347;

/// Block-device parameters the engine runs with.
///
/// Derived once per mount from the card and immutable afterwards.
///
/// # Examples
///
/// ```
/// use lfs_vfs::{CardInfo, Geometry};
///
/// let card = CardInfo::new(512, 9, 1 << 21); // 1 GiB
/// let geometry = Geometry::derive(&card).unwrap();
/// assert_eq!(geometry.block_size(), 8192);
/// assert_eq!(geometry.block_count(), 131072);
/// ```
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    read_size: u32,
    prog_size: u32,
    block_size: u32,
    block_count: u32,
    block_cycles: i32,
    cache_size: u32,
    lookahead_size: u32,
}

impl Geometry {
    /// Derive the geometry for a probed card.
    ///
    /// Read and program granularities are rounded up to powers of two of at least
    /// [`MIN_GRANULARITY`]. The block size is their least common multiple, doubled until
    /// it reaches [`TARGET_BLOCK_SIZE`]. A trailing partial block is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the sector size is zero, the read block length is out of range,
    /// or the card holds less than one block.
    pub fn derive(card: &CardInfo) -> Result<Self, GeometryError> {
        if card.sector_size == 0 {
            return Err(GeometryError::ZeroSectorSize);
        }
        if card.read_block_len > 31 {
            return Err(GeometryError::ReadBlockLenOutOfRange(card.read_block_len));
        }

        let read_size = round_granularity(1u32 << card.read_block_len)?;
        let prog_size = round_granularity(card.sector_size)?;

        let mut block_size = lcm(read_size, prog_size).ok_or(GeometryError::Overflow)?;
        while block_size < TARGET_BLOCK_SIZE {
            block_size <<= 1;
        }

        let block_count = card.size_bytes() / block_size as u64;
        if block_count == 0 {
            return Err(GeometryError::CardTooSmall {
                size_bytes: card.size_bytes(),
                block_size,
            });
        }
        let block_count = u32::try_from(block_count).map_err(|_| GeometryError::Overflow)?;

        Ok(Self {
            read_size,
            prog_size,
            block_size,
            block_count,
            block_cycles: BLOCK_CYCLES,
            cache_size: block_size,
            lookahead_size: LOOKAHEAD_SIZE,
        })
    }

    /// Minimum read granularity in bytes.
    #[inline]
    pub const fn read_size(&self) -> u32 {
        self.read_size
    }

    /// Minimum program granularity in bytes.
    #[inline]
    pub const fn prog_size(&self) -> u32 {
        self.prog_size
    }

    /// Engine block size in bytes.
    #[inline]
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of whole blocks on the card.
    #[inline]
    pub const fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Wear-leveling erase cycle budget.
    #[inline]
    pub const fn block_cycles(&self) -> i32 {
        self.block_cycles
    }

    /// Read and program cache size in bytes.
    #[inline]
    pub const fn cache_size(&self) -> u32 {
        self.cache_size
    }

    /// Lookahead bitmap size in bytes.
    #[inline]
    pub const fn lookahead_size(&self) -> u32 {
        self.lookahead_size
    }

    /// Usable filesystem size in bytes.
    #[inline]
    pub const fn total_size(&self) -> u64 {
        self.block_size as u64 * self.block_count as u64
    }
}

fn round_granularity(size: u32) -> Result<u32, GeometryError> {
    size.max(MIN_GRANULARITY)
        .checked_next_power_of_two()
        .ok_or(GeometryError::Overflow)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn lcm(a: u32, b: u32) -> Option<u32> {
    (a / gcd(a, b)).checked_mul(b)
}

/// Errors that can occur when deriving a geometry.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// The card reported a sector size of zero.
    ZeroSectorSize,
    /// `READ_BL_LEN` does not fit a 32-bit size.
    ReadBlockLenOutOfRange(u8),
    /// The card is smaller than a single block.
    CardTooSmall {
        /// Card size in bytes.
        size_bytes: u64,
        /// Derived block size.
        block_size: u32,
    },
    /// An intermediate size does not fit in 32 bits.
    Overflow,
}

impl core::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroSectorSize => write!(f, "Card reports a zero sector size"),
            Self::ReadBlockLenOutOfRange(len) => {
                write!(f, "Read block length 2^{} is out of range", len)
            }
            Self::CardTooSmall {
                size_bytes,
                block_size,
            } => write!(
                f,
                "Card of {} bytes holds no {}-byte block",
                size_bytes, block_size
            ),
            Self::Overflow => write!(f, "Geometry does not fit in 32 bits"),
        }
    }
}

impl core::error::Error for GeometryError {}
