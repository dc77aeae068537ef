//! Raw card characteristics reported by the host driver after probing.

use core::fmt;

/// Characteristics of an initialized SD/MMC card.
///
/// Only `sector_size`, `read_block_len` and `capacity` feed the geometry; the rest is
/// reported on mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    /// Product name from the CID register (up to 8 bytes).
    pub name: [u8; 8],
    /// Serial number from the CID register.
    pub serial: u32,
    /// Card capacity in sectors.
    pub capacity: u64,
    /// Native sector size in bytes.
    pub sector_size: u32,
    /// `log2` of the maximum read block length (CSD `READ_BL_LEN`).
    pub read_block_len: u8,
    /// Maximum bus frequency in kHz.
    pub max_freq_khz: u32,
    /// `log2` of the bus width in use.
    pub log_bus_width: u8,
    /// Whether the bus runs in DDR mode.
    pub is_ddr: bool,
}

impl CardInfo {
    /// Create card info from the three values the geometry depends on.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfs_vfs::CardInfo;
    ///
    /// let card = CardInfo::new(512, 9, 2048);
    /// assert_eq!(card.size_bytes(), 1024 * 1024);
    /// ```
    pub const fn new(sector_size: u32, read_block_len: u8, capacity: u64) -> Self {
        Self {
            name: [0; 8],
            serial: 0,
            capacity,
            sector_size,
            read_block_len,
            max_freq_khz: 0,
            log_bus_width: 0,
            is_ddr: false,
        }
    }

    /// Set the product name, truncated to 8 bytes.
    pub fn with_name(mut self, name: &str) -> Self {
        let len = name.len().min(self.name.len());
        self.name = [0; 8];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        self
    }

    /// Product name as text, without trailing padding.
    pub fn name(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..end]).unwrap_or("?")
    }

    /// Total card size in bytes.
    #[inline]
    pub const fn size_bytes(&self) -> u64 {
        self.capacity * self.sector_size as u64
    }
}

impl fmt::Display for CardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={} serial={} capacity={} sectors ({} MiB) sector_size={} read_block_len={} \
             max_freq={} kHz bus_width={} ddr={}",
            self.name(),
            self.serial,
            self.capacity,
            self.size_bytes() / (1024 * 1024),
            self.sector_size,
            self.read_block_len,
            self.max_freq_khz,
            1u32.checked_shl(self.log_bus_width as u32).unwrap_or(0),
            self.is_ddr,
        )
    }
}
