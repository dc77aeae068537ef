//! Adapter connecting an SD/MMC card driver to the engine's `BlockDevice` port.
//!
//! Engine addresses are `(block, offset)` pairs; the card is addressed in sectors. The
//! derived geometry makes every engine offset and length a whole number of sectors, so
//! the translation is a plain division and is not re-validated here.
//!
//! Erase and sync are no-ops: the card's flash translation layer erases on write, and
//! nothing is cached between the engine and the card.

use alloc::sync::Arc;

use crate::domain::{
    error::EngineError,
    ports::{BlockDevice, CardDriver, DeviceLock, RawLock, SpinRawMutex},
    value_objects::{CardInfo, Geometry},
};

const TARGET: &str = "lfs_vfs::sdmmc";

/// A contiguous run of card sectors.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorRange {
    /// First sector.
    pub start: u64,
    /// Number of sectors.
    pub count: usize,
}

/// Block device shim over an SD/MMC card.
///
/// # Type Parameters
///
/// - `D`: The card driver (must implement [`CardDriver`])
/// - `R`: Raw mutex behind [`BlockDevice::lock`], a spinlock by default
///
/// # Examples
///
/// ```ignore
/// let card = driver.probe_card()?;
/// let geometry = Geometry::derive(&card)?;
/// let device = SdmmcBlockDevice::new(Arc::new(driver), card, geometry);
/// let engine = MyEngine::mount(Arc::new(device), config)?;
/// ```
pub struct SdmmcBlockDevice<D: CardDriver, R: RawLock = SpinRawMutex> {
    driver: Arc<D>,
    card: CardInfo,
    geometry: Geometry,
    #[cfg_attr(not(feature = "thread-safe"), allow(dead_code))]
    lock: R,
}

impl<D: CardDriver> SdmmcBlockDevice<D> {
    /// Bind a probed card and its geometry to the driver.
    pub fn new(driver: Arc<D>, card: CardInfo, geometry: Geometry) -> Self {
        Self::with_raw_mutex(driver, card, geometry)
    }
}

impl<D: CardDriver, R: RawLock> SdmmcBlockDevice<D, R> {
    /// Like [`new`](SdmmcBlockDevice::new), locking with the raw mutex `R`.
    pub fn with_raw_mutex(driver: Arc<D>, card: CardInfo, geometry: Geometry) -> Self {
        Self {
            driver,
            card,
            geometry,
            lock: R::INIT,
        }
    }

    /// The card this device talks to.
    pub fn card(&self) -> &CardInfo {
        &self.card
    }

    /// The underlying driver.
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Translate an engine address into the sectors it covers.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// # use lfs_vfs::*;
    /// # struct NoCard;
    /// # impl CardDriver for NoCard {
    /// #     type SlotConfig = ();
    /// #     fn init(&self) -> Result<(), DriverError> { Ok(()) }
    /// #     fn init_slot(&self, _: &()) -> Result<(), DriverError> { Ok(()) }
    /// #     fn deinit(&self) {}
    /// #     fn probe_card(&self) -> Result<CardInfo, DriverError> { Err(DriverError::NotFound) }
    /// #     fn read_sectors(&self, _: &CardInfo, _: &mut [u8], _: u64, _: usize) -> Result<(), DriverError> { Ok(()) }
    /// #     fn write_sectors(&self, _: &CardInfo, _: &[u8], _: u64, _: usize) -> Result<(), DriverError> { Ok(()) }
    /// # }
    /// let card = CardInfo::new(512, 9, 1 << 16);
    /// let geometry = Geometry::derive(&card).unwrap();
    /// let device = SdmmcBlockDevice::new(Arc::new(NoCard), card, geometry);
    ///
    /// let range = device.sectors(2, 1024, 4096);
    /// assert_eq!(range.start, (2 * 8192 + 1024) / 512);
    /// assert_eq!(range.count, 8);
    /// ```
    pub fn sectors(&self, block: u32, offset: u32, len: usize) -> SectorRange {
        let sector_size = self.card.sector_size as u64;
        let byte = block as u64 * self.geometry.block_size() as u64 + offset as u64;
        SectorRange {
            start: byte / sector_size,
            count: len / self.card.sector_size as usize,
        }
    }
}

impl<D: CardDriver, R: RawLock> BlockDevice for SdmmcBlockDevice<D, R> {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn read(&self, block: u32, offset: u32, dest: &mut [u8]) -> Result<(), EngineError> {
        let range = self.sectors(block, offset, dest.len());
        log::trace!(target: TARGET, "read block={} offset={} size={}", block, offset, dest.len());
        self.driver
            .read_sectors(&self.card, dest, range.start, range.count)
            .map_err(EngineError::from)
    }

    fn program(&self, block: u32, offset: u32, src: &[u8]) -> Result<(), EngineError> {
        let range = self.sectors(block, offset, src.len());
        log::trace!(target: TARGET, "prog block={} offset={} size={}", block, offset, src.len());
        self.driver
            .write_sectors(&self.card, src, range.start, range.count)
            .map_err(EngineError::from)
    }

    fn erase(&self, block: u32) -> Result<(), EngineError> {
        log::trace!(target: TARGET, "erase block={}", block);
        Ok(())
    }

    fn sync(&self) -> Result<(), EngineError> {
        log::trace!(target: TARGET, "sync");
        Ok(())
    }

    #[cfg(feature = "thread-safe")]
    fn lock(&self) -> DeviceLock<'_> {
        DeviceLock::acquire(&self.lock)
    }
}
