//! CardDriver port - the SD/MMC host driver.

use crate::domain::{error::DriverError, value_objects::CardInfo};

/// Port for the SD/MMC host/transport driver.
///
/// Methods take `&self`: after mount the driver is shared between the block device
/// shim and the mount handle, and must synchronize its own transfers.
pub trait CardDriver: Send + Sync {
    /// Slot and pin configuration (bus width, GPIOs, ...).
    type SlotConfig;

    /// Initialize the host controller.
    fn init(&self) -> Result<(), DriverError>;

    /// Configure the slot's pins and controller.
    fn init_slot(&self, config: &Self::SlotConfig) -> Result<(), DriverError>;

    /// Release the host controller. Undoes [`init`](Self::init).
    fn deinit(&self);

    /// Probe and initialize the card in the slot.
    fn probe_card(&self) -> Result<CardInfo, DriverError>;

    /// Read `count` sectors starting at `start` into `dest`.
    fn read_sectors(
        &self,
        card: &CardInfo,
        dest: &mut [u8],
        start: u64,
        count: usize,
    ) -> Result<(), DriverError>;

    /// Write `count` sectors starting at `start` from `src`.
    fn write_sectors(
        &self,
        card: &CardInfo,
        src: &[u8],
        start: u64,
        count: usize,
    ) -> Result<(), DriverError>;
}
