//! Generic stream card driver
//!
//! Provides a `CardDriver` implementation wrapping any blocking I/O stream.

use embedded_io::{Error as _, ErrorKind, Read, ReadExactError, Seek, SeekFrom, Write};
use lfs_vfs::{CardDriver, CardInfo, DriverError};
use spin::Mutex;

use core::sync::atomic::{AtomicBool, Ordering};

/// Sector size of stream-backed cards.
pub const SECTOR_SIZE: u32 = 512;

/// `log2` of the read block length reported for stream-backed cards.
pub const READ_BLOCK_LEN: u8 = 9;

/// Card driver for I/O streams
///
/// Wraps any type implementing `embedded_io::{Read, Write, Seek}` and presents it as
/// an SD/MMC card of 512-byte sectors. The stream is behind a lock, so the driver can
/// be shared between the mount and the block device.
///
/// Probing fails until the host is initialized, like a real controller.
///
/// # Example
///
/// ```ignore
/// use lfs_vfs_platform::StreamCard;
/// use embedded_io_adapters::std::FromStd;
///
/// let file = std::fs::OpenOptions::new().read(true).write(true).open("card.img")?;
/// let sectors = file.metadata()?.len() / 512;
/// let card = StreamCard::new(FromStd::new(file), sectors);
/// ```
pub struct StreamCard<T> {
    inner: Mutex<T>,
    info: CardInfo,
    host_ready: AtomicBool,
}

impl<T> StreamCard<T> {
    /// Create a card of `sectors` 512-byte sectors over `inner`.
    pub fn new(inner: T, sectors: u64) -> Self {
        Self::with_info(inner, CardInfo::new(SECTOR_SIZE, READ_BLOCK_LEN, sectors).with_name("STREAM"))
    }

    /// Create a card reporting `info` over `inner`.
    pub fn with_info(inner: T, info: CardInfo) -> Self {
        Self {
            inner: Mutex::new(inner),
            info,
            host_ready: AtomicBool::new(false),
        }
    }

    /// What probing reports.
    pub fn info(&self) -> &CardInfo {
        &self.info
    }

    /// Consume the driver and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    fn offset(&self, start: u64, count: usize, len: usize) -> Result<(u64, usize), DriverError> {
        let bytes = count
            .checked_mul(self.info.sector_size as usize)
            .filter(|bytes| *bytes <= len)
            .ok_or(DriverError::InvalidArg)?;
        let end = start.checked_add(count as u64).ok_or(DriverError::InvalidArg)?;
        if end > self.info.capacity {
            log::warn!(target: "lfs_vfs_platform::stream", "sectors {}..{} beyond card end {}", start, end, self.info.capacity);
            return Err(DriverError::InvalidArg);
        }
        Ok((start * self.info.sector_size as u64, bytes))
    }
}

fn driver_error(kind: ErrorKind) -> DriverError {
    match kind {
        ErrorKind::OutOfMemory => DriverError::NoMem,
        ErrorKind::InvalidInput => DriverError::InvalidArg,
        ErrorKind::TimedOut => DriverError::Timeout,
        ErrorKind::NotFound => DriverError::NotFound,
        _ => DriverError::Other(-1),
    }
}

impl<T> CardDriver for StreamCard<T>
where
    T: Read + Write + Seek + Send,
{
    type SlotConfig = ();

    fn init(&self) -> Result<(), DriverError> {
        self.host_ready.store(true, Ordering::Release);
        Ok(())
    }

    fn init_slot(&self, _config: &()) -> Result<(), DriverError> {
        Ok(())
    }

    fn deinit(&self) {
        self.host_ready.store(false, Ordering::Release);
    }

    fn probe_card(&self) -> Result<CardInfo, DriverError> {
        if !self.host_ready.load(Ordering::Acquire) {
            return Err(DriverError::NotFound);
        }
        Ok(self.info.clone())
    }

    fn read_sectors(
        &self,
        _card: &CardInfo,
        dest: &mut [u8],
        start: u64,
        count: usize,
    ) -> Result<(), DriverError> {
        let (offset, bytes) = self.offset(start, count, dest.len())?;
        let mut inner = self.inner.lock();
        inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| driver_error(e.kind()))?;
        inner.read_exact(&mut dest[..bytes]).map_err(|e| match e {
            ReadExactError::UnexpectedEof => DriverError::InvalidArg,
            ReadExactError::Other(e) => driver_error(e.kind()),
        })
    }

    fn write_sectors(
        &self,
        _card: &CardInfo,
        src: &[u8],
        start: u64,
        count: usize,
    ) -> Result<(), DriverError> {
        let (offset, bytes) = self.offset(start, count, src.len())?;
        let mut inner = self.inner.lock();
        inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| driver_error(e.kind()))?;
        inner
            .write_all(&src[..bytes])
            .map_err(|e| driver_error(e.kind()))?;
        inner.flush().map_err(|e| driver_error(e.kind()))
    }
}
