//! BlockDevice port - what the engine needs from the storage below it.

use lock_api::RawMutex;

use crate::domain::{error::EngineError, value_objects::Geometry};

/// Raw mutex behind the device lock and the descriptor slots.
///
/// Both are held across card transfers. Bare-metal builds use [`SpinRawMutex`]; an RTOS
/// build should supply a mutex that puts waiting tasks to sleep, since a spinning
/// higher-priority task never lets the holder finish its transfer.
pub trait RawLock: RawMutex + Send + Sync + 'static {}

impl<T: RawMutex + Send + Sync + 'static> RawLock for T {}

/// Spinlock used when no other raw mutex is chosen.
pub type SpinRawMutex = spin::Mutex<()>;

/// Releases a raw mutex locked by [`DeviceLock::acquire`].
trait Unlock {
    /// # Safety
    ///
    /// The mutex must be locked in the current context.
    unsafe fn unlock(&self);
}

impl<R: RawMutex> Unlock for R {
    unsafe fn unlock(&self) {
        // SAFETY: forwarded from the caller
        unsafe { RawMutex::unlock(self) }
    }
}

/// Guard returned by [`BlockDevice::lock`]; the device is unlocked when it drops.
#[must_use = "the device is unlocked as soon as the guard is dropped"]
pub struct DeviceLock<'a>(Option<&'a dyn Unlock>);

impl<'a> DeviceLock<'a> {
    /// A guard that holds nothing, for devices without locking.
    #[inline]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Lock `raw`, blocking until it is available, and hold it until the guard drops.
    pub fn acquire<R: RawMutex>(raw: &'a R) -> Self {
        raw.lock();
        Self(Some(raw))
    }

    /// Whether this guard actually holds a lock.
    #[inline]
    pub const fn is_held(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for DeviceLock<'_> {
    fn drop(&mut self) {
        if let Some(raw) = self.0.take() {
            // SAFETY: locked in `acquire` and released exactly once, here
            unsafe { raw.unlock() }
        }
    }
}

/// Port for the engine's block-level storage operations.
///
/// Addresses are `(block, offset)` pairs in engine space. Offsets and lengths are
/// multiples of the geometry's read or program size, which the engine guarantees.
///
/// ```text
/// ┌─────────────────────┐
/// │   FsEngine          │
/// └──────────┬──────────┘
///            │ depends on
///            ▼
/// ┌─────────────────────┐
/// │  BlockDevice Port   │  ◄── This trait
/// └──────────┬──────────┘
///            │ implemented by
///            ▼
/// ┌─────────────────────┐
/// │  SdmmcBlockDevice   │
/// └─────────────────────┘
/// ```
pub trait BlockDevice: Send + Sync {
    /// The geometry the device was set up with.
    fn geometry(&self) -> &Geometry;

    /// Read `dest.len()` bytes from `block` at `offset`.
    fn read(&self, block: u32, offset: u32, dest: &mut [u8]) -> Result<(), EngineError>;

    /// Program `src` into `block` at `offset`. The block must have been erased.
    fn program(&self, block: u32, offset: u32, src: &[u8]) -> Result<(), EngineError>;

    /// Erase `block`.
    fn erase(&self, block: u32) -> Result<(), EngineError>;

    /// Flush any state cached below the engine.
    fn sync(&self) -> Result<(), EngineError>;

    /// Serialize a logical engine operation against others on the same device.
    ///
    /// The default holds no lock.
    fn lock(&self) -> DeviceLock<'_> {
        DeviceLock::none()
    }
}
