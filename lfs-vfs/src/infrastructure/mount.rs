//! Mount lifecycle: bring a card up, mount the engine on it and register it.
//!
//! At most one mount is active per process. The mount is an owned [`Mount`] token;
//! unmounting consumes it.

use alloc::{
    string::{String, ToString},
    sync::Arc,
};
use core::fmt;

use crate::{
    adapters::{SdmmcBlockDevice, VfsAdapter},
    domain::{
        error::{DriverError, EngineError},
        ports::{
            BlockDevice, CardDriver, DispatchError, Dispatcher, EngineConfig, FsEngine, RawLock,
            SpinRawMutex,
        },
        value_objects::{CardInfo, Geometry, GeometryError, MountFlags},
        CacheBuffers, MAX_FILES,
    },
    infrastructure::router::{is_valid_mount_point, MOUNT_POINT_MAX},
};

const TARGET: &str = "lfs_vfs::mount";

/// Mount point of the active mount, if any.
static ACTIVE: spin::Mutex<Option<String>> = spin::Mutex::new(None);

/// The mount point currently mounted, if any.
pub fn active_mount_point() -> Option<String> {
    ACTIVE.lock().clone()
}

/// Holds the process-wide mount slot; releases it on drop.
struct Claim;

impl Claim {
    fn acquire(mount_point: &str) -> Result<Self, MountError> {
        let mut active = ACTIVE.lock();
        if let Some(current) = active.as_deref() {
            log::error!(target: TARGET, "{} is already mounted", current);
            return Err(MountError::AlreadyMounted);
        }
        *active = Some(mount_point.to_string());
        Ok(Claim)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        *ACTIVE.lock() = None;
    }
}

/// Why a mount failed. Every completed stage was rolled back.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountError {
    /// The mount point is not absolute, is the root, ends in `/`, or is too long.
    InvalidMountPoint,
    /// Another mount is active.
    AlreadyMounted,
    /// Host controller initialization failed.
    HostInit(DriverError),
    /// Slot configuration failed.
    SlotInit(DriverError),
    /// The card did not initialize, twice.
    Probe(DriverError),
    /// The card's geometry is unusable.
    Geometry(GeometryError),
    /// Formatting failed.
    Format(EngineError),
    /// The engine refused to mount.
    Engine(EngineError),
    /// The dispatch layer refused the registration.
    Register(DispatchError),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMountPoint => write!(
                f,
                "invalid mount point (absolute, non-root, no trailing '/', at most {} bytes)",
                MOUNT_POINT_MAX
            ),
            Self::AlreadyMounted => write!(f, "a filesystem is already mounted"),
            Self::HostInit(e) => write!(f, "host init failed: {}", e),
            Self::SlotInit(e) => write!(f, "slot init failed: {}", e),
            Self::Probe(e) => write!(f, "card probe failed: {}", e),
            Self::Geometry(e) => write!(f, "unusable card geometry: {}", e),
            Self::Format(e) => write!(f, "format failed: {}", e),
            Self::Engine(e) => write!(f, "engine mount failed: {}", e),
            Self::Register(e) => write!(f, "registration failed: {}", e),
        }
    }
}

impl core::error::Error for MountError {}

/// An active mount.
///
/// `R` is the raw mutex behind the device lock and the descriptor slots.
///
/// Dropping it unmounts on a best-effort basis; [`unmount`](Self::unmount) reports
/// failures and hands the mount back. If a dropped mount cannot be torn down, the
/// filesystem stays mounted and registered, and the mount slot stays claimed for the
/// rest of the process.
pub struct Mount<E: FsEngine, D: CardDriver, R: RawLock = SpinRawMutex> {
    mount_point: String,
    driver: Arc<D>,
    card: CardInfo,
    geometry: Geometry,
    backend: Arc<VfsAdapter<E, MAX_FILES, R>>,
    dispatcher: Arc<dyn Dispatcher>,
    claim: Option<Claim>,
}

/// A failed unmount. The mount is still active; its open files were closed.
pub struct UnmountError<E: FsEngine, D: CardDriver, R: RawLock = SpinRawMutex> {
    /// The mount, still registered.
    pub mount: Mount<E, D, R>,
    /// What the engine reported.
    pub error: EngineError,
}

impl<E: FsEngine, D: CardDriver, R: RawLock> fmt::Debug for UnmountError<E, D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmountError")
            .field("mount", &self.mount)
            .field("error", &self.error)
            .finish()
    }
}

impl<E: FsEngine, D: CardDriver, R: RawLock> fmt::Display for UnmountError<E, D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unmounting {} failed: {}", self.mount.mount_point, self.error)
    }
}

impl<E: FsEngine, D: CardDriver, R: RawLock> Mount<E, D, R> {
    /// Where the filesystem is registered.
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// The probed card.
    pub fn card(&self) -> &CardInfo {
        &self.card
    }

    /// The geometry the engine runs with.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The registered backend.
    pub fn backend(&self) -> &Arc<VfsAdapter<E, MAX_FILES, R>> {
        &self.backend
    }

    /// The mounted engine.
    pub fn engine(&self) -> &Arc<E> {
        self.backend.engine()
    }

    /// The card driver.
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Unregister, close open files, unmount the engine, release the host and free the
    /// mount slot.
    ///
    /// # Errors
    ///
    /// If the engine fails to unmount, the backend is registered again and the mount
    /// is returned inside the error. Descriptors open before the call stay closed.
    pub fn unmount(mut self) -> Result<(), UnmountError<E, D, R>> {
        match self.teardown() {
            Ok(()) => Ok(()),
            Err(error) => Err(UnmountError { mount: self, error }),
        }
    }

    fn teardown(&mut self) -> Result<(), EngineError> {
        if self.claim.is_none() {
            return Ok(());
        }
        if let Err(err) = self.dispatcher.unregister(&self.mount_point) {
            log::warn!(target: TARGET, "unregister {}: {}", self.mount_point, err);
        }
        let closed = self.backend.close_all();
        if closed > 0 {
            log::warn!(target: TARGET, "closed {} open files on {}", closed, self.mount_point);
        }
        if let Err(err) = self.engine().unmount() {
            log::error!(target: TARGET, "engine unmount of {} failed: {}", self.mount_point, err);
            let backend = Arc::clone(&self.backend);
            if let Err(err) = self.dispatcher.register(&self.mount_point, backend) {
                log::error!(target: TARGET, "re-register {}: {}", self.mount_point, err);
            }
            return Err(err);
        }
        self.driver.deinit();
        self.claim = None;
        log::info!(target: TARGET, "unmounted {}", self.mount_point);
        Ok(())
    }
}

impl<E: FsEngine, D: CardDriver, R: RawLock> fmt::Debug for Mount<E, D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("mount_point", &self.mount_point)
            .field("card", &self.card)
            .field("geometry", &self.geometry)
            .finish()
    }
}

impl<E: FsEngine, D: CardDriver, R: RawLock> Drop for Mount<E, D, R> {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            log::error!(target: TARGET, "dropping {} left the engine mounted: {}", self.mount_point, err);
            // The filesystem is still live, so the slot must stay taken
            core::mem::forget(self.claim.take());
        }
    }
}

/// Mount the filesystem on the card behind `driver` and register it under
/// `mount_point`.
///
/// Stages, in order: claim the mount slot, host init, slot init, card probe (retried
/// once), geometry and cache buffers, optional format, engine mount, registration. A
/// failing stage rolls back the completed ones in reverse.
///
/// # Errors
///
/// See [`MountError`]. After an error nothing is registered, the host is released and
/// another mount may be attempted.
///
/// # Examples
///
/// ```ignore
/// let router = Arc::new(PathRouter::new());
/// let mount = lfs_vfs::mount::<MyEngine, _>(
///     "/sdcard",
///     Arc::new(driver),
///     &slot_config,
///     MountFlags::empty(),
///     router.clone(),
/// )?;
/// // ...
/// mount.unmount().map_err(|e| e.error)?;
/// ```
pub fn mount<E, D>(
    mount_point: &str,
    driver: Arc<D>,
    slot_config: &D::SlotConfig,
    flags: MountFlags,
    dispatcher: Arc<dyn Dispatcher>,
) -> Result<Mount<E, D>, MountError>
where
    E: FsEngine,
    D: CardDriver + 'static,
{
    mount_with_raw_mutex::<E, D, SpinRawMutex>(mount_point, driver, slot_config, flags, dispatcher)
}

/// Like [`mount`], with `R` as the raw mutex behind the device lock and the descriptor
/// slots.
///
/// Under an RTOS, pass a mutex that blocks: both locks are held across card transfers.
///
/// # Errors
///
/// See [`MountError`].
pub fn mount_with_raw_mutex<E, D, R>(
    mount_point: &str,
    driver: Arc<D>,
    slot_config: &D::SlotConfig,
    flags: MountFlags,
    dispatcher: Arc<dyn Dispatcher>,
) -> Result<Mount<E, D, R>, MountError>
where
    E: FsEngine,
    D: CardDriver + 'static,
    R: RawLock,
{
    if !is_valid_mount_point(mount_point) {
        log::error!(target: TARGET, "invalid mount point {:?}", mount_point);
        return Err(MountError::InvalidMountPoint);
    }
    let claim = Claim::acquire(mount_point)?;

    driver.init().map_err(|err| {
        log::error!(target: TARGET, "host init failed: {}", err);
        MountError::HostInit(err)
    })?;

    let (card, geometry, engine) = match bring_up::<E, D, R>(&driver, slot_config, flags) {
        Ok(staged) => staged,
        Err(err) => {
            driver.deinit();
            return Err(err);
        }
    };

    let backend = Arc::new(VfsAdapter::<E, MAX_FILES, R>::new(engine));
    if let Err(err) = dispatcher.register(mount_point, backend.clone()) {
        log::error!(target: TARGET, "registering {} failed: {}", mount_point, err);
        if let Err(err) = backend.engine().unmount() {
            log::error!(target: TARGET, "engine unmount during rollback failed: {}", err);
        }
        driver.deinit();
        return Err(MountError::Register(err));
    }

    log::info!(target: TARGET, "mounted {} ({} blocks of {} bytes)", mount_point, geometry.block_count(), geometry.block_size());
    Ok(Mount {
        mount_point: mount_point.to_string(),
        driver,
        card,
        geometry,
        backend,
        dispatcher,
        claim: Some(claim),
    })
}

/// Stages between host init and registration. The caller releases the host on error.
fn bring_up<E, D, R>(
    driver: &Arc<D>,
    slot_config: &D::SlotConfig,
    flags: MountFlags,
) -> Result<(CardInfo, Geometry, Arc<E>), MountError>
where
    E: FsEngine,
    D: CardDriver + 'static,
    R: RawLock,
{
    driver.init_slot(slot_config).map_err(|err| {
        log::error!(target: TARGET, "slot init failed: {}", err);
        MountError::SlotInit(err)
    })?;

    let card = probe(driver.as_ref())?;
    log::info!(target: TARGET, "card: {}", card);

    let geometry = Geometry::derive(&card).map_err(|err| {
        log::error!(target: TARGET, "geometry: {}", err);
        MountError::Geometry(err)
    })?;
    log::info!(
        target: TARGET,
        "geometry: read={} prog={} block={} count={} cache={} lookahead={} cycles={}",
        geometry.read_size(),
        geometry.prog_size(),
        geometry.block_size(),
        geometry.block_count(),
        geometry.cache_size(),
        geometry.lookahead_size(),
        geometry.block_cycles(),
    );

    let mut config = EngineConfig::new(geometry, CacheBuffers::allocate(&geometry));
    let device: Arc<dyn BlockDevice> = Arc::new(SdmmcBlockDevice::<D, R>::with_raw_mutex(
        Arc::clone(driver),
        card.clone(),
        geometry,
    ));

    if flags.contains(MountFlags::FORMAT) {
        log::info!(target: TARGET, "formatting");
        E::format(device.as_ref(), &mut config).map_err(|err| {
            log::error!(target: TARGET, "format failed: {}", err);
            MountError::Format(err)
        })?;
    }

    let engine = E::mount(device, config).map_err(|err| {
        log::error!(target: TARGET, "engine mount failed: {}", err);
        MountError::Engine(err)
    })?;

    Ok((card, geometry, Arc::new(engine)))
}

fn probe<D: CardDriver>(driver: &D) -> Result<CardInfo, MountError> {
    driver.probe_card().or_else(|err| {
        log::warn!(target: TARGET, "card init failed ({}), retrying", err);
        driver.probe_card().map_err(|err| {
            log::error!(target: TARGET, "card init failed again: {}", err);
            MountError::Probe(err)
        })
    })
}
