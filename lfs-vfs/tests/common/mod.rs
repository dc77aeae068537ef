//! Shared fixtures: an in-memory engine, a scriptable card and a serial lock for tests
//! that mount.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use lfs_vfs::{
    BlockDevice, CardDriver, CardInfo, DriverError, EngineConfig, EngineError, EngineInfo,
    EngineOpenFlags, EngineWhence, FileType, FsEngine,
};

/// Marker the engine writes to block 0 on format and checks on mount.
pub const MAGIC: &[u8; 8] = b"littlefs";

static SERIAL: Mutex<()> = Mutex::new(());

/// Serialize tests that touch the process-wide mount slot.
pub fn serial() -> MutexGuard<'static, ()> {
    let _ = env_logger::builder().is_test(true).try_init();
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Faults the next engine instances are created with.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineFaults {
    pub format: Option<EngineError>,
    pub mount: Option<EngineError>,
    pub unmount: Option<EngineError>,
}

static FAULTS: Mutex<EngineFaults> = Mutex::new(EngineFaults {
    format: None,
    mount: None,
    unmount: None,
});

pub fn set_engine_faults(faults: EngineFaults) {
    *FAULTS.lock().unwrap() = faults;
}

fn engine_faults() -> EngineFaults {
    *FAULTS.lock().unwrap()
}

pub static FORMATS: AtomicUsize = AtomicUsize::new(0);
pub static UNMOUNTS: AtomicUsize = AtomicUsize::new(0);
pub static CLOSES: AtomicUsize = AtomicUsize::new(0);

/// Raw mutex that puts waiters to sleep on a condition variable, the way an RTOS
/// mutex blocks the calling task.
pub struct BlockingRawMutex {
    locked: Mutex<bool>,
    released: Condvar,
}

unsafe impl lock_api::RawMutex for BlockingRawMutex {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        locked: Mutex::new(false),
        released: Condvar::new(),
    };
    type GuardMarker = lock_api::GuardSend;

    fn lock(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        while *locked {
            locked = self
                .released
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn try_lock(&self) -> bool {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        !std::mem::replace(&mut *locked, true)
    }

    unsafe fn unlock(&self) {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.released.notify_one();
    }
}

enum Node {
    Dir,
    File(Vec<u8>),
}

/// In-memory engine with littlefs error semantics.
///
/// The tree lives in memory; the device only carries the format marker. Capacity is
/// the device's total size minus two metadata blocks. Directory listings carry no `.`
/// and `..` entries.
pub struct MemEngine {
    device: Arc<dyn BlockDevice>,
    tree: Mutex<BTreeMap<String, Node>>,
    capacity: u64,
    pub open_dirs: AtomicUsize,
    unmount_fault: Mutex<Option<EngineError>>,
}

pub struct MemFile {
    path: String,
    pos: u64,
    flags: EngineOpenFlags,
}

pub struct MemDir {
    entries: Vec<EngineInfo>,
    next: usize,
}

fn normalize(path: &str) -> Result<String, EngineError> {
    let mut parts = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part.len() > MemEngine::NAME_MAX {
            return Err(EngineError::NameTooLong);
        }
        if part == ".." {
            parts.pop();
        } else {
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn base_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

impl MemEngine {
    fn used(tree: &BTreeMap<String, Node>) -> u64 {
        tree.values()
            .map(|node| match node {
                Node::File(data) => data.len() as u64,
                Node::Dir => 0,
            })
            .sum()
    }

    fn check_parent(tree: &BTreeMap<String, Node>, path: &str) -> Result<(), EngineError> {
        match tree.get(parent(path)) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(EngineError::NotDir),
            None => Err(EngineError::NoEnt),
        }
    }

    /// Number of entries in the tree, root included.
    pub fn entries(&self) -> usize {
        self.tree.lock().unwrap().len()
    }
}

impl FsEngine for MemEngine {
    type File = MemFile;
    type Dir = MemDir;

    fn format(device: &dyn BlockDevice, config: &mut EngineConfig) -> Result<(), EngineError> {
        if let Some(err) = engine_faults().format {
            return Err(err);
        }
        let _lock = device.lock();
        let mut block = vec![0u8; config.geometry.prog_size() as usize];
        block[..MAGIC.len()].copy_from_slice(MAGIC);
        device.erase(0)?;
        device.program(0, 0, &block)?;
        device.sync()?;
        FORMATS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn mount(device: Arc<dyn BlockDevice>, config: EngineConfig) -> Result<Self, EngineError> {
        let faults = engine_faults();
        if let Some(err) = faults.mount {
            return Err(err);
        }
        {
            let _lock = device.lock();
            let mut block = vec![0u8; config.geometry.read_size() as usize];
            device.read(0, 0, &mut block)?;
            if &block[..MAGIC.len()] != MAGIC {
                return Err(EngineError::Corrupt);
            }
        }
        let capacity = config.geometry.total_size() - 2 * config.geometry.block_size() as u64;
        let mut tree = BTreeMap::new();
        tree.insert(String::new(), Node::Dir);
        Ok(Self {
            device,
            tree: Mutex::new(tree),
            capacity,
            open_dirs: AtomicUsize::new(0),
            unmount_fault: Mutex::new(faults.unmount),
        })
    }

    fn unmount(&self) -> Result<(), EngineError> {
        if let Some(err) = self.unmount_fault.lock().unwrap().take() {
            return Err(err);
        }
        UNMOUNTS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn file_open(&self, path: &str, flags: EngineOpenFlags) -> Result<MemFile, EngineError> {
        let _lock = self.device.lock();
        let path = normalize(path)?;
        let mut tree = self.tree.lock().unwrap();
        match tree.get_mut(&path) {
            Some(Node::Dir) => return Err(EngineError::IsDir),
            Some(Node::File(_)) if flags.contains(EngineOpenFlags::CREAT | EngineOpenFlags::EXCL) => {
                return Err(EngineError::Exist);
            }
            Some(Node::File(data)) => {
                if flags.contains(EngineOpenFlags::TRUNC) {
                    data.clear();
                }
            }
            None => {
                if !flags.contains(EngineOpenFlags::CREAT) {
                    return Err(EngineError::NoEnt);
                }
                Self::check_parent(&tree, &path)?;
                tree.insert(path.clone(), Node::File(Vec::new()));
            }
        }
        Ok(MemFile { path, pos: 0, flags })
    }

    fn file_close(&self, _file: MemFile) -> Result<(), EngineError> {
        CLOSES.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn file_read(&self, file: &mut MemFile, dest: &mut [u8]) -> Result<usize, EngineError> {
        if !file.flags.readable() {
            return Err(EngineError::BadF);
        }
        let _lock = self.device.lock();
        let tree = self.tree.lock().unwrap();
        let Some(Node::File(data)) = tree.get(&file.path) else {
            return Err(EngineError::NoEnt);
        };
        let start = (file.pos as usize).min(data.len());
        let n = (data.len() - start).min(dest.len());
        dest[..n].copy_from_slice(&data[start..start + n]);
        file.pos += n as u64;
        Ok(n)
    }

    fn file_write(&self, file: &mut MemFile, src: &[u8]) -> Result<usize, EngineError> {
        if !file.flags.writable() {
            return Err(EngineError::BadF);
        }
        let _lock = self.device.lock();
        let mut tree = self.tree.lock().unwrap();
        let used = Self::used(&tree);
        let Some(Node::File(data)) = tree.get_mut(&file.path) else {
            return Err(EngineError::NoEnt);
        };
        if file.flags.contains(EngineOpenFlags::APPEND) {
            file.pos = data.len() as u64;
        }
        let end = file.pos as usize + src.len();
        let growth = end.saturating_sub(data.len()) as u64;
        if used + growth > self.capacity {
            return Err(EngineError::NoSpc);
        }
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos as usize..end].copy_from_slice(src);
        file.pos = end as u64;
        Ok(src.len())
    }

    fn file_seek(
        &self,
        file: &mut MemFile,
        offset: i64,
        whence: EngineWhence,
    ) -> Result<u64, EngineError> {
        let tree = self.tree.lock().unwrap();
        let len = match tree.get(&file.path) {
            Some(Node::File(data)) => data.len() as i64,
            _ => return Err(EngineError::NoEnt),
        };
        let base = match whence {
            EngineWhence::Set => 0,
            EngineWhence::Cur => file.pos as i64,
            EngineWhence::End => len,
        };
        let pos = base
            .checked_add(offset)
            .filter(|pos| *pos >= 0)
            .ok_or(EngineError::Inval)?;
        file.pos = pos as u64;
        Ok(file.pos)
    }

    fn file_sync(&self, _file: &mut MemFile) -> Result<(), EngineError> {
        let _lock = self.device.lock();
        self.device.sync()
    }

    fn dir_open(&self, path: &str) -> Result<MemDir, EngineError> {
        let path = normalize(path)?;
        let tree = self.tree.lock().unwrap();
        match tree.get(&path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(EngineError::NotDir),
            None => return Err(EngineError::NoEnt),
        }
        let entries = tree
            .iter()
            .filter(|(child, _)| !child.is_empty() && parent(child) == path)
            .map(|(child, node)| EngineInfo {
                kind: match node {
                    Node::Dir => FileType::Directory,
                    Node::File(_) => FileType::Regular,
                },
                size: match node {
                    Node::Dir => 0,
                    Node::File(data) => data.len() as u64,
                },
                name: base_name(child).to_string(),
            })
            .collect();
        self.open_dirs.fetch_add(1, Ordering::SeqCst);
        Ok(MemDir { entries, next: 0 })
    }

    fn dir_read(&self, dir: &mut MemDir) -> Result<Option<EngineInfo>, EngineError> {
        let entry = dir.entries.get(dir.next).cloned();
        dir.next += 1;
        Ok(entry)
    }

    fn dir_close(&self, _dir: MemDir) -> Result<(), EngineError> {
        self.open_dirs.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<EngineInfo, EngineError> {
        let path = normalize(path)?;
        let tree = self.tree.lock().unwrap();
        let node = tree.get(&path).ok_or(EngineError::NoEnt)?;
        Ok(EngineInfo {
            kind: match node {
                Node::Dir => FileType::Directory,
                Node::File(_) => FileType::Regular,
            },
            size: match node {
                Node::Dir => 0,
                Node::File(data) => data.len() as u64,
            },
            name: base_name(&path).to_string(),
        })
    }

    fn remove(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path)?;
        if path.is_empty() {
            return Err(EngineError::Inval);
        }
        let mut tree = self.tree.lock().unwrap();
        match tree.get(&path) {
            None => return Err(EngineError::NoEnt),
            Some(Node::Dir) if tree.keys().any(|child| parent(child) == path && *child != path) => {
                return Err(EngineError::NotEmpty);
            }
            Some(_) => {}
        }
        tree.remove(&path);
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path)?;
        let mut tree = self.tree.lock().unwrap();
        if tree.contains_key(&path) {
            return Err(EngineError::Exist);
        }
        Self::check_parent(&tree, &path)?;
        tree.insert(path, Node::Dir);
        Ok(())
    }
}

/// Slot configuration of the mock host.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub width: u8,
}

/// Failures the mock card injects.
#[derive(Debug, Default)]
pub struct CardFaults {
    pub init: Option<DriverError>,
    pub init_slot: Option<DriverError>,
    /// Number of probes that fail before one succeeds.
    pub failed_probes: usize,
}

/// In-memory card with call counters.
pub struct MockCard {
    info: CardInfo,
    data: Mutex<Vec<u8>>,
    pub faults: Mutex<CardFaults>,
    pub inits: AtomicUsize,
    pub deinits: AtomicUsize,
    pub slot_inits: AtomicUsize,
    pub probes: AtomicUsize,
}

impl MockCard {
    /// A blank card of `sectors` sectors of 512 bytes.
    pub fn new(sectors: u64) -> Self {
        Self::with_info(CardInfo::new(512, 9, sectors).with_name("MOCK"))
    }

    pub fn with_info(info: CardInfo) -> Self {
        let len = (info.capacity * info.sector_size as u64) as usize;
        Self {
            info,
            data: Mutex::new(vec![0xFF; len]),
            faults: Mutex::new(CardFaults::default()),
            inits: AtomicUsize::new(0),
            deinits: AtomicUsize::new(0),
            slot_inits: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
        }
    }

    /// Whether init and deinit calls balance.
    pub fn host_released(&self) -> bool {
        self.inits.load(Ordering::SeqCst) == self.deinits.load(Ordering::SeqCst)
    }

    fn range(&self, start: u64, count: usize) -> Result<std::ops::Range<usize>, DriverError> {
        let sector = self.info.sector_size as usize;
        let from = start as usize * sector;
        let to = from + count * sector;
        if to > self.data.lock().unwrap().len() {
            return Err(DriverError::InvalidArg);
        }
        Ok(from..to)
    }
}

impl CardDriver for MockCard {
    type SlotConfig = Slot;

    fn init(&self) -> Result<(), DriverError> {
        if let Some(err) = self.faults.lock().unwrap().init {
            return Err(err);
        }
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn init_slot(&self, config: &Slot) -> Result<(), DriverError> {
        self.slot_inits.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.faults.lock().unwrap().init_slot {
            return Err(err);
        }
        if ![1, 4, 8].contains(&config.width) {
            return Err(DriverError::InvalidArg);
        }
        Ok(())
    }

    fn deinit(&self) {
        self.deinits.fetch_add(1, Ordering::SeqCst);
    }

    fn probe_card(&self) -> Result<CardInfo, DriverError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let mut faults = self.faults.lock().unwrap();
        if faults.failed_probes > 0 {
            faults.failed_probes -= 1;
            return Err(DriverError::Timeout);
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
        let range = self.range(start, count)?;
        let len = range.len();
        dest[..len].copy_from_slice(&self.data.lock().unwrap()[range]);
        Ok(())
    }

    fn write_sectors(
        &self,
        _card: &CardInfo,
        src: &[u8],
        start: u64,
        count: usize,
    ) -> Result<(), DriverError> {
        let range = self.range(start, count)?;
        let len = range.len();
        self.data.lock().unwrap()[range].copy_from_slice(&src[..len]);
        Ok(())
    }
}

/// Card large enough for 64 blocks of 8 KiB.
pub fn small_card() -> Arc<MockCard> {
    Arc::new(MockCard::new(1024))
}

pub const SLOT: Slot = Slot { width: 4 };
