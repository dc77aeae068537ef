//! Descriptor table - bounded mapping from descriptors to engine file handles.
//!
//! The table owns a fixed array of slots and a stack of free slot indices. Allocation
//! and release are O(1). The free stack has its own spinlock, held only for a push or
//! pop. Each slot has a separate lock of the caller's raw mutex type, held across engine
//! I/O on that descriptor, so I/O on one descriptor never blocks allocation or I/O on
//! another.

use lock_api::Mutex;

use crate::domain::{
    entities::SlotState,
    error::Errno,
    ports::{RawLock, SpinRawMutex},
    value_objects::Descriptor,
};

/// Default number of simultaneously open files.
pub const MAX_FILES: usize = 64;

struct FreeList<const N: usize> {
    stack: [u16; N],
    len: usize,
}

impl<const N: usize> FreeList<N> {
    /// All indices free, lowest index on top.
    const fn full() -> Self {
        let mut stack = [0u16; N];
        let mut i = 0;
        while i < N {
            stack[i] = (N - 1 - i) as u16;
            i += 1;
        }
        Self { stack, len: N }
    }

    fn pop(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.stack[self.len] as usize)
    }

    fn push(&mut self, index: usize) {
        debug_assert!(self.len < N, "free list overflow");
        self.stack[self.len] = index as u16;
        self.len += 1;
    }
}

/// Fixed-capacity pool of descriptor slots.
///
/// # Type Parameters
///
/// - `F`: The engine's open-file handle type
/// - `N`: Capacity (at most `u16::MAX`)
/// - `R`: Raw mutex guarding each slot, a spinlock by default
///
/// # Examples
///
/// ```
/// use lfs_vfs::{DescriptorTable, Errno};
///
/// let table: DescriptorTable<u32, 2> = DescriptorTable::new();
/// let fd = table.allocate().unwrap();
/// table.install(fd, 7).unwrap();
/// assert_eq!(table.resolve(fd, |file| *file), Ok(7));
/// assert_eq!(table.release(fd), Ok(Some(7)));
/// assert_eq!(table.resolve(fd, |file| *file), Err(Errno::BadDescriptor));
/// ```
pub struct DescriptorTable<F, const N: usize = MAX_FILES, R: RawLock = SpinRawMutex> {
    free: spin::Mutex<FreeList<N>>,
    slots: [Mutex<R, SlotState<F>>; N],
}

impl<F, const N: usize> DescriptorTable<F, N> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self::with_raw_mutex()
    }
}

impl<F, const N: usize, R: RawLock> DescriptorTable<F, N, R> {
    /// Create an empty table whose slots lock with the raw mutex `R`.
    pub const fn with_raw_mutex() -> Self {
        const { assert!(N > 0 && N <= u16::MAX as usize, "capacity out of range") };
        Self {
            free: spin::Mutex::new(FreeList::full()),
            slots: [const { Mutex::const_new(R::INIT, SlotState::Free) }; N],
        }
    }

    /// Capacity of the table.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of slots currently allocated.
    pub fn in_use(&self) -> usize {
        N - self.free.lock().len
    }

    /// Reserve a slot and return its descriptor.
    ///
    /// The slot stays reserved, and unresolvable, until [`install`](Self::install).
    ///
    /// # Errors
    ///
    /// Returns `TooManyOpenFiles` when every slot is taken.
    pub fn allocate(&self) -> Result<Descriptor, Errno> {
        let index = self.free.lock().pop().ok_or(Errno::TooManyOpenFiles)?;
        *self.slots[index].lock() = SlotState::Reserved;
        Ok(Descriptor::from_slot(index))
    }

    /// Store an open engine handle in a reserved slot.
    ///
    /// # Errors
    ///
    /// Hands `file` back if the slot is not reserved, e.g. because the descriptor was
    /// closed while the file was being opened.
    pub fn install(&self, fd: Descriptor, file: F) -> Result<(), F> {
        let Ok(slot) = self.slot(fd) else {
            return Err(file);
        };
        let mut slot = slot.lock();
        match *slot {
            SlotState::Reserved => {
                *slot = SlotState::Open(file);
                Ok(())
            }
            _ => Err(file),
        }
    }

    /// Run `op` on the open handle behind `fd`.
    ///
    /// Only the slot's own lock is held while `op` runs.
    ///
    /// # Errors
    ///
    /// Returns `BadDescriptor` if `fd` is out of range or does not refer to an open file.
    pub fn resolve<T>(&self, fd: Descriptor, op: impl FnOnce(&mut F) -> T) -> Result<T, Errno> {
        let mut slot = self.slot(fd)?.lock();
        match &mut *slot {
            SlotState::Open(file) => Ok(op(file)),
            _ => Err(Errno::BadDescriptor),
        }
    }

    /// Free the slot behind `fd`, returning the handle it held.
    ///
    /// A reserved slot is released too and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `BadDescriptor` if `fd` is out of range or already free.
    pub fn release(&self, fd: Descriptor) -> Result<Option<F>, Errno> {
        let (index, file) = {
            let index = Self::index(fd)?;
            let mut slot = self.slots[index].lock();
            if slot.is_free() {
                return Err(Errno::BadDescriptor);
            }
            (index, slot.take())
        };
        self.free.lock().push(index);
        Ok(file)
    }

    /// Free every open slot, passing each handle to `op`.
    ///
    /// Reserved slots are left alone. Returns how many handles were drained.
    pub fn drain(&self, mut op: impl FnMut(Descriptor, F)) -> usize {
        let mut drained = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let file = {
                let mut slot = slot.lock();
                if slot.is_open() { slot.take() } else { None }
            };
            if let Some(file) = file {
                self.free.lock().push(index);
                op(Descriptor::from_slot(index), file);
                drained += 1;
            }
        }
        drained
    }

    fn index(fd: Descriptor) -> Result<usize, Errno> {
        match fd.slot_index() {
            Some(index) if index < N => Ok(index),
            _ => Err(Errno::BadDescriptor),
        }
    }

    fn slot(&self, fd: Descriptor) -> Result<&Mutex<R, SlotState<F>>, Errno> {
        Ok(&self.slots[Self::index(fd)?])
    }
}

impl<F, const N: usize> Default for DescriptorTable<F, N> {
    fn default() -> Self {
        Self::new()
    }
}
