//! Descriptor slot state.

/// The state of one slot in the descriptor table.
///
/// Slots transition through these states:
/// - Free: available for allocation
/// - Reserved: handed out by `allocate`, engine file not yet opened
/// - Open: holds an open engine file handle
#[derive(Debug)]
pub enum SlotState<F> {
    /// Slot is available.
    Free,
    /// Slot is allocated but holds no engine handle yet.
    Reserved,
    /// Slot holds an open engine handle.
    Open(F),
}

impl<F> Default for SlotState<F> {
    fn default() -> Self {
        Self::Free
    }
}

impl<F> SlotState<F> {
    /// Check if the slot is free.
    #[inline]
    pub const fn is_free(&self) -> bool {
        matches!(self, SlotState::Free)
    }

    /// Check if the slot holds an open handle.
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, SlotState::Open(_))
    }

    /// Mark the slot free, returning the handle it held, if any.
    pub fn take(&mut self) -> Option<F> {
        match core::mem::take(self) {
            SlotState::Open(file) => Some(file),
            _ => None,
        }
    }
}
