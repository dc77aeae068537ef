//! Domain entities.
//!
//! Entities carry state that changes over their lifetime: descriptor slots move between
//! free, reserved and open; directory entries are refilled on every `readdir`.

mod dir_entry;
mod file_stat;
mod slot_state;

pub use dir_entry::{DirEntry, DT_DIR, DT_REG, NAME_MAX};
pub use file_stat::{FileType, Stat, PLACEHOLDER_INO, S_IFDIR, S_IFMT, S_IFREG, S_IRWXUGO};
pub use slot_state::SlotState;
