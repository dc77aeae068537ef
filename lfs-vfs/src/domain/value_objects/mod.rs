//! Value objects for the domain layer.
//!
//! Immutable, validated data types: descriptors, card characteristics, the derived
//! device geometry and the flag sets that cross the POSIX/engine boundary.

mod card_info;
mod descriptor;
mod flags;
mod geometry;

pub use card_info::CardInfo;
pub use descriptor::{Descriptor, FD_OFFSET};
pub use flags::{AccessMode, EngineOpenFlags, EngineWhence, MountFlags, OpenFlags, Whence};
pub use geometry::{
    Geometry, GeometryError, BLOCK_CYCLES, LOOKAHEAD_SIZE, MIN_GRANULARITY, TARGET_BLOCK_SIZE,
};
