//! Block device adapters

pub mod memory;

#[cfg(feature = "std")]
pub mod file;

pub use memory::MemoryBlockDevice;

#[cfg(feature = "std")]
pub use file::FileBlockDevice;
