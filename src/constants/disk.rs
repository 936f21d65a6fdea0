//! Volume geometry and allocation table constants.

/// Size of a device block in bytes
pub const BLOCK_SIZE: usize = 4096;

/// Size of one allocation table entry in bytes (signed 16-bit)
pub const FAT_ENTRY_SIZE: usize = 2;

/// Number of blocks on the volume; the whole table fits in a single block
pub const TOTAL_BLOCKS: usize = BLOCK_SIZE / FAT_ENTRY_SIZE;

/// Block holding the root directory
pub const ROOT_BLOCK: u16 = 0;

/// Block holding the serialized allocation table
pub const FAT_BLOCK: u16 = 1;

/// First block handed out by the allocator
pub const FIRST_DATA_BLOCK: u16 = 2;

/// Table value of an unused block
pub const FAT_FREE: i16 = 0;

/// Table value of the last block in a chain
pub const FAT_EOF: i16 = -1;
