//! Directory records and whole-block directory codec

use crate::constants::dir::*;
use crate::constants::disk::BLOCK_SIZE;
use crate::filesys::{AccessRights, BlockDevice, EntryKind, FileMetadata, FsError};
use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec;
use arrayvec::ArrayString;

/// A validated single path component
pub type EntryName = ArrayString<MAX_NAME_LEN>;

/// Checks a caller supplied name before it is stored in a slot
pub fn validate_name(name: &str) -> Result<EntryName, FsError> {
    if name.len() > MAX_NAME_LEN {
        return Err(FsError::NameTooLong);
    }
    if name.is_empty() || name == PARENT_ENTRY_NAME || name.contains(['/', '\0']) {
        return Err(FsError::InvalidName);
    }
    EntryName::from(name).map_err(|_| FsError::NameTooLong)
}

/// One 64-byte directory slot. A slot with an empty name is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirRecord {
    pub name: EntryName,
    pub size: u32,
    pub first_block: u16,
    pub kind: EntryKind,
    pub rights: AccessRights,
}

impl DirRecord {
    /// The all-zero free slot
    pub const FREE: DirRecord = DirRecord {
        name: EntryName::new_const(),
        size: 0,
        first_block: 0,
        kind: EntryKind::File,
        rights: AccessRights::empty(),
    };

    /// Creates a file record with default rights
    pub fn new_file(name: EntryName, first_block: u16, size: u32) -> Self {
        Self {
            name,
            size,
            first_block,
            kind: EntryKind::File,
            rights: AccessRights::FILE_DEFAULT,
        }
    }

    /// Creates a directory record with default rights
    pub fn new_directory(name: EntryName, first_block: u16) -> Self {
        Self {
            name,
            size: 0,
            first_block,
            kind: EntryKind::Directory,
            rights: AccessRights::DIR_DEFAULT,
        }
    }

    /// The back-link stored in slot 0 of every subdirectory
    pub fn parent_link(parent_block: u16) -> Self {
        let mut name = EntryName::new();
        name.push_str(PARENT_ENTRY_NAME);
        Self::new_directory(name, parent_block)
    }

    /// Returns true if entry is empty/unused
    pub fn is_free(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns true if entry is a directory
    pub fn is_directory(&self) -> bool {
        !self.is_free() && self.kind == EntryKind::Directory
    }

    pub fn is_parent_link(&self) -> bool {
        self.is_directory() && self.name.as_str() == PARENT_ENTRY_NAME
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: match self.kind {
                EntryKind::File => Some(self.size),
                EntryKind::Directory => None,
            },
            kind: self.kind,
            first_block: self.first_block,
            permissions: self.rights,
        }
    }

    /// Decodes one record; `block`/`slot` locate it in the warning logged for
    /// a damaged slot. A damaged slot still decodes so its siblings stay
    /// usable: an unterminated name is cut to `MAX_NAME_LEN` bytes, invalid
    /// UTF-8 is replaced, and an unknown kind byte reads as a file.
    pub fn decode(raw: &[u8], block: u16, slot: usize) -> Self {
        let name_field = &raw[..NAME_FIELD_LEN];
        if name_field[0] == 0 {
            return Self::FREE;
        }
        let (name, clean_name) = decode_name(name_field);

        let size = u32::from_le_bytes([
            raw[SIZE_OFFSET],
            raw[SIZE_OFFSET + 1],
            raw[SIZE_OFFSET + 2],
            raw[SIZE_OFFSET + 3],
        ]);
        let first_block =
            u16::from_le_bytes([raw[FIRST_BLOCK_OFFSET], raw[FIRST_BLOCK_OFFSET + 1]]);
        let kind = match raw[KIND_OFFSET] {
            TYPE_DIR => EntryKind::Directory,
            _ => EntryKind::File,
        };
        let rights = AccessRights::from_bits_retain(raw[RIGHTS_OFFSET]);

        if !clean_name || !matches!(raw[KIND_OFFSET], TYPE_FILE | TYPE_DIR) {
            log::warn!(
                "damaged directory entry {} in block {} read as {} {:?}",
                slot,
                block,
                kind,
                name.as_str()
            );
        }

        Self {
            name,
            size,
            first_block,
            kind,
            rights,
        }
    }

    /// Encodes into a zeroed 64-byte slice; free records stay all zero
    pub fn encode(&self, raw: &mut [u8]) {
        raw[..DIR_ENTRY_SIZE].fill(0);
        if self.is_free() {
            return;
        }
        raw[..self.name.len()].copy_from_slice(self.name.as_bytes());
        raw[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&self.size.to_le_bytes());
        raw[FIRST_BLOCK_OFFSET..FIRST_BLOCK_OFFSET + 2]
            .copy_from_slice(&self.first_block.to_le_bytes());
        raw[KIND_OFFSET] = match self.kind {
            EntryKind::File => TYPE_FILE,
            EntryKind::Directory => TYPE_DIR,
        };
        raw[RIGHTS_OFFSET] = self.rights.bits();
    }
}

/// Name bytes up to the NUL terminator, and whether they needed no repair
fn decode_name(field: &[u8]) -> (EntryName, bool) {
    let (bytes, terminated) = match field.iter().position(|&b| b == 0) {
        Some(len) if len <= MAX_NAME_LEN => (&field[..len], true),
        _ => (&field[..MAX_NAME_LEN], false),
    };
    let text = String::from_utf8_lossy(bytes);

    let mut name = EntryName::new();
    for c in text.chars() {
        if name.try_push(c).is_err() {
            break;
        }
    }
    (name, terminated && matches!(text, Cow::Borrowed(_)))
}

/// All slots of one directory block
#[derive(Clone)]
pub struct DirBlock {
    slots: [DirRecord; SLOTS_PER_DIR],
}

impl DirBlock {
    /// A block with every slot free
    pub fn empty() -> Self {
        Self {
            slots: [DirRecord::FREE; SLOTS_PER_DIR],
        }
    }

    /// A fresh subdirectory: only the `..` link in slot 0
    pub fn with_parent(parent_block: u16) -> Self {
        let mut block = Self::empty();
        block.slots[0] = DirRecord::parent_link(parent_block);
        block
    }

    pub fn slot(&self, index: usize) -> &DirRecord {
        &self.slots[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut DirRecord {
        &mut self.slots[index]
    }

    /// Overwrites a slot with the all-zero free record
    pub fn clear(&mut self, index: usize) {
        self.slots[index] = DirRecord::FREE;
    }

    /// Index of the first live slot carrying `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| !slot.is_free() && slot.name.as_str() == name)
    }

    /// Index of the first free slot
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(DirRecord::is_free)
    }

    /// Block of the parent directory, `None` for the root
    pub fn parent(&self) -> Option<u16> {
        self.slots
            .iter()
            .find(|slot| slot.is_parent_link())
            .map(|slot| slot.first_block)
    }

    /// Name under which the subdirectory stored at `child` is linked here
    pub fn child_dir_name(&self, child: u16) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| {
                slot.is_directory() && !slot.is_parent_link() && slot.first_block == child
            })
            .map(|slot| slot.name.as_str())
    }

    /// Returns true if nothing but the `..` link is live
    pub fn is_empty_dir(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.is_free() || slot.is_parent_link())
    }

    /// Live slots in on-disk order
    pub fn live(&self) -> impl Iterator<Item = &DirRecord> {
        self.slots.iter().filter(|slot| !slot.is_free())
    }
}

/// Reads one directory block and decodes every slot. Damaged slots are
/// normalised when the block is next written back.
pub fn read_entries(device: &dyn BlockDevice, block: u16) -> Result<DirBlock, FsError> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    device.read_block(block as u64, &mut buf)?;

    let mut entries = DirBlock::empty();
    for (slot, raw) in buf.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
        entries.slots[slot] = DirRecord::decode(raw, block, slot);
    }
    Ok(entries)
}

/// Encodes every slot and writes the whole block back
pub fn write_entries(
    device: &mut dyn BlockDevice,
    block: u16,
    entries: &DirBlock,
) -> Result<(), FsError> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    for (raw, record) in buf.chunks_exact_mut(DIR_ENTRY_SIZE).zip(entries.slots.iter()) {
        record.encode(raw);
    }
    device.write_block(block as u64, &buf)
}
