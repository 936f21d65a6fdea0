use super::*;
use crate::constants::dir::SLOTS_PER_DIR;
use crate::constants::disk::FIRST_DATA_BLOCK;
use crate::filesys::block::MemoryBlockDevice;
use alloc::format;
use alloc::string::ToString;
use alloc::vec;

const DATA_BLOCKS: usize = TOTAL_BLOCKS - FIRST_DATA_BLOCK as usize;

fn fresh() -> FatFs<'static> {
    FatFs::format(Box::new(MemoryBlockDevice::with_volume_geometry())).unwrap()
}

/// Creates `name` holding exactly `text`, which must be empty or end in `\n`
fn create_text(fs: &mut FatFs, name: &str, text: &str) -> Result<(), FsError> {
    let mut lines = text.lines().chain([""]);
    fs.create(name, &mut lines)
}

/// Single-line file of exactly `len` bytes, newline included
fn create_sized(fs: &mut FatFs, name: &str, len: usize) -> Result<(), FsError> {
    let line = "x".repeat(len - 1);
    let mut lines = [line.as_str(), ""].into_iter();
    fs.create(name, &mut lines)
}

fn names(fs: &FatFs) -> Vec<String> {
    fs.ls().unwrap().into_iter().map(|entry| entry.name).collect()
}

#[test]
fn test_create_then_cat() {
    let mut fs = fresh();
    create_text(&mut fs, "hello", "hello\nworld\n").unwrap();

    assert_eq!(fs.cat("hello").unwrap(), b"hello\nworld\n");
    let meta = fs.stat("hello").unwrap();
    assert_eq!(meta.size, Some(12));
    assert_eq!(meta.first_block, FIRST_DATA_BLOCK);
    assert_eq!(meta.permissions, AccessRights::FILE_DEFAULT);
}

#[test]
fn test_content_stops_at_first_empty_line() {
    let mut fs = fresh();
    let mut lines = ["one", "two", "", "never stored"].into_iter();
    fs.create("f", &mut lines).unwrap();
    assert_eq!(fs.cat("f").unwrap(), b"one\ntwo\n");
}

#[test]
fn test_empty_file_owns_one_block() {
    let mut fs = fresh();
    create_text(&mut fs, "empty", "").unwrap();

    assert_eq!(fs.cat("empty").unwrap(), b"");
    assert_eq!(fs.stat("empty").unwrap().size, Some(0));
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 1);
}

#[test]
fn test_multi_block_roundtrip() {
    let mut fs = fresh();
    let mut text = String::new();
    for i in 0..1500 {
        text.push_str(&format!("line number {}\n", i));
    }
    create_text(&mut fs, "long", &text).unwrap();

    assert_eq!(fs.cat("long").unwrap(), text.as_bytes());
    assert_eq!(
        fs.free_blocks().unwrap(),
        DATA_BLOCKS - content::blocks_needed(text.len())
    );
}

#[test]
fn test_name_rules_apply_to_every_new_name() {
    let mut fs = fresh();
    let long = "n".repeat(56);
    assert_eq!(create_text(&mut fs, &long, ""), Err(FsError::NameTooLong));
    assert_eq!(fs.mkdir(&long), Err(FsError::NameTooLong));
    assert_eq!(create_text(&mut fs, "", ""), Err(FsError::InvalidName));
    assert_eq!(fs.mkdir("a/b"), Err(FsError::InvalidName));

    create_text(&mut fs, "src", "x\n").unwrap();
    assert_eq!(fs.cp("src", &long), Err(FsError::NameTooLong));
    assert_eq!(fs.mv("src", &long), Err(FsError::NameTooLong));
    assert_eq!(names(&fs), ["src"]);

    let longest = "n".repeat(55);
    create_text(&mut fs, &longest, "").unwrap();
    assert!(fs.stat(&longest).is_ok());
}

#[test]
fn test_duplicate_names_rejected() {
    let mut fs = fresh();
    create_text(&mut fs, "a", "a\n").unwrap();
    create_text(&mut fs, "b", "b\n").unwrap();
    fs.mkdir("d").unwrap();
    let free = fs.free_blocks().unwrap();

    assert_eq!(create_text(&mut fs, "a", ""), Err(FsError::AlreadyExists));
    assert_eq!(fs.mkdir("a"), Err(FsError::AlreadyExists));
    assert_eq!(fs.mkdir("d"), Err(FsError::AlreadyExists));
    assert_eq!(fs.cp("a", "b"), Err(FsError::AlreadyExists));
    assert_eq!(fs.mv("a", "b"), Err(FsError::AlreadyExists));
    assert_eq!(fs.free_blocks().unwrap(), free);
}

#[test]
fn test_missing_and_wrong_kind() {
    let mut fs = fresh();
    create_text(&mut fs, "f", "f\n").unwrap();
    fs.mkdir("d").unwrap();

    assert_eq!(fs.cat("nope"), Err(FsError::NotFound));
    assert_eq!(fs.cat("d"), Err(FsError::NotAFile));
    assert_eq!(fs.cp("nope", "x"), Err(FsError::NotFound));
    assert_eq!(fs.cp("d", "x"), Err(FsError::NotAFile));
    assert_eq!(fs.mv("nope", "x"), Err(FsError::NotFound));
    assert_eq!(fs.mv("d", "x"), Err(FsError::NotAFile));
    assert_eq!(fs.rm("nope"), Err(FsError::NotFound));
    assert_eq!(fs.append("nope", "f"), Err(FsError::NotFound));
    assert_eq!(fs.append("f", "nope"), Err(FsError::NotFound));
    assert_eq!(fs.append("d", "f"), Err(FsError::NotAFile));
    assert_eq!(fs.append("f", "d"), Err(FsError::NotAFile));
    assert_eq!(fs.chmod(AccessRights::READ, "nope"), Err(FsError::NotFound));
    assert_eq!(fs.stat("nope"), Err(FsError::NotFound));
}

#[test]
fn test_rm_frees_blocks_for_first_fit_reuse() {
    let mut fs = fresh();
    create_sized(&mut fs, "a", 2 * BLOCK_SIZE).unwrap();
    create_text(&mut fs, "b", "b\n").unwrap();
    assert_eq!(fs.stat("b").unwrap().first_block, 4);

    fs.rm("a").unwrap();
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 1);
    assert_eq!(names(&fs), ["b"]);

    create_sized(&mut fs, "c", 2 * BLOCK_SIZE).unwrap();
    let head = fs.stat("c").unwrap().first_block;
    let fat = FatTable::load(fs.device()).unwrap();
    assert_eq!(fat.chain(head).unwrap(), vec![2, 3]);
    // the freed slot 0 is reused as well
    assert_eq!(names(&fs), ["c", "b"]);
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 3);
}

#[test]
fn test_copy_is_independent() {
    let mut fs = fresh();
    create_text(&mut fs, "a", "original\n").unwrap();
    create_text(&mut fs, "more", "more\n").unwrap();
    fs.cp("a", "b").unwrap();
    assert_ne!(
        fs.stat("a").unwrap().first_block,
        fs.stat("b").unwrap().first_block
    );

    fs.append("more", "a").unwrap();
    assert_eq!(fs.cat("a").unwrap(), b"original\nmore\n");
    assert_eq!(fs.cat("b").unwrap(), b"original\n");

    fs.rm("a").unwrap();
    assert_eq!(fs.cat("b").unwrap(), b"original\n");
}

#[test]
fn test_copy_multi_block_file() {
    let mut fs = fresh();
    create_sized(&mut fs, "big", 3 * BLOCK_SIZE + 7).unwrap();
    fs.cp("big", "twin").unwrap();
    assert_eq!(fs.cat("twin").unwrap(), fs.cat("big").unwrap());
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 8);
}

#[test]
fn test_mv_renames_in_place() {
    let mut fs = fresh();
    create_text(&mut fs, "a", "a\n").unwrap();
    create_text(&mut fs, "b", "b\n").unwrap();
    let before = fs.stat("a").unwrap();

    fs.mv("a", "z").unwrap();
    assert_eq!(names(&fs), ["z", "b"]);
    assert_eq!(fs.stat("z").unwrap(), before);
    assert_eq!(fs.cat("z").unwrap(), b"a\n");
    assert_eq!(fs.stat("a"), Err(FsError::NotFound));
}

#[test]
fn test_mv_onto_directory_name_is_a_collision() {
    let mut fs = fresh();
    create_text(&mut fs, "f", "f\n").unwrap();
    fs.mkdir("d").unwrap();

    assert_eq!(fs.mv("f", "d"), Err(FsError::AlreadyExists));
    fs.cd("d").unwrap();
    assert_eq!(names(&fs), [".."]);
}

#[test]
fn test_append_crosses_block_boundary() {
    let mut fs = fresh();
    create_sized(&mut fs, "dst", BLOCK_SIZE - 1).unwrap();
    create_text(&mut fs, "src", "bc\n").unwrap();
    let mut expected = fs.cat("dst").unwrap();
    let free = fs.free_blocks().unwrap();

    fs.append("src", "dst").unwrap();
    expected.extend_from_slice(b"bc\n");
    assert_eq!(fs.cat("dst").unwrap(), expected);
    assert_eq!(fs.stat("dst").unwrap().size, Some(BLOCK_SIZE as u32 + 2));
    assert_eq!(fs.free_blocks().unwrap(), free - 1);
    // the source is untouched
    assert_eq!(fs.cat("src").unwrap(), b"bc\n");
}

#[test]
fn test_append_to_exactly_full_block() {
    let mut fs = fresh();
    create_sized(&mut fs, "dst", BLOCK_SIZE).unwrap();
    create_text(&mut fs, "src", "tail\n").unwrap();
    let mut expected = fs.cat("dst").unwrap();

    fs.append("src", "dst").unwrap();
    expected.extend_from_slice(b"tail\n");
    assert_eq!(fs.cat("dst").unwrap(), expected);
}

#[test]
fn test_append_empty_source_is_noop() {
    let mut fs = fresh();
    create_text(&mut fs, "dst", "keep\n").unwrap();
    create_text(&mut fs, "empty", "").unwrap();
    let free = fs.free_blocks().unwrap();

    fs.append("empty", "dst").unwrap();
    assert_eq!(fs.cat("dst").unwrap(), b"keep\n");
    assert_eq!(fs.free_blocks().unwrap(), free);
}

#[test]
fn test_append_to_empty_file() {
    let mut fs = fresh();
    create_text(&mut fs, "dst", "").unwrap();
    create_text(&mut fs, "src", "first\n").unwrap();
    fs.append("src", "dst").unwrap();
    assert_eq!(fs.cat("dst").unwrap(), b"first\n");
}

#[test]
fn test_append_file_to_itself() {
    let mut fs = fresh();
    create_text(&mut fs, "f", "ab\n").unwrap();
    fs.append("f", "f").unwrap();
    assert_eq!(fs.cat("f").unwrap(), b"ab\nab\n");
}

#[test]
fn test_root_directory_full() {
    let mut fs = fresh();
    for i in 0..SLOTS_PER_DIR {
        create_text(&mut fs, &format!("f{}", i), "").unwrap();
    }
    assert_eq!(create_text(&mut fs, "one-more", ""), Err(FsError::DirectoryFull));
    assert_eq!(fs.mkdir("dir"), Err(FsError::DirectoryFull));
    assert_eq!(fs.cp("f0", "copy"), Err(FsError::DirectoryFull));
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - SLOTS_PER_DIR);

    fs.rm("f10").unwrap();
    create_text(&mut fs, "one-more", "").unwrap();
    assert_eq!(fs.ls().unwrap()[10].name, "one-more");
}

#[test]
fn test_subdirectory_loses_a_slot_to_parent_link() {
    let mut fs = fresh();
    fs.mkdir("d").unwrap();
    fs.cd("d").unwrap();
    for i in 0..SLOTS_PER_DIR - 1 {
        create_text(&mut fs, &format!("f{}", i), "").unwrap();
    }
    assert_eq!(create_text(&mut fs, "extra", ""), Err(FsError::DirectoryFull));
}

#[test]
fn test_mkdir_layout() {
    let mut fs = fresh();
    fs.mkdir("d").unwrap();
    let meta = fs.stat("d").unwrap();
    assert!(meta.is_dir());
    assert_eq!(meta.size, None);
    assert_eq!(meta.permissions, AccessRights::DIR_DEFAULT);
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 1);

    fs.cd("d").unwrap();
    let listing = fs.ls().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "..");
    assert_eq!(listing[0].metadata.first_block, ROOT_BLOCK);
    assert!(listing[0].metadata.is_dir());
}

#[test]
fn test_same_name_in_different_directories() {
    let mut fs = fresh();
    create_text(&mut fs, "notes", "root\n").unwrap();
    fs.mkdir("d").unwrap();
    fs.cd("d").unwrap();
    create_text(&mut fs, "notes", "nested\n").unwrap();

    assert_eq!(fs.cat("notes").unwrap(), b"nested\n");
    fs.cd("..").unwrap();
    assert_eq!(fs.cat("notes").unwrap(), b"root\n");
}

#[test]
fn test_rm_directory_requires_empty() {
    let mut fs = fresh();
    fs.mkdir("d").unwrap();
    let block = fs.stat("d").unwrap().first_block;
    fs.cd("d").unwrap();
    create_text(&mut fs, "inner", "x\n").unwrap();
    fs.cd("/").unwrap();

    assert_eq!(fs.rm("d"), Err(FsError::DirectoryNotEmpty));

    fs.cd("d").unwrap();
    fs.rm("inner").unwrap();
    fs.cd("/").unwrap();
    fs.rm("d").unwrap();
    assert!(fs.ls().unwrap().is_empty());
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS);

    fs.mkdir("again").unwrap();
    assert_eq!(fs.stat("again").unwrap().first_block, block);
}

#[test]
fn test_rm_parent_link_refused() {
    let mut fs = fresh();
    fs.mkdir("d").unwrap();
    fs.cd("d").unwrap();
    assert_eq!(fs.rm(".."), Err(FsError::InvalidName));
    assert_eq!(fs.pwd().unwrap(), "/d");
}

#[test]
fn test_disk_full_keeps_volume_consistent() {
    let mut fs = fresh();
    create_sized(&mut fs, "big", (DATA_BLOCKS - 1) * BLOCK_SIZE).unwrap();
    assert_eq!(fs.free_blocks().unwrap(), 1);
    create_text(&mut fs, "last", "l\n").unwrap();
    assert_eq!(fs.free_blocks().unwrap(), 0);

    assert_eq!(create_text(&mut fs, "more", ""), Err(FsError::DiskFull));
    assert_eq!(fs.mkdir("d"), Err(FsError::DiskFull));
    assert_eq!(fs.cp("last", "copy"), Err(FsError::DiskFull));
    assert_eq!(fs.append("last", "big"), Err(FsError::DiskFull));
    assert_eq!(
        fs.stat("big").unwrap().size,
        Some(((DATA_BLOCKS - 1) * BLOCK_SIZE) as u32)
    );

    assert_eq!(names(&fs), ["big", "last"]);
    assert_eq!(fs.cat("last").unwrap(), b"l\n");
    fs.rm("big").unwrap();
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 1);
    create_text(&mut fs, "more", "m\n").unwrap();
}

#[test]
fn test_oversized_create_allocates_nothing() {
    let mut fs = fresh();
    assert_eq!(
        create_sized(&mut fs, "huge", DATA_BLOCKS * BLOCK_SIZE + 1),
        Err(FsError::DiskFull)
    );
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS);
    assert!(fs.ls().unwrap().is_empty());
}

#[test]
fn test_damaged_slot_leaves_directory_usable() {
    use crate::constants::dir::{DIR_ENTRY_SIZE, KIND_OFFSET};

    let mut fs = fresh();
    create_text(&mut fs, "good", "fine\n").unwrap();
    create_text(&mut fs, "bad", "junk\n").unwrap();

    let mut raw = vec![0u8; BLOCK_SIZE];
    fs.device.read_block(ROOT_BLOCK as u64, &mut raw).unwrap();
    raw[DIR_ENTRY_SIZE + KIND_OFFSET] = 7;
    fs.device.write_block(ROOT_BLOCK as u64, &raw).unwrap();

    assert_eq!(names(&fs), ["good", "bad"]);
    assert_eq!(fs.cat("good").unwrap(), b"fine\n");
    fs.rm("bad").unwrap();
    assert_eq!(names(&fs), ["good"]);
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS - 1);
}

#[cfg(feature = "std")]
#[test]
fn test_create_keeps_non_utf8_lines() {
    use crate::filesys::source::LineSource;

    let mut fs = fresh();
    let mut input = LineSource::new(std::io::Cursor::new(&b"ok\n\xff\xfe\nmore\n\n"[..]));
    fs.create("bytes", &mut input).unwrap();
    assert_eq!(fs.cat("bytes").unwrap(), b"ok\n\xff\xfe\nmore\n");
}

#[test]
fn test_chmod_sets_rights() {
    let mut fs = fresh();
    create_text(&mut fs, "f", "f\n").unwrap();
    fs.mkdir("d").unwrap();

    fs.chmod(AccessRights::READ, "f").unwrap();
    fs.chmod("5".parse().unwrap(), "d").unwrap();
    let listing = fs.ls().unwrap();
    assert_eq!(listing[0].metadata.permissions.to_string(), "r--");
    assert_eq!(listing[1].metadata.permissions.to_string(), "r-x");

    let mut raw = vec![0u8; BLOCK_SIZE];
    fs.device().read_block(ROOT_BLOCK as u64, &mut raw).unwrap();
    assert_eq!(raw[crate::constants::dir::RIGHTS_OFFSET], 0x04);
    // rights are not enforced
    assert_eq!(fs.cat("f").unwrap(), b"f\n");
}

#[test]
fn test_ls_reports_kinds_and_sizes_in_slot_order() {
    let mut fs = fresh();
    assert!(fs.ls().unwrap().is_empty());
    create_text(&mut fs, "a", "abc\n").unwrap();
    fs.mkdir("d").unwrap();
    create_text(&mut fs, "b", "").unwrap();

    let listing = fs.ls().unwrap();
    let summary: Vec<(&str, EntryKind, Option<u32>)> = listing
        .iter()
        .map(|e| (e.name.as_str(), e.metadata.kind, e.metadata.size))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a", EntryKind::File, Some(4)),
            ("d", EntryKind::Directory, None),
            ("b", EntryKind::File, Some(0)),
        ]
    );
}

#[test]
fn test_format_resets_volume() {
    let mut fs = fresh();
    create_text(&mut fs, "f", "f\n").unwrap();
    fs.mkdir("d").unwrap();
    fs.cd("d").unwrap();

    fs.format().unwrap();
    assert_eq!(fs.pwd().unwrap(), "/");
    assert!(fs.ls().unwrap().is_empty());
    assert_eq!(fs.free_blocks().unwrap(), DATA_BLOCKS);
}

#[test]
fn test_remount_sees_existing_content() {
    let mut fs = fresh();
    fs.mkdir("d").unwrap();
    fs.cd("d").unwrap();
    create_text(&mut fs, "kept", "kept\n").unwrap();

    let mut fs = FatFs::new(fs.into_device()).unwrap();
    assert_eq!(fs.pwd().unwrap(), "/");
    fs.cd("d").unwrap();
    assert_eq!(fs.cat("kept").unwrap(), b"kept\n");
}

#[test]
fn test_unformatted_device_mounts() {
    let fs = FatFs::new(Box::new(MemoryBlockDevice::with_volume_geometry())).unwrap();
    assert_eq!(fs.free_blocks().unwrap(), TOTAL_BLOCKS);
    assert!(fs.ls().unwrap().is_empty());
}

#[test]
fn test_unsupported_geometry() {
    let small = MemoryBlockDevice::new(16, BLOCK_SIZE);
    assert!(matches!(
        FatFs::format(Box::new(small)),
        Err(FsError::UnsupportedDevice {
            block_size: BLOCK_SIZE,
            total_blocks: 16
        })
    ));

    let sectors = MemoryBlockDevice::new(TOTAL_BLOCKS as u64 * 8, 512);
    assert!(matches!(
        FatFs::new(Box::new(sectors)),
        Err(FsError::UnsupportedDevice { block_size: 512, .. })
    ));
}

#[test]
fn test_borrowed_device() {
    let mut device = MemoryBlockDevice::with_volume_geometry();
    {
        let mut fs = FatFs::format(Box::new(&mut device)).unwrap();
        create_text(&mut fs, "f", "on loan\n").unwrap();
    }
    let root = device.block(ROOT_BLOCK as u64).unwrap();
    assert_eq!(&root[..2], b"f\0");
}

#[cfg(feature = "std")]
#[test]
fn test_persists_through_disk_image() {
    use crate::filesys::block::FileBlockDevice;

    let path = std::env::temp_dir().join(format!("fatdisk-fs-{}.img", std::process::id()));
    let _ = std::fs::remove_file(&path);
    {
        let device = FileBlockDevice::open(&path).unwrap();
        let mut fs = FatFs::format(Box::new(device)).unwrap();
        fs.mkdir("docs").unwrap();
        fs.cd("docs").unwrap();
        create_sized(&mut fs, "report", BLOCK_SIZE + 100).unwrap();
    }
    {
        let device = FileBlockDevice::open(&path).unwrap();
        let mut fs = FatFs::new(Box::new(device)).unwrap();
        fs.cd("docs").unwrap();
        assert_eq!(fs.pwd().unwrap(), "/docs");
        let content = fs.cat("report").unwrap();
        assert_eq!(content.len(), BLOCK_SIZE + 100);
        assert_eq!(content.last(), Some(&b'\n'));
    }
    std::fs::remove_file(&path).unwrap();
}
