//! Volume geometry and on-disk layout constants.

pub mod dir;
pub mod disk;
