//! Batch manifests and snapshot readers.
//!
//! [`BatchFileList`] turns a manifest into an ordered list of snapshot
//! groups. [`ReaderKind`] opens a group in one of the supported formats and
//! hands back a [`coef_core::SnapshotReader`].

pub mod filelist;
pub mod formats;
pub mod memory;

pub use filelist::BatchFileList;
pub use formats::{load_group, read_ascii, read_json, JsonComponent, JsonSnapshot, ReaderKind};
pub use memory::MemorySnapshot;
