//! File system abstraction with virtual file support.
//!
//! This module provides a layered file system for stylesheet builds:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    File Access Flow                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  path ──► read_source(path)                                 │
//! │                │                                            │
//! │                ├─► GLOBAL_SOURCE_CACHE (fingerprint check)  │
//! │                │                                            │
//! │                ├─► Virtual Path                             │
//! │                │   └─► VirtualFileSystem::read              │
//! │                │                                            │
//! │                └─► Physical File                            │
//! │                    └─► read_disk()                          │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Virtual File System
//!
//! The [`VirtualFileSystem`] trait allows injecting generated stylesheets
//! that take precedence over files on disk.
//!
//! # Access Tracking
//!
//! Every read is recorded in a thread-local set, which a build session
//! drains to report the files a build depended on.

mod access;
mod cache;
mod read;
mod vfs;

pub use access::{get_accessed_files, record_file_access, reset_access_flags};
pub use cache::{clear_source_cache, read_source, SlotCell, GLOBAL_SOURCE_CACHE};
pub use read::{decode_utf8, locate, read_file, read_with_global_virtual, read_with_virtual};
pub use vfs::{is_virtual_path, set_virtual_fs, MapVirtualFS, NoVirtualFS, VirtualFileSystem};

#[cfg(test)]
pub(crate) use vfs::VirtualFsGuard;
