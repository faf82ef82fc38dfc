/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use nix::ioctl_write_ptr;
use nix::request_code_none;
use nix::request_code_readwrite;
use nix::request_code_write;
use nix::sys::ioctl::ioctl_num_type;

pub const F2FS_IOCTL_MAGIC: u8 = 0xf5;

/// Mirrors `struct f2fs_defragment` from linux/f2fs.h
#[derive(Debug, Copy, Clone, Default)]
#[repr(C)]
pub struct defragment_args {
    pub start: u64,
    pub len: u64,
}

pub const START_ATOMIC_WRITE: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 1);
pub const COMMIT_ATOMIC_WRITE: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 2);
pub const START_VOLATILE_WRITE: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 3);
pub const RELEASE_VOLATILE_WRITE: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 4);
pub const ABORT_VOLATILE_WRITE: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 5);
pub const GARBAGE_COLLECT: ioctl_num_type =
    request_code_write!(F2FS_IOCTL_MAGIC, 6, std::mem::size_of::<u32>());
pub const WRITE_CHECKPOINT: ioctl_num_type = request_code_none!(F2FS_IOCTL_MAGIC, 7);
pub const DEFRAGMENT: ioctl_num_type = request_code_readwrite!(
    F2FS_IOCTL_MAGIC,
    8,
    std::mem::size_of::<defragment_args>()
);

/// Every f2fs control request this crate knows about, keyed by the name the
/// kernel headers give it (minus the `F2FS_IOC_` prefix).
pub const REQUESTS: &[(&str, ioctl_num_type)] = &[
    ("START_ATOMIC_WRITE", START_ATOMIC_WRITE),
    ("COMMIT_ATOMIC_WRITE", COMMIT_ATOMIC_WRITE),
    ("START_VOLATILE_WRITE", START_VOLATILE_WRITE),
    ("RELEASE_VOLATILE_WRITE", RELEASE_VOLATILE_WRITE),
    ("ABORT_VOLATILE_WRITE", ABORT_VOLATILE_WRITE),
    ("GARBAGE_COLLECT", GARBAGE_COLLECT),
    ("WRITE_CHECKPOINT", WRITE_CHECKPOINT),
    ("DEFRAGMENT", DEFRAGMENT),
];

pub fn request_code(name: &str) -> Option<ioctl_num_type> {
    REQUESTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

// the argument is the `sync` flag, read by the kernel as a __u32
ioctl_write_ptr!(garbage_collect, F2FS_IOCTL_MAGIC, 6, u32);
