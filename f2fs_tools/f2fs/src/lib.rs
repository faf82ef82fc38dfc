/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt::Display;
use std::fs::File;
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use nix::sys::statfs::fstatfs;
use thiserror::Error;
use tracing::debug;
use tracing::trace;
use tracing::warn;

mod ioctl;

pub use ioctl::request_code;
pub use ioctl::F2FS_IOCTL_MAGIC;
pub use ioctl::REQUESTS;

const F2FS_SUPER_MAGIC: u32 = 0xf2f5_2010;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{request} ioctl failed: {source}")]
    Ioctl {
        request: &'static str,
        source: std::io::Error,
    },
}

impl Error {
    /// The underlying OS error, without any of the context we added.
    pub fn os_error(&self) -> &std::io::Error {
        match self {
            Self::Open { source, .. } | Self::Ioctl { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The `sync` argument of F2FS_IOC_GARBAGE_COLLECT. The kernel only
/// distinguishes zero from non-zero, but whatever the caller gives us is
/// forwarded untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GcMode(i32);

impl GcMode {
    /// Let the kernel run a background-style pass, which may do no work.
    pub const BACKGROUND: Self = Self(0);
    /// Block until a victim section has been cleaned.
    pub const FOREGROUND: Self = Self(1);

    pub fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_foreground(self) -> bool {
        self.0 != 0
    }
}

impl From<i32> for GcMode {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl FromStr for GcMode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Display for GcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open handle to something on an f2fs filesystem (usually the mount
/// point). The descriptor is closed when this is dropped.
#[derive(Debug)]
pub struct Volume {
    fd: File,
    opened_path: PathBuf,
}

impl Volume {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fd = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| Error::Open {
                path: path.to_owned(),
                source,
            })?;
        trace!("opened {} as fd {}", path.display(), fd.as_raw_fd());

        // The kernel is the authority on whether this request makes sense,
        // but a hint in the logs saves some head scratching when it doesn't.
        match fstatfs(&fd) {
            Ok(statfs) if statfs.filesystem_type().0 as u32 != F2FS_SUPER_MAGIC => {
                warn!("{} is not on an f2fs filesystem", path.display());
            }
            Ok(_) => {}
            Err(e) => warn!("failed to statfs {}: {e}", path.display()),
        }

        Ok(Self {
            fd,
            opened_path: path.to_owned(),
        })
    }

    /// Path where this volume was opened.
    pub fn path(&self) -> &Path {
        &self.opened_path
    }

    /// Ask the filesystem for one garbage collection pass. Returns the
    /// ioctl's return value.
    pub fn garbage_collect(&self, mode: GcMode) -> Result<i32> {
        let arg = mode.raw() as u32;
        debug!(
            "F2FS_IOC_GARBAGE_COLLECT ({:#x}) sync={mode} on {}",
            ioctl::GARBAGE_COLLECT,
            self.path().display()
        );
        unsafe { ioctl::garbage_collect(self.fd.as_raw_fd(), &arg) }.map_err(|e| Error::Ioctl {
            request: "GARBAGE_COLLECT",
            source: std::io::Error::from(e),
        })
    }
}
