/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt::Display;
use std::process::ExitCode;
use std::str::FromStr;

use f2fs::GcMode;
use f2fs::Volume;
use thiserror::Error;
use tracing::debug;
use tracing::trace_span;
use tracing_subscriber::prelude::*;

pub mod cli;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] clap::Error),
    #[error("open file error: {}", .0.os_error())]
    Open(#[source] f2fs::Error),
    #[error("ioctl error: {}", .source.os_error())]
    Call {
        attempt: u64,
        #[source]
        source: f2fs::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can be asked for a garbage collection pass. [Volume] is the
/// real thing, tests provide their own.
pub trait GarbageCollect {
    fn garbage_collect(&self, mode: GcMode) -> f2fs::Result<i32>;
}

impl GarbageCollect for Volume {
    fn garbage_collect(&self, mode: GcMode) -> f2fs::Result<i32> {
        Volume::garbage_collect(self, mode)
    }
}

/// How many passes to request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    /// Exactly this many, unless one of them fails first.
    Bounded(u64),
    /// Keep going until a pass fails.
    Unbounded,
}

impl Repeat {
    fn allows(self, attempts: u64) -> bool {
        match self {
            Self::Bounded(n) => attempts < n,
            Self::Unbounded => true,
        }
    }
}

impl FromStr for Repeat {
    type Err = std::num::ParseIntError;

    /// `-1` means unbounded. Other negative counts run zero passes.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let n: i64 = s.trim().parse()?;
        Ok(match n {
            -1 => Self::Unbounded,
            n => Self::Bounded(n.try_into().unwrap_or(0)),
        })
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Outcome of a [collect] run.
#[derive(Debug, Default)]
pub struct Report {
    attempts: u64,
    last: Option<Result<i32>>,
}

impl Report {
    /// Number of ioctls issued, including a failed final one.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Result of the most recent ioctl, if any was issued.
    pub fn last(&self) -> Option<&Result<i32>> {
        self.last.as_ref()
    }

    pub fn error(&self) -> Option<&Error> {
        self.last().and_then(|r| r.as_ref().err())
    }

    /// What the ioctl returned, in the shape of the raw syscall: -1 on
    /// failure. Zero when no pass was requested at all.
    pub fn ret(&self) -> i32 {
        match self.last() {
            None => 0,
            Some(Ok(ret)) => *ret,
            Some(Err(_)) => -1,
        }
    }

    /// Running zero passes counts as success.
    pub fn succeeded(&self) -> bool {
        !matches!(self.last, Some(Err(_)))
    }
}

/// Request garbage collection passes from `target` until `repeat` is
/// exhausted or one of them fails.
pub fn collect<T>(target: &T, mode: GcMode, repeat: Repeat) -> Report
where
    T: GarbageCollect + ?Sized,
{
    let span = trace_span!(
        "collect",
        sync = mode.raw(),
        foreground = mode.is_foreground(),
        repeat = %repeat
    );
    let _enter = span.enter();
    let mut report = Report::default();
    while repeat.allows(report.attempts) {
        report.attempts += 1;
        let attempt = report.attempts;
        match target.garbage_collect(mode) {
            Ok(ret) => {
                debug!("pass {attempt} returned {ret}");
                report.last = Some(Ok(ret));
            }
            Err(source) => {
                debug!("pass {attempt} failed: {source}");
                report.last = Some(Err(Error::Call { attempt, source }));
                break;
            }
        }
    }
    report
}

/// Process exit status of the command line tools.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

/// glog-formatted logs on stderr, filtered by RUST_LOG.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(std::io::stderr)
                .event_format(
                    tracing_glog::Glog::default()
                        .with_span_context(true)
                        .with_timer(tracing_glog::LocalTime::default()),
                )
                .fmt_fields(tracing_glog::GlogFields::default()),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
