/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Drivers behind the `f2fs-gc-once` and `f2fs-gc` binaries. They take the
//! raw argv, the function used to open the target and the output streams,
//! so that everything except the ioctl itself can be exercised in tests.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use f2fs::GcMode;

use crate::collect;
use crate::Error;
use crate::Exit;
use crate::GarbageCollect;
use crate::Repeat;
use crate::Report;
use crate::Result;

const SYNC_HELP: &str = "sync is the third arg passed to ioctl. Generally, sync=1 implies \
                         foreground gc. sync=0 implies background gc.";

/// Ask f2fs for a single garbage collection pass
#[derive(Debug, Parser)]
#[command(after_help = SYNC_HELP)]
struct OnceArgs {
    /// Path on the f2fs volume, usually its mount point
    mount_point: PathBuf,
    #[arg(allow_negative_numbers = true)]
    sync: GcMode,
}

/// Ask f2fs for garbage collection passes until `n` are done or one fails
#[derive(Debug, Parser)]
#[command(after_help = SYNC_HELP)]
struct RepeatArgs {
    /// Path on the f2fs volume, usually its mount point
    mount_point: PathBuf,
    #[arg(allow_negative_numbers = true)]
    sync: GcMode,
    /// Number of passes, -1 to keep going until one fails
    #[arg(allow_negative_numbers = true)]
    n: Repeat,
}

/// Parse argv, printing usage on failure. `Err` carries the exit status the
/// caller should return immediately.
///
/// Every argument after the program name is positional. The count is checked
/// on the raw argv, and a correctly sized argv is handed to clap behind `--`,
/// so paths starting with `-` reach the opener untouched.
fn parse<A, I>(
    argv: I,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<std::result::Result<A, Exit>>
where
    A: Parser,
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    let mut argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let mut cmd = A::command();
    let expected = cmd.get_positionals().count();
    let given = argv.len().saturating_sub(1);
    let parsed = if given == expected {
        argv.insert(1, "--".into());
        A::try_parse_from(argv)
    } else {
        match A::try_parse_from(argv) {
            Ok(_) => {
                writeln!(
                    err,
                    "error: expected {expected} arguments, got {given}\n\n{}",
                    cmd.render_usage()
                )?;
                writeln!(err, "{SYNC_HELP}")?;
                return Ok(Err(Exit::Failure));
            }
            Err(e) => Err(e),
        }
    };
    match parsed {
        Ok(args) => Ok(Ok(args)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                write!(out, "{e}")?;
                Ok(Err(Exit::Success))
            }
            _ => {
                write!(err, "{}", Error::Usage(e))?;
                writeln!(err, "{SYNC_HELP}")?;
                Ok(Err(Exit::Failure))
            }
        },
    }
}

/// The target is only alive inside this function, so it is closed before the
/// report is printed no matter how the loop ended.
fn open_and_collect<T, F>(path: &Path, open: F, mode: GcMode, repeat: Repeat) -> Result<Report>
where
    T: GarbageCollect,
    F: FnOnce(&Path) -> f2fs::Result<T>,
{
    let target = open(path).map_err(Error::Open)?;
    Ok(collect(&target, mode, repeat))
}

/// `f2fs-gc-once <mount-point> <sync>`
///
/// Exits with success once the target was opened, even if the ioctl failed.
pub fn run_once<I, T, F>(
    argv: I,
    open: F,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<Exit>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    T: GarbageCollect,
    F: FnOnce(&Path) -> f2fs::Result<T>,
{
    let args: OnceArgs = match parse(argv, out, err)? {
        Ok(args) => args,
        Err(exit) => return Ok(exit),
    };
    writeln!(out, "arg:{}", args.sync)?;

    let report = match open_and_collect(&args.mount_point, open, args.sync, Repeat::Bounded(1)) {
        Ok(report) => report,
        Err(e) => {
            writeln!(err, "{e}")?;
            return Ok(Exit::Failure);
        }
    };
    if let Some(e) = report.error() {
        writeln!(err, "{e}")?;
    }
    writeln!(out, "ioctl ret: {}.", report.ret())?;
    Ok(Exit::Success)
}

/// `f2fs-gc <mount-point> <sync> <n>`
///
/// Exits with failure if the last ioctl attempted failed.
pub fn run_repeat<I, T, F>(
    argv: I,
    open: F,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<Exit>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    T: GarbageCollect,
    F: FnOnce(&Path) -> f2fs::Result<T>,
{
    let args: RepeatArgs = match parse(argv, out, err)? {
        Ok(args) => args,
        Err(exit) => return Ok(exit),
    };
    writeln!(out, "arg:{}", args.sync)?;

    let report = match open_and_collect(&args.mount_point, open, args.sync, args.n) {
        Ok(report) => report,
        Err(e) => {
            writeln!(err, "{e}")?;
            return Ok(Exit::Failure);
        }
    };
    if let Some(e) = report.error() {
        writeln!(err, "{e}")?;
    }
    writeln!(
        out,
        "{} iterations, ioctl ret: {}.",
        report.attempts(),
        report.ret()
    )?;
    Ok(match report.succeeded() {
        true => Exit::Success,
        false => Exit::Failure,
    })
}
