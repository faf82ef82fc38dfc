/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use f2fs::Volume;

fn main() -> Result<ExitCode> {
    f2fs_gc::init_logging();

    let exit = f2fs_gc::cli::run_repeat(
        std::env::args_os(),
        |path| Volume::open(path),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
    .context("while writing output")?;
    Ok(exit.into())
}
