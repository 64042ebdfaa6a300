// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `exec PROG [ARGS...]`: set `JAVA_HOME`/`PATH` for the requested JDK, then
//! run `PROG`. On POSIX the current process is replaced via `exec()`; on
//! Windows (which has no equivalent syscall) the child is spawned and this
//! process exits with its status.

use crate::api;
use crate::config::ConfigBuilder;
use crate::error::{CjdkError, Result};

pub fn execute(builder: ConfigBuilder, prog: &str, args: &[String]) -> Result<()> {
    let guard = api::java_env(builder, true)?;
    // The guard's restore-on-drop is moot on the POSIX path (exec never
    // returns into this process), but matters if spawning fails before we
    // ever launch the child.
    run(prog, args, &guard.home)
}

#[cfg(unix)]
fn run(prog: &str, args: &[String], _java_home: &std::path::Path) -> Result<()> {
    use std::os::unix::process::CommandExt;
    use std::process::Command;

    let err = Command::new(prog).args(args).exec();
    Err(CjdkError::install(format!("Failed to execute {prog}: {err}")))
}

#[cfg(windows)]
fn run(prog: &str, args: &[String], _java_home: &std::path::Path) -> Result<()> {
    use std::process::{Command, Stdio};

    let status = Command::new(prog)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| CjdkError::install(format!("Failed to execute {prog}: {e}")))?;

    std::process::exit(status.code().unwrap_or(1));
}
