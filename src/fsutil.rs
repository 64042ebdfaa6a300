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

//! Cross-platform filesystem primitives the cache protocol relies on:
//! atomic rename with Windows busy-file retry, and best-effort cleanup that
//! tries hard instead of failing on the first transient error.

use crate::error::{CjdkError, Result};
use crate::key::backoff_seconds;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

/// ERROR_ACCESS_DENIED (5) and ERROR_SHARING_VIOLATION (32). On POSIX these
/// never occur, so the retry loop below degrades to a single attempt there.
const WIN_OPEN_FILE_ERRS: [i32; 2] = [5, 32];

fn is_windows_busy(err: &std::io::Error) -> bool {
    cfg!(windows) && err.raw_os_error().is_some_and(|code| WIN_OPEN_FILE_ERRS.contains(&code))
}

/// Rename `tmpfile` onto `target`, creating `target`'s parent directory if
/// needed. On Windows, retries under backoff when the target is transiently
/// open by another process (antivirus, a concurrent reader); on POSIX a
/// single attempt always suffices.
pub fn swap_in_file(target: &Path, tmpfile: &Path, timeout: f64) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CjdkError::install(format!("Failed to create directory {}: {e}", parent.display())))?;
    }

    for wait_seconds in backoff_seconds(0.001, 0.5, timeout, 1.5) {
        match std::fs::rename(tmpfile, target) {
            Ok(()) => return Ok(()),
            Err(e) if is_windows_busy(&e) && wait_seconds > 0.0 => {
                sleep(Duration::from_secs_f64(wait_seconds));
                continue;
            }
            Err(e) => {
                return Err(CjdkError::install(format!(
                    "Failed to move {} to {}: {e}",
                    tmpfile.display(),
                    target.display()
                )));
            }
        }
    }
    unreachable!("backoff_seconds always yields a terminal -1 sentinel")
}

/// Best-effort recursive directory removal, tolerating a missing directory
/// and retrying Windows busy-file errors under backoff.
pub fn rmtree_tempdir(path: &Path, timeout: f64) -> Result<()> {
    for wait_seconds in backoff_seconds(0.001, 0.5, timeout, 1.5) {
        if !path.is_dir() {
            return Ok(());
        }
        match std::fs::remove_dir_all(path) {
            Ok(()) => return Ok(()),
            Err(e) if is_windows_busy(&e) && wait_seconds > 0.0 => {
                sleep(Duration::from_secs_f64(wait_seconds));
                continue;
            }
            Err(e) => {
                return Err(CjdkError::install(format!("Failed to remove directory {}: {e}", path.display())));
            }
        }
    }
    unreachable!("backoff_seconds always yields a terminal -1 sentinel")
}

/// Best-effort single-file removal, tolerating a missing file and retrying
/// Windows busy-file errors under backoff.
pub fn unlink_tempfile(path: &Path, timeout: f64) -> Result<()> {
    for wait_seconds in backoff_seconds(0.001, 0.5, timeout, 1.5) {
        if !path.exists() {
            return Ok(());
        }
        match std::fs::remove_file(path) {
            Ok(()) => return Ok(()),
            Err(e) if is_windows_busy(&e) && wait_seconds > 0.0 => {
                sleep(Duration::from_secs_f64(wait_seconds));
                continue;
            }
            Err(e) => {
                return Err(CjdkError::install(format!("Failed to delete file {}: {e}", path.display())));
            }
        }
    }
    unreachable!("backoff_seconds always yields a terminal -1 sentinel")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn swap_in_file_moves_tmpfile_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("tmp.txt");
        let target = dir.path().join("nested").join("target.txt");
        fs::write(&tmp, b"hello").unwrap();

        swap_in_file(&target, &tmp, 1.0).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"hello");
        assert!(!tmp.exists());
    }

    #[test]
    fn rmtree_tempdir_tolerates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(rmtree_tempdir(&missing, 1.0).is_ok());
    }

    #[test]
    fn rmtree_tempdir_removes_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("f"), b"x").unwrap();

        rmtree_tempdir(&nested, 1.0).unwrap();

        assert!(!nested.exists());
    }

    #[test]
    fn unlink_tempfile_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        assert!(unlink_tempfile(&missing, 1.0).is_ok());
    }
}
