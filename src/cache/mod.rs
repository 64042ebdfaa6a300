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

//! The content-addressed cache protocol: `atomic_file` (TTL'd single file)
//! and `permanent_directory` (write-once directory). Both use the presence
//! of a scratch `v0/fetching/<prefix>/<key>/` directory, created with
//! exclusive `mkdir` semantics, as the sole inter-process lock.

use crate::error::{CjdkError, Result};
use crate::fsutil;
use crate::key::{backoff_seconds, key_for_url};
use crate::progress::ProgressSink;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// An hour short of "forever"; used as the effective TTL once we know a
/// writer elsewhere has already published the entry.
const EFFECTIVELY_FOREVER: f64 = (1u64 << 63) as f64;

/// Retrieve the cached file for `(prefix, key_url)`, calling `fetch` to
/// populate it if it is missing or stale. See §4.3.
pub fn atomic_file(
    prefix: &str,
    key_url: &str,
    filename: &str,
    cache_dir: &Path,
    ttl: f64,
    timeout_for_fetch_elsewhere: f64,
    timeout_for_read_elsewhere: f64,
    progress: &dyn ProgressSink,
    fetch: impl FnOnce(&Path) -> Result<()>,
) -> Result<PathBuf> {
    let key = (prefix.to_string(), key_for_url(key_url)?);
    std::fs::create_dir_all(cache_dir)
        .map_err(|e| CjdkError::install(format!("Failed to create cache directory {}: {e}", cache_dir.display())))?;

    let keydir = key_directory(cache_dir, &key);
    let target = keydir.join(filename);

    if !file_exists_and_is_fresh(&target, ttl) {
        let tmpdir = key_tmpdir(cache_dir, &key);
        match create_key_tmpdir(&tmpdir)? {
            Some(()) => {
                let result = (|| -> Result<()> {
                    let filepath = tmpdir.join(filename);
                    fetch(&filepath)?;
                    fsutil::swap_in_file(&target, &filepath, timeout_for_read_elsewhere)?;
                    add_url_file(&keydir, key_url)?;
                    Ok(())
                })();
                // Cleanup runs whether fetch/swap succeeded or not: a
                // successful swap has already moved the file out, so this is
                // a no-op in that case.
                let _ = fsutil::unlink_tempfile(&tmpdir.join(filename), 2.5);
                fsutil::rmtree_tempdir(&tmpdir, 2.5)?;
                result?;
            }
            None => {
                wait_for_dir_to_vanish(&tmpdir, timeout_for_fetch_elsewhere, progress)?;
                if !file_exists_and_is_fresh(&target, EFFECTIVELY_FOREVER) {
                    return Err(CjdkError::install(format!(
                        "Another process was fetching {} but the file is not present; \
                         the other process may have failed or been interrupted.",
                        target.display()
                    )));
                }
            }
        }
    }

    Ok(target)
}

/// Retrieve the cached directory for `(prefix, key_url)`, calling `fetch` to
/// populate it if absent. Directories are write-once: there is no TTL.
pub fn permanent_directory(
    prefix: &str,
    key_url: &str,
    cache_dir: &Path,
    timeout_for_fetch_elsewhere: f64,
    progress: &dyn ProgressSink,
    fetch: impl FnOnce(&Path) -> Result<()>,
) -> Result<PathBuf> {
    let key = (prefix.to_string(), key_for_url(key_url)?);
    std::fs::create_dir_all(cache_dir)
        .map_err(|e| CjdkError::install(format!("Failed to create cache directory {}: {e}", cache_dir.display())))?;

    let keydir = key_directory(cache_dir, &key);

    if !keydir.is_dir() {
        let tmpdir = key_tmpdir(cache_dir, &key);
        match create_key_tmpdir(&tmpdir)? {
            Some(()) => {
                let result = (|| -> Result<()> {
                    fetch(&tmpdir)?;
                    move_in_fetched_directory(&keydir, &tmpdir)?;
                    add_url_file(&keydir, key_url)?;
                    Ok(())
                })();
                fsutil::rmtree_tempdir(&tmpdir, 2.5)?;
                result?;
            }
            None => {
                wait_for_dir_to_vanish(&tmpdir, timeout_for_fetch_elsewhere, progress)?;
                if !keydir.is_dir() {
                    return Err(CjdkError::install(format!(
                        "Another process was fetching {} but the directory is not present; \
                         the other process may have failed or been interrupted",
                        keydir.display()
                    )));
                }
            }
        }
    }

    Ok(keydir)
}

/// Cache key of the URL used by a given `(prefix, key_url)` pair, exposed so
/// callers (e.g. `list_jdks`'s cached-only filter) can check whether an
/// entry exists without re-running the fetch protocol.
pub fn key_for(prefix: &str, key_url: &str) -> Result<(String, String)> {
    Ok((prefix.to_string(), key_for_url(key_url)?))
}

pub fn key_directory(cache_dir: &Path, key: &(String, String)) -> PathBuf {
    cache_dir.join("v0").join(&key.0).join(&key.1)
}

fn key_tmpdir(cache_dir: &Path, key: &(String, String)) -> PathBuf {
    cache_dir.join("v0").join("fetching").join(&key.0).join(&key.1)
}

fn file_exists_and_is_fresh(file: &Path, ttl: f64) -> bool {
    if !file.is_file() {
        return false;
    }
    let mtime = match std::fs::metadata(file).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    // A "forever" TTL (EFFECTIVELY_FOREVER, or a caller-supplied huge value)
    // added to `mtime` can exceed what `SystemTime` can represent, which
    // would otherwise panic. Treat that overflow as "fresh": a TTL too large
    // to even express as an expiration time can never have elapsed.
    let expiration = match mtime.checked_add(Duration::from_secs_f64(ttl.max(0.0))) {
        Some(t) => t,
        None => return true,
    };
    let now = SystemTime::now();
    // Err on the side of staleness when the margin is under a second, to
    // avoid races with clock granularity.
    now + Duration::from_secs(1) < expiration
}

/// Attempt exclusive creation of the fetching directory. `Some(())` means we
/// are the writer; `None` means another process already owns it.
fn create_key_tmpdir(tmpdir: &Path) -> Result<Option<()>> {
    if let Some(parent) = tmpdir.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CjdkError::install(format!("Failed to create cache directory {}: {e}", parent.display())))?;
    }
    match std::fs::create_dir(tmpdir) {
        Ok(()) => Ok(Some(())),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(CjdkError::install(format!("Failed to create cache directory {}: {e}", tmpdir.display()))),
    }
}

fn move_in_fetched_directory(target: &Path, tmpdir: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CjdkError::install(format!("Failed to create cache directory {}: {e}", parent.display())))?;
    }
    std::fs::rename(tmpdir, target)
        .map_err(|e| CjdkError::install(format!("Failed to move {} to {}: {e}", tmpdir.display(), target.display())))
}

fn add_url_file(keydir: &Path, key_url: &str) -> Result<()> {
    let file_name = keydir
        .file_name()
        .map(|n| format!("{}.url", n.to_string_lossy()))
        .unwrap_or_else(|| "entry.url".to_string());
    let url_file = keydir.parent().map(|p| p.join(&file_name)).unwrap_or_else(|| PathBuf::from(&file_name));
    std::fs::write(&url_file, key_url)
        .map_err(|e| CjdkError::install(format!("Failed to write URL file {}: {e}", url_file.display())))
}

fn wait_for_dir_to_vanish(directory: &Path, timeout: f64, progress: &dyn ProgressSink) -> Result<()> {
    log::warn!("cjdk: another process is currently downloading the same file");
    log::warn!(
        "cjdk: if you are sure this is not the case (e.g., previous download crashed), \
         try again after deleting the directory {}",
        directory.display()
    );
    for wait_seconds in backoff_seconds(0.001, 0.5, timeout, 1.5) {
        if !directory.is_dir() {
            return Ok(());
        }
        if wait_seconds < 0.0 {
            return Err(CjdkError::install(format!(
                "Timeout while waiting for directory {} to disappear",
                directory.display()
            )));
        }
        std::thread::sleep(Duration::from_secs_f64(wait_seconds));
        progress.waiting_tick("Already downloading; waiting");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgressSink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn atomic_file_calls_fetch_exactly_once_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);

        let path = atomic_file(
            "misc-files",
            "https://example.com/a/b.txt",
            "b.txt",
            dir.path(),
            1e18,
            10.0,
            2.5,
            &SilentProgressSink,
            |dest| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::fs::write(dest, b"payload").map_err(Into::into)
            },
        )
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn atomic_file_with_effectively_forever_ttl_does_not_panic_on_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let url = "https://example.com/a/forever.txt";

        for _ in 0..2 {
            atomic_file(
                "misc-files",
                url,
                "forever.txt",
                dir.path(),
                EFFECTIVELY_FOREVER,
                10.0,
                2.5,
                &SilentProgressSink,
                |dest| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::fs::write(dest, b"payload").map_err(Into::into)
                },
            )
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn file_exists_and_is_fresh_treats_overflowing_ttl_as_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();

        assert!(file_exists_and_is_fresh(&file, EFFECTIVELY_FOREVER));
    }

    #[test]
    fn atomic_file_cache_hit_does_not_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let url = "https://example.com/a/c.txt";

        for _ in 0..2 {
            atomic_file(
                "misc-files",
                url,
                "c.txt",
                dir.path(),
                1e18,
                10.0,
                2.5,
                &SilentProgressSink,
                |dest| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::fs::write(dest, b"payload").map_err(Into::into)
                },
            )
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn atomic_file_writes_url_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/a/d.txt";

        let path = atomic_file(
            "misc-files",
            url,
            "d.txt",
            dir.path(),
            1e18,
            10.0,
            2.5,
            &SilentProgressSink,
            |dest| std::fs::write(dest, b"x").map_err(Into::into),
        )
        .unwrap();

        let sidecar = path.parent().unwrap().parent().unwrap().join(format!(
            "{}.url",
            path.parent().unwrap().file_name().unwrap().to_string_lossy()
        ));
        assert_eq!(std::fs::read_to_string(sidecar).unwrap(), url);
    }

    #[test]
    fn atomic_file_expired_ttl_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let url = "https://example.com/a/e.txt";

        atomic_file("misc-files", url, "e.txt", dir.path(), 0.0, 10.0, 2.5, &SilentProgressSink, |dest| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, b"v1").map_err(Into::into)
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(1100));

        let path = atomic_file("misc-files", url, "e.txt", dir.path(), 0.0, 10.0, 2.5, &SilentProgressSink, |dest| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, b"v2").map_err(Into::into)
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn atomic_file_cleans_up_fetching_dir_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/a/f.txt";

        let result = atomic_file("misc-files", url, "f.txt", dir.path(), 1e18, 10.0, 2.5, &SilentProgressSink, |_dest| {
            Err(CjdkError::install("boom"))
        });

        assert!(result.is_err());
        let key = key_for("misc-files", url).unwrap();
        let tmpdir = key_tmpdir(dir.path(), &key);
        assert!(!tmpdir.exists());
    }

    #[test]
    fn permanent_directory_calls_fetch_once_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let url = "tgz+https://example.com/pkg.tgz";

        for _ in 0..2 {
            permanent_directory("jdks", url, dir.path(), 60.0, &SilentProgressSink, |destdir| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::fs::write(destdir.join("marker"), b"x").map_err(Into::into)
            })
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
