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

//! OS/arch canonicalization and the per-OS default cache directory.

use crate::error::{CjdkError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Canonicalize an OS name the way the index and the CLI expect it:
/// `windows|darwin|linux|aix|solaris|...`. Falls back to `CJDK_OS`, then
/// [`std::env::consts::OS`].
pub fn canonicalize_os(os: Option<&str>) -> String {
    let raw = os
        .map(str::to_owned)
        .or_else(|| env::var("CJDK_OS").ok())
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let lower = raw.to_lowercase();

    if lower == "win32" {
        "windows".to_string()
    } else if lower == "macos" {
        "darwin".to_string()
    } else if lower.starts_with("aix") {
        "aix".to_string()
    } else if lower.starts_with("solaris") {
        "solaris".to_string()
    } else {
        lower
    }
}

/// Canonicalize a CPU architecture name to `amd64|arm64|x86|...`.
pub fn canonicalize_arch(arch: Option<&str>) -> String {
    let raw = arch
        .map(str::to_owned)
        .or_else(|| env::var("CJDK_ARCH").ok())
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());
    let lower = raw.to_lowercase();

    if matches!(lower.as_str(), "x86_64" | "x86-64" | "x64") {
        "amd64".to_string()
    } else if lower == "aarch64" {
        "arm64".to_string()
    } else if is_x86_32(&lower) {
        "x86".to_string()
    } else {
        lower
    }
}

fn is_x86_32(s: &str) -> bool {
    let digits = s.strip_prefix('i').unwrap_or(s);
    digits.len() == 3 && digits.ends_with("86") && matches!(&digits[..1], "3" | "5" | "6")
}

/// Default vendor, `CJDK_VENDOR` or `adoptium`.
pub fn default_vendor() -> String {
    env::var("CJDK_VENDOR").unwrap_or_else(|_| "adoptium".to_string())
}

/// Compute the default cache directory for the current platform, honoring
/// `CJDK_CACHE_DIR` first. Creates the platform-specific parent directories
/// with mode `0o700` where supported (POSIX).
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(v) = env::var("CJDK_CACHE_DIR") {
        let dir = PathBuf::from(v);
        if !dir.is_absolute() {
            return Err(CjdkError::config(format!(
                "CJDK_CACHE_DIR must be an absolute path (found '{}')",
                dir.display()
            )));
        }
        return Ok(dir);
    }

    if cfg!(target_os = "windows") {
        windows_cache_dir()
    } else if cfg!(target_os = "macos") {
        macos_cache_dir()
    } else {
        xdg_cache_dir()
    }
}

#[cfg(target_os = "windows")]
fn windows_cache_dir() -> Result<PathBuf> {
    let local_app_data = env::var("LOCALAPPDATA")
        .map(PathBuf::from)
        .or_else(|_| dirs::home_dir().map(|h| h.join("AppData").join("Local")).ok_or(()))
        .map_err(|_| CjdkError::config("Cannot determine home directory"))?;
    let cjdk_cache = local_app_data.join("cjdk");
    create_dir_0700(&cjdk_cache)?;
    Ok(cjdk_cache.join("cache"))
}

#[cfg(not(target_os = "windows"))]
fn windows_cache_dir() -> Result<PathBuf> {
    unreachable!("only used on windows")
}

#[cfg(target_os = "macos")]
fn macos_cache_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CjdkError::config("Cannot determine home directory"))?;
    let caches = home.join("Library").join("Caches");
    create_dir_0700(&caches)?;
    Ok(caches.join("cjdk"))
}

#[cfg(not(target_os = "macos"))]
fn macos_cache_dir() -> Result<PathBuf> {
    unreachable!("only used on macos")
}

fn xdg_cache_dir() -> Result<PathBuf> {
    let caches = if let Ok(v) = env::var("XDG_CACHE_HOME") {
        PathBuf::from(v)
    } else {
        dirs::home_dir()
            .ok_or_else(|| CjdkError::config("Cannot determine home directory"))?
            .join(".cache")
    };
    create_dir_0700(&caches)?;
    Ok(caches.join("cjdk"))
}

fn create_dir_0700(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| {
        CjdkError::config(format!(
            "Failed to create cache directory {}: {e}",
            path.display()
        ))
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        let _ = std::fs::set_permissions(path, perms);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_windows_os_aliases() {
        assert_eq!(canonicalize_os(Some("Win32")), "windows");
        assert_eq!(canonicalize_os(Some("macOS")), "darwin");
        assert_eq!(canonicalize_os(Some("AIX7")), "aix");
        assert_eq!(canonicalize_os(Some("solaris11")), "solaris");
        assert_eq!(canonicalize_os(Some("Linux")), "linux");
    }

    #[test]
    fn canonicalizes_arch_aliases() {
        assert_eq!(canonicalize_arch(Some("x86_64")), "amd64");
        assert_eq!(canonicalize_arch(Some("X64")), "amd64");
        assert_eq!(canonicalize_arch(Some("aarch64")), "arm64");
        assert_eq!(canonicalize_arch(Some("i686")), "x86");
        assert_eq!(canonicalize_arch(Some("i386")), "x86");
        assert_eq!(canonicalize_arch(Some("arm")), "arm");
    }

    #[test]
    fn rejects_relative_cache_dir_override() {
        unsafe {
            env::set_var("CJDK_CACHE_DIR", "relative/path");
        }
        let result = default_cache_dir();
        unsafe {
            env::remove_var("CJDK_CACHE_DIR");
        }
        assert!(result.is_err());
    }
}
