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

//! Resolves a requested JDK against the index, installs it into the
//! permanent-directory cache, and locates its home directory within the
//! extracted tree.

use crate::cache;
use crate::config::Configuration;
use crate::download;
use crate::error::{CjdkError, Result};
use crate::index;
use crate::progress::ProgressSink;
use std::path::{Path, PathBuf};

pub const JDK_KEY_PREFIX: &str = "jdks";

/// Install the JDK described by `conf` if it is not already cached, and
/// return its extracted directory (not necessarily the Java home itself —
/// see [`find_home`]).
pub fn install_jdk(conf: &Configuration, progress: &dyn ProgressSink) -> Result<PathBuf> {
    let idx = index::jdk_index(conf)?;
    let exact_version = index::resolve_jdk_version(&idx, conf)?;
    let name = format!("JDK {}:{}", conf.vendor, exact_version);
    let url = index::jdk_url(&idx, conf, Some(&exact_version))?;

    let allow_insecure = conf.allow_insecure_for_testing;
    let progress_enabled = conf.progress;
    let fetch_url = url.clone();
    cache::permanent_directory(JDK_KEY_PREFIX, &url, &conf.cache_dir, 300.0, progress, move |destdir| {
        if progress_enabled {
            log::info!("cjdk: installing {name}");
        }
        download::download_and_extract(destdir, &fetch_url, None, progress, allow_insecure)
    })
    .map_err(|e| e.into_jdk_not_found_if_unsupported())
}

/// Locate the Java home inside `path`: `path` itself, its macOS
/// `Contents/Home`, or (recursively, bounded by `depth`) the Java home
/// inside its single subdirectory.
pub fn find_home(path: &Path, depth: u32) -> Result<PathBuf> {
    if looks_like_java_home(path) {
        return Ok(path.to_path_buf());
    }
    let macos_home = path.join("Contents").join("Home");
    if looks_like_java_home(&macos_home) {
        return Ok(macos_home);
    }
    if depth > 0 {
        if let Some(subdir) = contains_single_subdir(path)? {
            return find_home(&subdir, depth - 1);
        }
    }
    Err(CjdkError::install(format!(
        "{} does not look like it contains a JDK or JRE",
        path.display()
    )))
}

fn looks_like_java_home(path: &Path) -> bool {
    let bin = path.join("bin");
    bin.is_dir() && (bin.join("java").is_file() || bin.join("java.exe").is_file())
}

fn contains_single_subdir(path: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(path)
        .map_err(|e| CjdkError::install(format!("Cannot read directory {}: {e}", path.display())))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CjdkError::install(format!("Cannot read directory {}: {e}", path.display())))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }

    if dirs.len() == 1 {
        Ok(Some(dirs.into_iter().next().unwrap()))
    } else {
        Ok(None)
    }
}
