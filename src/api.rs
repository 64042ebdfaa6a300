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

//! The public library surface: install and locate JDKs, cache arbitrary
//! files/packages, and set up a process environment for a JDK.

use crate::cache;
use crate::config::ConfigBuilder;
use crate::download;
use crate::error::{CjdkError, Result};
use crate::index;
use crate::installer;
use crate::progress;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

/// Install the JDK described by `builder` (if not already cached) and
/// return the path to its extracted directory tree.
pub fn cache_jdk(builder: ConfigBuilder) -> Result<PathBuf> {
    let conf = builder.build()?;
    let sink = progress::create(conf.progress);
    installer::install_jdk(&conf, sink.as_ref())
}

/// Install the JDK described by `builder` and return its Java home
/// directory (which may be a subdirectory of the extracted tree).
pub fn java_home(builder: ConfigBuilder) -> Result<PathBuf> {
    let conf = builder.build()?;
    let sink = progress::create(conf.progress);
    let path = installer::install_jdk(&conf, sink.as_ref())?;
    installer::find_home(&path, 2)
}

/// RAII guard restoring `JAVA_HOME` (and, unless `add_bin` was false,
/// `PATH`) to their pre-call values when dropped. Holds the resolved Java
/// home for the duration of its scope.
pub struct JavaEnvGuard {
    pub home: PathBuf,
    saved: Vec<(&'static str, Option<String>)>,
}

impl Drop for JavaEnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.saved.iter().rev() {
            match value {
                Some(v) => unsafe { env::set_var(name, v) },
                None => unsafe { env::remove_var(name) },
            }
        }
    }
}

/// Install the JDK described by `builder`, then set `JAVA_HOME` (and,
/// unless `add_bin` is false, prepend its `bin` directory to `PATH`) for
/// the current process. The previous values are restored when the
/// returned guard is dropped.
pub fn java_env(builder: ConfigBuilder, add_bin: bool) -> Result<JavaEnvGuard> {
    let home = java_home(builder)?;

    let mut saved = Vec::new();
    saved.push(("JAVA_HOME", env::var("JAVA_HOME").ok()));
    unsafe {
        env::set_var("JAVA_HOME", &home);
    }

    if add_bin {
        saved.push(("PATH", env::var("PATH").ok()));
        let old_path = env::var("PATH").unwrap_or_default();
        let bin = home.join("bin");
        let new_path = match env::join_paths([bin, PathBuf::from(old_path)]) {
            Ok(p) => p,
            Err(e) => return Err(CjdkError::install(format!("Failed to build PATH: {e}"))),
        };
        unsafe {
            env::set_var("PATH", &new_path);
        }
    }

    Ok(JavaEnvGuard { home, saved })
}

/// Install an arbitrary file resource into the cache, downloading if
/// necessary. `url`'s scheme must be https (unless testing-only insecure
/// access is enabled via the builder). Hash checks run only on a fresh
/// download, never on a cache hit.
#[allow(clippy::too_many_arguments)]
pub fn cache_file(
    name: &str,
    url: &str,
    filename: &str,
    ttl: Option<f64>,
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
    builder: ConfigBuilder,
) -> Result<PathBuf> {
    crate::config::check_str("name", Some(name), false, true)?;
    crate::config::check_str("url", Some(url), false, false)?;
    crate::config::check_str("filename", Some(filename), false, false)?;

    let conf = builder.build()?;
    let sink = progress::create(conf.progress);
    let check = download::make_hash_checker(sha1, sha256, sha512);
    let ttl = ttl.unwrap_or((1u64 << 63) as f64);
    let allow_insecure = conf.allow_insecure_for_testing;
    let url_owned = url.to_string();

    if conf.progress {
        log::info!("cjdk: installing {name} to {}", conf.cache_dir.display());
    }

    cache::atomic_file(
        "misc-files",
        url,
        filename,
        &conf.cache_dir,
        ttl,
        300.0,
        2.5,
        sink.as_ref(),
        |dest| {
            let checker: &dyn Fn(&Path) -> Result<()> = &check;
            download::download_file(dest, &url_owned, Some(checker), sink.as_ref(), allow_insecure)
        },
    )
    .map_err(|e| e.into_config_if_unsupported())?;

    let key = cache::key_for("misc-files", url)?;
    Ok(cache::key_directory(&conf.cache_dir, &key).join(filename))
}

/// Install an arbitrary archive package into the cache, downloading and
/// extracting if necessary. `url` is normalized to a `tgz+https`/`zip+https`
/// scheme when it bears a plain `.tgz`/`.zip` suffix; anything else that
/// isn't already prefixed with `tgz+http`/`zip+http` is a configuration
/// error.
pub fn cache_package(
    name: &str,
    url: &str,
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
    builder: ConfigBuilder,
) -> Result<PathBuf> {
    crate::config::check_str("name", Some(name), false, true)?;
    crate::config::check_str("url", Some(url), false, false)?;

    let url = normalize_package_url(url)?;
    let conf = builder.build()?;
    let sink = progress::create(conf.progress);
    let check = download::make_hash_checker(sha1, sha256, sha512);
    let allow_insecure = conf.allow_insecure_for_testing;
    let fetch_url = url.clone();

    if conf.progress {
        log::info!("cjdk: installing {name} to {}", conf.cache_dir.display());
    }

    cache::permanent_directory(
        "misc-dirs",
        &url,
        &conf.cache_dir,
        300.0,
        sink.as_ref(),
        |destdir| {
            let checker: &dyn Fn(&Path) -> Result<()> = &check;
            download::download_and_extract(destdir, &fetch_url, Some(checker), sink.as_ref(), allow_insecure)
        },
    )
    .map_err(|e| e.into_config_if_unsupported())
}

fn normalize_package_url(url: &str) -> Result<String> {
    if url.starts_with("tgz+http") || url.starts_with("zip+http") {
        return Ok(url.to_string());
    }
    if let Some(rest) = url.strip_prefix("http") {
        if url.ends_with(".tgz") {
            return Ok(format!("tgz+http{rest}"));
        }
        if url.ends_with(".zip") {
            return Ok(format!("zip+http{rest}"));
        }
    }
    Err(CjdkError::config(format!(
        "Cannot handle '{url}' URL (must be tgz+https or zip+https)"
    )))
}

/// All JDK vendors named in the index (the `jdk@` prefix stripped),
/// alphabetically sorted.
pub fn list_vendors(builder: ConfigBuilder) -> Result<Vec<String>> {
    let conf = builder.build()?;
    let idx = index::jdk_index(&conf)?;

    let mut vendors: BTreeSet<String> = BTreeSet::new();
    for arches in idx.values() {
        for vendors_map in arches.values() {
            for vendor in vendors_map.keys() {
                vendors.insert(vendor.strip_prefix("jdk@").unwrap_or(vendor).to_string());
            }
        }
    }
    Ok(vendors.into_iter().collect())
}

/// `vendor:version` strings matching the builder's criteria. When the
/// builder leaves `vendor` unset, every vendor named by the index is
/// expanded and concatenated (alphabetically by vendor).
pub fn list_jdks(builder: ConfigBuilder, cached_only: bool) -> Result<Vec<String>> {
    if builder.vendor.is_none() {
        let vendors = list_vendors(builder.clone())?;
        let mut out = Vec::new();
        for vendor in vendors {
            let mut per_vendor = builder.clone();
            per_vendor.vendor = Some(vendor);
            out.extend(list_jdks(per_vendor, cached_only)?);
        }
        return Ok(out);
    }

    let conf = builder.build()?;
    let idx = index::jdk_index(&conf)?;
    let jdks = index::available_jdks(&idx, &conf);
    let candidates: Vec<String> = jdks
        .into_iter()
        .filter(|(vendor, _)| *vendor == conf.vendor)
        .map(|(_, version)| version)
        .collect();
    let matched = index::match_versions(&conf.vendor, &candidates, &conf.version);

    let mut result: Vec<String> = Vec::new();
    for version in matched.values() {
        if cached_only {
            let url = index::jdk_url(&idx, &conf, Some(version))?;
            let key = cache::key_for(installer::JDK_KEY_PREFIX, &url)?;
            if !cache::key_directory(&conf.cache_dir, &key).exists() {
                continue;
            }
        }
        result.push(format!("{}:{version}", conf.vendor));
    }
    Ok(result)
}

/// Remove the entire cache directory tree. Not safe to call while another
/// process may be reading or writing the cache.
pub fn clear_cache(builder: ConfigBuilder) -> Result<PathBuf> {
    let conf = builder.build()?;
    if conf.cache_dir.exists() {
        std::fs::remove_dir_all(&conf.cache_dir)
            .map_err(|e| CjdkError::install(format!("Failed to remove cache directory {}: {e}", conf.cache_dir.display())))?;
    }
    Ok(conf.cache_dir)
}
