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

//! Resolved, per-invocation configuration: CLI flag > `CJDK_*` env var >
//! platform default, layered by [`ConfigBuilder`].

use crate::error::{CjdkError, Result};
use crate::platform;
use std::env;
use std::path::{Path, PathBuf};

/// Where a [`Configuration`] field's value ultimately came from. Purely for
/// diagnostics (`log::debug!`); does not affect the resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    Environment,
    Default,
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub os: String,
    pub arch: String,
    pub vendor: String,
    pub version: String,
    pub cache_dir: PathBuf,
    pub index_url: String,
    pub index_ttl: f64,
    pub progress: bool,
    pub allow_insecure_for_testing: bool,
}

const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/coursier/jvm-index/master/index.json";
const DEFAULT_INDEX_TTL_SECS: f64 = 86400.0;

/// Builder mirroring the source's `**kwargs` configure() entry point: every
/// field is optional and falls back through env var then platform default.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    pub jdk: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub index_url: Option<String>,
    pub index_ttl: Option<f64>,
    pub progress: Option<bool>,
    pub allow_insecure_for_testing: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self) -> Result<Configuration> {
        if let Some(jdk) = self.jdk.take() {
            if jdk.is_empty() {
                // nothing to disambiguate
            } else {
                if self.vendor.is_some() {
                    return Err(CjdkError::config("Cannot specify jdk= together with vendor="));
                }
                if self.version.is_some() {
                    return Err(CjdkError::config("Cannot specify jdk= together with version="));
                }
                let (vendor, version) = parse_vendor_version(&jdk)?;
                if !vendor.is_empty() {
                    self.vendor = Some(vendor);
                }
                if !version.is_empty() {
                    self.version = Some(version);
                }
            }
        }

        let (cache_dir, cache_dir_source) = match self.cache_dir {
            Some(dir) => (dir, ConfigSource::Explicit),
            None => (platform::default_cache_dir()?, ConfigSource::Default),
        };
        ensure_absolute(&cache_dir, "cache_dir")?;

        let (index_ttl, index_ttl_source) = match self.index_ttl {
            Some(ttl) => (ttl, ConfigSource::Explicit),
            None => (default_index_ttl()?, source_or_default(env::var("CJDK_INDEX_TTL").is_ok())),
        };
        let (index_url, index_url_source) = match self.index_url {
            Some(url) => (url, ConfigSource::Explicit),
            None => (default_index_url(), source_or_default(env::var("CJDK_INDEX_URL").is_ok())),
        };
        let (vendor, vendor_source) = match self.vendor {
            Some(v) => (v, ConfigSource::Explicit),
            None => (platform::default_vendor(), source_or_default(env::var("CJDK_VENDOR").is_ok())),
        };
        let os_source = source_or_default_opt(&self.os, "CJDK_OS");
        let arch_source = source_or_default_opt(&self.arch, "CJDK_ARCH");

        let os = platform::canonicalize_os(self.os.as_deref());
        let arch = platform::canonicalize_arch(self.arch.as_deref());

        log::debug!("cache_dir={} ({cache_dir_source:?})", cache_dir.display());
        log::debug!("index_url={index_url} ({index_url_source:?})");
        log::debug!("index_ttl={index_ttl} ({index_ttl_source:?})");
        log::debug!("vendor={vendor} ({vendor_source:?})");
        log::debug!("os={os} ({os_source:?}), arch={arch} ({arch_source:?})");

        Ok(Configuration {
            os,
            arch,
            vendor,
            version: self.version.unwrap_or_default(),
            cache_dir,
            index_url,
            index_ttl,
            progress: self.progress.unwrap_or(true),
            allow_insecure_for_testing: self.allow_insecure_for_testing,
        })
    }
}

fn source_or_default(from_env: bool) -> ConfigSource {
    if from_env { ConfigSource::Environment } else { ConfigSource::Default }
}

fn source_or_default_opt(explicit: &Option<String>, env_var: &str) -> ConfigSource {
    if explicit.is_some() {
        ConfigSource::Explicit
    } else {
        source_or_default(env::var(env_var).is_ok())
    }
}

fn default_index_url() -> String {
    env::var("CJDK_INDEX_URL").unwrap_or_else(|_| DEFAULT_INDEX_URL.to_string())
}

fn default_index_ttl() -> Result<f64> {
    match env::var("CJDK_INDEX_TTL") {
        Ok(v) => v
            .parse::<f64>()
            .map_err(|_| CjdkError::config(format!("Invalid value for CJDK_INDEX_TTL: '{v}' (must be a number)"))),
        Err(_) => Ok(DEFAULT_INDEX_TTL_SECS),
    }
}

/// Disambiguate a `vendor:version` or bare `vendor`/`version` spec. This does
/// not fully parse either side; it only distinguishes when exactly one is
/// given, matching the source's documented (intentionally partial) behavior.
pub fn parse_vendor_version(spec: &str) -> Result<(String, String)> {
    if let Some((vendor, version)) = spec.split_once(':') {
        if version.contains(':') {
            return Err(CjdkError::config(format!("Cannot parse JDK spec '{spec}'")));
        }
        return Ok((vendor.to_string(), version.to_string()));
    }
    if spec.is_empty() {
        return Ok((String::new(), String::new()));
    }
    if looks_like_vendor(spec) {
        return Ok((spec.to_string(), String::new()));
    }
    if looks_like_version(spec) {
        return Ok((String::new(), spec.to_string()));
    }
    Err(CjdkError::config(format!("Cannot parse JDK spec '{spec}'")))
}

fn looks_like_vendor(spec: &str) -> bool {
    let mut chars = spec.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn looks_like_version(spec: &str) -> bool {
    !spec.is_empty() && spec.chars().all(|c| c.is_ascii_digit() || "+.-".contains(c))
}

/// `name` must be non-empty when `allow_empty` is false; callers pass `None`
/// only where that is explicitly permitted. Re-implements the source's
/// `check_str`, which rejects `None` only when `allow_none` is false.
pub fn check_str(name: &str, value: Option<&str>, allow_none: bool, allow_empty: bool) -> Result<()> {
    match value {
        None if allow_none => Ok(()),
        None => Err(CjdkError::config(format!("{name} must be a string, got None"))),
        Some("") if !allow_empty => Err(CjdkError::config(format!("{name} must not be empty"))),
        Some(_) => Ok(()),
    }
}

pub fn ensure_absolute(path: &Path, field: &str) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(CjdkError::config(format!(
            "{field} must be an absolute path (found '{}')",
            path.display()
        )))
    }
}
