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

//! One thin module per CLI subcommand (§4.9): each builds a
//! [`crate::config::ConfigBuilder`] from the parsed global flags/environment
//! and calls exactly one `crate::api` entry point.

pub mod cache_file;
pub mod cache_jdk;
pub mod cache_package;
pub mod clear_cache;
pub mod exec;
pub mod java_home;
pub mod ls;
pub mod ls_vendors;

use crate::config::ConfigBuilder;

/// Global flags shared by every subcommand, already parsed by `clap`
/// in the binary. Kept here (rather than in `main.rs`) so the conversion
/// to a [`ConfigBuilder`] is unit-testable without going through `clap`.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub jdk: Option<String>,
    pub cache_dir: Option<std::path::PathBuf>,
    pub index_url: Option<String>,
    pub index_ttl: Option<f64>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub progress: Option<bool>,
}

impl GlobalArgs {
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder {
            jdk: self.jdk,
            os: self.os,
            arch: self.arch,
            vendor: None,
            version: None,
            cache_dir: self.cache_dir,
            index_url: self.index_url,
            index_ttl: self.index_ttl,
            progress: self.progress,
            allow_insecure_for_testing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_builder_carries_jdk_spec_through() {
        let args = GlobalArgs {
            jdk: Some("adoptium:17".to_string()),
            ..Default::default()
        };
        let builder = args.into_builder();
        assert_eq!(builder.jdk.as_deref(), Some("adoptium:17"));
        assert!(builder.vendor.is_none());
    }
}
