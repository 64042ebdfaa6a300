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

use crate::api;
use crate::config::ConfigBuilder;
use crate::error::Result;

/// `cache-file URL FILENAME [--ttl SECONDS] [--sha1|--sha256|--sha512 HASH]
/// [--name NAME]`: print the cached file's path.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    url: &str,
    filename: &str,
    ttl: Option<f64>,
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
    name: Option<String>,
    builder: ConfigBuilder,
) -> Result<()> {
    let name = name.unwrap_or_else(|| filename.to_string());
    let path = api::cache_file(&name, url, filename, ttl, sha1, sha256, sha512, builder)?;
    println!("{}", path.display());
    Ok(())
}
