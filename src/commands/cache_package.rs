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

/// `cache-package URL [--sha1|--sha256|--sha512 HASH] [--name NAME]`: print
/// the cached directory's path.
pub fn execute(
    url: &str,
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
    name: Option<String>,
    builder: ConfigBuilder,
) -> Result<()> {
    let name = name.unwrap_or_else(|| url.to_string());
    let path = api::cache_package(&name, url, sha1, sha256, sha512, builder)?;
    println!("{}", path.display());
    Ok(())
}
