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

/// `ls [--cached|--available]`: print `vendor:version` entries matching the
/// global flags. `--cached` (the default) restricts to entries already
/// present in the cache; `--available` lists everything the index knows
/// about regardless of cache state.
pub fn execute(builder: ConfigBuilder, cached_only: bool) -> Result<()> {
    for entry in api::list_jdks(builder, cached_only)? {
        println!("{entry}");
    }
    Ok(())
}
