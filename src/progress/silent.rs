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

use super::ProgressSink;

/// No-op sink, used when `Configuration.progress` is false and always for
/// index fetches (§4.5).
pub struct SilentProgressSink;

impl ProgressSink for SilentProgressSink {
    fn download_start(&self, _total: Option<u64>) {}
    fn download_update(&self, _bytes_so_far: u64) {}
    fn download_complete(&self) {}
    fn extract_entry(&self, _index: u64, _total: Option<u64>) {}
    fn index_fetch_begin(&self) {}
    fn index_fetch_end(&self) {}
    fn waiting_tick(&self, _message: &str) {}
}
