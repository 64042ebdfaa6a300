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

//! The only channel the cache/download/archive pipeline uses to report
//! activity. The core never formats human-readable progress text itself —
//! it emits structured events through [`ProgressSink`]; rendering is left to
//! the implementations here.

mod factory;
mod silent;
mod terminal;

pub use factory::create;
pub use silent::SilentProgressSink;
pub use terminal::TerminalProgressSink;

/// One method per event the cache/download/archive pipeline can report.
pub trait ProgressSink: Send + Sync {
    /// A download is starting; `total` is `None` when content-length is
    /// absent or unparseable.
    fn download_start(&self, total: Option<u64>);
    fn download_update(&self, bytes_so_far: u64);
    fn download_complete(&self);

    /// One archive entry was extracted; `index` is 0-based.
    fn extract_entry(&self, index: u64, total: Option<u64>);

    fn index_fetch_begin(&self);
    fn index_fetch_end(&self);

    /// A tick of an indefinite wait (another process fetching, or a file
    /// transiently busy on Windows).
    fn waiting_tick(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sink_never_panics() {
        let sink = SilentProgressSink;
        sink.download_start(Some(10));
        sink.download_update(5);
        sink.download_complete();
        sink.extract_entry(0, Some(3));
        sink.index_fetch_begin();
        sink.index_fetch_end();
        sink.waiting_tick("waiting");
    }
}
