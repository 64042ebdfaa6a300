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
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Terminal progress sink built on `indicatif`. Each event kind owns its own
/// bar slot, recreated at the start of the corresponding phase; phases never
/// overlap within one pipeline invocation.
pub struct TerminalProgressSink {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgressSink {
    pub fn new() -> Self {
        Self { bar: Mutex::new(None) }
    }
}

impl Default for TerminalProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgressSink {
    fn download_start(&self, total: Option<u64>) {
        let pb = match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(
                    "Download [{bar:40}] {bytes}/{total_bytes} ({eta})",
                ) {
                    pb.set_style(style);
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_message("Download");
                pb
            }
        };
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn download_update(&self, bytes_so_far: u64) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_position(bytes_so_far);
        }
    }

    fn download_complete(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_with_message("Download complete");
        }
    }

    fn extract_entry(&self, index: u64, total: Option<u64>) {
        let mut guard = self.bar.lock().unwrap();
        if guard.is_none() {
            let pb = match total {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            pb.set_message("Extract");
            *guard = Some(pb);
        }
        if let Some(pb) = guard.as_ref() {
            pb.set_position(index + 1);
            if total.is_some() && index + 1 == total.unwrap() {
                pb.finish_and_clear();
            }
        }
    }

    fn index_fetch_begin(&self) {
        // Index fetches always run under a silent sink (§4.5); kept here so
        // the trait is total and a terminal sink never panics if misused.
    }

    fn index_fetch_end(&self) {}

    fn waiting_tick(&self, message: &str) {
        let mut guard = self.bar.lock().unwrap();
        if guard.is_none() {
            let pb = ProgressBar::new_spinner();
            pb.set_message(message.to_string());
            *guard = Some(pb);
        }
        if let Some(pb) = guard.as_ref() {
            pb.tick();
        }
    }
}
