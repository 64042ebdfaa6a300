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

use super::{ProgressSink, SilentProgressSink, TerminalProgressSink};
use std::env;

/// Build the sink for one call: `CJDK_HIDE_PROGRESS_BARS` always wins over
/// an enabled request, matching the source's `_bar_enabled`.
pub fn create(progress: bool) -> Box<dyn ProgressSink> {
    if !progress || hide_progress_bars() {
        Box::new(SilentProgressSink)
    } else {
        Box::new(TerminalProgressSink::new())
    }
}

fn hide_progress_bars() -> bool {
    env::var("CJDK_HIDE_PROGRESS_BARS")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_env_var_forces_silent() {
        unsafe {
            env::set_var("CJDK_HIDE_PROGRESS_BARS", "true");
        }
        let sink = create(true);
        sink.download_start(None);
        unsafe {
            env::remove_var("CJDK_HIDE_PROGRESS_BARS");
        }
        // Silent sink never panics regardless of what it was handed.
        sink.download_complete();
    }

    #[test]
    fn progress_false_is_silent_regardless_of_env() {
        unsafe {
            env::remove_var("CJDK_HIDE_PROGRESS_BARS");
        }
        let sink = create(false);
        sink.download_start(Some(100));
        sink.download_complete();
    }
}
