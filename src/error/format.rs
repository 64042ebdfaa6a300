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

use crate::error::CjdkError;
use colored::Colorize;

/// Renders a single-line message for stderr, as the CLI's uniform error
/// handler expects (§7: "prints a single-line message to stderr").
pub fn format_error_chain(error: &CjdkError) -> String {
    format!("{} {error}", "Error:".red().bold())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_single_line() {
        colored::control::set_override(false);
        let msg = format_error_chain(&CjdkError::config("cache_dir must be absolute"));
        assert!(!msg.contains('\n'));
        assert!(msg.contains("cache_dir must be absolute"));
    }
}
