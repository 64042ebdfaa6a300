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

/// Maps an error to the process exit code documented for the CLI (§6).
pub fn get_exit_code(error: &CjdkError) -> i32 {
    match error {
        CjdkError::Config(_) => 2,
        CjdkError::JdkNotFound(_) => 3,
        CjdkError::Install(_) | CjdkError::Http(_) | CjdkError::Zip(_) => 4,
        // Should have been folded into Config/JdkNotFound before reaching
        // here; mapped as an install failure as a safety net.
        CjdkError::UnsupportedFormat(_) => 4,
        CjdkError::Io(_) | CjdkError::Json(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_two() {
        assert_eq!(get_exit_code(&CjdkError::config("bad url")), 2);
    }

    #[test]
    fn not_found_maps_to_three() {
        assert_eq!(get_exit_code(&CjdkError::jdk_not_found("no match")), 3);
    }

    #[test]
    fn install_maps_to_four() {
        assert_eq!(get_exit_code(&CjdkError::install("hash mismatch")), 4);
    }

    #[test]
    fn io_maps_to_generic_one() {
        let io = std::io::Error::other("boom");
        assert_eq!(get_exit_code(&CjdkError::Io(io)), 1);
    }
}
