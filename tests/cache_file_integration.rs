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

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn test_cache_file_rejects_plain_http_without_insecure_flag() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("cjdk")
        .unwrap()
        .args(["--cache-dir", dir.path().to_str().unwrap(), "cache-file", "http://example.com/a", "a"])
        .assert()
        .failure()
        .stderr(contains("https"));
}

#[test]
fn test_clear_cache_on_fresh_directory_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cjdk-cache");

    Command::cargo_bin("cjdk")
        .unwrap()
        .args(["--cache-dir", cache_dir.to_str().unwrap(), "clear-cache"])
        .assert()
        .success();
}

#[test]
fn test_ls_vendors_reports_unreachable_index_as_config_error() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("cjdk")
        .unwrap()
        .args([
            "--cache-dir",
            dir.path().to_str().unwrap(),
            "--index-url",
            "https://127.0.0.1:1/index.json",
            "ls-vendors",
        ])
        .assert()
        .failure();
}
