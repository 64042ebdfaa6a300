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

use crate::error::{CjdkError, Result};
use digest::Digest;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 16 * 1024;

/// Build a `checkfunc` closure verifying the optionally-given hex digests
/// against the downloaded file. Never called on a pre-existing cache entry
/// — only immediately after a fresh download (§9's asymmetry).
pub fn make_hash_checker(
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
) -> impl Fn(&Path) -> Result<()> {
    move |path: &Path| -> Result<()> {
        if let Some(expected) = &sha1 {
            verify::<Sha1>(path, expected)?;
        }
        if let Some(expected) = &sha256 {
            verify::<Sha256>(path, expected)?;
        }
        if let Some(expected) = &sha512 {
            verify::<Sha512>(path, expected)?;
        }
        Ok(())
    }
}

fn verify<D: Digest>(path: &Path, expected_hex: &str) -> Result<()> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| CjdkError::install(format!("Failed to read file for hash verification: {e}")))?;
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| CjdkError::install(format!("Failed to read file for hash verification: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hex::encode(hasher.finalize());
    if digest.to_lowercase() != expected_hex.to_lowercase() {
        return Err(CjdkError::install("Hash does not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_sha1_passes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();
        let mut hasher = Sha1::new();
        hasher.update(b"hello");
        let expected = hex::encode(hasher.finalize());

        let check = make_hash_checker(Some(expected), None, None);
        assert!(check(&file).is_ok());
    }

    #[test]
    fn mismatched_sha256_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();

        let check = make_hash_checker(None, Some("0".repeat(64)), None);
        assert!(check(&file).is_err());
    }

    #[test]
    fn no_hashes_given_always_passes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();

        let check = make_hash_checker(None, None, None);
        assert!(check(&file).is_ok());
    }
}
