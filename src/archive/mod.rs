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

//! Scheme parsing and extraction for the `zip+https`/`tgz+https` archive
//! URLs the index hands out.

use crate::error::{CjdkError, Result};
use crate::progress::ProgressSink;
use std::fs::{self, File};
use std::path::Path;
use tar::Archive as TarArchive;
use zip::ZipArchive;

/// Split `<ext>+<transport>://...` into `(ext, rewritten transport URL)`.
/// `ext` must be `zip` or `tgz`; the transport must be `https` unless
/// `allow_insecure`.
pub fn split_archive_scheme(url: &str, allow_insecure: bool) -> Result<(String, String)> {
    let (ext, rest) = url
        .split_once('+')
        .ok_or_else(|| CjdkError::unsupported_format(format!("Not an archive URL: {url}")))?;

    if ext != "zip" && ext != "tgz" {
        return Err(CjdkError::unsupported_format(format!(
            "Unknown archive type: {ext}"
        )));
    }

    let scheme = rest.split_once("://").map(|(s, _)| s).unwrap_or("");
    if scheme != "https" && !allow_insecure {
        return Err(CjdkError::unsupported_format(format!(
            "Cannot handle {scheme} (must be https)"
        )));
    }

    Ok((ext.to_string(), rest.to_string()))
}

/// Extract `archive_file` (of the given `ext`) into `destdir`.
pub fn extract(ext: &str, destdir: &Path, archive_file: &Path, progress: &dyn ProgressSink) -> Result<()> {
    create_dir_all(destdir)?;
    match ext {
        "zip" => extract_zip(destdir, archive_file, progress),
        "tgz" => extract_tgz(destdir, archive_file, progress),
        other => Err(CjdkError::unsupported_format(format!(
            "Unknown archive type: {other}"
        ))),
    }
}

fn extract_zip(destdir: &Path, archive_file: &Path, progress: &dyn ProgressSink) -> Result<()> {
    let file = File::open(archive_file)
        .map_err(|e| CjdkError::install(format!("Failed to open archive {}: {e}", archive_file.display())))?;
    let mut archive = ZipArchive::new(file)?;
    let total = archive.len();

    for i in 0..total {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => {
                validate_entry_path(&path)?;
                destdir.join(path)
            }
            None => {
                log::warn!("Skipping zip entry with invalid name at index {i}");
                continue;
            }
        };

        if entry.is_dir() {
            create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)
                .map_err(|e| CjdkError::install(format!("Failed to create {}: {e}", outpath.display())))?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| CjdkError::install(format!("Failed to extract {}: {e}", outpath.display())))?;
        }

        // Recover executable bits; create_system == 3 means "created on Unix"
        // (the zip crate only returns unix_mode() in that case).
        if let Some(mode) = entry.unix_mode() {
            if outpath.is_file() {
                set_executable_bits(&outpath, mode)?;
            }
        }

        progress.extract_entry(i as u64, Some(total as u64));
    }

    log::info!("Extracted {total} entries from zip archive");
    Ok(())
}

#[cfg(unix)]
fn set_executable_bits(path: &Path, zip_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let exec_bits = zip_mode & 0o111;
    let meta = fs::metadata(path)
        .map_err(|e| CjdkError::install(format!("Failed to read permissions of {}: {e}", path.display())))?;
    let current = meta.permissions().mode();
    fs::set_permissions(path, fs::Permissions::from_mode(current | exec_bits))
        .map_err(|e| CjdkError::install(format!("Failed to set permissions on {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable_bits(_path: &Path, _zip_mode: u32) -> Result<()> {
    Ok(())
}

fn extract_tgz(destdir: &Path, archive_file: &Path, progress: &dyn ProgressSink) -> Result<()> {
    let file = File::open(archive_file)
        .map_err(|e| CjdkError::install(format!("Failed to open archive {}: {e}", archive_file.display())))?;
    let gz = flate2::read::GzDecoder::new(file);
    let mut archive = TarArchive::new(gz);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    let mut count = 0usize;
    let entries = archive
        .entries()
        .map_err(|e| CjdkError::install(format!("Failed to read tar archive {}: {e}", archive_file.display())))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| CjdkError::install(format!("Failed to read tar entry: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| CjdkError::install(format!("Failed to read tar entry path: {e}")))?
            .into_owned();
        validate_entry_path(&path)?;

        let dest_path = destdir.join(&path);
        if let Some(parent) = dest_path.parent() {
            create_dir_all(parent)?;
        }

        entry
            .unpack(&dest_path)
            .map_err(|e| CjdkError::install(format!("Failed to extract {}: {e}", dest_path.display())))?;
        progress.extract_entry(count as u64, None);
        count += 1;
    }

    log::info!("Extracted {count} entries from tar.gz archive");
    Ok(())
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| CjdkError::install(format!("Failed to create directory {}: {e}", path.display())))
}

/// Reject entries that would escape `destdir`: absolute paths or any `..`
/// component. The `tar` crate's own hardened unpacking (when built with a
/// recent enough version) rejects these too; this check makes the
/// guarantee independent of that feature being enabled.
fn validate_entry_path(entry_path: &Path) -> Result<()> {
    for component in entry_path.components() {
        match component {
            std::path::Component::ParentDir => {
                return Err(CjdkError::install(format!(
                    "Archive contains path traversal: {}",
                    entry_path.display()
                )));
            }
            std::path::Component::RootDir | std::path::Component::Prefix(_) => {
                return Err(CjdkError::install(format!(
                    "Archive contains absolute path: {}",
                    entry_path.display()
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tgz_https_scheme() {
        let (ext, url) = split_archive_scheme("tgz+https://example.com/a.tar.gz", false).unwrap();
        assert_eq!(ext, "tgz");
        assert_eq!(url, "https://example.com/a.tar.gz");
    }

    #[test]
    fn splits_zip_https_scheme() {
        let (ext, url) = split_archive_scheme("zip+https://example.com/a.zip", false).unwrap();
        assert_eq!(ext, "zip");
        assert_eq!(url, "https://example.com/a.zip");
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(split_archive_scheme("rar+https://example.com/a.rar", false).is_err());
    }

    #[test]
    fn rejects_non_https_transport_by_default() {
        assert!(split_archive_scheme("zip+http://example.com/a.zip", false).is_err());
    }

    #[test]
    fn allow_insecure_permits_http_transport() {
        let (ext, url) = split_archive_scheme("zip+http://example.com/a.zip", true).unwrap();
        assert_eq!(ext, "zip");
        assert_eq!(url, "http://example.com/a.zip");
    }

    #[test]
    fn rejects_url_with_no_plus_separator() {
        assert!(split_archive_scheme("https://example.com/a.zip", false).is_err());
    }

    #[test]
    fn entry_path_rejects_parent_dir_traversal() {
        assert!(validate_entry_path(Path::new("../escape")).is_err());
    }

    #[test]
    fn entry_path_rejects_absolute_path() {
        assert!(validate_entry_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn entry_path_accepts_plain_relative_path() {
        assert!(validate_entry_path(Path::new("jdk-17/bin/java")).is_ok());
    }

    #[test]
    fn extract_zip_roundtrips_a_single_file() {
        use crate::progress::SilentProgressSink;
        use std::io::Write as _;

        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("a.zip");
        {
            let file = File::create(&archive_path).unwrap();
            let mut zw = zip::ZipWriter::new(file);
            zw.start_file("hello.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zw.write_all(b"hi").unwrap();
            zw.finish().unwrap();
        }

        let destdir = dir.path().join("out");
        extract("zip", &destdir, &archive_path, &SilentProgressSink).unwrap();
        let contents = fs::read_to_string(destdir.join("hello.txt")).unwrap();
        assert_eq!(contents, "hi");
    }
}
