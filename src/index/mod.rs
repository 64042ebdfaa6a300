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

//! The 4-level JDK index (`os -> arch -> "jdk@"+vendor -> exact version ->
//! archive URL`), its cache-backed retrieval, and version resolution.

use crate::cache;
use crate::config::Configuration;
use crate::download;
use crate::error::{CjdkError, Result};
use crate::progress::SilentProgressSink;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const INDEX_KEY_PREFIX: &str = "index";
const INDEX_FILENAME: &str = "jdk-index.json";

pub type Versions = BTreeMap<String, String>;
pub type Vendors = BTreeMap<String, Versions>;
pub type Arches = BTreeMap<String, Vendors>;
pub type Index = BTreeMap<String, Arches>;

/// Fetch the index (from cache if fresh), parsed and vendor-bucket-merged.
/// Index fetches are always silent regardless of `conf.progress` (§4.5).
pub fn jdk_index(conf: &Configuration) -> Result<Index> {
    let path = cached_index_path(conf)?;
    read_index(&path)
}

/// `(vendor, version)` pairs available for `conf.os`/`conf.arch`, vendor
/// names with the `jdk@` prefix stripped.
pub fn available_jdks(index: &Index, conf: &Configuration) -> Vec<(String, String)> {
    let Some(arches) = index.get(&conf.os) else {
        return Vec::new();
    };
    let Some(vendors) = arches.get(&conf.arch) else {
        return Vec::new();
    };

    let mut out: Vec<(String, String)> = vendors
        .iter()
        .flat_map(|(vendor, versions)| {
            let bare = vendor.strip_prefix("jdk@").unwrap_or(vendor).to_string();
            versions.keys().map(move |v| (bare.clone(), v.clone()))
        })
        .collect();
    out.sort();
    out
}

pub fn resolve_jdk_version(index: &Index, conf: &Configuration) -> Result<String> {
    let jdks = available_jdks(index, conf);
    let candidates: Vec<String> = jdks
        .into_iter()
        .filter(|(vendor, _)| *vendor == conf.vendor)
        .map(|(_, version)| version)
        .collect();
    if candidates.is_empty() {
        return Err(CjdkError::jdk_not_found(format!(
            "No {} JDK is available for {}-{}",
            conf.vendor, conf.os, conf.arch
        )));
    }
    match_version(&conf.vendor, &candidates, &conf.version)
}

/// Archive URL for `conf`'s `(os, arch, vendor, exact_version)`, resolving
/// `conf.version` against the index first when `exact_version` is `None`.
pub fn jdk_url(index: &Index, conf: &Configuration, exact_version: Option<&str>) -> Result<String> {
    let exact_version = match exact_version {
        Some(v) => v.to_string(),
        None => resolve_jdk_version(index, conf)?,
    };
    index
        .get(&conf.os)
        .and_then(|a| a.get(&conf.arch))
        .and_then(|v| v.get(&format!("jdk@{}", conf.vendor)))
        .and_then(|versions| versions.get(&exact_version))
        .cloned()
        .ok_or_else(|| {
            CjdkError::jdk_not_found(format!(
                "No URL found for {}:{} on {}-{}",
                conf.vendor, exact_version, conf.os, conf.arch
            ))
        })
}

fn cached_index_path(conf: &Configuration) -> Result<std::path::PathBuf> {
    let key_url = conf.index_url.clone();
    let fetch_url = conf.index_url.clone();
    let allow_insecure = conf.allow_insecure_for_testing;
    cache::atomic_file(
        INDEX_KEY_PREFIX,
        &key_url,
        INDEX_FILENAME,
        &conf.cache_dir,
        conf.index_ttl,
        300.0,
        2.5,
        &SilentProgressSink,
        move |dest| {
            let check: &dyn Fn(&Path) -> Result<()> = &|path: &Path| read_index(path).map(|_| ());
            download::download_file(dest, &fetch_url, Some(check), &SilentProgressSink, allow_insecure)
        },
    )
}

fn read_index(path: &Path) -> Result<Index> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CjdkError::install(format!("Failed to read index file {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| CjdkError::install(format!("Invalid JSON in index file {}: {e}", path.display())))?;
    let index: Index = serde_json::from_value(value)
        .map_err(|e| CjdkError::install(format!("Invalid JSON in index file {}: {e}", path.display())))?;
    Ok(postprocess_index(index))
}

/// Merge synonymous vendor buckets, e.g. `ibm-semeru-openj9-java17` into
/// `ibm-semeru-openj9`. GraalVM vendors follow the same naming pattern but
/// are deliberately excluded: the trailing number there is a bundled JDK
/// major version, not part of the GraalVM version itself, so merging would
/// conflate incompatible version spaces.
fn postprocess_index(mut index: Index) -> Index {
    let pattern = Regex::new(r"^(jdk@ibm-semeru.*)-java\d+$").expect("static regex is valid");

    for arches in index.values_mut() {
        for vendors in arches.values_mut() {
            let merges: Vec<(String, Versions)> = vendors
                .iter()
                .filter(|(vendor, _)| {
                    !vendor.starts_with("jdk@graalvm") && pattern.is_match(vendor)
                })
                .map(|(vendor, versions)| {
                    let true_vendor = pattern.captures(vendor).unwrap()[1].to_string();
                    (true_vendor, versions.clone())
                })
                .collect();

            for (true_vendor, versions) in merges {
                vendors.entry(true_vendor).or_default().extend(versions);
            }
        }
    }

    index
}

pub(crate) fn match_versions(vendor: &str, candidates: &[String], requested: &str) -> BTreeMap<VersionKey, String> {
    let is_graal = vendor.to_lowercase().contains("graalvm");
    let normreq = normalize_version(requested, !is_graal);

    let mut normcands: BTreeMap<VersionKey, String> = BTreeMap::new();
    for candidate in candidates {
        match try_normalize_version(candidate, !is_graal) {
            Some(normcand) => {
                normcands.insert(normcand, candidate.clone());
            }
            None => {
                log::warn!("Invalid version '{candidate}' in index; skipped");
            }
        }
    }

    normcands
        .into_iter()
        .filter(|(k, _)| is_version_compatible_with_spec(k, &normreq))
        .collect()
}

fn match_version(vendor: &str, candidates: &[String], requested: &str) -> Result<String> {
    let matched = match_versions(vendor, candidates, requested);
    match matched.into_iter().next_back() {
        Some((_, version)) => Ok(version),
        None => Err(CjdkError::jdk_not_found(format!(
            "No matching version for '{vendor}:{requested}'"
        ))),
    }
}

/// Element-wise comparable, lexicographically ordered normalized version.
/// Integers sort before strings at the same position, matching Python's
/// rule that the candidates never actually mix types at a given index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey {
    elements: Vec<VersionElement>,
    plus: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum VersionElement {
    Int(i64),
    Str(String),
}

fn normalize_version(ver: &str, remove_prefix_1: bool) -> VersionKey {
    try_normalize_version(ver, remove_prefix_1).unwrap_or(VersionKey { elements: Vec::new(), plus: false })
}

/// Always returns `Some`: every element either parses as an integer or is
/// kept as a string, so there is no malformed input this can reject. The
/// `None` path in `match_versions` mirrors the source's defensive handling
/// of a normalization failure that can't actually occur.
fn try_normalize_version(ver: &str, remove_prefix_1: bool) -> Option<VersionKey> {
    let is_plus = ver.ends_with('+');
    let trimmed = if is_plus { &ver[..ver.len() - 1] } else { ver };

    let mut elements: Vec<VersionElement> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed
            .split(['.', '+', '_', '-'])
            .map(|e| match e.parse::<i64>() {
                Ok(n) => VersionElement::Int(n),
                Err(_) => VersionElement::Str(e.to_string()),
            })
            .collect()
    };

    if remove_prefix_1 && matches!(elements.first(), Some(VersionElement::Int(1))) {
        elements.remove(0);
    }

    Some(VersionKey { elements, plus: is_plus })
}

fn is_version_compatible_with_spec(version: &VersionKey, spec: &VersionKey) -> bool {
    debug_assert!(!version.plus, "a candidate version should never itself be open-ended");

    if spec.plus {
        if spec.elements.is_empty() {
            return true;
        }
        let prefix_len = spec.elements.len() - 1;
        version.elements.len() >= spec.elements.len()
            && version.elements[..prefix_len] == spec.elements[..prefix_len]
            && version.elements[prefix_len] >= spec.elements[prefix_len]
    } else {
        version.elements.len() >= spec.elements.len() && version.elements[..spec.elements.len()] == spec.elements[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> Index {
        let json = r#"{
            "linux": {
                "amd64": {
                    "jdk@adoptium": {"17.0.9": "tgz+https://example.com/a.tgz", "17.0.8": "tgz+https://example.com/b.tgz"},
                    "jdk@ibm-semeru-openj9-java17": {"17.0.1": "tgz+https://example.com/c.tgz"},
                    "jdk@graalvm-java17": {"22.3.3": "tgz+https://example.com/d.tgz"}
                }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    fn conf(os: &str, arch: &str, vendor: &str, version: &str) -> Configuration {
        Configuration {
            os: os.to_string(),
            arch: arch.to_string(),
            vendor: vendor.to_string(),
            version: version.to_string(),
            cache_dir: std::path::PathBuf::from("/tmp/unused"),
            index_url: "https://example.com/index.json".to_string(),
            index_ttl: 0.0,
            progress: false,
            allow_insecure_for_testing: false,
        }
    }

    #[test]
    fn available_jdks_strips_jdk_prefix() {
        let index = sample_index();
        let c = conf("linux", "amd64", "adoptium", "");
        let jdks = available_jdks(&index, &c);
        assert!(jdks.contains(&("adoptium".to_string(), "17.0.9".to_string())));
    }

    #[test]
    fn available_jdks_missing_os_returns_empty() {
        let index = sample_index();
        let c = conf("windows", "amd64", "adoptium", "");
        assert!(available_jdks(&index, &c).is_empty());
    }

    #[test]
    fn postprocess_merges_ibm_semeru_java_suffixed_vendor() {
        let index = postprocess_index(sample_index());
        let vendors = &index["linux"]["amd64"];
        assert!(vendors.contains_key("jdk@ibm-semeru-openj9"));
        assert_eq!(vendors["jdk@ibm-semeru-openj9"]["17.0.1"], "tgz+https://example.com/c.tgz");
    }

    #[test]
    fn postprocess_does_not_merge_graalvm_vendor() {
        let index = postprocess_index(sample_index());
        let vendors = &index["linux"]["amd64"];
        assert!(!vendors.contains_key("jdk@graalvm"));
        assert!(vendors.contains_key("jdk@graalvm-java17"));
    }

    #[test]
    fn resolve_jdk_version_picks_highest_compatible() {
        let index = postprocess_index(sample_index());
        let c = conf("linux", "amd64", "adoptium", "17+");
        assert_eq!(resolve_jdk_version(&index, &c).unwrap(), "17.0.9");
    }

    #[test]
    fn resolve_jdk_version_errors_when_vendor_absent() {
        let index = postprocess_index(sample_index());
        let c = conf("linux", "amd64", "zulu", "17");
        assert!(resolve_jdk_version(&index, &c).is_err());
    }

    #[test]
    fn jdk_url_looks_up_exact_version() {
        let index = postprocess_index(sample_index());
        let c = conf("linux", "amd64", "adoptium", "");
        let url = jdk_url(&index, &c, Some("17.0.8")).unwrap();
        assert_eq!(url, "tgz+https://example.com/b.tgz");
    }

    #[test]
    fn normalize_version_strips_leading_one_for_non_graal() {
        let k = normalize_version("1.8.0", true);
        assert_eq!(k.elements, vec![VersionElement::Int(8), VersionElement::Int(0)]);
    }

    #[test]
    fn normalize_version_keeps_leading_one_for_graal() {
        let k = normalize_version("1.8.0", false);
        assert_eq!(k.elements, vec![VersionElement::Int(1), VersionElement::Int(8), VersionElement::Int(0)]);
    }

    #[test]
    fn open_ended_spec_matches_any_higher_patch() {
        let spec = normalize_version("17+", true);
        let candidate = normalize_version("17.0.9", true);
        assert!(is_version_compatible_with_spec(&candidate, &spec));
    }

    #[test]
    fn exact_spec_rejects_different_version() {
        let spec = normalize_version("17.0.8", true);
        let candidate = normalize_version("17.0.9", true);
        assert!(!is_version_compatible_with_spec(&candidate, &spec));
    }

    #[test]
    fn invalid_candidate_version_is_skipped_not_fatal() {
        let candidates = vec!["17.0.9".to_string()];
        let matched = match_versions("adoptium", &candidates, "17+");
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn jdk_index_fetches_once_then_serves_from_cache() {
        let mut server = mockito::Server::new();
        let body = r#"{"linux":{"amd64":{"jdk@adoptium":{"17":"zip+https://h/j.zip"}}}}"#;
        let mock = server
            .mock("GET", "/index.json")
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let mut c = conf("linux", "amd64", "adoptium", "");
        c.cache_dir = dir.path().to_path_buf();
        c.index_url = format!("{}/index.json", server.url());
        c.index_ttl = 1e18;
        c.allow_insecure_for_testing = true;

        let first = jdk_index(&c).unwrap();
        let second = jdk_index(&c).unwrap();

        mock.assert();
        assert_eq!(first, second);
        assert!(first["linux"]["amd64"].contains_key("jdk@adoptium"));
    }
}
