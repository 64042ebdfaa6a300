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

//! Cache-key hashing and the exponential-backoff sequence shared by the
//! cache protocol and the filesystem retry loops.

use crate::error::{CjdkError, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha1::{Digest, Sha1};
use url::Url;

/// Unix and Windows both disallow characters beyond what this set permits;
/// `+ - . _` are never percent-encoded so the normalization is a no-op for
/// them, matching the source's stated safe set.
const KEY_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Compute the SHA-1-based cache key for a URL. Rejects URLs carrying query,
/// params, or fragment components, since those are not stable cache
/// identity. Not used for any security purpose, only filesystem naming.
pub fn key_for_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| CjdkError::config(format!("Invalid URL '{url}': {e}")))?;
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(CjdkError::config(format!(
            "URL should not have parameters, query, or fragment: {url}"
        )));
    }

    let netloc = parsed.host_str().map(|h| match parsed.port() {
        Some(p) => format!("{h}:{p}"),
        None => h.to_string(),
    });
    let path_segments: Vec<&str> = parsed
        .path()
        .trim_matches('/')
        .split('/')
        .collect();

    let mut items: Vec<String> = Vec::with_capacity(path_segments.len() + 1);
    items.push(netloc.unwrap_or_default());
    items.extend(path_segments.iter().map(|s| s.to_string()));

    let normalized = items
        .iter()
        .map(|item| percent_reencode(item))
        .collect::<Result<Vec<_>>>()?
        .join("/");

    let mut hasher = Sha1::new();
    hasher.update(normalized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn percent_reencode(item: &str) -> Result<String> {
    let decoded = percent_decode_str(item)
        .decode_utf8()
        .map_err(|e| CjdkError::config(format!("Invalid percent encoding in URL component '{item}': {e}")))?;
    Ok(utf8_percent_encode(&decoded, KEY_SAFE).to_string())
}

/// Yield sleep durations for exponential backoff: `initial`, growing by
/// `factor` each step and capped at `max_interval`, until their running sum
/// would exceed `max_total`. The final item is always the sentinel `-1.0`,
/// signaling the caller to make one last attempt before giving up.
pub fn backoff_seconds(initial_interval: f64, max_interval: f64, max_total: f64, factor: f64) -> Vec<f64> {
    assert!(initial_interval > 0.0);
    assert!(max_total >= 0.0);
    assert!(factor > 1.0);

    let mut out = Vec::new();
    let mut total = 0.0;
    let mut next_interval = initial_interval;

    while max_total > 0.0 {
        let next_total = total + next_interval;
        if next_total > max_total {
            let remaining = max_total - total;
            if remaining > 0.01 {
                out.push(remaining);
            }
            break;
        }
        out.push(next_interval);
        total = next_total;
        next_interval *= factor;
        if next_interval > max_interval {
            next_interval = max_interval;
        }
    }
    out.push(-1.0);
    out
}
