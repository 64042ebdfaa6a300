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

mod exit_codes;
mod format;

pub use exit_codes::get_exit_code;
pub use format::format_error_chain;

use thiserror::Error;

/// The three user-facing error kinds from the cache/resolver/installer
/// pipeline, plus the Io/Json transparent wrappers every layer can raise.
#[derive(Error, Debug)]
pub enum CjdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no JDK matching the request was found: {0}")]
    JdkNotFound(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] attohttpc::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// Archive scheme prefix (`zip+`/`tgz+`) or transport is well-formed but
    /// not one the pipeline knows how to handle. Never crosses the API
    /// boundary: callers fold this into Config (a user-supplied URL) or
    /// JdkNotFound (an index-supplied URL) at the call site that knows
    /// which it was.
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),
}

impl CjdkError {
    pub fn config(msg: impl Into<String>) -> Self {
        CjdkError::Config(msg.into())
    }

    pub fn jdk_not_found(msg: impl Into<String>) -> Self {
        CjdkError::JdkNotFound(msg.into())
    }

    pub fn install(msg: impl Into<String>) -> Self {
        CjdkError::Install(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        CjdkError::UnsupportedFormat(msg.into())
    }

    /// True for the internal sentinel that must be folded into Config or
    /// JdkNotFound before reaching a caller.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, CjdkError::UnsupportedFormat(_))
    }

    /// Fold an `UnsupportedFormat` into `JdkNotFound` (index-supplied URL);
    /// pass through any other error unchanged.
    pub fn into_jdk_not_found_if_unsupported(self) -> Self {
        match self {
            CjdkError::UnsupportedFormat(msg) => {
                CjdkError::JdkNotFound(format!("Unsupported archive format: {msg}"))
            }
            other => other,
        }
    }

    /// Fold an `UnsupportedFormat` into `Config` (user-supplied URL); pass
    /// through any other error unchanged.
    pub fn into_config_if_unsupported(self) -> Self {
        match self {
            CjdkError::UnsupportedFormat(msg) => CjdkError::Config(msg),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CjdkError>;
