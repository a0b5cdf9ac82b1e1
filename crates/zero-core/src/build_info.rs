//! Build metadata embedded into health responses.
//!
//! Values are captured at compile time from `ZERO_*` environment variables set
//! by the build pipeline; anything not provided reads as `"unknown"`.

use serde::Serialize;

const UNKNOWN: &str = "unknown";

/// Last commit the binary was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: String,
    pub time: String,
    pub author: String,
}

/// Immutable version/VCS information for the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: String,
    pub git_version: String,
    pub build_time: String,
    pub last_commit: Commit,
}

impl BuildInfo {
    /// Capture the metadata baked in by the build environment.
    pub fn from_build_env() -> Self {
        Self {
            version: option_env!("ZERO_APP_VERSION")
                .unwrap_or(env!("CARGO_PKG_VERSION"))
                .to_string(),
            git_version: or_unknown(option_env!("ZERO_GIT_VERSION")),
            build_time: or_unknown(option_env!("ZERO_BUILD_TIME")),
            last_commit: Commit {
                id: or_unknown(option_env!("ZERO_COMMIT_ID")),
                time: or_unknown(option_env!("ZERO_COMMIT_TIME")),
                author: or_unknown(option_env!("ZERO_COMMIT_AUTHOR")),
            },
        }
    }
}

fn or_unknown(v: Option<&str>) -> String {
    v.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN).to_string()
}
