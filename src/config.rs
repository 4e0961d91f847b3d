//! Ambient configuration
//!
//! Configuration is resolved once at process start into an explicit
//! [`SnapshotConfig`] value and threaded through the harness; nothing else
//! in the crate touches the environment.

use crate::error::ConfigError;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the artifact root directory.
pub const ROOT_ENV_VAR: &str = "SNAPCHECK_ROOT";

/// Environment variable forcing record mode (`1` or `true`).
pub const RECORD_ENV_VAR: &str = "SNAPCHECK_RECORD";

/// Resolved snapshot configuration: where artifacts live and whether runs
/// record new baselines instead of verifying against existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    root: PathBuf,
    record: bool,
}

impl SnapshotConfig {
    /// Resolves the configuration from the process environment.
    ///
    /// `SNAPCHECK_ROOT` must name the artifact root; its absence is a
    /// [`ConfigError`]. `SNAPCHECK_RECORD=1` switches every run built from
    /// this config into record mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = env::var(ROOT_ENV_VAR).map_err(|_| ConfigError::RootPathNotSet {
            var: ROOT_ENV_VAR,
        })?;
        if root.is_empty() {
            return Err(ConfigError::EmptyRootPath { var: ROOT_ENV_VAR });
        }
        Ok(Self {
            root: PathBuf::from(root),
            record: env_flag(RECORD_ENV_VAR),
        })
    }

    /// Builds a configuration with an explicit root, record mode off.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            record: false,
        }
    }

    /// Toggles record mode.
    pub fn record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    /// Artifact root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when runs should record baselines instead of verifying.
    pub fn is_record_mode(&self) -> bool {
        self.record
    }
}

fn env_flag(var: &str) -> bool {
    env::var(var).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
