//! Environment-driven configuration.
//!
//! All environment mutation lives in this single test so the process-global
//! variables are never raced by a parallel test.

use snapcheck::config::{ROOT_ENV_VAR, RECORD_ENV_VAR};
use snapcheck::error::ConfigError;
use snapcheck::SnapshotConfig;
use std::env;
use std::path::Path;

#[test]
fn from_env_resolves_root_and_record_mode() {
    env::remove_var(ROOT_ENV_VAR);
    env::remove_var(RECORD_ENV_VAR);

    assert!(matches!(
        SnapshotConfig::from_env(),
        Err(ConfigError::RootPathNotSet { .. })
    ));

    env::set_var(ROOT_ENV_VAR, "");
    assert!(matches!(
        SnapshotConfig::from_env(),
        Err(ConfigError::EmptyRootPath { .. })
    ));

    env::set_var(ROOT_ENV_VAR, "/srv/ci/snapshots");
    let config = SnapshotConfig::from_env().unwrap();
    assert_eq!(config.root(), Path::new("/srv/ci/snapshots"));
    assert!(!config.is_record_mode());

    env::set_var(RECORD_ENV_VAR, "1");
    assert!(SnapshotConfig::from_env().unwrap().is_record_mode());

    env::set_var(RECORD_ENV_VAR, "true");
    assert!(SnapshotConfig::from_env().unwrap().is_record_mode());

    env::set_var(RECORD_ENV_VAR, "0");
    assert!(!SnapshotConfig::from_env().unwrap().is_record_mode());

    env::remove_var(ROOT_ENV_VAR);
    env::remove_var(RECORD_ENV_VAR);
}
