//! Configuration loader.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// File name looked up by discovery.
pub const CONFIG_FILE_NAME: &str = ".shipmate.toml";

/// Template written by `shipmate init`.
pub const DEFAULT_CONFIG: &str = r#"# Shipmate configuration
target_branch = "main"
branch_prefix = "release"
project_url = ""

[provider]
kind = "github"
repository = ""

[versioning]
strategy = "conventional"
version_prefix = ""
bump_minor_pre_major = false
bump_patch_minor_pre_major = false

# [[extra_files]]
# path = "README.md"

# [[propagation_targets]]
# target = "owner/other-repo"
"#;

/// Reads and parses `.shipmate.toml` at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] for a missing file, otherwise an IO or
/// TOML error.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    debug!(?path, "loaded configuration file");
    Ok(toml::from_str(&content)?)
}

/// Like [`find_and_load_config_from`], starting at the working directory.
///
/// # Errors
///
/// See [`find_and_load_config_from`].
pub fn find_and_load_config() -> ConfigResult<Config> {
    find_and_load_config_from(std::env::current_dir()?)
}

/// Loads the nearest `.shipmate.toml` in `start_dir` or its ancestors.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] naming `start_dir` when no ancestor has
/// one, or the parse error of the file found.
pub fn find_and_load_config_from(start_dir: impl AsRef<Path>) -> ConfigResult<Config> {
    let start_dir = start_dir.as_ref();
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .map_or_else(
            || Err(ConfigError::NotFound(start_dir.join(CONFIG_FILE_NAME))),
            load_config,
        )
}

/// Writes [`DEFAULT_CONFIG`] into `dir`.
///
/// Returns `Ok(None)` when a file exists and `force` is false.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(dir: impl AsRef<Path>, force: bool) -> ConfigResult<Option<PathBuf>> {
    let path = dir.as_ref().join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        debug!(?path, "configuration already present");
        return Ok(None);
    }

    std::fs::write(&path, DEFAULT_CONFIG)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderKind, Strategy};
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join(CONFIG_FILE_NAME);

        assert!(matches!(load_config(&missing), Err(ConfigError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "");

        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "target_branch = [unterminated");

        assert!(matches!(load_config(&path), Err(ConfigError::InvalidToml(_))));
    }

    #[test]
    fn test_unknown_provider_kind_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[provider]\nkind = \"bitbucket\"\n");

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_discovery_walks_up() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "target_branch = \"develop\"\n");
        let nested = root.path().join("services").join("api");
        fs::create_dir_all(&nested).unwrap();

        let config = find_and_load_config_from(&nested).unwrap();
        assert_eq!(config.target_branch, "develop");
    }

    #[test]
    fn test_discovery_prefers_nearest() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "target_branch = \"develop\"\n");
        let nested = root.path().join("app");
        fs::create_dir(&nested).unwrap();
        write_config(&nested, "target_branch = \"trunk\"\n");

        assert_eq!(find_and_load_config_from(&nested).unwrap().target_branch, "trunk");
    }

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.provider.kind(), ProviderKind::GitHub);
        assert_eq!(config.versioning.strategy, Strategy::Conventional);
    }

    #[test]
    fn test_write_default_config_respects_existing() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "target_branch = \"trunk\"\n");

        assert!(write_default_config(dir.path(), false).unwrap().is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "target_branch = \"trunk\"\n");

        assert!(write_default_config(dir.path(), true).unwrap().is_some());
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
