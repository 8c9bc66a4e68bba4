//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// File name of the admissions database inside the root folder
pub const DATABASE_FILE: &str = "admissions.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Ensure the root folder exists, creating it when missing
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Path of the admissions database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/adms/config.toml first, then /etc/adms/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("adms").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/adms/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("adms").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("adms"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\adms"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("adms"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/adms"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("adms"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/adms"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let root = resolve_root_folder(Some("/tmp/adms-test"), "ADMS_TEST_UNSET_VAR");
        assert_eq!(root, PathBuf::from("/tmp/adms-test"));
    }

    #[test]
    fn test_env_var_second() {
        std::env::set_var("ADMS_TEST_ROOT_VAR", "/tmp/adms-from-env");
        let root = resolve_root_folder(None, "ADMS_TEST_ROOT_VAR");
        assert_eq!(root, PathBuf::from("/tmp/adms-from-env"));
        std::env::remove_var("ADMS_TEST_ROOT_VAR");
    }

    #[test]
    fn test_database_path() {
        let root = PathBuf::from("/data/adms");
        assert_eq!(
            database_path(&root),
            PathBuf::from("/data/adms/admissions.db")
        );
    }

    #[test]
    fn test_ensure_root_folder_creates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("root");
        ensure_root_folder(&root).expect("should create");
        assert!(root.is_dir());
    }
}
