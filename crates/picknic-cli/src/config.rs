//! Configuration file management for picknic.
//!
//! Provides a TOML config file at `~/.config/picknic/config.toml` and a
//! resolution chain for the database URL: CLI flag > env var > config file >
//! default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use picknic_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Defaults for `picknic serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "ServerSection::default_bind")]
    pub bind: String,
    #[serde(default = "ServerSection::default_port")]
    pub port: u16,
}

impl ServerSection {
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3000;

    fn default_bind() -> String {
        Self::DEFAULT_BIND.to_string()
    }

    fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            port: Self::default_port(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the picknic config directory.
///
/// Always XDG layout: `$XDG_CONFIG_HOME/picknic` or `~/.config/picknic`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("picknic");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("picknic")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file is made owner-only on Unix since the URL may carry a password.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PicknicConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl PicknicConfig {
    /// Resolve configuration.
    ///
    /// - DB URL: `cli_db_url` > `PICKNIC_DATABASE_URL` > `[database].url` >
    ///   [`DbConfig::DEFAULT_URL`]
    /// - Server: `[server]` section, else `127.0.0.1:3000`
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server: file_config.map(|cfg| cfg.server).unwrap_or_default(),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_util::{lock_env, with_config_home};

    #[test]
    fn config_roundtrips_through_toml() {
        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            server: ServerSection {
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
        };

        let contents = toml::to_string_pretty(&original).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();

        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.server, original.server);
    }

    #[test]
    fn server_section_is_optional() {
        let loaded: ConfigFile =
            toml::from_str("[database]\nurl = \"postgresql://h/db\"\n").unwrap();
        assert_eq!(loaded.server, ServerSection::default());

        let partial: ConfigFile =
            toml::from_str("[database]\nurl = \"x\"\n\n[server]\nport = 9000\n").unwrap();
        assert_eq!(partial.server.bind, ServerSection::DEFAULT_BIND);
        assert_eq!(partial.server.port, 9000);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_writes_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        let path = with_config_home(tmp.path(), || {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://localhost/picknic".to_string(),
                },
                server: ServerSection::default(),
            })
            .unwrap()
        });

        assert_eq!(path, tmp.path().join("picknic").join("config.toml"));
        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        let config = PicknicConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };

        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("picknic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[database]\nurl = \"postgresql://file:5432/filedb\"\n\n[server]\nport = 4000\n",
        )
        .unwrap();

        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        let config = with_config_home(tmp.path(), || PicknicConfig::resolve(None).unwrap());
        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };

        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn resolve_reads_config_file_when_env_unset() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("picknic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[database]\nurl = \"postgresql://file:5432/filedb\"\n",
        )
        .unwrap();

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        let config = with_config_home(tmp.path(), || PicknicConfig::resolve(None).unwrap());

        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        let config = with_config_home(tmp.path(), || PicknicConfig::resolve(None).unwrap());

        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
    }

    #[test]
    fn resolve_rejects_malformed_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("picknic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "not [valid toml").unwrap();

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        let result = with_config_home(tmp.path(), || PicknicConfig::resolve(None));

        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("picknic/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
