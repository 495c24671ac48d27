//! Server configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.chatd/` by default) and
//! deserializes it into [`ServerConfig`]. Falls back to defaults when the file
//! is missing or malformed.

use std::path::{Path, PathBuf};

use chatserver_types::config::ServerConfig;

use crate::sqlite::pool::default_database_url;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CHATD_DATA_DIR";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// Uses `CHATD_DATA_DIR` if set, otherwise `~/.chatd`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chatd");
    }

    PathBuf::from(".chatd")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ServerConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_config(data_dir: &Path) -> ServerConfig {
    load_config_file(&data_dir.join(CONFIG_FILE)).await
}

/// Load configuration from an explicit file path, with the same fallbacks as
/// [`load_config`].
pub async fn load_config_file(config_path: &Path) -> ServerConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServerConfig::default()
        }
    }
}

/// Resolve the database URL.
///
/// Priority: explicit override (CLI flag or `CHATD_DATABASE_URL`), then
/// `database_url` from the config file, then `{data_dir}/chat.db`.
pub fn resolve_database_url(
    config: &ServerConfig,
    data_dir: &Path,
    override_url: Option<&str>,
) -> String {
    override_url
        .map(str::to_owned)
        .or_else(|| config.database_url.clone())
        .unwrap_or_else(|| default_database_url(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatserver_types::chat::UserId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, ServerConfig::default());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
database_url = "sqlite:///srv/chat.db"
request_timeout_secs = 5
known_users = [7, 9]
log_filter = "debug"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///srv/chat.db"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.known_users, Some(vec![UserId(7), UserId(9)]));
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn resolve_database_url_priority() {
        let data_dir = Path::new("/data");
        let mut config = ServerConfig::default();

        assert_eq!(
            resolve_database_url(&config, data_dir, None),
            "sqlite:///data/chat.db?mode=rwc"
        );

        config.database_url = Some("sqlite:///from/config.db".to_string());
        assert_eq!(
            resolve_database_url(&config, data_dir, None),
            "sqlite:///from/config.db"
        );
        assert_eq!(
            resolve_database_url(&config, data_dir, Some("sqlite:///from/flag.db")),
            "sqlite:///from/flag.db"
        );
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is the only one touching CHATD_DATA_DIR and restores it immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-chatd");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-chatd"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
