//! Sink configuration: `~/.searchsim/sink.toml`, then environment overrides.
//!
//! ```toml
//! bind = "127.0.0.1:8787"
//! dbPath = "/var/lib/searchsim/events.db"
//! ```

use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ADDR_ENV: &str = "SEARCHSIM_SINK_ADDR";
pub const DB_ENV: &str = "SEARCHSIM_SINK_DB";
const DEFAULT_BIND: &str = "127.0.0.1:8787";
const CONFIG_RELATIVE_PATH: &str = ".searchsim/sink.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SinkConfigFile {
    bind: Option<String>,
    db_path: Option<PathBuf>,
}

impl SinkConfig {
    /// Reads the default config file (absent file means defaults) and applies
    /// `SEARCHSIM_SINK_ADDR` / `SEARCHSIM_SINK_DB`.
    pub fn load() -> Result<Self, String> {
        let home = dirs::home_dir().ok_or_else(|| "Home directory not found".to_string())?;
        let file = read_config_file(home.join(CONFIG_RELATIVE_PATH))?;
        Self::resolve(
            file,
            env::var(ADDR_ENV).ok(),
            env::var(DB_ENV).ok(),
            default_db_path(&home),
        )
    }

    fn resolve(
        file: SinkConfigFile,
        addr_override: Option<String>,
        db_override: Option<String>,
        default_db: PathBuf,
    ) -> Result<Self, String> {
        let bind = non_blank(addr_override)
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .map_err(|err| format!("Invalid bind address {}: {}", bind, err))?;

        let db_path = non_blank(db_override)
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or(default_db);

        Ok(Self { bind, db_path })
    }
}

fn read_config_file(path: PathBuf) -> Result<SinkConfigFile, String> {
    if !path.exists() {
        return Ok(SinkConfigFile::default());
    }
    let content = fs_err::read_to_string(&path)
        .map_err(|err| format!("Failed to read sink config {}: {}", path.display(), err))?;
    toml::from_str::<SinkConfigFile>(&content)
        .map_err(|err| format!("Failed to parse sink config {}: {}", path.display(), err))
}

fn default_db_path(home: &std::path::Path) -> PathBuf {
    home.join(".searchsim").join("sink").join("events.db")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let file = read_config_file(temp_dir.path().join("missing.toml")).expect("read");
        let default_db = temp_dir.path().join("events.db");
        let config = SinkConfig::resolve(file, None, None, default_db).expect("config");
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.db_path, temp_dir.path().join("events.db"));
    }

    #[test]
    fn file_values_apply_and_env_wins() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("sink.toml");
        fs_err::write(
            &path,
            r#"
bind = "0.0.0.0:9000"
dbPath = "/tmp/from-file.db"
"#,
        )
        .expect("write config");

        let file = read_config_file(path.clone()).expect("read");
        let config = SinkConfig::resolve(file, None, None, PathBuf::from("unused")).expect("config");
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/from-file.db"));

        let file = read_config_file(path).expect("read");
        let config = SinkConfig::resolve(
            file,
            Some("127.0.0.1:9100".to_string()),
            Some("  ".to_string()),
            PathBuf::from("unused"),
        )
        .expect("config");
        assert_eq!(config.bind.port(), 9100);
        assert_eq!(config.db_path, PathBuf::from("/tmp/from-file.db"));
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = SinkConfig::resolve(
            SinkConfigFile::default(),
            Some("localhost".to_string()),
            None,
            PathBuf::from("events.db"),
        )
        .expect_err("not a socket address");
        assert!(err.contains("Invalid bind address"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("sink.toml");
        fs_err::write(&path, "bind = [").expect("write config");
        assert!(read_config_file(path).is_err());
    }
}
