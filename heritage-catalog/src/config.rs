use crate::error::{CatalogError, ConfigError, Result};
use crate::pagination::MAX_PER_PAGE;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_bind() -> String {
    "[::]:5000".into()
}

fn default_workers() -> usize {
    4
}

fn default_connection_rate() -> usize {
    256
}

fn default_enable_compression() -> bool {
    false
}

fn default_database_path() -> PathBuf {
    PathBuf::from("catalog.sqlite")
}

fn default_read_connections() -> usize {
    4
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    100
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_per_page() -> u32 {
    10
}

/// Longest accepted `cache_ttl_secs` (30 days).
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_connection_rate")]
    pub max_connection_rate: usize,

    #[serde(default = "default_enable_compression")]
    pub enable_compression: bool,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Connections searches are spread over
    #[serde(default = "default_read_connections")]
    pub read_connections: usize,

    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Redis server holding the cache; the in-process cache is used when unset
    #[serde(default)]
    pub cache_url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Fixture imported at startup when the catalog is empty
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: default_bind(),
            workers: default_workers(),
            max_connection_rate: default_connection_rate(),
            enable_compression: default_enable_compression(),
            database_path: default_database_path(),
            read_connections: default_read_connections(),
            cache_enabled: default_cache_enabled(),
            cache_url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            default_per_page: default_per_page(),
            seed_file: None,
        }
    }
}

impl Config {
    pub fn load(settings_file: &Path) -> Result<Config> {
        let contents = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.display().to_string(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Config> {
        toml::from_str(contents).map_err(|e| CatalogError::from(ConfigError::from(e)))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Reject settings the server can't run with and clamp the page size.
    fn validate(mut self) -> Result<Config> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                reason: "workers must be greater than 0".to_string(),
            }
            .into());
        }
        if self.read_connections == 0 {
            return Err(ConfigError::Invalid {
                reason: "read_connections must be greater than 0".to_string(),
            }
            .into());
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                reason: format!("cache_ttl_secs must be at most {MAX_CACHE_TTL_SECS}"),
            }
            .into());
        }
        if self.cache_enabled && self.cache_url.is_none() && self.cache_max_entries == 0 {
            return Err(ConfigError::Invalid {
                reason: "cache_max_entries must be greater than 0 when the cache is enabled"
                    .to_string(),
            }
            .into());
        }
        if !(1..=MAX_PER_PAGE).contains(&self.default_per_page) {
            tracing::warn!(
                "default_per_page {} is outside 1..={MAX_PER_PAGE}, clamping",
                self.default_per_page
            );
            self.default_per_page = self.default_per_page.clamp(1, MAX_PER_PAGE);
        }
        Ok(self)
    }
}

/// Resolve the configuration from an explicit settings file, falling back to
/// `./settings.toml` and then to the defaults.
pub fn load_from(
    settings_file: Option<&Path>,
    database_path: Option<PathBuf>,
    cache_url: Option<String>,
) -> Result<Config> {
    let mut settings = match settings_file {
        Some(path) => Config::load(path)?,
        None => {
            if Path::new("settings.toml").exists() {
                Config::load(Path::new("settings.toml"))?
            } else {
                Config::default()
            }
        }
    };

    if let Some(database_path) = database_path {
        settings.database_path = database_path;
    }
    if let Some(cache_url) = cache_url {
        settings.cache_url = Some(cache_url);
    }

    settings.validate()
}

/// Load the configuration named by `$CONFIG_FILE`, honouring `$DATABASE_PATH`
/// and `$REDIS_URL`.
pub fn load() -> Result<Config> {
    let settings_file = std::env::var_os("CONFIG_FILE").map(PathBuf::from);
    let database_path = std::env::var_os("DATABASE_PATH").map(PathBuf::from);
    let cache_url = std::env::var("REDIS_URL").ok();
    load_from(settings_file.as_deref(), database_path, cache_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_utils_test::ScratchDir;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.bind, "[::]:5000");
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_connection_rate, 256);
        assert!(!config.enable_compression);
        assert_eq!(config.database_path, PathBuf::from("catalog.sqlite"));
        assert_eq!(config.read_connections, 4);
        assert!(config.cache_enabled);
        assert!(config.cache_url.is_none());
        assert_eq!(config.cache_ttl(), Duration::from_secs(100));
        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.default_per_page, 10);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn test_default_impl_matches_serde_defaults() {
        let parsed = Config::parse("").unwrap();
        let built = Config::default();
        assert_eq!(parsed.bind, built.bind);
        assert_eq!(parsed.cache_ttl_secs, built.cache_ttl_secs);
        assert_eq!(parsed.default_per_page, built.default_per_page);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = Config::parse("priority = 30\n").unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_file_and_database_override() {
        let dir = ScratchDir::new().unwrap();
        let path = dir
            .write_file(
                "settings.toml",
                "bind = \"127.0.0.1:8080\"\ncache_ttl_secs = 5\ndatabase_path = \"a.sqlite\"\n",
            )
            .unwrap();

        let config = load_from(Some(path.as_path()), None, None).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.cache_ttl_secs, 5);
        assert_eq!(config.database_path, PathBuf::from("a.sqlite"));

        let config = load_from(Some(path.as_path()), Some(dir.db_path()), None).unwrap();
        assert_eq!(config.database_path, dir.db_path());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = ScratchDir::new().unwrap();
        let err = load_from(Some(dir.path().join("nope.toml").as_path()), None, None).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = ScratchDir::new().unwrap();
        let path = dir.write_file("settings.toml", "workers = 0\n").unwrap();
        let err = load_from(Some(path.as_path()), None, None).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_cache_ttl_is_bounded() {
        let dir = ScratchDir::new().unwrap();
        let path = dir
            .write_file("settings.toml", "cache_ttl_secs = 315360000\n")
            .unwrap();
        let err = load_from(Some(path.as_path()), None, None).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::Invalid { .. })));

        let path = dir
            .write_file("settings.toml", &format!("cache_ttl_secs = {MAX_CACHE_TTL_SECS}\n"))
            .unwrap();
        let config = load_from(Some(path.as_path()), None, None).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(MAX_CACHE_TTL_SECS));
    }

    #[test]
    fn test_redis_url_override() {
        let dir = ScratchDir::new().unwrap();
        let path = dir
            .write_file("settings.toml", "cache_url = \"redis://cache:6379/0\"\n")
            .unwrap();
        let config = load_from(Some(path.as_path()), None, None).unwrap();
        assert_eq!(config.cache_url.as_deref(), Some("redis://cache:6379/0"));

        let other = Some("redis://other:6379/1".to_string());
        let config = load_from(Some(path.as_path()), None, other).unwrap();
        assert_eq!(config.cache_url.as_deref(), Some("redis://other:6379/1"));
    }

    #[test]
    fn test_zero_read_connections_rejected() {
        let dir = ScratchDir::new().unwrap();
        let path = dir.write_file("settings.toml", "read_connections = 0\n").unwrap();
        let err = load_from(Some(path.as_path()), None, None).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_default_per_page_is_clamped() {
        let dir = ScratchDir::new().unwrap();
        let path = dir.write_file("settings.toml", "default_per_page = 500\n").unwrap();
        assert_eq!(load_from(Some(path.as_path()), None, None).unwrap().default_per_page, 100);

        let path = dir.write_file("settings.toml", "default_per_page = 0\n").unwrap();
        assert_eq!(load_from(Some(path.as_path()), None, None).unwrap().default_per_page, 1);
    }
}
