use homebuilder_cache::CacheConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub locales_dir: PathBuf,
    /// When set, dictionaries are fetched from `<url>/locales/<lang>.json`
    /// instead of read from `locales_dir`
    pub locales_base_url: Option<String>,
    pub storage_dir: PathBuf,
    pub cleanup_interval: Duration,
    pub cache: CacheConfig,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let parse_secs = |name: &str| get(name).and_then(|s| s.trim().parse::<u64>().ok());

        let port = get("PORT").and_then(|p| p.parse().ok()).unwrap_or(3005);

        let locales_dir = get("LOCALES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./locales"));

        let locales_base_url = get("LOCALES_BASE_URL").filter(|s| !s.trim().is_empty());

        let storage_dir = get("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/storage"));

        let cleanup_interval = Duration::from_secs(
            parse_secs("CACHE_CLEANUP_INTERVAL_SECS")
                .filter(|s| *s > 0)
                .unwrap_or(60),
        );

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            general_ttl: parse_secs("CACHE_GENERAL_TTL_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.general_ttl),
            metadata_ttl: parse_secs("CACHE_METADATA_TTL_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.metadata_ttl),
            image_capacity: get("IMAGE_CACHE_CAPACITY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.image_capacity),
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Self {
            port,
            locales_dir,
            locales_base_url,
            storage_dir,
            cleanup_interval,
            cache,
            cors_origins,
        }
    }
}
