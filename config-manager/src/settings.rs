use std::time::Duration;

/// Cache key the manager stores its snapshot blob under.
pub const DEFAULT_CACHE_KEY: &str = "config.cache";

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 10;

/// Runtime settings for the configuration manager.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub cache_enabled: bool,
    pub cache_key: String,
    pub cache_ttl: Duration,
    /// How long the full-refresh advisory lock may be held before it expires
    /// on its own.
    pub lock_timeout: Duration,
    /// Whether process environment variables are merged in at load time.
    pub load_environment: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            lock_timeout: Duration::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
            load_environment: true,
        }
    }
}

impl ManagerSettings {
    /// Reads settings from the process environment, loading `.env` first.
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut settings = Self::default();
        if let Some(enabled) = std::env::var("CONFIG_CACHE_ENABLED")
            .ok()
            .as_deref()
            .and_then(parse_bool)
        {
            settings.cache_enabled = enabled;
        }
        if let Ok(key) = std::env::var("CONFIG_CACHE_KEY") {
            if !key.is_empty() {
                settings.cache_key = key;
            }
        }
        if let Some(secs) = std::env::var("CONFIG_CACHE_TTL_SECS")
            .ok()
            .as_deref()
            .and_then(parse_secs)
        {
            settings.cache_ttl = secs;
        }
        if let Some(secs) = std::env::var("CONFIG_LOCK_TIMEOUT_SECS")
            .ok()
            .as_deref()
            .and_then(parse_secs)
        {
            settings.lock_timeout = secs;
        }
        if let Some(load) = std::env::var("CONFIG_LOAD_ENV")
            .ok()
            .as_deref()
            .and_then(parse_bool)
        {
            settings.load_environment = load;
        }
        settings
    }

    /// Name of the advisory lock guarding full cache refreshes.
    pub fn lock_key(&self) -> String {
        format!("{}_lock", self.cache_key)
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_secs(raw: &str) -> Option<Duration> {
    raw.parse::<u64>().ok().map(Duration::from_secs)
}
