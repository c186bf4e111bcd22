use chrono_tz::Tz;

/// Timezone used when neither `FLEETCRON_TIMEZONE` nor `TZ` is set, and by
/// any job that does not carry its own.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What to assume when a job's enabled-flag cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnabledFallback {
    /// Arm the job anyway (fail-open).
    #[default]
    Enabled,
    /// Leave the job disarmed (fail-closed).
    Disabled,
}

impl EnabledFallback {
    #[must_use]
    pub fn as_bool(self) -> bool {
        matches!(self, EnabledFallback::Enabled)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub timezone: Tz,
    pub enabled_fallback: EnabledFallback,
    pub fleet_api_url: String,
    pub fleet_api_key: Option<String>,
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("timezone", &self.timezone)
            .field("enabled_fallback", &self.enabled_fallback)
            .field("fleet_api_url", &self.fleet_api_url)
            .field(
                "fleet_api_key",
                &self.fleet_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}
