use std::{env, time::Duration};

use glow_common::{helpers::parse_boolean_flag, Secret};
use glow_engine::{DEFAULT_CACHE_RETENTION_HOURS, DEFAULT_VERIFICATION_TIMEOUT};
use glow_providers::ProviderConfig;
use log::*;

const DEFAULT_GLOW_HOST: &str = "127.0.0.1";
const DEFAULT_GLOW_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/glow_store.db";
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the connection's
    /// remote address.
    pub use_forwarded: bool,
    /// Time between reconciliation runs
    pub reconcile_interval: Duration,
    /// Time between cache janitor runs
    pub janitor_interval: Duration,
    /// How long an unconfirmed payment stays in the cache before the janitor removes it
    pub cache_retention: chrono::Duration,
    /// Upper bound on a provider status query
    pub provider_timeout: Duration,
    /// The value the `glow_admin_token` header must carry on admin routes. Admin routes are closed when empty.
    pub admin_token: Secret<String>,
    pub providers: ProviderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GLOW_HOST.to_string(),
            port: DEFAULT_GLOW_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            janitor_interval: DEFAULT_JANITOR_INTERVAL,
            cache_retention: chrono::Duration::hours(DEFAULT_CACHE_RETENTION_HOURS),
            provider_timeout: DEFAULT_VERIFICATION_TIMEOUT,
            admin_token: Secret::default(),
            providers: ProviderConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("GLOW_HOST").ok().unwrap_or_else(|| DEFAULT_GLOW_HOST.into());
        let port = env::var("GLOW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for GLOW_PORT. {e} Using the default, {DEFAULT_GLOW_PORT}, \
                         instead."
                    );
                    DEFAULT_GLOW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_GLOW_PORT);
        let database_url = env::var("GLOW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ GLOW_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("GLOW_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("GLOW_USE_FORWARDED").ok(), false);
        let reconcile_interval = duration_from_env("GLOW_RECONCILE_INTERVAL", DEFAULT_RECONCILE_INTERVAL.as_secs())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RECONCILE_INTERVAL);
        let janitor_interval = duration_from_env("GLOW_JANITOR_INTERVAL", DEFAULT_JANITOR_INTERVAL.as_secs())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_JANITOR_INTERVAL);
        let cache_retention = duration_from_env("GLOW_CACHE_RETENTION", DEFAULT_CACHE_RETENTION_HOURS as u64)
            .and_then(|h| i64::try_from(h).ok())
            .map(chrono::Duration::hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_CACHE_RETENTION_HOURS));
        let provider_timeout = duration_from_env("GLOW_PROVIDER_TIMEOUT", DEFAULT_VERIFICATION_TIMEOUT.as_secs())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT);
        let admin_token = Secret::new(env::var("GLOW_ADMIN_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ GLOW_ADMIN_TOKEN is not set. The /admin routes are disabled.");
            String::default()
        }));
        let providers = ProviderConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            reconcile_interval,
            janitor_interval,
            cache_retention,
            provider_timeout,
            admin_token,
            providers,
        }
    }
}

/// Reads a positive integer from the environment. Zero, garbage and absent values yield `None` (after logging).
fn duration_from_env(var: &str, default: u64) -> Option<u64> {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {default}."))
        .and_then(|s| s.trim().parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}")))
        .ok()
        .filter(|v| {
            if *v == 0 {
                warn!("🪛️ {var} must be positive. Using the default value of {default}.");
            }
            *v > 0
        })
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

/// The configured admin token, made available to the admin middleware through app data.
#[derive(Clone, Debug, Default)]
pub struct AdminToken(pub Secret<String>);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.reconcile_interval, Duration::from_secs(300));
        assert_eq!(config.cache_retention.num_hours(), 24);
        assert!(config.admin_token.is_empty());
        let options = ServerOptions::from_config(&config);
        assert!(!options.use_forwarded);
    }

    #[test]
    fn durations_from_env() {
        env::set_var("GLOW_TEST_INTERVAL_OK", "42");
        env::set_var("GLOW_TEST_INTERVAL_ZERO", "0");
        env::set_var("GLOW_TEST_INTERVAL_BAD", "soon");
        assert_eq!(duration_from_env("GLOW_TEST_INTERVAL_OK", 1), Some(42));
        assert_eq!(duration_from_env("GLOW_TEST_INTERVAL_ZERO", 1), None);
        assert_eq!(duration_from_env("GLOW_TEST_INTERVAL_BAD", 1), None);
        assert_eq!(duration_from_env("GLOW_TEST_INTERVAL_UNSET", 1), None);
    }
}
