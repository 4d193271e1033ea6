use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Process configuration: where to listen, how loudly to log, and which policy tables to use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let vars = EnvVars;

        Ok(Self {
            environment: AppEnvironment::parse(&vars.text("APP_ENV", "development")),
            server: ServerConfig {
                host: vars.text("APP_HOST", "127.0.0.1"),
                port: vars.number("APP_PORT")?.unwrap_or(3000),
            },
            telemetry: TelemetryConfig {
                log_level: vars.text("APP_LOG_LEVEL", "info"),
            },
            policy: PolicyConfig {
                point_grid_path: vars.path("CRS_POINT_GRID_PATH")?,
                requirements_path: vars.path("CRS_REQUIREMENTS_PATH")?,
                medium_from: vars.number("CRS_MEDIUM_FROM")?,
                strong_from: vars.number("CRS_STRONG_FROM")?,
            },
        })
    }
}

struct EnvVars;

impl EnvVars {
    fn raw(&self, key: &'static str) -> Option<String> {
        env::var(key).ok().map(|value| value.trim().to_string())
    }

    fn text(&self, key: &'static str, default: &str) -> String {
        self.raw(key)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn number(&self, key: &'static str) -> Result<Option<u16>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<u16>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber { key, value }),
        }
    }

    fn path(&self, key: &'static str) -> Result<Option<PathBuf>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) if value.is_empty() => Err(ConfigError::EmptyPath { key }),
            Some(value) => Ok(Some(PathBuf::from(value))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Optional replacements for the built-in policy tables and band thresholds, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub point_grid_path: Option<PathBuf>,
    pub requirements_path: Option<PathBuf>,
    pub medium_from: Option<u16>,
    pub strong_from: Option<u16>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidHost { source: std::net::AddrParseError },
    EmptyPath { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a whole number up to 65535, got '{value}'")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyPath { key } => write!(f, "{key} is set but empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidNumber { .. } | ConfigError::EmptyPath { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 8] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "CRS_POINT_GRID_PATH",
        "CRS_REQUIREMENTS_PATH",
        "CRS_MEDIUM_FROM",
        "CRS_STRONG_FROM",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn with_env(vars: &[(&str, &str)], check: impl FnOnce(Result<AppConfig, ConfigError>)) {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        KEYS.iter().for_each(|key| env::remove_var(key));
        for (key, value) in vars {
            env::set_var(key, value);
        }
        check(AppConfig::load());
        KEYS.iter().for_each(|key| env::remove_var(key));
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        with_env(&[], |config| {
            let config = config.expect("defaults load");
            assert_eq!(config.environment, AppEnvironment::Development);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.telemetry.log_level, "info");
            assert!(config.policy.point_grid_path.is_none());
            assert!(config.policy.medium_from.is_none());
        });
    }

    #[test]
    fn localhost_binds_loopback() {
        with_env(&[("APP_HOST", "localhost"), ("APP_ENV", "CI")], |config| {
            let config = config.expect("config loads");
            assert_eq!(config.environment, AppEnvironment::Test);
            let addr = config.server.socket_addr().expect("localhost resolves");
            assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        });
    }

    #[test]
    fn policy_overrides_are_trimmed_and_parsed() {
        with_env(
            &[
                ("CRS_POINT_GRID_PATH", " /etc/crs/grid.json "),
                ("CRS_MEDIUM_FROM", "420"),
                ("CRS_STRONG_FROM", " 500 "),
            ],
            |config| {
                let policy = config.expect("config loads").policy;
                assert_eq!(
                    policy.point_grid_path,
                    Some(PathBuf::from("/etc/crs/grid.json"))
                );
                assert_eq!(policy.medium_from, Some(420));
                assert_eq!(policy.strong_from, Some(500));
            },
        );
    }

    #[test]
    fn blank_policy_path_is_rejected() {
        with_env(&[("CRS_REQUIREMENTS_PATH", "   ")], |config| {
            assert!(matches!(
                config,
                Err(ConfigError::EmptyPath {
                    key: "CRS_REQUIREMENTS_PATH"
                })
            ));
        });
    }

    #[test]
    fn non_numeric_values_name_the_variable() {
        with_env(&[("CRS_STRONG_FROM", "high")], |config| {
            let err = config.expect_err("threshold must be numeric");
            assert_eq!(
                err.to_string(),
                "CRS_STRONG_FROM must be a whole number up to 65535, got 'high'"
            );
        });
        with_env(&[("APP_PORT", "70000")], |config| {
            assert!(matches!(
                config,
                Err(ConfigError::InvalidNumber { key: "APP_PORT", .. })
            ));
        });
    }
}
