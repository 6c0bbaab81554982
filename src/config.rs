use crate::services::schema::ValidationMode;
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub validation_mode: ValidationMode,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub db_write_timeout: Duration,
    pub max_body_bytes: usize,
    pub event_log_path: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Bucket event notification ingest service")]
pub struct Args {
    /// Host to bind to (overrides EVENT_INGEST_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EVENT_INGEST_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides EVENT_INGEST_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Record validation mode (overrides EVENT_INGEST_VALIDATION_MODE)
    #[arg(long, value_enum)]
    pub validation_mode: Option<ValidationMode>,

    /// Maximum pooled database connections (overrides EVENT_INGEST_DB_MAX_CONNECTIONS)
    #[arg(long)]
    pub db_max_connections: Option<u32>,

    /// Connection acquire timeout in milliseconds (overrides EVENT_INGEST_DB_ACQUIRE_TIMEOUT_MS)
    #[arg(long)]
    pub db_acquire_timeout_ms: Option<u64>,

    /// Per-record write timeout in milliseconds (overrides EVENT_INGEST_DB_WRITE_TIMEOUT_MS)
    #[arg(long)]
    pub db_write_timeout_ms: Option<u64>,

    /// Maximum accepted request body in bytes (overrides EVENT_INGEST_MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// File that `/minio-webhook` appends raw payloads to (overrides EVENT_INGEST_EVENT_LOG_PATH)
    #[arg(long)]
    pub event_log_path: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |name| env::var(name))?;
        Ok((cfg, migrate))
    }

    /// Merge parsed CLI args over values produced by `lookup` (normally `env::var`).
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup("EVENT_INGEST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env(&lookup, "EVENT_INGEST_PORT", 5000u16)?;
        let env_db = lookup("EVENT_INGEST_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/events.db".into());
        let env_mode = parse_env(
            &lookup,
            "EVENT_INGEST_VALIDATION_MODE",
            ValidationMode::Lenient,
        )?;
        let env_max_conn = parse_env(&lookup, "EVENT_INGEST_DB_MAX_CONNECTIONS", 5u32)?;
        let env_acquire_ms = parse_env(&lookup, "EVENT_INGEST_DB_ACQUIRE_TIMEOUT_MS", 5000u64)?;
        let env_write_ms = parse_env(&lookup, "EVENT_INGEST_DB_WRITE_TIMEOUT_MS", 5000u64)?;
        let env_body = parse_env(&lookup, "EVENT_INGEST_MAX_BODY_BYTES", 2 * 1024 * 1024usize)?;
        let env_log = lookup("EVENT_INGEST_EVENT_LOG_PATH").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            validation_mode: args.validation_mode.unwrap_or(env_mode),
            db_max_connections: args.db_max_connections.unwrap_or(env_max_conn).max(1),
            db_acquire_timeout: Duration::from_millis(
                args.db_acquire_timeout_ms.unwrap_or(env_acquire_ms),
            ),
            db_write_timeout: Duration::from_millis(
                args.db_write_timeout_ms.unwrap_or(env_write_ms),
            ),
            max_body_bytes: args.max_body_bytes.unwrap_or(env_body),
            event_log_path: args.event_log_path.or(env_log).filter(|p| !p.is_empty()),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{}", err))
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, env::VarError> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::resolve(Args::default(), lookup_from(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:5000");
        assert_eq!(cfg.database_url, "sqlite://./data/events.db");
        assert_eq!(cfg.validation_mode, ValidationMode::Lenient);
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.db_write_timeout, Duration::from_secs(5));
        assert!(cfg.event_log_path.is_none());
    }

    #[test]
    fn cli_args_override_environment() {
        let args = Args {
            port: Some(8080),
            validation_mode: Some(ValidationMode::Lenient),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            lookup_from(&[
                ("EVENT_INGEST_PORT", "9000"),
                ("EVENT_INGEST_VALIDATION_MODE", "strict"),
                ("EVENT_INGEST_HOST", "127.0.0.1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.validation_mode, ValidationMode::Lenient);
    }

    #[test]
    fn environment_selects_strict_mode_and_timeouts() {
        let cfg = AppConfig::resolve(
            Args::default(),
            lookup_from(&[
                ("EVENT_INGEST_VALIDATION_MODE", "STRICT"),
                ("EVENT_INGEST_DB_ACQUIRE_TIMEOUT_MS", "250"),
                ("EVENT_INGEST_EVENT_LOG_PATH", "/tmp/events.log"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.validation_mode, ValidationMode::Strict);
        assert_eq!(cfg.db_acquire_timeout, Duration::from_millis(250));
        assert_eq!(cfg.event_log_path.as_deref(), Some("/tmp/events.log"));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = AppConfig::resolve(
            Args::default(),
            lookup_from(&[("EVENT_INGEST_PORT", "not-a-port")]),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("EVENT_INGEST_PORT"));
    }

    #[test]
    fn unknown_validation_mode_is_rejected() {
        assert!(
            AppConfig::resolve(
                Args::default(),
                lookup_from(&[("EVENT_INGEST_VALIDATION_MODE", "loose")]),
            )
            .is_err()
        );
    }
}
