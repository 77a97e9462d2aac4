use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BisectError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub target: TargetConfig,
    pub bisect: BisectConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ROWBISECT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ROWBISECT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            target: TargetConfig::from_env_profiled(p),
            bisect: BisectConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject settings that would make the run meaningless or the probe query unsafe.
    pub fn validate(&self) -> Result<(), BisectError> {
        self.target.validate()?;
        self.bisect.validate()
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  target:      {}:{}/{} as {}",
            self.target.host, self.target.port, self.target.database, self.target.username
        );
        tracing::info!(
            "  table:       {} (row id column {}, projection {})",
            self.target.table.as_deref().unwrap_or("(none)"),
            self.target.row_id_column,
            self.target.projection
        );
        tracing::info!(
            "  bisect:      concurrency={}, report_interval={}ms, explain_analyze={}",
            self.bisect.resolved_concurrency(),
            self.bisect.report_interval_ms,
            self.target.explain_analyze
        );
    }
}

// ── Target store ──────────────────────────────────────────────

/// Where the table lives and how a range of it is probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Pool size; 0 = concurrency + 1.
    pub max_connections: u32,
    pub table: Option<String>,
    pub projection: String,
    pub row_id_column: String,
    /// Wrap probes in `EXPLAIN ANALYZE` so the engine executes without shipping rows.
    pub explain_analyze: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            username: "root".to_string(),
            password: String::new(),
            database: "test".to_string(),
            max_connections: 0,
            table: None,
            projection: "*".to_string(),
            row_id_column: "_tidb_rowid".to_string(),
            explain_analyze: true,
        }
    }
}

impl TargetConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            host: profiled_env_or(p, "TIDB_HOST", &d.host),
            port: profiled_env_parse(p, "TIDB_PORT", d.port),
            username: profiled_env_or(p, "TIDB_USER", &d.username),
            password: profiled_env_or(p, "TIDB_PASSWORD", &d.password),
            database: profiled_env_or(p, "TIDB_DATABASE", &d.database),
            max_connections: profiled_env_parse(p, "TIDB_MAX_CONNECTIONS", d.max_connections),
            table: profiled_env_opt(p, "BISECT_TABLE"),
            projection: profiled_env_or(p, "BISECT_PROJECTION", &d.projection),
            row_id_column: profiled_env_or(p, "BISECT_ROW_ID_COLUMN", &d.row_id_column),
            explain_analyze: profiled_env_bool(p, "BISECT_EXPLAIN_ANALYZE", d.explain_analyze),
        }
    }

    pub fn connection_string(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Same as [`connection_string`](Self::connection_string) with the password masked.
    pub fn redacted_connection_string(&self) -> String {
        let pass = if self.password.is_empty() { "" } else { "***" };
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, pass, self.host, self.port, self.database
        )
    }

    /// Resolve pool size for a given worker count.
    pub fn resolved_max_connections(&self, concurrency: usize) -> u32 {
        if self.max_connections == 0 {
            u32::try_from(concurrency).unwrap_or(u32::MAX).saturating_add(1)
        } else {
            self.max_connections
        }
    }

    /// The table name, or a fatal error when none was configured.
    pub fn require_table(&self) -> Result<&str, BisectError> {
        self.table
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(BisectError::MissingParameter("table"))
    }

    fn validate(&self) -> Result<(), BisectError> {
        let table = self.require_table()?;
        check_identifier("table", table)?;
        check_identifier("row id column", &self.row_id_column)?;
        if self.projection.trim().is_empty() {
            return Err(BisectError::Config("projection must not be empty".into()));
        }
        if self.projection.contains(';') {
            return Err(BisectError::Config("projection must be a single clause".into()));
        }
        Ok(())
    }
}

/// Identifiers are spliced into probe SQL, so only plain (optionally
/// qualified or backquoted) names are accepted.
fn check_identifier(what: &str, ident: &str) -> Result<(), BisectError> {
    let ok = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '`'));
    if ok {
        Ok(())
    } else {
        Err(BisectError::Config(format!("invalid {}: {:?}", what, ident)))
    }
}

// ── Bisection run ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BisectConfig {
    /// Concurrent probes. 0 = available parallelism.
    pub concurrency: usize,
    /// Progress report interval in milliseconds.
    pub report_interval_ms: u64,
}

impl Default for BisectConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            report_interval_ms: 1000,
        }
    }
}

impl BisectConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            concurrency: profiled_env_parse(p, "BISECT_CONCURRENCY", d.concurrency),
            report_interval_ms: profiled_env_parse(p, "BISECT_REPORT_INTERVAL_MS", d.report_interval_ms),
        }
    }

    /// Resolve worker count (0 means use available parallelism).
    pub fn resolved_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.concurrency
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    fn validate(&self) -> Result<(), BisectError> {
        if self.report_interval_ms == 0 {
            return Err(BisectError::Config("report interval must be positive".into()));
        }
        Ok(())
    }
}
