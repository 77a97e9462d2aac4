use clap::Parser;
use rowbisect_core::Config;

/// Locate corrupted rows in a TiDB/MySQL table.
///
/// Probes row id ranges of the table and bisects every failing range down
/// to the single rows that make the query engine fail. Unset flags fall back
/// to environment variables (and `.env`), then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "rowbisect", version, about = "Locate corrupted rows by bisecting row id ranges")]
pub struct CliArgs {
    /// Config profile; env keys are read as {PROFILE}_{KEY} first
    #[arg(long)]
    pub profile: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Username
    #[arg(long)]
    pub user: Option<String>,

    /// Password
    #[arg(long)]
    pub pass: Option<String>,

    /// Database name
    #[arg(long = "db")]
    pub database: Option<String>,

    /// Table to scan (required)
    #[arg(long)]
    pub table: Option<String>,

    /// Number of concurrent range probes (0 = number of CPUs)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Projection clause used in probes
    #[arg(long)]
    pub projection: Option<String>,

    /// Column holding the row id
    #[arg(long)]
    pub row_id_column: Option<String>,

    /// Milliseconds between progress lines
    #[arg(long)]
    pub report_interval_ms: Option<u64>,

    /// Connection pool size (default: concurrency + 1)
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Run probes as plain SELECTs instead of EXPLAIN ANALYZE
    #[arg(long)]
    pub no_explain: bool,
}

impl CliArgs {
    /// Env-derived config with command-line flags applied on top.
    pub fn resolve_config(&self) -> Config {
        let mut config = match &self.profile {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        };
        self.apply(&mut config);
        config
    }

    /// Overwrite every field that was given on the command line.
    pub fn apply(&self, config: &mut Config) {
        let target = &mut config.target;
        if let Some(host) = &self.host {
            target.host = host.clone();
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if let Some(user) = &self.user {
            target.username = user.clone();
        }
        if let Some(pass) = &self.pass {
            target.password = pass.clone();
        }
        if let Some(database) = &self.database {
            target.database = database.clone();
        }
        if let Some(table) = &self.table {
            target.table = Some(table.clone());
        }
        if let Some(projection) = &self.projection {
            target.projection = projection.clone();
        }
        if let Some(column) = &self.row_id_column {
            target.row_id_column = column.clone();
        }
        if let Some(max) = self.max_connections {
            target.max_connections = max;
        }
        if self.no_explain {
            target.explain_analyze = false;
        }

        if let Some(concurrency) = self.concurrency {
            config.bisect.concurrency = concurrency;
        }
        if let Some(interval) = self.report_interval_ms {
            config.bisect.report_interval_ms = interval;
        }
    }
}
