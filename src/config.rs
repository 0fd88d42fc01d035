use std::time::Duration;

/// Top-level configuration for a migration run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Dialect selector: `postgresql`/`postgres`/`pg` or `mysql`.
    /// Anything else falls back to PostgreSQL.
    pub client: String,
    pub connection: ConnectionConfig,
    pub pool: PoolConfig,
    pub migrations: MigrationsConfig,
}

/// Identity of the target database.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// PostgreSQL only (`disable`/`require`/`verify-full`); empty means
    /// `disable`.
    pub ssl_mode: String,
}

/// Connection-pool settings. Each is applied only when positive, and only
/// where the driver exposes the knob.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolConfig {
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub conn_max_idle_time: Duration,
}

/// Migration-ledger settings.
#[derive(Debug, Clone)]
pub struct MigrationsConfig {
    /// Ledger table name. The layout of this table is a compatibility
    /// contract with existing installations.
    pub table_name: String,
}

pub const DEFAULT_MIGRATIONS_TABLE: &str = "jone_migrations";

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }
}
