pub mod action;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod migration;
pub mod runner;
pub mod schema;
pub mod tracker;

#[cfg(not(any(feature = "postgres", feature = "mysql")))]
compile_error!("at least one database driver feature must be enabled: `postgres` or `mysql`");

pub mod prelude {
    pub use crate::action::{
        Column, ColumnReference, ColumnType, ForeignKey, Index, ReferentialAction, TableAction,
        Value,
    };
    pub use crate::config::{Config, ConnectionConfig, MigrationsConfig, PoolConfig};
    pub use crate::connection::{Connection, Param, Transaction};
    pub use crate::dialect::{dialect_for, Dialect, MySql, Postgres};
    pub use crate::error::Error;
    pub use crate::migration::Registration;
    pub use crate::runner::{MigrationStatus, RunOptions, Runner};
    pub use crate::schema::{Schema, Table};
    pub use crate::tracker::Tracker;
}
