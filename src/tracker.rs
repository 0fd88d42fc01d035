use std::rc::Rc;

use crate::config::DEFAULT_MIGRATIONS_TABLE;
use crate::connection::{Connection, Param, Transaction};
use crate::dialect::Dialect;
use crate::error::Error;

/// Reads and writes the persisted ledger of applied migrations
/// (`id`, `name`, `batch`, `applied_at`).
pub struct Tracker {
    conn: Connection,
    dialect: Rc<dyn Dialect>,
    table_name: String,
}

impl Tracker {
    pub fn new(conn: Connection, dialect: Rc<dyn Dialect>, table_name: &str) -> Self {
        let table_name = if table_name.is_empty() {
            DEFAULT_MIGRATIONS_TABLE.to_string()
        } else {
            table_name.to_string()
        };
        Self {
            conn,
            dialect,
            table_name,
        }
    }

    /// Idempotently create the ledger table.
    pub fn ensure_table(&self) -> Result<(), Error> {
        let sql = self.dialect.create_migrations_table_sql(&self.table_name);
        self.conn
            .execute(&sql)
            .map_err(|e| Error::Ledger(e.to_string()))
    }

    /// Applied migration names in ascending id order. The runner relies on
    /// this order to enumerate applied migrations.
    pub fn get_applied(&self) -> Result<Vec<String>, Error> {
        let sql = self.dialect.applied_migrations_sql(&self.table_name);
        self.conn
            .query_names(&sql, &[])
            .map_err(|e| Error::Ledger(e.to_string()))
    }

    /// Highest batch number; 0 means no migrations have been applied.
    pub fn get_last_batch(&self) -> Result<i32, Error> {
        let sql = self.dialect.last_batch_sql(&self.table_name);
        self.conn
            .query_int(&sql, &[])
            .map(|n| n as i32)
            .map_err(|e| Error::Ledger(e.to_string()))
    }

    /// Names in one batch, descending id order (natural rollback order).
    pub fn get_batch_migrations(&self, batch: i32) -> Result<Vec<String>, Error> {
        let sql = self.dialect.migrations_by_batch_sql(&self.table_name);
        self.conn
            .query_names(&sql, &[Param::Int(batch)])
            .map_err(|e| Error::Ledger(e.to_string()))
    }

    /// Record a migration outside any transaction. `name` is UNIQUE; a
    /// second insert with the same name errors and signals "already
    /// applied".
    pub fn record_migration(&self, name: &str, batch: i32) -> Result<(), Error> {
        let sql = self.dialect.insert_migration_sql(&self.table_name);
        self.conn
            .execute_params(&sql, &[Param::Text(name), Param::Int(batch)])
    }

    /// Record a migration inside the given transaction, so ledger row and
    /// schema change commit or roll back atomically.
    pub fn record_migration_tx(
        &self,
        tx: &Transaction,
        name: &str,
        batch: i32,
    ) -> Result<(), Error> {
        let sql = self.dialect.insert_migration_sql(&self.table_name);
        tx.connection()
            .execute_params(&sql, &[Param::Text(name), Param::Int(batch)])
    }

    pub fn remove_migration(&self, name: &str) -> Result<(), Error> {
        let sql = self.dialect.delete_migration_sql(&self.table_name);
        self.conn.execute_params(&sql, &[Param::Text(name)])
    }

    pub fn remove_migration_tx(&self, tx: &Transaction, name: &str) -> Result<(), Error> {
        let sql = self.dialect.delete_migration_sql(&self.table_name);
        tx.connection().execute_params(&sql, &[Param::Text(name)])
    }
}
