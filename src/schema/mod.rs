//! The fluent surface migrations are written against. A schema renders
//! statements through its dialect and executes them against its current
//! executor; without one (dry-run, or a schema that was never opened)
//! every statement is printed and recorded in the SQL log sink.

mod index;
mod table;

pub use index::{ForeignKeyBuilder, IndexBuilder};
pub use table::Table;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::action::TableAction;
use crate::config::Config;
use crate::connection::{Connection, Param, Transaction};
use crate::dialect::{dialect_for, Dialect};
use crate::error::Error;

pub struct Schema {
    dialect: Rc<dyn Dialect>,
    config: Rc<Config>,
    connection: Option<Connection>,
    schema: String,
    sql_log: Rc<RefCell<Vec<String>>>,
}

impl Schema {
    /// Build a schema for the configured client. The dialect falls back to
    /// PostgreSQL for unrecognized client names. No connection is opened.
    pub fn new(config: Config) -> Self {
        let dialect: Rc<dyn Dialect> = Rc::from(dialect_for(&config.client));
        Self {
            dialect,
            config: Rc::new(config),
            connection: None,
            schema: String::new(),
            sql_log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Open the database connection: format the DSN, connect with the
    /// dialect's driver, ping, and apply the pool settings the driver
    /// exposes.
    pub fn open(&mut self) -> Result<(), Error> {
        let connection = Connection::open(self.dialect.as_ref(), &self.config)?;
        self.connection = Some(connection);
        Ok(())
    }

    /// Drop this schema's reference to the connection. Siblings derived
    /// with `with_schema`/`with_tx` keep theirs.
    pub fn close(&mut self) {
        self.connection = None;
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn dialect_rc(&self) -> Rc<dyn Dialect> {
        Rc::clone(&self.dialect)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current schema/namespace; empty means the dialect default.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Sibling schema whose table operations target the given namespace.
    /// The original is unchanged.
    pub fn with_schema(&self, name: impl Into<String>) -> Schema {
        Schema {
            dialect: Rc::clone(&self.dialect),
            config: Rc::clone(&self.config),
            connection: self.connection.clone(),
            schema: name.into(),
            sql_log: Rc::clone(&self.sql_log),
        }
    }

    /// Sibling schema whose executor is the given transaction. The
    /// original keeps its connection executor.
    pub fn with_tx(&self, tx: &Transaction) -> Schema {
        Schema {
            dialect: Rc::clone(&self.dialect),
            config: Rc::clone(&self.config),
            connection: Some(tx.connection().clone()),
            schema: self.schema.clone(),
            sql_log: Rc::clone(&self.sql_log),
        }
    }

    /// Sibling schema with no executor; emitted SQL goes to the log sink.
    pub fn detached(&self) -> Schema {
        Schema {
            dialect: Rc::clone(&self.dialect),
            config: Rc::clone(&self.config),
            connection: None,
            schema: self.schema.clone(),
            sql_log: Rc::clone(&self.sql_log),
        }
    }

    pub fn begin_tx(&self) -> Result<Transaction, Error> {
        match &self.connection {
            Some(conn) => conn.begin(),
            None => Err(Error::NoConnection),
        }
    }

    /// Statements recorded by executor-less siblings (dry-run output).
    pub fn sql_log(&self) -> Vec<String> {
        self.sql_log.borrow().clone()
    }

    fn run(&self, sql: &str) -> Result<(), Error> {
        match &self.connection {
            Some(conn) => conn.execute(sql),
            None => {
                println!("{}", sql);
                self.sql_log.borrow_mut().push(sql.to_string());
                Ok(())
            }
        }
    }

    /// Create a table populated by the builder. Column comments become
    /// follow-up statements where the dialect needs them (PostgreSQL);
    /// MySQL carries them inline in the column definition.
    pub fn create_table(
        &self,
        name: &str,
        build: impl FnOnce(&mut Table),
    ) -> Result<(), Error> {
        let mut table = Table::new(name);
        table.schema = self.schema.clone();
        build(&mut table);

        let sql = self.dialect.create_table_sql(&table);
        self.run(&sql)?;

        if self.connection.is_some() {
            let qualified = self.dialect.qualify_table(&self.schema, &table.name);
            for col in &table.columns {
                if let Some(comment) = &col.comment {
                    let comment_sql =
                        self.dialect.comment_column_sql(&qualified, &col.name, comment);
                    if !comment_sql.is_empty() {
                        self.run(&comment_sql)?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn create_table_if_not_exists(
        &self,
        name: &str,
        build: impl FnOnce(&mut Table),
    ) -> Result<(), Error> {
        let mut table = Table::new(name);
        table.schema = self.schema.clone();
        build(&mut table);

        let sql = self.dialect.create_table_if_not_exists_sql(&table);
        self.run(&sql)
    }

    pub fn drop_table(&self, name: &str) -> Result<(), Error> {
        self.run(&self.dialect.drop_table_sql(&self.schema, name))
    }

    pub fn drop_table_if_exists(&self, name: &str) -> Result<(), Error> {
        self.run(&self.dialect.drop_table_if_exists_sql(&self.schema, name))
    }

    pub fn rename_table(&self, old_name: &str, new_name: &str) -> Result<(), Error> {
        let sql = format!(
            "ALTER TABLE {} RENAME TO {};",
            self.dialect.qualify_table(&self.schema, old_name),
            self.dialect.quote_identifier(new_name)
        );
        self.run(&sql)
    }

    /// ALTER path: the builder populates actions; statements are emitted
    /// in action-append order.
    pub fn table(&self, name: &str, build: impl FnOnce(&mut Table)) -> Result<(), Error> {
        let mut table = Table::alter(name);
        table.schema = self.schema.clone();
        build(&mut table);

        self.resolve_column_types(&mut table);

        let statements = self
            .dialect
            .alter_table_sql(&self.schema, &table.name, &table.actions);
        for sql in statements {
            self.run(&sql)?;
        }
        Ok(())
    }

    /// MySQL rebuilds column definitions for nullability changes, so a
    /// connected schema resolves the current type from information_schema
    /// before lowering. Failures leave the slot unset and the dialect's
    /// fallback applies.
    fn resolve_column_types(&self, table: &mut Table) {
        if !self.dialect.needs_column_type_for_nullability() {
            return;
        }
        let Some(conn) = &self.connection else {
            return;
        };

        let table_name = table.name.clone();
        for action in table.actions.iter_mut() {
            if let TableAction::SetNotNull {
                column,
                column_type,
            }
            | TableAction::DropNotNull {
                column,
                column_type,
            } = action
            {
                if column_type.is_some() {
                    continue;
                }
                let sql = self
                    .dialect
                    .column_type_sql(&self.schema, &table_name, column);
                match conn.query_names(&sql, &[]) {
                    Ok(types) => *column_type = types.into_iter().next(),
                    Err(err) => {
                        debug!(column = column.as_str(), %err, "column type probe failed");
                    }
                }
            }
        }
    }

    /// False when no connection is open.
    pub fn has_table(&self, name: &str) -> bool {
        let Some(conn) = &self.connection else {
            return false;
        };
        let sql = self.dialect.has_table_sql(&self.schema, name);
        conn.query_int(&sql, &[]).map(|n| n > 0).unwrap_or(false)
    }

    /// False when no connection is open.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        let Some(conn) = &self.connection else {
            return false;
        };
        let sql = self.dialect.has_column_sql(&self.schema, table, column);
        conn.query_int(&sql, &[]).map(|n| n > 0).unwrap_or(false)
    }

    /// Execute SQL verbatim. For data migrations and dialect-specific
    /// features the builder does not cover.
    pub fn raw(&self, sql: &str, params: &[Param]) -> Result<(), Error> {
        match &self.connection {
            Some(conn) => conn.execute_params(sql, params),
            None => {
                println!("{}", sql);
                self.sql_log.borrow_mut().push(sql.to_string());
                Ok(())
            }
        }
    }
}
