//! Database-specific SQL generation. Each dialect owns its own SQL; there
//! is no cross-database generic DDL.

mod mysql;
mod postgres;

pub use mysql::MySql;
pub use postgres::Postgres;

use crate::action::{Column, TableAction};
use crate::config::ConnectionConfig;
use crate::schema::Table;

/// Lowers action records into dialect-specific SQL and supplies the
/// templates the tracker and connection layer need.
pub trait Dialect {
    /// Stable dialect identifier (e.g., "postgresql", "mysql").
    fn name(&self) -> &'static str;

    /// Database-adapter name consumed by the connection layer.
    fn driver_name(&self) -> &'static str;

    /// Connection string in the dialect's native form.
    fn format_dsn(&self, conn: &ConnectionConfig) -> String;

    /// Quote an identifier. Inputs are expected to be valid identifiers;
    /// embedded quote characters are not escaped.
    fn quote_identifier(&self, name: &str) -> String;

    /// Schema-qualified table name; just the quoted table when the schema
    /// is empty.
    fn qualify_table(&self, schema: &str, table: &str) -> String {
        if schema.is_empty() {
            self.quote_identifier(table)
        } else {
            format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            )
        }
    }

    fn create_table_sql(&self, table: &Table) -> String;

    fn create_table_if_not_exists_sql(&self, table: &Table) -> String;

    fn drop_table_sql(&self, schema: &str, name: &str) -> String {
        format!("DROP TABLE {};", self.qualify_table(schema, name))
    }

    fn drop_table_if_exists_sql(&self, schema: &str, name: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", self.qualify_table(schema, name))
    }

    /// One column definition for use inside CREATE TABLE or ADD COLUMN.
    fn column_definition_sql(&self, col: &Column) -> String;

    /// One statement per action, in input order.
    fn alter_table_sql(&self, schema: &str, table: &str, actions: &[TableAction]) -> Vec<String>;

    /// Statement attaching a comment to a column, or an empty string when
    /// the dialect carries comments inline in the column definition.
    fn comment_column_sql(&self, qualified_table: &str, column: &str, comment: &str) -> String;

    /// COUNT query probing for a table's existence.
    fn has_table_sql(&self, schema: &str, table: &str) -> String;

    /// COUNT query probing for a column's existence.
    fn has_column_sql(&self, schema: &str, table: &str, column: &str) -> String;

    /// Whether DDL participates in transactions. MySQL auto-commits most
    /// DDL statements, so partial failures can leave partial changes.
    fn supports_transactional_ddl(&self) -> bool;

    /// Whether SET/DROP NOT NULL lowering needs the column's current type
    /// (MySQL rebuilds the definition via MODIFY COLUMN).
    fn needs_column_type_for_nullability(&self) -> bool {
        false
    }

    /// Query returning the raw SQL type of a column, for dialects that
    /// answer `needs_column_type_for_nullability`.
    fn column_type_sql(&self, _schema: &str, _table: &str, _column: &str) -> String {
        String::new()
    }

    // Migration-ledger templates. Parameter markers are dialect-specific
    // ($1, $2… vs ?).

    fn create_migrations_table_sql(&self, table_name: &str) -> String;

    fn insert_migration_sql(&self, table_name: &str) -> String;

    fn delete_migration_sql(&self, table_name: &str) -> String;

    /// Applied migration names, ascending by id.
    fn applied_migrations_sql(&self, table_name: &str) -> String;

    /// Highest batch number, COALESCEd to 0.
    fn last_batch_sql(&self, table_name: &str) -> String;

    /// Names in one batch, descending by id (natural rollback order).
    fn migrations_by_batch_sql(&self, table_name: &str) -> String;
}

/// Resolve a dialect from the configured client name. Unrecognized names
/// fall back to PostgreSQL.
pub fn dialect_for(client: &str) -> Box<dyn Dialect> {
    match client {
        "mysql" => Box::new(MySql),
        "postgresql" | "postgres" | "pg" => Box::new(Postgres),
        _ => Box::new(Postgres),
    }
}

/// Escape a string for inclusion in a single-quoted SQL literal.
pub(crate) fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
