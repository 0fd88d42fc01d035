use super::{escape_literal, Dialect};
use crate::action::{Column, ColumnType, TableAction, Value};
use crate::config::ConnectionConfig;
use crate::schema::Table;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl MySql {
    fn map_data_type(&self, col: &Column) -> String {
        match &col.data_type {
            ColumnType::VarChar => {
                if col.length > 0 {
                    format!("VARCHAR({})", col.length)
                } else {
                    "VARCHAR(255)".to_string()
                }
            }
            ColumnType::Char => {
                if col.length > 0 {
                    format!("CHAR({})", col.length)
                } else {
                    "CHAR(1)".to_string()
                }
            }
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Float => {
                if col.precision > 0 {
                    format!("FLOAT({})", col.precision)
                } else {
                    "FLOAT".to_string()
                }
            }
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Decimal => {
                let p = if col.precision > 0 { col.precision } else { 10 };
                let s = if col.scale > 0 { col.scale } else { 2 };
                format!("DECIMAL({},{})", p, s)
            }
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            // No native UUID type.
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Json => "JSON".to_string(),
            // MySQL has a single JSON type.
            ColumnType::JsonB => "JSON".to_string(),
            ColumnType::Binary => {
                if col.length > 0 {
                    format!("VARBINARY({})", col.length)
                } else {
                    "BLOB".to_string()
                }
            }
            ColumnType::Serial => "INT AUTO_INCREMENT".to_string(),
            ColumnType::BigSerial => "BIGINT AUTO_INCREMENT".to_string(),
            ColumnType::Custom(name) => name.to_uppercase(),
        }
    }

    fn format_default(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("'{}'", escape_literal(s)),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
        }
    }

    fn columns_block(&self, table: &Table) -> String {
        table
            .columns
            .iter()
            .map(|col| self.column_definition_sql(col))
            .collect::<Vec<_>>()
            .join(",\n  ")
    }

    fn create_index_sql(&self, qualified_table: &str, index: &crate::action::Index) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let cols = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE {}INDEX {} ON {} ({});",
            unique,
            self.quote_identifier(&index.name),
            qualified_table,
            cols
        )
    }

    fn add_foreign_key_sql(&self, qualified_table: &str, fk: &crate::action::ForeignKey) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            qualified_table,
            self.quote_identifier(&fk.name),
            self.quote_identifier(&fk.column),
            self.quote_identifier(&fk.ref_table),
            self.quote_identifier(&fk.ref_column)
        );
        if let Some(action) = fk.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = fk.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql.push(';');
        sql
    }

    /// MODIFY COLUMN rebuilds the whole definition, so the current type is
    /// required. When no type was resolved (dry-run without a connection)
    /// the VARCHAR(255) placeholder is emitted; connected schemas fill the
    /// type from information_schema before lowering.
    fn modify_nullability_sql(
        &self,
        qualified_table: &str,
        column: &str,
        column_type: &Option<String>,
        not_null: bool,
    ) -> String {
        let column_type = column_type.as_deref().unwrap_or("VARCHAR(255)");
        format!(
            "ALTER TABLE {} MODIFY COLUMN {} {} {};",
            qualified_table,
            self.quote_identifier(column),
            column_type,
            if not_null { "NOT NULL" } else { "NULL" }
        )
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn driver_name(&self) -> &'static str {
        "mysql"
    }

    fn format_dsn(&self, conn: &ConnectionConfig) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}",
            conn.user, conn.password, conn.host, conn.port, conn.database
        )
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name)
    }

    fn create_table_sql(&self, table: &Table) -> String {
        format!(
            "CREATE TABLE {} (\n  {}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;",
            self.qualify_table(&table.schema, &table.name),
            self.columns_block(table)
        )
    }

    fn create_table_if_not_exists_sql(&self, table: &Table) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;",
            self.qualify_table(&table.schema, &table.name),
            self.columns_block(table)
        )
    }

    /// Modifier order matters: the REFERENCES clause must come last, and
    /// COMMENT sits between the constraints and the reference.
    fn column_definition_sql(&self, col: &Column) -> String {
        let mut parts = vec![self.quote_identifier(&col.name), self.map_data_type(col)];

        if col.unsigned {
            parts.push("UNSIGNED".to_string());
        }
        if col.not_null {
            parts.push("NOT NULL".to_string());
        }
        if let Some(value) = &col.default {
            parts.push(format!("DEFAULT {}", self.format_default(value)));
        }
        if col.primary {
            parts.push("PRIMARY KEY".to_string());
        }
        if col.unique && !col.primary {
            parts.push("UNIQUE".to_string());
        }
        if let Some(comment) = &col.comment {
            parts.push(format!("COMMENT '{}'", escape_literal(comment)));
        }
        if let Some(r) = &col.reference {
            let mut ref_part = format!(
                "REFERENCES {}({})",
                self.quote_identifier(&r.table),
                self.quote_identifier(&r.column)
            );
            if let Some(action) = r.on_delete {
                ref_part.push_str(" ON DELETE ");
                ref_part.push_str(action.as_sql());
            }
            if let Some(action) = r.on_update {
                ref_part.push_str(" ON UPDATE ");
                ref_part.push_str(action.as_sql());
            }
            parts.push(ref_part);
        }

        parts.join(" ")
    }

    fn alter_table_sql(&self, schema: &str, table: &str, actions: &[TableAction]) -> Vec<String> {
        let qualified = self.qualify_table(schema, table);
        let mut statements = Vec::with_capacity(actions.len());

        for action in actions {
            let sql = match action {
                TableAction::AddColumn(col) => format!(
                    "ALTER TABLE {} ADD COLUMN {};",
                    qualified,
                    self.column_definition_sql(col)
                ),
                TableAction::DropColumn { column } => format!(
                    "ALTER TABLE {} DROP COLUMN {};",
                    qualified,
                    self.quote_identifier(column)
                ),
                // RENAME COLUMN requires MySQL 8.0+.
                TableAction::RenameColumn { from, to } => format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {};",
                    qualified,
                    self.quote_identifier(from),
                    self.quote_identifier(to)
                ),
                TableAction::ChangeColumnType(col) => format!(
                    "ALTER TABLE {} MODIFY COLUMN {} {};",
                    qualified,
                    self.quote_identifier(&col.name),
                    self.map_data_type(col)
                ),
                TableAction::SetNotNull {
                    column,
                    column_type,
                } => self.modify_nullability_sql(&qualified, column, column_type, true),
                TableAction::DropNotNull {
                    column,
                    column_type,
                } => self.modify_nullability_sql(&qualified, column, column_type, false),
                TableAction::SetDefault { column, value } => format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    qualified,
                    self.quote_identifier(column),
                    self.format_default(value)
                ),
                TableAction::DropDefault { column } => format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    qualified,
                    self.quote_identifier(column)
                ),
                TableAction::CreateIndex(index) => self.create_index_sql(&qualified, index),
                // MySQL scopes indexes to the table.
                TableAction::DropIndex { name } => format!(
                    "DROP INDEX {} ON {};",
                    self.quote_identifier(name),
                    qualified
                ),
                TableAction::AddForeignKey(fk) => self.add_foreign_key_sql(&qualified, fk),
                TableAction::DropForeignKey { name } => format!(
                    "ALTER TABLE {} DROP FOREIGN KEY {};",
                    qualified,
                    self.quote_identifier(name)
                ),
                // Primary keys are unnamed in MySQL.
                TableAction::DropPrimary { .. } => {
                    format!("ALTER TABLE {} DROP PRIMARY KEY;", qualified)
                }
            };
            statements.push(sql);
        }

        statements
    }

    /// Comments ride the column definition inline; there is no separate
    /// statement.
    fn comment_column_sql(&self, _qualified_table: &str, _column: &str, _comment: &str) -> String {
        String::new()
    }

    fn has_table_sql(&self, schema: &str, table: &str) -> String {
        if schema.is_empty() {
            format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = '{}'",
                escape_literal(table)
            )
        } else {
            format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
                escape_literal(schema),
                escape_literal(table)
            )
        }
    }

    fn has_column_sql(&self, schema: &str, table: &str, column: &str) -> String {
        if schema.is_empty() {
            format!(
                "SELECT COUNT(*) FROM information_schema.columns WHERE table_schema = DATABASE() AND table_name = '{}' AND column_name = '{}'",
                escape_literal(table),
                escape_literal(column)
            )
        } else {
            format!(
                "SELECT COUNT(*) FROM information_schema.columns WHERE table_schema = '{}' AND table_name = '{}' AND column_name = '{}'",
                escape_literal(schema),
                escape_literal(table),
                escape_literal(column)
            )
        }
    }

    /// MySQL issues implicit commits for most DDL statements.
    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn needs_column_type_for_nullability(&self) -> bool {
        true
    }

    fn column_type_sql(&self, schema: &str, table: &str, column: &str) -> String {
        if schema.is_empty() {
            format!(
                "SELECT COLUMN_TYPE FROM information_schema.columns WHERE table_schema = DATABASE() AND table_name = '{}' AND column_name = '{}'",
                escape_literal(table),
                escape_literal(column)
            )
        } else {
            format!(
                "SELECT COLUMN_TYPE FROM information_schema.columns WHERE table_schema = '{}' AND table_name = '{}' AND column_name = '{}'",
                escape_literal(schema),
                escape_literal(table),
                escape_literal(column)
            )
        }
    }

    fn create_migrations_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  id INT AUTO_INCREMENT PRIMARY KEY,\n  name VARCHAR(255) NOT NULL UNIQUE,\n  batch INT NOT NULL,\n  applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);",
            self.quote_identifier(table_name)
        )
    }

    fn insert_migration_sql(&self, table_name: &str) -> String {
        format!(
            "INSERT INTO {} (name, batch) VALUES (?, ?);",
            self.quote_identifier(table_name)
        )
    }

    fn delete_migration_sql(&self, table_name: &str) -> String {
        format!(
            "DELETE FROM {} WHERE name = ?;",
            self.quote_identifier(table_name)
        )
    }

    fn applied_migrations_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM {} ORDER BY id;",
            self.quote_identifier(table_name)
        )
    }

    fn last_batch_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT COALESCE(MAX(batch), 0) FROM {};",
            self.quote_identifier(table_name)
        )
    }

    fn migrations_by_batch_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM {} WHERE batch = ? ORDER BY id DESC;",
            self.quote_identifier(table_name)
        )
    }
}
