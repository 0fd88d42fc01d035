use super::{escape_literal, Dialect};
use crate::action::{Column, ColumnType, TableAction, Value};
use crate::config::ConnectionConfig;
use crate::schema::Table;

/// PostgreSQL dialect. This is the canonical fallback when the configured
/// client name is unrecognized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Postgres {
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
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Float => {
                if col.precision > 0 {
                    format!("FLOAT({})", col.precision)
                } else {
                    "REAL".to_string()
                }
            }
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal => {
                let p = if col.precision > 0 { col.precision } else { 10 };
                let s = if col.scale > 0 { col.scale } else { 2 };
                format!("DECIMAL({},{})", p, s)
            }
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::JsonB => "JSONB".to_string(),
            ColumnType::Binary => "BYTEA".to_string(),
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::BigSerial => "BIGSERIAL".to_string(),
            ColumnType::Custom(name) => name.to_uppercase(),
        }
    }

    fn format_default(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("'{}'", escape_literal(s)),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
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
        let using = match &index.method {
            Some(method) => format!(" USING {}", method),
            None => String::new(),
        };
        let cols = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE {}INDEX {} ON {}{} ({});",
            unique,
            self.quote_identifier(&index.name),
            qualified_table,
            using,
            cols
        )
    }

    /// Indexes are schema-scoped in PostgreSQL, so DROP INDEX qualifies the
    /// index name rather than naming the table.
    fn drop_index_sql(&self, schema: &str, name: &str) -> String {
        if schema.is_empty() {
            format!("DROP INDEX {};", self.quote_identifier(name))
        } else {
            format!(
                "DROP INDEX {}.{};",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            )
        }
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
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn driver_name(&self) -> &'static str {
        "postgres"
    }

    fn format_dsn(&self, conn: &ConnectionConfig) -> String {
        let ssl_mode = if conn.ssl_mode.is_empty() {
            "disable"
        } else {
            &conn.ssl_mode
        };
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            conn.host, conn.port, conn.user, conn.password, conn.database, ssl_mode
        )
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name)
    }

    fn create_table_sql(&self, table: &Table) -> String {
        format!(
            "CREATE TABLE {} (\n  {}\n);",
            self.qualify_table(&table.schema, &table.name),
            self.columns_block(table)
        )
    }

    fn create_table_if_not_exists_sql(&self, table: &Table) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);",
            self.qualify_table(&table.schema, &table.name),
            self.columns_block(table)
        )
    }

    fn column_definition_sql(&self, col: &Column) -> String {
        let mut parts = vec![self.quote_identifier(&col.name), self.map_data_type(col)];

        if col.primary {
            parts.push("PRIMARY KEY".to_string());
        }
        if col.not_null && !col.primary {
            parts.push("NOT NULL".to_string());
        }
        if col.unique && !col.primary {
            parts.push("UNIQUE".to_string());
        }
        if let Some(value) = &col.default {
            parts.push(format!("DEFAULT {}", self.format_default(value)));
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
                TableAction::RenameColumn { from, to } => format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {};",
                    qualified,
                    self.quote_identifier(from),
                    self.quote_identifier(to)
                ),
                TableAction::ChangeColumnType(col) => format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
                    qualified,
                    self.quote_identifier(&col.name),
                    self.map_data_type(col)
                ),
                TableAction::SetNotNull { column, .. } => format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;",
                    qualified,
                    self.quote_identifier(column)
                ),
                TableAction::DropNotNull { column, .. } => format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL;",
                    qualified,
                    self.quote_identifier(column)
                ),
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
                TableAction::DropIndex { name } => self.drop_index_sql(schema, name),
                TableAction::AddForeignKey(fk) => self.add_foreign_key_sql(&qualified, fk),
                TableAction::DropForeignKey { name } => format!(
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    qualified,
                    self.quote_identifier(name)
                ),
                TableAction::DropPrimary { constraint } => {
                    let constraint = match constraint {
                        Some(name) => name.clone(),
                        None => format!("{}_pkey", table),
                    };
                    format!(
                        "ALTER TABLE {} DROP CONSTRAINT {};",
                        qualified,
                        self.quote_identifier(&constraint)
                    )
                }
            };
            statements.push(sql);
        }

        statements
    }

    fn comment_column_sql(&self, qualified_table: &str, column: &str, comment: &str) -> String {
        format!(
            "COMMENT ON COLUMN {}.{} IS '{}';",
            qualified_table,
            self.quote_identifier(column),
            escape_literal(comment)
        )
    }

    fn has_table_sql(&self, schema: &str, table: &str) -> String {
        let schema = if schema.is_empty() { "public" } else { schema };
        format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            escape_literal(schema),
            escape_literal(table)
        )
    }

    fn has_column_sql(&self, schema: &str, table: &str, column: &str) -> String {
        let schema = if schema.is_empty() { "public" } else { schema };
        format!(
            "SELECT COUNT(*) FROM information_schema.columns WHERE table_schema = '{}' AND table_name = '{}' AND column_name = '{}'",
            escape_literal(schema),
            escape_literal(table),
            escape_literal(column)
        )
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn create_migrations_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS \"public\".{} (\n  id SERIAL PRIMARY KEY,\n  name VARCHAR(255) NOT NULL UNIQUE,\n  batch INTEGER NOT NULL,\n  applied_at TIMESTAMP DEFAULT NOW()\n);",
            self.quote_identifier(table_name)
        )
    }

    fn insert_migration_sql(&self, table_name: &str) -> String {
        format!(
            "INSERT INTO \"public\".{} (name, batch) VALUES ($1, $2);",
            self.quote_identifier(table_name)
        )
    }

    fn delete_migration_sql(&self, table_name: &str) -> String {
        format!(
            "DELETE FROM \"public\".{} WHERE name = $1;",
            self.quote_identifier(table_name)
        )
    }

    fn applied_migrations_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM \"public\".{} ORDER BY id;",
            self.quote_identifier(table_name)
        )
    }

    fn last_batch_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT COALESCE(MAX(batch), 0) FROM \"public\".{};",
            self.quote_identifier(table_name)
        )
    }

    fn migrations_by_batch_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM \"public\".{} WHERE batch = $1 ORDER BY id DESC;",
            self.quote_identifier(table_name)
        )
    }
}
