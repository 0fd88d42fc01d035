use crate::action::{Column, ColumnType, ForeignKey, Index, TableAction, Value};
use crate::schema::{ForeignKeyBuilder, IndexBuilder};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TableMode {
    Create,
    Alter,
}

/// A table under construction. In create mode the column DSL populates
/// `columns`; in alter mode it appends `AddColumn` actions, so an ALTER
/// can mix adds with any other action. Action order is emission order.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    /// Database schema/namespace; empty means the dialect default.
    pub schema: String,
    pub columns: Vec<Column>,
    pub actions: Vec<TableAction>,
    mode: TableMode,
}

impl Table {
    /// A table for the CREATE TABLE path.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: String::new(),
            columns: Vec::new(),
            actions: Vec::new(),
            mode: TableMode::Create,
        }
    }

    /// A table for the ALTER path.
    pub fn alter(name: impl Into<String>) -> Self {
        Self {
            mode: TableMode::Alter,
            ..Self::new(name)
        }
    }

    fn add_column(&mut self, name: impl Into<String>, data_type: ColumnType) -> &mut Column {
        let col = Column::new(name, data_type);
        match self.mode {
            TableMode::Create => {
                self.columns.push(col);
                let idx = self.columns.len() - 1;
                &mut self.columns[idx]
            }
            TableMode::Alter => {
                self.actions.push(TableAction::AddColumn(col));
                match self.actions.last_mut() {
                    Some(TableAction::AddColumn(c)) => c,
                    _ => unreachable!("AddColumn was just appended"),
                }
            }
        }
    }

    // Column DSL. Each accessor returns the column for modifier chaining.

    /// A VARCHAR column.
    pub fn string(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::VarChar)
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Text)
    }

    pub fn char(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Char)
    }

    pub fn int(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Int)
    }

    pub fn big_int(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::BigInt)
    }

    pub fn small_int(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::SmallInt)
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Boolean)
    }

    pub fn float(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Float)
    }

    pub fn double(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Double)
    }

    pub fn decimal(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Decimal)
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Date)
    }

    pub fn time(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Time)
    }

    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Timestamp)
    }

    /// `created_at` and `updated_at`, both NOT NULL.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").not_nullable();
        self.timestamp("updated_at").not_nullable();
    }

    pub fn uuid(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Uuid)
    }

    pub fn json(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Json)
    }

    /// JSONB on PostgreSQL; falls back to JSON on MySQL.
    pub fn jsonb(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::JsonB)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Binary)
    }

    /// Auto-incrementing primary key (serial + primary + not-null).
    pub fn increments(&mut self, name: impl Into<String>) -> &mut Column {
        let col = self.add_column(name, ColumnType::Serial);
        col.primary();
        col
    }

    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut Column {
        let col = self.add_column(name, ColumnType::BigSerial);
        col.primary();
        col
    }

    /// A column with an arbitrary type name, lowered as uppercased
    /// passthrough.
    pub fn custom(&mut self, name: impl Into<String>, type_name: impl Into<String>) -> &mut Column {
        self.add_column(name, ColumnType::Custom(type_name.into()))
    }

    // Action DSL (ALTER path).

    pub fn drop_column(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::DropColumn {
            column: name.into(),
        });
    }

    pub fn drop_columns<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.drop_column(name);
        }
    }

    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.actions.push(TableAction::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Change a column's type. Returns the column so length, precision, and
    /// scale can be chained.
    pub fn change_column(
        &mut self,
        name: impl Into<String>,
        data_type: ColumnType,
    ) -> &mut Column {
        self.actions
            .push(TableAction::ChangeColumnType(Column::new(name, data_type)));
        match self.actions.last_mut() {
            Some(TableAction::ChangeColumnType(c)) => c,
            _ => unreachable!("ChangeColumnType was just appended"),
        }
    }

    /// Remove the NOT NULL constraint from a column.
    pub fn set_nullable(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::DropNotNull {
            column: name.into(),
            column_type: None,
        });
    }

    /// Add a NOT NULL constraint to a column.
    pub fn drop_nullable(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::SetNotNull {
            column: name.into(),
            column_type: None,
        });
    }

    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.actions.push(TableAction::SetDefault {
            column: name.into(),
            value: value.into(),
        });
    }

    pub fn drop_default(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::DropDefault {
            column: name.into(),
        });
    }

    pub fn index<I, S>(&mut self, columns: I) -> IndexBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        IndexBuilder::new(self, columns, false)
    }

    pub fn unique<I, S>(&mut self, columns: I) -> IndexBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        IndexBuilder::new(self, columns, true)
    }

    /// Drop the index that `index(columns)` would have auto-named.
    pub fn drop_index<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.drop_index_by_name(Index::auto_name(&self.name, &columns, false));
    }

    pub fn drop_index_by_name(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::DropIndex { name: name.into() });
    }

    /// Drop the unique index that `unique(columns)` would have auto-named.
    pub fn drop_unique<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.drop_index_by_name(Index::auto_name(&self.name, &columns, true));
    }

    pub fn drop_unique_by_name(&mut self, name: impl Into<String>) {
        self.drop_index_by_name(name);
    }

    pub fn foreign(&mut self, column: impl Into<String>) -> ForeignKeyBuilder<'_> {
        ForeignKeyBuilder::new(self, column.into())
    }

    /// Drop the foreign key that `foreign(column)` would have auto-named.
    pub fn drop_foreign(&mut self, column: impl Into<String>) {
        let name = ForeignKey::auto_name(&self.name, &column.into());
        self.drop_foreign_by_name(name);
    }

    pub fn drop_foreign_by_name(&mut self, name: impl Into<String>) {
        self.actions
            .push(TableAction::DropForeignKey { name: name.into() });
    }

    pub fn drop_primary(&mut self) {
        self.actions.push(TableAction::DropPrimary { constraint: None });
    }

    pub fn drop_primary_by_name(&mut self, name: impl Into<String>) {
        self.actions.push(TableAction::DropPrimary {
            constraint: Some(name.into()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_mode_populates_columns() {
        let mut t = Table::new("users");
        t.increments("id");
        t.string("email").not_nullable().unique();
        t.timestamps();

        assert_eq!(t.columns.len(), 4);
        assert!(t.actions.is_empty());
        assert_eq!(t.columns[0].name, "id");
        assert!(t.columns[0].primary);
        assert_eq!(t.columns[1].name, "email");
        assert!(t.columns[1].not_null);
        assert_eq!(t.columns[2].name, "created_at");
        assert_eq!(t.columns[3].name, "updated_at");
        assert!(t.columns[3].not_null);
    }

    #[test]
    fn alter_mode_appends_add_column_actions() {
        let mut t = Table::alter("users");
        t.string("nickname").length(40);
        t.drop_column("legacy");

        assert!(t.columns.is_empty());
        assert_eq!(t.actions.len(), 2);
        match &t.actions[0] {
            TableAction::AddColumn(col) => {
                assert_eq!(col.name, "nickname");
                assert_eq!(col.length, 40);
            }
            other => panic!("expected AddColumn, got {:?}", other),
        }
        assert_eq!(
            t.actions[1],
            TableAction::DropColumn {
                column: "legacy".to_string()
            }
        );
    }

    #[test]
    fn action_order_is_append_order() {
        let mut t = Table::alter("users");
        t.rename_column("name", "full_name");
        t.string("bio");
        t.set_default("status", "active");
        t.drop_default("status");

        let kinds: Vec<&str> = t
            .actions
            .iter()
            .map(|a| match a {
                TableAction::RenameColumn { .. } => "rename",
                TableAction::AddColumn(_) => "add",
                TableAction::SetDefault { .. } => "set_default",
                TableAction::DropDefault { .. } => "drop_default",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["rename", "add", "set_default", "drop_default"]);
    }

    #[test]
    fn drop_columns_appends_one_action_each() {
        let mut t = Table::alter("users");
        t.drop_columns(["a", "b", "c"]);
        assert_eq!(t.actions.len(), 3);
    }

    #[test]
    fn nullability_dsl_maps_to_actions() {
        let mut t = Table::alter("users");
        t.set_nullable("bio");
        t.drop_nullable("email");

        assert_eq!(
            t.actions[0],
            TableAction::DropNotNull {
                column: "bio".to_string(),
                column_type: None,
            }
        );
        assert_eq!(
            t.actions[1],
            TableAction::SetNotNull {
                column: "email".to_string(),
                column_type: None,
            }
        );
    }

    #[test]
    fn change_column_chains_size() {
        let mut t = Table::alter("users");
        t.change_column("age", ColumnType::Decimal).precision(6).scale(2);

        match &t.actions[0] {
            TableAction::ChangeColumnType(col) => {
                assert_eq!(col.name, "age");
                assert_eq!(col.precision, 6);
                assert_eq!(col.scale, 2);
            }
            other => panic!("expected ChangeColumnType, got {:?}", other),
        }
    }

    #[test]
    fn drop_index_auto_names() {
        let mut t = Table::alter("users");
        t.drop_index(["email"]);
        t.drop_unique(["email", "tenant"]);

        assert_eq!(
            t.actions[0],
            TableAction::DropIndex {
                name: "idx_users_email".to_string()
            }
        );
        assert_eq!(
            t.actions[1],
            TableAction::DropIndex {
                name: "uq_users_email_tenant".to_string()
            }
        );
    }

    #[test]
    fn drop_foreign_auto_names() {
        let mut t = Table::alter("posts");
        t.drop_foreign("user_id");
        assert_eq!(
            t.actions[0],
            TableAction::DropForeignKey {
                name: "fk_posts_user_id".to_string()
            }
        );
    }

    #[test]
    fn drop_primary_variants() {
        let mut t = Table::alter("users");
        t.drop_primary();
        t.drop_primary_by_name("pk_users");

        assert_eq!(t.actions[0], TableAction::DropPrimary { constraint: None });
        assert_eq!(
            t.actions[1],
            TableAction::DropPrimary {
                constraint: Some("pk_users".to_string())
            }
        );
    }
}
