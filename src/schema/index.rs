use crate::action::{ForeignKey, Index, TableAction};
use crate::schema::Table;

/// Fluent customization of an index that was appended when `index`/`unique`
/// was called. `name` and `using` rewrite the record held by the most
/// recently appended action, so chained customization takes effect even
/// though the action already exists.
pub struct IndexBuilder<'a> {
    table: &'a mut Table,
    columns: Vec<String>,
    unique: bool,
    name: Option<String>,
    method: Option<String>,
}

impl<'a> IndexBuilder<'a> {
    pub(crate) fn new(table: &'a mut Table, columns: Vec<String>, unique: bool) -> Self {
        let mut builder = Self {
            table,
            columns,
            unique,
            name: None,
            method: None,
        };
        let index = builder.build();
        builder.table.actions.push(TableAction::CreateIndex(index));
        builder
    }

    /// Set a custom name, replacing the auto-generated one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.update_action();
        self
    }

    /// Set the index method (btree, hash, gin, gist). PostgreSQL only.
    pub fn using(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.update_action();
        self
    }

    fn build(&self) -> Index {
        let mut index = Index::new(
            self.table.name.clone(),
            self.columns.clone(),
            self.unique,
            self.name.clone(),
        );
        index.method = self.method.clone();
        index
    }

    fn update_action(&mut self) {
        let index = self.build();
        if let Some(TableAction::CreateIndex(existing)) = self.table.actions.last_mut() {
            *existing = index;
        }
    }
}

/// Fluent customization of a foreign key appended by `foreign(column)`.
pub struct ForeignKeyBuilder<'a> {
    table: &'a mut Table,
    fk: ForeignKey,
}

impl<'a> ForeignKeyBuilder<'a> {
    pub(crate) fn new(table: &'a mut Table, column: String) -> Self {
        let fk = ForeignKey::new(&table.name, column);
        table.actions.push(TableAction::AddForeignKey(fk.clone()));
        Self { table, fk }
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.fk.ref_table = table.into();
        self.fk.ref_column = column.into();
        self.update_action();
        self
    }

    pub fn on_delete(mut self, action: crate::action::ReferentialAction) -> Self {
        self.fk.on_delete = Some(action);
        self.update_action();
        self
    }

    pub fn on_update(mut self, action: crate::action::ReferentialAction) -> Self {
        self.fk.on_update = Some(action);
        self.update_action();
        self
    }

    /// Set a custom constraint name, replacing the auto-generated one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fk.name = name.into();
        self.update_action();
        self
    }

    fn update_action(&mut self) {
        if let Some(TableAction::AddForeignKey(existing)) = self.table.actions.last_mut() {
            *existing = self.fk.clone();
        }
    }
}
