//! Plain records describing tables, columns, indexes, foreign keys, and
//! ALTER actions. The schema builder is the only writer; the dialects are
//! the only readers.

mod column;
mod constraint;

pub use column::{Column, ColumnReference, ColumnType, ReferentialAction, Value};
pub use constraint::{ForeignKey, Index};

/// One alteration to a table. Actions are lowered to SQL in the order they
/// were appended; that order is the observable emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    AddColumn(Column),
    DropColumn {
        column: String,
    },
    RenameColumn {
        from: String,
        to: String,
    },
    ChangeColumnType(Column),
    /// `column_type` is the raw SQL type MySQL needs to rebuild the column
    /// definition for MODIFY COLUMN. A connected schema fills it from
    /// information_schema before lowering; Postgres never reads it.
    SetNotNull {
        column: String,
        column_type: Option<String>,
    },
    DropNotNull {
        column: String,
        column_type: Option<String>,
    },
    SetDefault {
        column: String,
        value: Value,
    },
    DropDefault {
        column: String,
    },
    CreateIndex(Index),
    DropIndex {
        name: String,
    },
    AddForeignKey(ForeignKey),
    DropForeignKey {
        name: String,
    },
    DropPrimary {
        constraint: Option<String>,
    },
}
