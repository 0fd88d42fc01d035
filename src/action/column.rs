/// Symbolic column types, mapped to concrete SQL types per dialect.
/// `Custom` carries an arbitrary type name and is lowered as uppercased
/// passthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    VarChar,
    Char,
    Int,
    BigInt,
    SmallInt,
    Float,
    Double,
    Decimal,
    Boolean,
    Text,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    JsonB,
    Binary,
    Serial,
    BigSerial,
    Custom(String),
}

/// A typed default value. Rendering (quoting, booleans) is dialect-specific.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// Referential action for ON DELETE / ON UPDATE clauses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
        }
    }
}

/// An inline foreign-key reference attached to a column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// A column definition. Length, precision, and scale are zero when unset;
/// the dialects substitute their documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub length: u32,
    pub precision: u32,
    pub scale: u32,
    pub primary: bool,
    pub not_null: bool,
    pub unique: bool,
    pub unsigned: bool,
    pub default: Option<Value>,
    pub reference: Option<ColumnReference>,
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            length: 0,
            precision: 0,
            scale: 0,
            primary: false,
            not_null: false,
            unique: false,
            unsigned: false,
            default: None,
            reference: None,
            comment: None,
        }
    }

    /// Mark as primary key. Primary keys are implicitly NOT NULL.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self.not_null = true;
        self
    }

    pub fn not_nullable(&mut self) -> &mut Self {
        self.not_null = true;
        self
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.not_null = false;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// For numeric types on MySQL; Postgres ignores it.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// Inline REFERENCES clause on the column definition.
    pub fn references(&mut self, table: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.reference = Some(ColumnReference {
            table: table.into(),
            column: column.into(),
            on_delete: None,
            on_update: None,
        });
        self
    }

    /// No-op unless `references` was called first.
    pub fn on_delete(&mut self, action: ReferentialAction) -> &mut Self {
        if let Some(ref mut r) = self.reference {
            r.on_delete = Some(action);
        }
        self
    }

    /// No-op unless `references` was called first.
    pub fn on_update(&mut self, action: ReferentialAction) -> &mut Self {
        if let Some(ref mut r) = self.reference {
            r.on_update = Some(action);
        }
        self
    }

    pub fn length(&mut self, length: u32) -> &mut Self {
        self.length = length;
        self
    }

    pub fn precision(&mut self, precision: u32) -> &mut Self {
        self.precision = precision;
        self
    }

    pub fn scale(&mut self, scale: u32) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_modifier_chain() {
        let mut col = Column::new("email", ColumnType::VarChar);
        col.not_nullable().unique().length(100);

        assert_eq!(col.name, "email");
        assert!(col.not_null);
        assert!(col.unique);
        assert_eq!(col.length, 100);
        assert!(!col.primary);
    }

    #[test]
    fn primary_implies_not_null() {
        let mut col = Column::new("id", ColumnType::Serial);
        col.primary();

        assert!(col.primary);
        assert!(col.not_null);
    }

    #[test]
    fn default_records_typed_value() {
        let mut col = Column::new("status", ColumnType::VarChar);
        col.default("active");
        assert_eq!(col.default, Some(Value::Text("active".to_string())));

        let mut col = Column::new("admin", ColumnType::Boolean);
        col.default(false);
        assert_eq!(col.default, Some(Value::Bool(false)));

        let mut col = Column::new("count", ColumnType::Int);
        col.default(0);
        assert_eq!(col.default, Some(Value::Int(0)));
    }

    #[test]
    fn references_with_actions() {
        let mut col = Column::new("user_id", ColumnType::Int);
        col.references("users", "id")
            .on_delete(ReferentialAction::Cascade)
            .on_update(ReferentialAction::SetNull);

        let r = col.reference.unwrap();
        assert_eq!(r.table, "users");
        assert_eq!(r.column, "id");
        assert_eq!(r.on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(r.on_update, Some(ReferentialAction::SetNull));
    }

    #[test]
    fn on_delete_without_references_is_noop() {
        let mut col = Column::new("x", ColumnType::Int);
        col.on_delete(ReferentialAction::Cascade);
        assert!(col.reference.is_none());
    }

    #[test]
    fn referential_action_as_sql() {
        assert_eq!(ReferentialAction::NoAction.as_sql(), "NO ACTION");
        assert_eq!(ReferentialAction::Restrict.as_sql(), "RESTRICT");
        assert_eq!(ReferentialAction::Cascade.as_sql(), "CASCADE");
        assert_eq!(ReferentialAction::SetNull.as_sql(), "SET NULL");
    }
}
