/// An index definition. `table` is carried only so an omitted name can be
/// auto-generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// Index method (btree, hash, gin, gist). PostgreSQL only; MySQL
    /// ignores it.
    pub method: Option<String>,
    pub table: String,
}

impl Index {
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        unique: bool,
        name: Option<String>,
    ) -> Self {
        let table = table.into();
        let name = match name {
            Some(n) => n,
            None => Self::auto_name(&table, &columns, unique),
        };
        Self {
            name,
            columns,
            unique,
            method: None,
            table,
        }
    }

    /// `idx_<table>_<col1>_<col2>…`, or `uq_…` for unique indexes.
    pub fn auto_name(table: &str, columns: &[String], unique: bool) -> String {
        let prefix = if unique { "uq" } else { "idx" };
        format!("{}_{}_{}", prefix, table, columns.join("_"))
    }
}

/// A foreign-key constraint added or dropped through an ALTER.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
    pub on_delete: Option<super::ReferentialAction>,
    pub on_update: Option<super::ReferentialAction>,
}

impl ForeignKey {
    pub fn new(table: &str, column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            name: Self::auto_name(table, &column),
            column,
            ref_table: String::new(),
            ref_column: String::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// `fk_<table>_<column>`.
    pub fn auto_name(table: &str, column: &str) -> String {
        format!("fk_{}_{}", table, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_auto_name_single_column() {
        let idx = Index::new("users", vec!["email".to_string()], false, None);
        assert_eq!(idx.name, "idx_users_email");
    }

    #[test]
    fn index_auto_name_composite() {
        let idx = Index::new(
            "users",
            vec!["first_name".to_string(), "last_name".to_string()],
            false,
            None,
        );
        assert_eq!(idx.name, "idx_users_first_name_last_name");
    }

    #[test]
    fn unique_index_auto_name_uses_uq_prefix() {
        let idx = Index::new(
            "users",
            vec!["email".to_string(), "tenant".to_string()],
            true,
            None,
        );
        assert_eq!(idx.name, "uq_users_email_tenant");
    }

    #[test]
    fn explicit_index_name_wins() {
        let idx = Index::new(
            "users",
            vec!["email".to_string()],
            false,
            Some("my_index".to_string()),
        );
        assert_eq!(idx.name, "my_index");
    }

    #[test]
    fn foreign_key_auto_name() {
        let fk = ForeignKey::new("posts", "user_id");
        assert_eq!(fk.name, "fk_posts_user_id");
        assert_eq!(fk.column, "user_id");
    }
}
