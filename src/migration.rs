use crate::error::Error;
use crate::schema::Schema;

type MigrationFn = Box<dyn Fn(&Schema) -> Result<(), Error>>;

/// A named pair of `up`/`down` operations. The authoring convention is a
/// `<UTC yyyymmddhhmmss>_<slug>` name, which makes lexicographic order
/// match creation order; names must be unique across a run (the ledger
/// enforces this with a UNIQUE column).
pub struct Registration {
    name: String,
    up: MigrationFn,
    down: MigrationFn,
}

impl Registration {
    pub fn new<U, D>(name: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(&Schema) -> Result<(), Error> + 'static,
        D: Fn(&Schema) -> Result<(), Error> + 'static,
    {
        Self {
            name: name.into(),
            up: Box::new(up),
            down: Box::new(down),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self, schema: &Schema) -> Result<(), Error> {
        (self.up)(schema)
    }

    pub fn down(&self, schema: &Schema) -> Result<(), Error> {
        (self.down)(schema)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn registration_runs_callbacks() {
        let reg = Registration::new(
            "20250101000000_create_users",
            |schema: &Schema| {
                schema.create_table("users", |t| {
                    t.increments("id");
                })
            },
            |schema: &Schema| schema.drop_table("users"),
        );

        assert_eq!(reg.name(), "20250101000000_create_users");

        let schema = Schema::new(Config::default());
        reg.up(&schema).unwrap();
        reg.down(&schema).unwrap();

        let log = schema.sql_log();
        assert!(log[0].contains("CREATE TABLE \"users\""));
        assert_eq!(log[1], "DROP TABLE \"users\";");
    }

    #[test]
    fn registration_debug_shows_name() {
        let reg = Registration::new("0001_x", |_: &Schema| Ok(()), |_: &Schema| Ok(()));
        assert!(format!("{:?}", reg).contains("0001_x"));
    }
}
