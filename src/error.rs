/// Errors produced while connecting, building schema SQL, tracking the
/// ledger, or running migrations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Opening or pinging the database failed.
    Connection(String),
    /// An operation that needs a database handle was called on a schema
    /// that was never opened.
    NoConnection,
    /// A statement failed to execute.
    Sql { statement: String, message: String },
    /// Reading or writing the migrations ledger failed.
    Ledger(String),
    /// A migration name was requested that is not in the registration list.
    UnknownMigration(String),
    /// A rollback target that is not in the applied list.
    NotApplied(String),
    /// A migration unit failed; the wrapped error is the cause.
    Migration { name: String, source: Box<Error> },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connection(message) => {
                write!(
                    f,
                    "cannot connect to database: {}. Verify host, port, and credentials",
                    message
                )
            }
            Error::NoConnection => write!(f, "no database connection"),
            Error::Sql { statement, message } => {
                write!(f, "{} while executing: {}", message, statement)
            }
            Error::Ledger(message) => write!(f, "migrations ledger: {}", message),
            Error::UnknownMigration(name) => {
                write!(f, "migration {} not found in registry", name)
            }
            Error::NotApplied(name) => {
                write!(f, "migration {} not found in applied migrations", name)
            }
            Error::Migration { name, source } => {
                write!(f, "migration {} failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Migration { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Wrap an error with the name of the migration it occurred in.
    pub(crate) fn in_migration(self, name: &str) -> Error {
        Error::Migration {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            Error::UnknownMigration("20250101000000_users".to_string()).to_string(),
            "migration 20250101000000_users not found in registry"
        );
        assert_eq!(
            Error::NotApplied("a".to_string()).to_string(),
            "migration a not found in applied migrations"
        );
        assert_eq!(Error::NoConnection.to_string(), "no database connection");
        assert_eq!(
            Error::Ledger("boom".to_string()).to_string(),
            "migrations ledger: boom"
        );
    }

    #[test]
    fn connection_error_includes_hint() {
        let err = Error::Connection("refused".to_string());
        let text = err.to_string();
        assert!(text.contains("refused"));
        assert!(text.contains("Verify host, port, and credentials"));
    }

    #[test]
    fn migration_error_carries_name_and_cause() {
        let err = Error::Sql {
            statement: "CREATE TABLE x".to_string(),
            message: "syntax error".to_string(),
        }
        .in_migration("0001_bad");

        let text = err.to_string();
        assert!(text.starts_with("migration 0001_bad failed:"));
        assert!(text.contains("syntax error"));
    }

    #[test]
    fn migration_error_exposes_source() {
        use std::error::Error as _;

        let err = Error::NoConnection.in_migration("0001_x");
        assert!(err.source().is_some());
        assert!(Error::NoConnection.source().is_none());
    }
}
