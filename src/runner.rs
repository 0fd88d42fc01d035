//! Orders migrations, computes the pending set, assigns batch numbers, and
//! drives `up`/`down` inside per-migration transactions.
//!
//! Registrations are consumed in the order supplied; the runner never
//! re-sorts. The authoring convention (`<UTC yyyymmddhhmmss>_<slug>` names)
//! makes creation time monotonic with that order.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::migration::Registration;
use crate::schema::Schema;
use crate::tracker::Tracker;

/// Optional flags for migration commands.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Positional arguments (a migration name for `up`/`down`).
    pub args: Vec<String>,
    /// For rollback: roll back every applied migration, not just the last
    /// batch.
    pub all: bool,
    /// Print SQL without executing; the ledger is untouched.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MigrationStatus {
    Applied,
    Pending,
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStatus::Applied => write!(f, "applied"),
            MigrationStatus::Pending => write!(f, "pending"),
        }
    }
}

pub struct Runner<'a> {
    config: &'a Config,
    registrations: &'a [Registration],
    schema: &'a Schema,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: &'a Config,
        registrations: &'a [Registration],
        schema: &'a Schema,
        options: RunOptions,
    ) -> Self {
        Self {
            config,
            registrations,
            schema,
            options,
        }
    }

    fn tracker(&self) -> Result<Tracker, Error> {
        let conn = self
            .schema
            .connection()
            .cloned()
            .ok_or(Error::NoConnection)?;
        Ok(Tracker::new(
            conn,
            self.schema.dialect_rc(),
            &self.config.migrations.table_name,
        ))
    }

    fn find(&self, name: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.name() == name)
    }

    /// Apply every pending migration, in registration order, under one new
    /// batch number. On failure the run aborts; already-committed
    /// predecessors remain applied.
    pub fn run_latest(&self) -> Result<Vec<String>, Error> {
        if self.options.dry_run {
            return self.dry_run_latest();
        }

        let tracker = self.tracker()?;
        tracker.ensure_table()?;

        let applied: HashSet<String> = tracker.get_applied()?.into_iter().collect();
        let pending: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| !applied.contains(r.name()))
            .collect();

        if pending.is_empty() {
            info!("no pending migrations");
            return Ok(Vec::new());
        }

        let batch = tracker.get_last_batch()? + 1;
        info!(count = pending.len(), batch, "running pending migrations");
        if !self.schema.dialect().supports_transactional_ddl() {
            warn!("dialect does not support transactional DDL; a failed migration may leave partial changes");
        }

        let mut names = Vec::with_capacity(pending.len());
        for reg in pending {
            self.run_migration(&tracker, reg, batch)?;
            names.push(reg.name().to_string());
        }
        Ok(names)
    }

    /// Apply a single migration: the one named in `args`, or the first
    /// pending one in registration order. An already-applied named target
    /// is an idempotent no-op.
    pub fn run_up(&self) -> Result<Option<String>, Error> {
        if self.options.dry_run {
            return self.dry_run_up();
        }

        let tracker = self.tracker()?;
        tracker.ensure_table()?;

        let applied: HashSet<String> = tracker.get_applied()?.into_iter().collect();
        let batch = tracker.get_last_batch()? + 1;

        let target = match self.options.args.first() {
            Some(name) => {
                let reg = self
                    .find(name)
                    .ok_or_else(|| Error::UnknownMigration(name.clone()))?;
                if applied.contains(name.as_str()) {
                    info!(migration = name.as_str(), "already applied");
                    return Ok(None);
                }
                reg
            }
            None => match self
                .registrations
                .iter()
                .find(|r| !applied.contains(r.name()))
            {
                Some(reg) => reg,
                None => {
                    info!("no pending migrations");
                    return Ok(None);
                }
            },
        };

        self.run_migration(&tracker, target, batch)?;
        Ok(Some(target.name().to_string()))
    }

    /// Roll back a single migration: the one named in `args` (which must
    /// be applied), or the most recently applied one.
    pub fn run_down(&self) -> Result<Option<String>, Error> {
        if self.options.dry_run {
            return self.dry_run_down();
        }

        let tracker = self.tracker()?;
        let applied = tracker.get_applied()?;

        if applied.is_empty() {
            info!("no migrations to roll back");
            return Ok(None);
        }

        let target = match self.options.args.first() {
            Some(name) => {
                if !applied.iter().any(|n| n == name) {
                    return Err(Error::NotApplied(name.clone()));
                }
                name.clone()
            }
            None => applied[applied.len() - 1].clone(),
        };

        self.rollback_migration(&tracker, &target)?;
        Ok(Some(target))
    }

    /// Roll back the last batch, or every applied migration when `all` is
    /// set, in reverse-applied order.
    pub fn run_rollback(&self) -> Result<Vec<String>, Error> {
        if self.options.dry_run {
            return self.dry_run_rollback();
        }

        let tracker = self.tracker()?;

        if self.options.all {
            let applied = tracker.get_applied()?;
            if applied.is_empty() {
                info!("nothing to roll back");
                return Ok(Vec::new());
            }
            info!(count = applied.len(), "rolling back all migrations");
            let mut names = Vec::with_capacity(applied.len());
            for name in applied.iter().rev() {
                self.rollback_migration(&tracker, name)?;
                names.push(name.clone());
            }
            return Ok(names);
        }

        let last_batch = tracker.get_last_batch()?;
        if last_batch == 0 {
            info!("nothing to roll back");
            return Ok(Vec::new());
        }

        let batch = tracker.get_batch_migrations(last_batch)?;
        if batch.is_empty() {
            info!("nothing to roll back");
            return Ok(Vec::new());
        }

        info!(count = batch.len(), batch = last_batch, "rolling back batch");
        for name in &batch {
            self.rollback_migration(&tracker, name)?;
        }
        Ok(batch)
    }

    /// Report every registration's status, in registration order.
    pub fn run_list(&self) -> Result<Vec<(String, MigrationStatus)>, Error> {
        let tracker = self.tracker()?;
        tracker.ensure_table()?;

        let applied: HashSet<String> = tracker.get_applied()?.into_iter().collect();

        let mut list = Vec::with_capacity(self.registrations.len());
        let mut applied_count = 0;
        let mut pending_count = 0;

        println!("\nMigrations:");
        for reg in self.registrations {
            let status = if applied.contains(reg.name()) {
                applied_count += 1;
                MigrationStatus::Applied
            } else {
                pending_count += 1;
                MigrationStatus::Pending
            };
            println!("  {:>8}  {}", status.to_string(), reg.name());
            list.push((reg.name().to_string(), status));
        }
        println!("Total: {} applied, {} pending", applied_count, pending_count);

        Ok(list)
    }

    /// Run one migration in its own transaction. The ledger row is written
    /// in the same transaction, so it commits or rolls back with the DDL.
    fn run_migration(&self, tracker: &Tracker, reg: &Registration, batch: i32) -> Result<(), Error> {
        let tx = self
            .schema
            .begin_tx()
            .map_err(|e| e.in_migration(reg.name()))?;
        let tx_schema = self.schema.with_tx(&tx);

        if let Err(err) = reg.up(&tx_schema) {
            let _ = tx.rollback();
            return Err(err.in_migration(reg.name()));
        }
        if let Err(err) = tracker.record_migration_tx(&tx, reg.name(), batch) {
            let _ = tx.rollback();
            return Err(err.in_migration(reg.name()));
        }
        tx.commit().map_err(|e| e.in_migration(reg.name()))?;

        info!(migration = reg.name(), batch, "migrated");
        Ok(())
    }

    fn rollback_migration(&self, tracker: &Tracker, name: &str) -> Result<(), Error> {
        let reg = self
            .find(name)
            .ok_or_else(|| Error::UnknownMigration(name.to_string()))?;

        let tx = self.schema.begin_tx().map_err(|e| e.in_migration(name))?;
        let tx_schema = self.schema.with_tx(&tx);

        if let Err(err) = reg.down(&tx_schema) {
            let _ = tx.rollback();
            return Err(err.in_migration(name));
        }
        if let Err(err) = tracker.remove_migration_tx(&tx, name) {
            let _ = tx.rollback();
            return Err(err.in_migration(name));
        }
        tx.commit().map_err(|e| e.in_migration(name))?;

        info!(migration = name, "rolled back");
        Ok(())
    }

    // Dry-run paths. SQL goes through a detached schema, so every statement
    // is printed instead of executed and the ledger is never written. When
    // the underlying schema still has a live connection the ledger is
    // consulted read-only so the walked set matches a real run; without one
    // the down direction falls back to the registration list.

    fn applied_if_connected(&self) -> Vec<String> {
        if self.schema.connection().is_none() {
            return Vec::new();
        }
        match self.tracker() {
            Ok(tracker) => tracker.get_applied().unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn dry_run_latest(&self) -> Result<Vec<String>, Error> {
        let applied: HashSet<String> = self.applied_if_connected().into_iter().collect();
        let dry = self.schema.detached();

        println!("[DRY RUN] Would run the following migrations:");
        println!();

        let mut names = Vec::new();
        for reg in self
            .registrations
            .iter()
            .filter(|r| !applied.contains(r.name()))
        {
            println!("Migration: {}", reg.name());
            println!("SQL:");
            reg.up(&dry)?;
            println!();
            names.push(reg.name().to_string());
        }

        println!("Total: {} migration(s) would be applied", names.len());
        Ok(names)
    }

    fn dry_run_up(&self) -> Result<Option<String>, Error> {
        let applied: HashSet<String> = self.applied_if_connected().into_iter().collect();
        let dry = self.schema.detached();

        let target = match self.options.args.first() {
            Some(name) => {
                let reg = self
                    .find(name)
                    .ok_or_else(|| Error::UnknownMigration(name.clone()))?;
                if applied.contains(name.as_str()) {
                    println!("Migration {} already applied", name);
                    return Ok(None);
                }
                reg
            }
            None => match self
                .registrations
                .iter()
                .find(|r| !applied.contains(r.name()))
            {
                Some(reg) => reg,
                None => {
                    println!("No pending migrations");
                    return Ok(None);
                }
            },
        };

        println!("[DRY RUN] Would run migration:");
        println!();
        println!("Migration: {}", target.name());
        println!("SQL:");
        target.up(&dry)?;
        println!();
        Ok(Some(target.name().to_string()))
    }

    fn dry_run_down(&self) -> Result<Option<String>, Error> {
        let applied = self.applied_if_connected();
        let dry = self.schema.detached();

        // Without a ledger to consult, approximate with the last
        // registration.
        let target_name = match self.options.args.first() {
            Some(name) => name.clone(),
            None => match applied.last() {
                Some(name) => name.clone(),
                None => match self.registrations.last() {
                    Some(reg) => reg.name().to_string(),
                    None => {
                        println!("No migrations registered");
                        return Ok(None);
                    }
                },
            },
        };

        let reg = self
            .find(&target_name)
            .ok_or_else(|| Error::UnknownMigration(target_name.clone()))?;

        println!("[DRY RUN] Would roll back migration:");
        println!();
        println!("Migration: {}", reg.name());
        println!("SQL:");
        reg.down(&dry)?;
        println!();
        Ok(Some(target_name))
    }

    fn dry_run_rollback(&self) -> Result<Vec<String>, Error> {
        if self.registrations.is_empty() {
            println!("No migrations registered");
            return Ok(Vec::new());
        }

        let applied = self.applied_if_connected();
        let dry = self.schema.detached();

        let targets: Vec<String> = if self.options.all {
            if applied.is_empty() {
                self.registrations
                    .iter()
                    .rev()
                    .map(|r| r.name().to_string())
                    .collect()
            } else {
                applied.iter().rev().cloned().collect()
            }
        } else if applied.is_empty() {
            match self.registrations.last() {
                Some(reg) => vec![reg.name().to_string()],
                None => Vec::new(),
            }
        } else {
            let batch = self.tracker().and_then(|tracker| {
                let last_batch = tracker.get_last_batch()?;
                tracker.get_batch_migrations(last_batch)
            });
            match batch {
                Ok(names) if !names.is_empty() => names,
                _ => vec![applied[applied.len() - 1].clone()],
            }
        };

        println!("[DRY RUN] Would roll back migrations:");
        println!();
        for name in &targets {
            let reg = self
                .find(name)
                .ok_or_else(|| Error::UnknownMigration(name.clone()))?;
            println!("Migration: {}", reg.name());
            println!("SQL:");
            reg.down(&dry)?;
            println!();
        }
        println!("Total: {} migration(s) would be rolled back", targets.len());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn pg_config() -> Config {
        Config {
            client: "postgresql".to_string(),
            ..Config::default()
        }
    }

    fn registrations() -> Vec<Registration> {
        vec![
            Registration::new(
                "20250101000000_create_users",
                |s: &Schema| {
                    s.create_table("users", |t| {
                        t.increments("id");
                        t.string("email").not_nullable().unique();
                    })
                },
                |s: &Schema| s.drop_table("users"),
            ),
            Registration::new(
                "20250102000000_create_posts",
                |s: &Schema| {
                    s.create_table("posts", |t| {
                        t.increments("id");
                        t.int("user_id").not_nullable().references("users", "id");
                    })
                },
                |s: &Schema| s.drop_table("posts"),
            ),
        ]
    }

    #[test]
    fn latest_without_connection_fails() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(&config, &regs, &schema, RunOptions::default());

        assert_eq!(runner.run_latest().err(), Some(Error::NoConnection));
    }

    #[test]
    fn dry_run_latest_prints_sql_and_skips_ledger() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(
            &config,
            &regs,
            &schema,
            RunOptions {
                dry_run: true,
                ..RunOptions::default()
            },
        );

        let names = runner.run_latest().unwrap();
        assert_eq!(
            names,
            vec![
                "20250101000000_create_users".to_string(),
                "20250102000000_create_posts".to_string(),
            ]
        );

        let log = schema.sql_log();
        assert_eq!(log.len(), 2);
        assert!(log[0].contains("CREATE TABLE \"users\""));
        assert!(log[1].contains("CREATE TABLE \"posts\""));
        assert!(!log.iter().any(|sql| sql.contains("jone_migrations")));
    }

    #[test]
    fn dry_run_up_targets_first_registration() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(
            &config,
            &regs,
            &schema,
            RunOptions {
                dry_run: true,
                ..RunOptions::default()
            },
        );

        let name = runner.run_up().unwrap();
        assert_eq!(name.as_deref(), Some("20250101000000_create_users"));
        assert_eq!(schema.sql_log().len(), 1);
    }

    #[test]
    fn dry_run_up_named_unknown_errors() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(
            &config,
            &regs,
            &schema,
            RunOptions {
                args: vec!["20990101000000_missing".to_string()],
                dry_run: true,
                ..RunOptions::default()
            },
        );

        assert!(matches!(
            runner.run_up(),
            Err(Error::UnknownMigration(name)) if name == "20990101000000_missing"
        ));
    }

    #[test]
    fn dry_run_down_walks_last_registration() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(
            &config,
            &regs,
            &schema,
            RunOptions {
                dry_run: true,
                ..RunOptions::default()
            },
        );

        let name = runner.run_down().unwrap();
        assert_eq!(name.as_deref(), Some("20250102000000_create_posts"));
        assert_eq!(schema.sql_log(), vec!["DROP TABLE \"posts\";".to_string()]);
    }

    #[test]
    fn dry_run_rollback_all_is_reverse_registration_order() {
        let config = pg_config();
        let regs = registrations();
        let schema = Schema::new(config.clone());
        let runner = Runner::new(
            &config,
            &regs,
            &schema,
            RunOptions {
                all: true,
                dry_run: true,
                ..RunOptions::default()
            },
        );

        let names = runner.run_rollback().unwrap();
        assert_eq!(
            names,
            vec![
                "20250102000000_create_posts".to_string(),
                "20250101000000_create_users".to_string(),
            ]
        );

        let log = schema.sql_log();
        assert_eq!(log[0], "DROP TABLE \"posts\";");
        assert_eq!(log[1], "DROP TABLE \"users\";");
    }

    #[test]
    fn migration_status_display() {
        assert_eq!(MigrationStatus::Applied.to_string(), "applied");
        assert_eq!(MigrationStatus::Pending.to_string(), "pending");
    }
}
