//! Shared database handles, transactions, and positional parameter binding
//! for the blocking `postgres` and `mysql` drivers.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::Error;

/// A positional statement parameter.
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    Text(&'a str),
    Int(i32),
    BigInt(i64),
    Bool(bool),
}

enum Handle {
    #[cfg(feature = "postgres")]
    Postgres(postgres::Client),
    #[cfg(feature = "mysql")]
    MySql(mysql::PooledConn),
}

/// A database handle shared by every schema derived from the same `open`
/// call. The engine is single-threaded; sharing is reference-counted, not
/// synchronized.
#[derive(Clone)]
pub struct Connection {
    handle: Rc<RefCell<Handle>>,
}

impl Connection {
    /// Open a connection for the dialect's driver, ping it, and apply the
    /// pool settings the driver exposes.
    pub fn open(dialect: &dyn Dialect, config: &Config) -> Result<Connection, Error> {
        let conn = match dialect.driver_name() {
            #[cfg(feature = "postgres")]
            "postgres" => {
                let dsn = dialect.format_dsn(&config.connection);
                let client = postgres::Client::connect(&dsn, postgres::NoTls)
                    .map_err(|e| Error::Connection(e.to_string()))?;
                Connection {
                    handle: Rc::new(RefCell::new(Handle::Postgres(client))),
                }
            }
            #[cfg(feature = "mysql")]
            "mysql" => {
                let conn = &config.connection;
                let pool_cfg = &config.pool;

                let mut pool_opts = mysql::PoolOpts::default();
                if pool_cfg.max_open_conns > 0 {
                    let max = pool_cfg.max_open_conns as usize;
                    let min = (pool_cfg.max_idle_conns as usize).min(max);
                    if let Some(constraints) = mysql::PoolConstraints::new(min, max) {
                        pool_opts = pool_opts.with_constraints(constraints);
                    }
                }
                if !pool_cfg.conn_max_idle_time.is_zero() {
                    pool_opts =
                        pool_opts.with_inactive_connection_ttl(pool_cfg.conn_max_idle_time);
                }

                let opts = mysql::OptsBuilder::new()
                    .ip_or_hostname(Some(conn.host.clone()))
                    .tcp_port(conn.port)
                    .user(Some(conn.user.clone()))
                    .pass(Some(conn.password.clone()))
                    .db_name(Some(conn.database.clone()))
                    .pool_opts(pool_opts);

                let pool = mysql::Pool::new(opts).map_err(|e| Error::Connection(e.to_string()))?;
                let conn = pool
                    .get_conn()
                    .map_err(|e| Error::Connection(e.to_string()))?;
                Connection {
                    handle: Rc::new(RefCell::new(Handle::MySql(conn))),
                }
            }
            other => {
                return Err(Error::Connection(format!(
                    "driver {} is not enabled in this build",
                    other
                )))
            }
        };

        conn.ping()?;
        debug!(dialect = dialect.name(), "database connection established");
        Ok(conn)
    }

    fn ping(&self) -> Result<(), Error> {
        match &mut *self.handle.borrow_mut() {
            #[cfg(feature = "postgres")]
            Handle::Postgres(client) => client
                .simple_query("SELECT 1")
                .map(|_| ())
                .map_err(|e| Error::Connection(e.to_string())),
            #[cfg(feature = "mysql")]
            Handle::MySql(conn) => {
                use mysql::prelude::Queryable;
                conn.query_drop("SELECT 1")
                    .map_err(|e| Error::Connection(e.to_string()))
            }
        }
    }

    /// Execute a statement without preparing it. DDL and transaction
    /// control go through here.
    pub fn execute(&self, sql: &str) -> Result<(), Error> {
        match &mut *self.handle.borrow_mut() {
            #[cfg(feature = "postgres")]
            Handle::Postgres(client) => client.batch_execute(sql).map_err(|e| Error::Sql {
                statement: sql.to_string(),
                message: e.to_string(),
            }),
            #[cfg(feature = "mysql")]
            Handle::MySql(conn) => {
                use mysql::prelude::Queryable;
                conn.query_drop(sql).map_err(|e| Error::Sql {
                    statement: sql.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Execute a prepared statement with positional parameters.
    pub fn execute_params(&self, sql: &str, params: &[Param]) -> Result<(), Error> {
        if params.is_empty() {
            return self.execute(sql);
        }
        match &mut *self.handle.borrow_mut() {
            #[cfg(feature = "postgres")]
            Handle::Postgres(client) => {
                let owned = pg_params(params);
                let refs = pg_param_refs(&owned);
                client.execute(sql, &refs).map(|_| ()).map_err(|e| Error::Sql {
                    statement: sql.to_string(),
                    message: e.to_string(),
                })
            }
            #[cfg(feature = "mysql")]
            Handle::MySql(conn) => {
                use mysql::prelude::Queryable;
                conn.exec_drop(sql, mysql_params(params))
                    .map_err(|e| Error::Sql {
                        statement: sql.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Run a query whose single selected column is a string.
    pub fn query_names(&self, sql: &str, params: &[Param]) -> Result<Vec<String>, Error> {
        match &mut *self.handle.borrow_mut() {
            #[cfg(feature = "postgres")]
            Handle::Postgres(client) => {
                let owned = pg_params(params);
                let refs = pg_param_refs(&owned);
                let rows = client.query(sql, &refs).map_err(|e| Error::Sql {
                    statement: sql.to_string(),
                    message: e.to_string(),
                })?;
                Ok(rows.iter().map(|row| row.get(0)).collect())
            }
            #[cfg(feature = "mysql")]
            Handle::MySql(conn) => {
                use mysql::prelude::Queryable;
                let result: Result<Vec<String>, mysql::Error> = if params.is_empty() {
                    conn.query(sql)
                } else {
                    conn.exec(sql, mysql_params(params))
                };
                result.map_err(|e| Error::Sql {
                    statement: sql.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Run a query whose single selected column is an integer (COUNT,
    /// MAX(batch), …).
    pub fn query_int(&self, sql: &str, params: &[Param]) -> Result<i64, Error> {
        match &mut *self.handle.borrow_mut() {
            #[cfg(feature = "postgres")]
            Handle::Postgres(client) => {
                let owned = pg_params(params);
                let refs = pg_param_refs(&owned);
                let row = client.query_one(sql, &refs).map_err(|e| Error::Sql {
                    statement: sql.to_string(),
                    message: e.to_string(),
                })?;
                // COUNT(*) is int8, MAX over an INTEGER column is int4.
                match row.try_get::<_, i64>(0) {
                    Ok(v) => Ok(v),
                    Err(_) => row
                        .try_get::<_, i32>(0)
                        .map(i64::from)
                        .map_err(|e| Error::Sql {
                            statement: sql.to_string(),
                            message: e.to_string(),
                        }),
                }
            }
            #[cfg(feature = "mysql")]
            Handle::MySql(conn) => {
                use mysql::prelude::Queryable;
                let result: Result<Option<i64>, mysql::Error> = if params.is_empty() {
                    conn.query_first(sql)
                } else {
                    conn.exec_first(sql, mysql_params(params))
                };
                result
                    .map(|opt| opt.unwrap_or(0))
                    .map_err(|e| Error::Sql {
                        statement: sql.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Begin a transaction on this connection. The transaction is
    /// session-scoped: statements executed on the connection until commit
    /// or rollback run inside it.
    pub fn begin(&self) -> Result<Transaction, Error> {
        self.execute("BEGIN")?;
        Ok(Transaction {
            conn: self.clone(),
            resolved: false,
        })
    }
}

/// An open transaction. Dropping it without committing issues a
/// best-effort ROLLBACK.
pub struct Transaction {
    conn: Connection,
    resolved: bool,
}

impl Transaction {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn commit(mut self) -> Result<(), Error> {
        self.resolved = true;
        self.conn.execute("COMMIT")
    }

    pub fn rollback(mut self) -> Result<(), Error> {
        self.resolved = true;
        self.conn.execute("ROLLBACK")
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.resolved {
            let _ = self.conn.execute("ROLLBACK");
        }
    }
}

#[cfg(feature = "postgres")]
fn pg_params(params: &[Param]) -> Vec<Box<dyn postgres::types::ToSql + Sync>> {
    params
        .iter()
        .map(|p| match p {
            Param::Text(v) => Box::new(v.to_string()) as Box<dyn postgres::types::ToSql + Sync>,
            Param::Int(v) => Box::new(*v) as Box<dyn postgres::types::ToSql + Sync>,
            Param::BigInt(v) => Box::new(*v) as Box<dyn postgres::types::ToSql + Sync>,
            Param::Bool(v) => Box::new(*v) as Box<dyn postgres::types::ToSql + Sync>,
        })
        .collect()
}

#[cfg(feature = "postgres")]
fn pg_param_refs(
    owned: &[Box<dyn postgres::types::ToSql + Sync>],
) -> Vec<&(dyn postgres::types::ToSql + Sync)> {
    owned.iter().map(|b| b.as_ref()).collect()
}

#[cfg(feature = "mysql")]
fn mysql_params(params: &[Param]) -> mysql::Params {
    mysql::Params::Positional(
        params
            .iter()
            .map(|p| match p {
                Param::Text(v) => mysql::Value::from(*v),
                Param::Int(v) => mysql::Value::from(*v),
                Param::BigInt(v) => mysql::Value::from(*v),
                Param::Bool(v) => mysql::Value::from(*v),
            })
            .collect(),
    )
}
