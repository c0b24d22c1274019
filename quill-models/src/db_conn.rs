use crate::{config::Config, Connection, Result};
use diesel::r2d2::{
    ConnectionManager, CustomizeConnection, Error as ConnError, Pool, PooledConnection,
};
#[cfg(feature = "sqlite")]
use diesel::{dsl::sql_query, ConnectionError, RunQueryDsl};
use std::ops::Deref;
use tracing::info;

pub type DbPool = Pool<ConnectionManager<Connection>>;

/// A connection checked out of the pool.
pub struct DbConn(pub PooledConnection<ConnectionManager<Connection>>);

impl DbConn {
    pub fn get(pool: &DbPool) -> Result<DbConn> {
        Ok(DbConn(pool.get()?))
    }
}

// For the convenience of using an &DbConn as an &Connection.
impl Deref for DbConn {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// SQLite leaves foreign keys unchecked unless asked for each connection.
#[cfg(feature = "sqlite")]
pub fn enable_foreign_keys(conn: &Connection) -> diesel::QueryResult<()> {
    sql_query("PRAGMA foreign_keys = on;")
        .execute(conn)
        .map(|_| ())
}

#[cfg(not(feature = "sqlite"))]
pub fn enable_foreign_keys(_conn: &Connection) -> diesel::QueryResult<()> {
    Ok(())
}

#[derive(Debug)]
pub struct PragmaForeignKey;

impl CustomizeConnection<Connection, ConnError> for PragmaForeignKey {
    #[cfg(feature = "sqlite")]
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), ConnError> {
        enable_foreign_keys(conn).map_err(|_| {
            ConnError::ConnectionError(ConnectionError::BadConnection(String::from(
                "PRAGMA foreign_keys = on failed",
            )))
        })
    }

    #[cfg(not(feature = "sqlite"))]
    fn on_acquire(&self, _: &mut Connection) -> std::result::Result<(), ConnError> {
        Ok(())
    }
}

pub fn init_pool(config: &Config) -> Result<DbPool> {
    let manager = ConnectionManager::<Connection>::new(config.database_url.as_str());
    let mut builder = DbPool::builder()
        .connection_customizer(Box::new(PragmaForeignKey))
        .min_idle(config.db_min_idle);
    if let Some(max_size) = config.db_max_size {
        builder = builder.max_size(max_size);
    };
    let pool = builder.build(manager)?;
    info!(database = config.db_name, "database pool ready");
    Ok(pool)
}
