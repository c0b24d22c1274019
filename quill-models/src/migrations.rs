use crate::{Connection, Error, Result};
use diesel::connection::{Connection as Conn, SimpleConnection};
use migrations_internals::{setup_database, MigrationConnection};
use quill_macro::import_migrations;
use tracing::info;

/// One schema change, as embedded by `import_migrations!`.
struct Migration {
    name: &'static str,
    up: &'static str,
    down: &'static str,
}

impl Migration {
    fn run(&self, conn: &Connection) -> Result<()> {
        info!("Running migration {}", self.name);
        conn.batch_execute(self.up).map_err(Error::from)
    }

    fn revert(&self, conn: &Connection) -> Result<()> {
        info!("Reverting migration {}", self.name);
        conn.batch_execute(self.down).map_err(Error::from)
    }
}

/// Every migration of the enabled backend, sorted by version.
pub struct ImportedMigrations(&'static [Migration]);

impl ImportedMigrations {
    pub fn run_pending_migrations(&self, conn: &Connection) -> Result<()> {
        use diesel::dsl::sql;
        use diesel::sql_types::Bool;
        use diesel::{select, RunQueryDsl};
        #[cfg(feature = "postgres")]
        let schema_exists: bool = select(sql::<Bool>(
            "EXISTS \
             (SELECT 1 \
             FROM information_schema.tables \
             WHERE table_name = '__diesel_schema_migrations')",
        ))
        .get_result(conn)?;
        #[cfg(feature = "sqlite")]
        let schema_exists: bool = select(sql::<Bool>(
            "EXISTS \
             (SELECT 1 \
             FROM sqlite_master \
             WHERE type = 'table' \
             AND name = '__diesel_schema_migrations')",
        ))
        .get_result(conn)?;

        if !schema_exists {
            setup_database(conn)?;
        }

        let to_run = &self.0[self.first_pending(conn)?..];
        for migration in to_run {
            conn.transaction(|| {
                migration.run(conn)?;
                conn.insert_new_migration(migration.name)
                    .map_err(Error::from)
            })?;
        }
        Ok(())
    }

    pub fn is_pending(&self, conn: &Connection) -> Result<bool> {
        let latest_migration = conn.latest_run_migration_version()?;
        match (latest_migration, self.0.last()) {
            (Some(migration), Some(last)) => Ok(last.name != migration),
            (None, Some(_)) => Ok(true),
            (_, None) => Ok(false),
        }
    }

    pub fn rerun_last_migration(&self, conn: &Connection) -> Result<()> {
        let latest_migration = conn
            .latest_run_migration_version()?
            .ok_or(Error::NotFound)?;
        let migration = &self.0[self.position(&latest_migration)?];
        conn.transaction(|| {
            migration.revert(conn)?;
            migration.run(conn)
        })
    }

    fn position(&self, version: &str) -> Result<usize> {
        self.0
            .binary_search_by_key(&version, |mig| mig.name)
            .map_err(|_| Error::NotFound)
    }

    fn first_pending(&self, conn: &Connection) -> Result<usize> {
        match conn.latest_run_migration_version()? {
            Some(version) => self.position(&version).map(|id| id + 1),
            None => Ok(0),
        }
    }
}

pub const IMPORTED_MIGRATIONS: ImportedMigrations = import_migrations! {};
