#[macro_use]
extern crate diesel;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate shrinkwraprs;

use std::fmt;

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("Either feature \"sqlite\" or \"postgres\" must be enabled for this crate.");
#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!("Either feature \"sqlite\" or \"postgres\" must be enabled for this crate.");

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type Connection = diesel::SqliteConnection;

#[cfg(all(not(feature = "sqlite"), feature = "postgres"))]
pub type Connection = diesel::PgConnection;

/// All the ways a community operation can fail.
///
/// Apart from the storage variants, every error is a validation failure that
/// is reported as-is to the caller. Nothing is retried.
#[derive(Debug)]
pub enum Error {
    Db(diesel::result::Error),
    DbPool,
    InvalidValue,
    NotFound,

    NotAMember,
    AlreadyMember,
    Banned,
    AlreadyBanned,
    NotBanned,

    NotAnAdmin,
    AlreadyAdmin,
    InsufficientSeniority,
    CannotModifyOwner,

    Muted,
    AlreadyMuted,
    NotMuted,
    CannotMuteSelf,

    NotAttached,
    AlreadyAttached,
    NotAuthor,

    InvitationsNotSupported,
    InvitationAlreadyExists,
    NoSuchInvitation,

    CannotDowngradeAdmin,
    ArityMismatch { expected: usize, found: usize },
}

impl Error {
    /// True when the store refused a row because of a unique constraint
    pub fn is_unique_violation(&self) -> bool {
        use diesel::result::{DatabaseErrorKind, Error as DbError};
        matches!(
            self,
            Error::Db(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            err => Error::Db(err),
        }
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(_: diesel::r2d2::PoolError) -> Self {
        Error::DbPool
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Db(err) => write!(f, "database error: {}", err),
            Error::DbPool => f.write_str("couldn't get a database connection"),
            Error::InvalidValue => f.write_str("invalid value"),
            Error::NotFound => f.write_str("not found"),
            Error::NotAMember => f.write_str("user is not a member of this community"),
            Error::AlreadyMember => f.write_str("user is already a member of this community"),
            Error::Banned => f.write_str("user is banned from this community"),
            Error::AlreadyBanned => f.write_str("user is already banned from this community"),
            Error::NotBanned => f.write_str("user is not banned from this community"),
            Error::NotAnAdmin => f.write_str("user is not an admin of this community"),
            Error::AlreadyAdmin => f.write_str("user is already an admin of this community"),
            Error::InsufficientSeniority => {
                f.write_str("admin is not senior enough to act on this user")
            }
            Error::CannotModifyOwner => f.write_str("the community owner can't be modified"),
            Error::Muted => f.write_str("user is muted in this community"),
            Error::AlreadyMuted => f.write_str("user is already muted"),
            Error::NotMuted => f.write_str("user is not muted"),
            Error::CannotMuteSelf => f.write_str("an admin can't mute themselves"),
            Error::NotAttached => f.write_str("content is not attached to this community"),
            Error::AlreadyAttached => f.write_str("content is already attached to this community"),
            Error::NotAuthor => f.write_str("user is not the author of this content"),
            Error::InvitationsNotSupported => {
                f.write_str("invitation requests only exist for private communities")
            }
            Error::InvitationAlreadyExists => f.write_str("invitation request already exists"),
            Error::NoSuchInvitation => f.write_str("there is no invitation request for this user"),
            Error::CannotDowngradeAdmin => f.write_str("admins can't be given read access"),
            Error::ArityMismatch { expected, found } => write!(
                f,
                "{} users were given but {} of them are members of this community",
                expected, found
            ),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Adds a function to a model, that returns the first
/// matching row for a given list of fields.
///
/// Usage:
///
/// ```rust,ignore
/// impl Model {
///     find_by!(model_table, name_of_the_function, field1 as String, field2 as i32);
/// }
///
/// // Get the Model with field1 == "", and field2 == 0
/// Model::name_of_the_function(connection, String::new(), 0);
/// ```
macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// List all rows of a model, with field-based filtering.
///
/// Usage:
///
/// ```rust,ignore
/// impl Model {
///     list_by!(model_table, name_of_the_function, field1 as String);
/// }
///
/// // To get all Models with field1 == ""
/// Model::name_of_the_function(connection, String::new());
/// ```
macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to retrieve a row by ID
///
/// # Usage
///
/// ```rust,ignore
/// impl Model {
///     get!(model_table);
/// }
///
/// // Get the Model with ID 1
/// Model::get(connection, 1);
/// ```
macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &crate::Connection, id: i32) -> Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to insert a new row
///
/// # Usage
///
/// ```rust,ignore
/// impl Model {
///     insert!(model_table, NewModelType);
/// }
///
/// // Insert a new row
/// Model::insert(connection, NewModelType::new());
/// ```
macro_rules! insert {
    ($table:ident, $from:ty) => {
        last!($table);

        #[cfg(feature = "postgres")]
        #[allow(dead_code)]
        pub fn insert(conn: &crate::Connection, new: $from) -> Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .get_result(conn)
                .map_err(Error::from)
        }

        // The write lock taken by the insert is held until the end of the
        // transaction, so no other connection can add a row before `last`.
        #[cfg(feature = "sqlite")]
        #[allow(dead_code)]
        pub fn insert(conn: &crate::Connection, new: $from) -> Result<Self> {
            diesel::Connection::transaction::<_, Error, _>(conn, || {
                diesel::insert_into($table::table)
                    .values(new)
                    .execute(conn)?;
                Self::last(conn)
            })
        }
    };
}

/// Returns the last row of a table.
///
/// # Usage
///
/// ```rust,ignore
/// impl Model {
///     last!(model_table);
/// }
///
/// // Get the last Model
/// Model::last(connection)
/// ```
macro_rules! last {
    ($table:ident) => {
        #[allow(dead_code)]
        pub fn last(conn: &crate::Connection) -> Result<Self> {
            $table::table
                .order_by($table::id.desc())
                .first(conn)
                .map_err(Error::from)
        }
    };
}

pub mod authority;
pub mod blogline;
pub mod comments;
pub mod communities;
pub mod community_bans;
pub mod community_members;
pub mod config;
pub mod content;
pub mod db_conn;
pub mod invitation_requests;
pub mod likes;
pub mod migrations;
pub mod placements;
pub mod posts;
pub mod reshares;
pub mod schema;
pub mod timeline;
pub mod users;

pub use config::CONFIG;

#[cfg(test)]
pub(crate) mod tests {
    use crate::{db_conn, migrations::IMPORTED_MIGRATIONS, Connection as Conn, CONFIG};
    use diesel::Connection;

    /// A freshly migrated connection. With SQLite, every test gets its own
    /// in-memory database.
    pub(crate) fn db() -> Conn {
        let conn = Conn::establish(CONFIG.database_url.as_str())
            .expect("Couldn't connect to the database");
        db_conn::enable_foreign_keys(&conn).expect("Couldn't enable foreign keys");
        IMPORTED_MIGRATIONS
            .run_pending_migrations(&conn)
            .expect("Couldn't run migrations");
        conn
    }
}
