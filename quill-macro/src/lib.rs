#![recursion_limit = "128"]

#[macro_use]
extern crate quote;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use std::fs::{read_dir, read_to_string};
use std::path::{Path, PathBuf};

/// Embeds the SQL migrations of the enabled backend.
///
/// Every directory of `migrations/<backend>` becomes one migration, named after
/// the first 14 digits of the directory name and made of its `up.sql` and
/// `down.sql`. The expansion must be used where `ImportedMigrations` and
/// `Migration` are in scope.
#[proc_macro]
pub fn import_migrations(input: TokenStream) -> TokenStream {
    assert!(input.is_empty(), "import_migrations! takes no argument");

    let mut dirs = read_dir(migrations_root())
        .expect("couldn't list migrations")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    dirs.sort_unstable();

    migration_list(&dirs).into()
}

fn backend_dir() -> &'static str {
    if cfg!(feature = "postgres") {
        "migrations/postgres"
    } else if cfg!(feature = "sqlite") {
        "migrations/sqlite"
    } else {
        "migrations"
    }
}

/// Walks up from this crate until a directory containing the migrations (or the
/// repository root) is found.
fn migrations_root() -> PathBuf {
    let dir = backend_dir();
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .find(|path| path.join(dir).is_dir() || path.join(".git").exists())
        .expect("migrations dir not found")
        .join(dir)
}

fn version(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .expect("migration directories must have UTF-8 names")
        .chars()
        .filter(char::is_ascii_digit)
        .take(14)
        .collect()
}

/// Reads one side of a migration, dropping comment lines.
fn read_sql(dir: &Path, file: &str) -> String {
    let path = dir.join(file);
    read_to_string(&path)
        .unwrap_or_else(|e| panic!("couldn't read {}: {}", path.display(), e))
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .fold(String::new(), |mut sql, line| {
            sql.push_str(line);
            sql.push('\n');
            sql
        })
}

fn migration_list(dirs: &[PathBuf]) -> TokenStream2 {
    let names = dirs.iter().map(|dir| version(dir)).collect::<Vec<_>>();
    let ups = dirs
        .iter()
        .map(|dir| read_sql(dir, "up.sql"))
        .collect::<Vec<_>>();
    let downs = dirs
        .iter()
        .map(|dir| read_sql(dir, "down.sql"))
        .collect::<Vec<_>>();

    quote!(
        ImportedMigrations(
            &[#(Migration { name: #names, up: #ups, down: #downs }),*]
        )
    )
}
