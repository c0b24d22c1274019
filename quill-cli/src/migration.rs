use clap::{App, ArgMatches, SubCommand};

use quill_models::{migrations::IMPORTED_MIGRATIONS, Connection};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("migration")
        .about("Manage migrations")
        .subcommand(SubCommand::with_name("run").about("Run migrations"))
        .subcommand(SubCommand::with_name("redo").about("Rerun latest migration"))
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("run", Some(_)) => run_(conn),
        ("redo", Some(_)) => redo(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn run_(conn: &Connection) {
    IMPORTED_MIGRATIONS
        .run_pending_migrations(conn)
        .expect("Failed to run migrations")
}

fn redo(conn: &Connection) {
    IMPORTED_MIGRATIONS
        .rerun_last_migration(conn)
        .expect("Failed to rerun migrations")
}
