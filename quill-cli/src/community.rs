use clap::{App, Arg, ArgMatches, SubCommand};

use quill_models::{
    communities::{Community, NewCommunity},
    community_members::AccessLevel,
    users::User,
    Connection, CONFIG,
};
use tracing::info;

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("community")
        .about("Manage communities")
        .subcommand(
            SubCommand::with_name("create")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .takes_value(true)
                        .help("The name of the new community"),
                )
                .arg(
                    Arg::with_name("owner")
                        .short("o")
                        .long("owner")
                        .takes_value(true)
                        .help("The username of its owner"),
                )
                .arg(
                    Arg::with_name("private")
                        .short("p")
                        .long("private")
                        .help("Only let in users whose invitation request was accepted"),
                )
                .arg(
                    Arg::with_name("read-only")
                        .short("r")
                        .long("read-only")
                        .help("Give new members read access only"),
                )
                .about("Create a new community"),
        )
        .subcommand(
            SubCommand::with_name("destroy")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .takes_value(true)
                        .help("The name of the community to destroy"),
                )
                .arg(
                    Arg::with_name("yes")
                        .short("y")
                        .long("yes")
                        .help("Confirm the destruction"),
                )
                .about("Destroy a community, and remove its content from every timeline"),
        )
        .subcommand(
            SubCommand::with_name("join")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .takes_value(true)
                        .help("The name of the community"),
                )
                .arg(
                    Arg::with_name("user")
                        .short("u")
                        .long("user")
                        .takes_value(true)
                        .help("The username of the new member"),
                )
                .about("Add a user to a community, and fill their timeline with its latest content"),
        )
        .subcommand(
            SubCommand::with_name("members")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .takes_value(true)
                        .help("The name of the community"),
                )
                .about("List the members of a community"),
        )
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("create", Some(x)) => create(x, conn),
        ("destroy", Some(x)) => destroy(x, conn),
        ("join", Some(x)) => join(x, conn),
        ("members", Some(x)) => members(x, conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn find<'a>(args: &ArgMatches<'a>, conn: &Connection) -> Community {
    let name = args
        .value_of("name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Community name"));
    Community::find_by_name(conn, &name).expect("Couldn't find this community")
}

fn create<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let name = args
        .value_of("name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Community name"));
    let owner = args
        .value_of("owner")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Owner's username"));
    let owner = User::find_by_name(conn, &owner).expect("Couldn't find the owner");
    let access = if args.is_present("read-only") {
        AccessLevel::Read
    } else {
        AccessLevel::Write
    };

    let community = Community::create(
        conn,
        NewCommunity::new(&name, &owner, !args.is_present("private"), access),
    )
    .expect("Couldn't create the community");
    println!("Created community {} with ID {}", community.name, community.id);
}

fn destroy<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let community = find(args, conn);
    if !args.is_present("yes") {
        let answer = super::ask_for(&format!(
            "Destroy {} and all of its memberships? [y/N]",
            community.name
        ));
        if !answer.eq_ignore_ascii_case("y") {
            println!("Nothing was destroyed");
            return;
        }
    }
    community
        .destroy(conn)
        .expect("Couldn't destroy the community");
    info!(name = %community.name, "community destroyed from the CLI");
}

fn join<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let community = find(args, conn);
    let username = args
        .value_of("user")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Username"));
    let user = User::find_by_name(conn, &username).expect("Couldn't find this user");
    let member = community
        .join(conn, &CONFIG.timeline, &user)
        .expect("Couldn't join the community");
    info!(
        community_id = community.id,
        user_id = user.id,
        backfill_size = CONFIG.timeline.backfill_size,
        "member added from the CLI"
    );
    let access = if member.can_write() { "write" } else { "read" };
    println!("{} joined {} with {} access", user.username, community.name, access);
}

fn members<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let community = find(args, conn);
    let admins = community
        .list_admins(conn)
        .expect("Couldn't list the admins");
    for id in community
        .list_members(conn)
        .expect("Couldn't list the members")
    {
        let user = User::get(conn, id).expect("Couldn't load a member");
        let member = community
            .membership(conn, &user)
            .expect("Couldn't load a membership")
            .expect("Member disappeared while listing");
        let role = if admins.contains(&id) {
            format!("admin (level {})", member.admin_level.unwrap_or_default())
        } else if member.can_write() {
            String::from("writer")
        } else {
            String::from("reader")
        };
        let muted = if member.muted { ", muted" } else { "" };
        println!("{}\t{}{}", user.username, role, muted);
    }
}
