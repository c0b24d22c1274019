use crate::{
    communities::Community,
    content::ResolvedContent,
    schema::{communities, community_members, users},
    timeline::TimelineEntry,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// Someone using the platform. Only the identity matters to communities, the
/// rest of the profile belongs to the surrounding application.
#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub creation_date: NaiveDateTime,
}

impl NewUser {
    pub fn new(username: &str, display_name: &str) -> Self {
        NewUser {
            username: username.to_owned(),
            display_name: display_name.to_owned(),
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl User {
    insert!(users, NewUser);
    get!(users);
    find_by!(users, find_by_name, username as &str);

    /// Communities this user is a member of
    pub fn communities(&self, conn: &Connection) -> Result<Vec<Community>> {
        let ids = community_members::table
            .filter(community_members::user_id.eq(self.id))
            .select(community_members::community_id);
        communities::table
            .filter(communities::id.eq_any(ids))
            .order(communities::id.asc())
            .load::<Community>(conn)
            .map_err(Error::from)
    }

    /// A page of this user's timeline, newest first, starting after the entry
    /// `before` if it is given.
    pub fn timeline(
        &self,
        conn: &Connection,
        before: Option<i32>,
        limit: i64,
    ) -> Result<Vec<(TimelineEntry, ResolvedContent)>> {
        TimelineEntry::page_for_user(conn, self.id, before, limit)?
            .into_iter()
            .map(|entry| {
                let content = entry.content().resolve(conn)?;
                Ok((entry, content))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::db;
    use diesel::Connection;

    /// owner, alice, bob, carol, dave
    pub(crate) fn fill_database(conn: &crate::Connection) -> Vec<User> {
        ["owner", "alice", "bob", "carol", "dave"]
            .iter()
            .map(|name| User::insert(conn, NewUser::new(name, &name.to_uppercase())).unwrap())
            .collect()
    }

    #[test]
    fn find_by_name() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(conn);
            let bob = User::find_by_name(conn, "bob").unwrap();
            assert_eq!(bob, users[2]);
            assert_eq!(bob.display_name, "BOB");
            assert!(User::find_by_name(conn, "eve").is_err());
            Ok(())
        });
    }
}
