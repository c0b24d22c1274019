use crate::{schema::community_bans, Connection, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct CommunityBan {
    pub id: i32,
    pub community_id: i32,
    pub user_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "community_bans"]
pub struct NewCommunityBan {
    pub community_id: i32,
    pub user_id: i32,
    pub creation_date: NaiveDateTime,
}

impl NewCommunityBan {
    pub fn new(community_id: i32, user_id: i32) -> Self {
        NewCommunityBan {
            community_id,
            user_id,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl CommunityBan {
    insert!(community_bans, NewCommunityBan);
    get!(community_bans);

    pub fn find(conn: &Connection, community_id: i32, user_id: i32) -> Result<Option<Self>> {
        community_bans::table
            .filter(community_bans::community_id.eq(community_id))
            .filter(community_bans::user_id.eq(user_id))
            .first(conn)
            .optional()
            .map_err(Error::from)
    }

    pub fn exists(conn: &Connection, community_id: i32, user_id: i32) -> Result<bool> {
        dsl::select(dsl::exists(
            community_bans::table
                .filter(community_bans::community_id.eq(community_id))
                .filter(community_bans::user_id.eq(user_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }

    pub fn delete_for_community(conn: &Connection, community_id: i32) -> Result<usize> {
        diesel::delete(community_bans::table.filter(community_bans::community_id.eq(community_id)))
            .execute(conn)
            .map_err(Error::from)
    }
}
