//! Requests to join a private community, waiting for an admin to answer them.

use crate::{schema::invitation_requests, Connection, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct InvitationRequest {
    pub id: i32,
    pub community_id: i32,
    pub user_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "invitation_requests"]
pub struct NewInvitationRequest {
    pub community_id: i32,
    pub user_id: i32,
    pub creation_date: NaiveDateTime,
}

impl NewInvitationRequest {
    pub fn new(community_id: i32, user_id: i32) -> Self {
        NewInvitationRequest {
            community_id,
            user_id,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl InvitationRequest {
    insert!(invitation_requests, NewInvitationRequest);
    get!(invitation_requests);

    pub fn find(conn: &Connection, community_id: i32, user_id: i32) -> Result<Option<Self>> {
        invitation_requests::table
            .filter(invitation_requests::community_id.eq(community_id))
            .filter(invitation_requests::user_id.eq(user_id))
            .first(conn)
            .optional()
            .map_err(Error::from)
    }

    pub fn exists(conn: &Connection, community_id: i32, user_id: i32) -> Result<bool> {
        dsl::select(dsl::exists(
            invitation_requests::table
                .filter(invitation_requests::community_id.eq(community_id))
                .filter(invitation_requests::user_id.eq(user_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }

    pub fn delete_for_community(conn: &Connection, community_id: i32) -> Result<usize> {
        diesel::delete(invitation_requests::table.filter(invitation_requests::community_id.eq(community_id)))
            .execute(conn)
            .map_err(Error::from)
    }
}
