use crate::{schema::community_members, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    self,
    backend::Backend,
    deserialize::{self, FromSql},
    dsl,
    serialize::{self, Output, ToSql},
    sql_types::Integer,
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl,
};
use std::convert::TryFrom;
use std::io::Write;

/// What a member may do with the community's blog line. Represented in
/// database as an integer
#[derive(Copy, Clone, Debug, PartialEq, Eq, AsExpression, FromSqlRow)]
#[sql_type = "Integer"]
pub enum AccessLevel {
    Read,
    Write,
}

impl TryFrom<i32> for AccessLevel {
    type Error = Error;

    fn try_from(i: i32) -> Result<Self> {
        match i {
            0 => Ok(AccessLevel::Read),
            1 => Ok(AccessLevel::Write),
            _ => Err(Error::InvalidValue),
        }
    }
}

impl From<AccessLevel> for i32 {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Read => 0,
            AccessLevel::Write => 1,
        }
    }
}

impl<DB> ToSql<Integer, DB> for AccessLevel
where
    DB: Backend,
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: Write>(&self, out: &mut Output<W, DB>) -> serialize::Result {
        <i32 as ToSql<Integer, DB>>::to_sql(&i32::from(*self), out)
    }
}

impl<DB> FromSql<Integer, DB> for AccessLevel
where
    DB: Backend,
    i32: FromSql<Integer, DB>,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let level = <i32 as FromSql<Integer, DB>>::from_sql(bytes)?;
        AccessLevel::try_from(level).map_err(|_| format!("invalid access level {}", level).into())
    }
}

/// The relation between one user and one community.
///
/// `admin_level` is set if and only if `is_admin` is: it ranks admins, the
/// owner being 0 and every promotion adding one to the level of the promoter.
#[derive(Clone, Debug, Queryable, Identifiable, AsChangeset)]
#[changeset_options(treat_none_as_null = "true")]
#[table_name = "community_members"]
pub struct CommunityMember {
    pub id: i32,
    pub community_id: i32,
    pub user_id: i32,
    pub access: AccessLevel,
    pub is_admin: bool,
    pub admin_level: Option<i32>,
    pub muted: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "community_members"]
pub struct NewCommunityMember {
    pub community_id: i32,
    pub user_id: i32,
    pub access: AccessLevel,
    pub is_admin: bool,
    pub admin_level: Option<i32>,
    pub muted: bool,
    pub creation_date: NaiveDateTime,
}

impl NewCommunityMember {
    pub fn owner(community_id: i32, user_id: i32) -> Self {
        NewCommunityMember {
            community_id,
            user_id,
            access: AccessLevel::Write,
            is_admin: true,
            admin_level: Some(0),
            muted: false,
            creation_date: Utc::now().naive_utc(),
        }
    }

    pub fn regular(community_id: i32, user_id: i32, access: AccessLevel) -> Self {
        NewCommunityMember {
            community_id,
            user_id,
            access,
            is_admin: false,
            admin_level: None,
            muted: false,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl CommunityMember {
    insert!(community_members, NewCommunityMember);
    get!(community_members);

    pub fn find(conn: &crate::Connection, community_id: i32, user_id: i32) -> Result<Option<Self>> {
        community_members::table
            .filter(community_members::community_id.eq(community_id))
            .filter(community_members::user_id.eq(user_id))
            .first(conn)
            .optional()
            .map_err(Error::from)
    }

    pub fn exists(conn: &crate::Connection, community_id: i32, user_id: i32) -> Result<bool> {
        dsl::select(dsl::exists(
            community_members::table
                .filter(community_members::community_id.eq(community_id))
                .filter(community_members::user_id.eq(user_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    /// IDs of the members of a community, in joining order
    pub fn member_ids(conn: &crate::Connection, community_id: i32) -> Result<Vec<i32>> {
        community_members::table
            .filter(community_members::community_id.eq(community_id))
            .order(community_members::id.asc())
            .select(community_members::user_id)
            .load(conn)
            .map_err(Error::from)
    }

    pub fn writer_ids(conn: &crate::Connection, community_id: i32) -> Result<Vec<i32>> {
        community_members::table
            .filter(community_members::community_id.eq(community_id))
            .filter(community_members::access.eq(AccessLevel::Write))
            .order(community_members::id.asc())
            .select(community_members::user_id)
            .load(conn)
            .map_err(Error::from)
    }

    /// IDs of the admins of a community, most senior first
    pub fn admin_ids(conn: &crate::Connection, community_id: i32) -> Result<Vec<i32>> {
        community_members::table
            .filter(community_members::community_id.eq(community_id))
            .filter(community_members::is_admin.eq(true))
            .order((
                community_members::admin_level.asc(),
                community_members::id.asc(),
            ))
            .select(community_members::user_id)
            .load(conn)
            .map_err(Error::from)
    }

    /// Changes the access level of several members at once.
    ///
    /// Every user must be a member, and admins always keep write access.
    pub fn set_access(
        conn: &crate::Connection,
        community_id: i32,
        user_ids: &[i32],
        access: AccessLevel,
    ) -> Result<()> {
        let members = community_members::table
            .filter(community_members::community_id.eq(community_id))
            .filter(community_members::user_id.eq_any(user_ids))
            .load::<Self>(conn)?;
        if members.len() != user_ids.len() {
            return Err(Error::ArityMismatch {
                expected: user_ids.len(),
                found: members.len(),
            });
        }
        if access == AccessLevel::Read && members.iter().any(|m| m.is_admin) {
            return Err(Error::CannotDowngradeAdmin);
        }

        diesel::update(
            community_members::table
                .filter(community_members::id.eq_any(members.iter().map(|m| m.id))),
        )
        .set(community_members::access.eq(access))
        .execute(conn)?;
        Ok(())
    }

    pub fn update(&self, conn: &crate::Connection) -> Result<()> {
        diesel::update(self).set(self).execute(conn)?;
        Ok(())
    }

    pub fn delete(&self, conn: &crate::Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }

    pub fn delete_for_community(conn: &crate::Connection, community_id: i32) -> Result<usize> {
        diesel::delete(
            community_members::table.filter(community_members::community_id.eq(community_id)),
        )
        .execute(conn)
        .map_err(Error::from)
    }

    pub fn is_owner(&self) -> bool {
        self.admin_level == Some(0)
    }

    pub fn can_write(&self) -> bool {
        self.access == AccessLevel::Write
    }
}
