use crate::{
    content::{ContentKind, ContentRef},
    schema::placements,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};

/// A post or a comment shown in the blog line of a community.
#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Placement {
    pub id: i32,
    pub community_id: i32,
    pub content_kind: ContentKind,
    pub content_id: i32,
    pub is_reblog: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "placements"]
pub struct NewPlacement {
    pub community_id: i32,
    pub content_kind: ContentKind,
    pub content_id: i32,
    pub is_reblog: bool,
    pub creation_date: NaiveDateTime,
}

impl NewPlacement {
    pub fn new(community_id: i32, content: ContentRef, is_reblog: bool) -> Self {
        NewPlacement {
            community_id,
            content_kind: content.kind,
            content_id: content.id,
            is_reblog,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Placement {
    insert!(placements, NewPlacement);
    get!(placements);

    pub fn content(&self) -> ContentRef {
        ContentRef {
            kind: self.content_kind,
            id: self.content_id,
        }
    }

    pub fn find(conn: &Connection, community_id: i32, content: ContentRef) -> Result<Option<Self>> {
        placements::table
            .filter(placements::community_id.eq(community_id))
            .filter(placements::content_kind.eq(content.kind))
            .filter(placements::content_id.eq(content.id))
            .first(conn)
            .optional()
            .map_err(Error::from)
    }

    /// Attaches content to a community, now.
    pub fn record(
        conn: &Connection,
        community_id: i32,
        content: ContentRef,
        is_reblog: bool,
    ) -> Result<Self> {
        if Self::find(conn, community_id, content)?.is_some() {
            return Err(Error::AlreadyAttached);
        }
        Self::insert(conn, NewPlacement::new(community_id, content, is_reblog))
    }

    /// Detaches content from a community, returning the placement that was removed.
    pub fn remove(conn: &Connection, community_id: i32, content: ContentRef) -> Result<Self> {
        let placement = Self::find(conn, community_id, content)?.ok_or(Error::NotAttached)?;
        placement.delete(conn)?;
        Ok(placement)
    }

    /// The communities some content is attached to, in attachment order
    pub fn communities_of(conn: &Connection, content: ContentRef) -> Result<Vec<i32>> {
        placements::table
            .filter(placements::content_kind.eq(content.kind))
            .filter(placements::content_id.eq(content.id))
            .order(placements::id.asc())
            .select(placements::community_id)
            .load(conn)
            .map_err(Error::from)
    }

    pub fn list_for_content(conn: &Connection, content: ContentRef) -> Result<Vec<Self>> {
        placements::table
            .filter(placements::content_kind.eq(content.kind))
            .filter(placements::content_id.eq(content.id))
            .order(placements::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    /// The `limit` most recent placements of a community
    pub fn latest(conn: &Connection, community_id: i32, limit: i64) -> Result<Vec<Self>> {
        placements::table
            .filter(placements::community_id.eq(community_id))
            .order((placements::creation_date.desc(), placements::id.desc()))
            .limit(limit)
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    /// Up to `limit` placements of a community that are older than `cursor`,
    /// most recent first.
    pub fn page(conn: &Connection, community_id: i32, cursor: &Placement, limit: i64) -> Result<Vec<Self>> {
        placements::table
            .filter(placements::community_id.eq(community_id))
            .filter(
                placements::creation_date.lt(cursor.creation_date).or(placements::creation_date
                    .eq(cursor.creation_date)
                    .and(placements::id.lt(cursor.id))),
            )
            .order((placements::creation_date.desc(), placements::id.desc()))
            .limit(limit)
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }

    pub fn delete_for_community(conn: &Connection, community_id: i32) -> Result<usize> {
        diesel::delete(placements::table.filter(placements::community_id.eq(community_id)))
            .execute(conn)
            .map_err(Error::from)
    }
}
