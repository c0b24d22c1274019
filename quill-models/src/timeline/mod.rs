//! Per-user timelines.
//!
//! A timeline entry means "this user sees this content". Each entry keeps the
//! set of communities it came from, its provenance, in the
//! `timeline_entry_sources` table. An entry never has an empty provenance:
//! removing the last source deletes the entry. The `has_many_sources` flag is
//! only ever written by [`TimelineEntry::sync_flag`].
//!
//! The rules deciding when entries appear and disappear live in [`fanout`].

use crate::{
    content::{ContentKind, ContentRef},
    schema::{timeline_entries, timeline_entry_sources},
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{
    self, dsl, BoolExpressionMethods, Connection as _, ExpressionMethods, OptionalExtension,
    QueryDsl, RunQueryDsl,
};
use std::{collections::BTreeSet, iter::FromIterator};
use tracing::warn;

pub mod fanout;

#[derive(Queryable, Identifiable, Clone, Debug)]
#[table_name = "timeline_entries"]
pub struct TimelineEntry {
    pub id: i32,
    pub user_id: i32,
    pub content_kind: ContentKind,
    pub content_id: i32,
    pub has_many_sources: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "timeline_entries"]
pub struct NewTimelineEntry {
    pub user_id: i32,
    pub content_kind: ContentKind,
    pub content_id: i32,
    pub has_many_sources: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "timeline_entry_sources"]
struct NewEntrySource {
    entry_id: i32,
    community_id: i32,
}

/// The communities through which an entry reached its owner.
#[derive(Shrinkwrap, Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance(BTreeSet<i32>);

impl Provenance {
    pub fn is_multi_source(&self) -> bool {
        self.0.len() >= 2
    }
}

impl FromIterator<i32> for Provenance {
    fn from_iter<I: IntoIterator<Item = i32>>(ids: I) -> Self {
        Provenance(ids.into_iter().collect())
    }
}

impl TimelineEntry {
    insert!(timeline_entries, NewTimelineEntry);
    get!(timeline_entries);
    list_by!(timeline_entries, list_for_user, user_id as i32);

    pub fn content(&self) -> ContentRef {
        ContentRef {
            kind: self.content_kind,
            id: self.content_id,
        }
    }

    pub fn find(conn: &Connection, user_id: i32, content: ContentRef) -> Result<Option<Self>> {
        timeline_entries::table
            .filter(timeline_entries::user_id.eq(user_id))
            .filter(timeline_entries::content_kind.eq(content.kind))
            .filter(timeline_entries::content_id.eq(content.id))
            .first(conn)
            .optional()
            .map_err(Error::from)
    }

    pub fn list_for_content(conn: &Connection, content: ContentRef) -> Result<Vec<Self>> {
        timeline_entries::table
            .filter(timeline_entries::content_kind.eq(content.kind))
            .filter(timeline_entries::content_id.eq(content.id))
            .order(timeline_entries::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    /// Entries of a user, most recent first. When `before` is the ID of one
    /// of them, only older entries are returned.
    pub fn page_for_user(
        conn: &Connection,
        user_id: i32,
        before: Option<i32>,
        limit: i64,
    ) -> Result<Vec<Self>> {
        let mut query = timeline_entries::table
            .filter(timeline_entries::user_id.eq(user_id))
            .order((
                timeline_entries::creation_date.desc(),
                timeline_entries::id.desc(),
            ))
            .limit(limit)
            .into_boxed();
        if let Some(cursor) = before {
            let cursor = Self::get(conn, cursor)?;
            query = query.filter(
                timeline_entries::creation_date
                    .lt(cursor.creation_date)
                    .or(timeline_entries::creation_date
                        .eq(cursor.creation_date)
                        .and(timeline_entries::id.lt(cursor.id))),
            );
        }
        query.load::<Self>(conn).map_err(Error::from)
    }

    /// Every entry that came through a community
    pub fn with_source(conn: &Connection, community_id: i32) -> Result<Vec<Self>> {
        let ids = timeline_entry_sources::table
            .filter(timeline_entry_sources::community_id.eq(community_id))
            .select(timeline_entry_sources::entry_id);
        timeline_entries::table
            .filter(timeline_entries::id.eq_any(ids))
            .order(timeline_entries::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    pub fn with_source_for_user(
        conn: &Connection,
        community_id: i32,
        user_id: i32,
    ) -> Result<Vec<Self>> {
        let ids = timeline_entry_sources::table
            .filter(timeline_entry_sources::community_id.eq(community_id))
            .select(timeline_entry_sources::entry_id);
        timeline_entries::table
            .filter(timeline_entries::user_id.eq(user_id))
            .filter(timeline_entries::id.eq_any(ids))
            .order(timeline_entries::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    pub fn with_source_for_content(
        conn: &Connection,
        community_id: i32,
        content: ContentRef,
    ) -> Result<Vec<Self>> {
        let ids = timeline_entry_sources::table
            .filter(timeline_entry_sources::community_id.eq(community_id))
            .select(timeline_entry_sources::entry_id);
        timeline_entries::table
            .filter(timeline_entries::content_kind.eq(content.kind))
            .filter(timeline_entries::content_id.eq(content.id))
            .filter(timeline_entries::id.eq_any(ids))
            .order(timeline_entries::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    pub fn provenance(&self, conn: &Connection) -> Result<Provenance> {
        timeline_entry_sources::table
            .filter(timeline_entry_sources::entry_id.eq(self.id))
            .select(timeline_entry_sources::community_id)
            .load::<i32>(conn)
            .map(|ids| ids.into_iter().collect())
            .map_err(Error::from)
    }

    pub fn has_source(&self, conn: &Connection, community_id: i32) -> Result<bool> {
        dsl::select(dsl::exists(
            timeline_entry_sources::table
                .filter(timeline_entry_sources::entry_id.eq(self.id))
                .filter(timeline_entry_sources::community_id.eq(community_id)),
        ))
        .get_result(conn)
        .map_err(Error::from)
    }

    fn count_sources(&self, conn: &Connection) -> Result<i64> {
        timeline_entry_sources::table
            .filter(timeline_entry_sources::entry_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    fn insert_source(&self, conn: &Connection, community_id: i32) -> Result<()> {
        diesel::insert_into(timeline_entry_sources::table)
            .values(NewEntrySource {
                entry_id: self.id,
                community_id,
            })
            .execute(conn)?;
        Ok(())
    }

    /// Makes `content` reach `user_id` through `community_id`: the existing
    /// entry gains a source, or a new one is created at `creation_date`.
    pub(crate) fn deliver(
        conn: &Connection,
        user_id: i32,
        content: ContentRef,
        community_id: i32,
        creation_date: NaiveDateTime,
    ) -> Result<Self> {
        match Self::find(conn, user_id, content)? {
            Some(entry) => entry.add_source(conn, community_id),
            None => Self::create(conn, user_id, content, community_id, creation_date),
        }
    }

    fn create(
        conn: &Connection,
        user_id: i32,
        content: ContentRef,
        community_id: i32,
        creation_date: NaiveDateTime,
    ) -> Result<Self> {
        let created = conn.transaction::<_, Error, _>(|| {
            let entry = Self::insert(
                conn,
                NewTimelineEntry {
                    user_id,
                    content_kind: content.kind,
                    content_id: content.id,
                    has_many_sources: false,
                    creation_date,
                },
            )?;
            entry.insert_source(conn, community_id)?;
            Ok(entry)
        });
        match created {
            Err(err) if err.is_unique_violation() => {
                warn!(
                    user_id,
                    content_id = content.id,
                    "timeline entry already exists, merging into it"
                );
                Self::find(conn, user_id, content)?
                    .ok_or(Error::NotFound)?
                    .add_source(conn, community_id)
            }
            created => created,
        }
    }

    /// Adds a community to the provenance, if it isn't there yet.
    pub fn add_source(&self, conn: &Connection, community_id: i32) -> Result<Self> {
        if !self.has_source(conn, community_id)? {
            self.insert_source(conn, community_id)?;
        }
        self.sync_flag(conn)
    }

    /// Removes a community from the provenance. Returns `None` if it was the
    /// last one, in which case the entry is deleted.
    pub fn remove_source(&self, conn: &Connection, community_id: i32) -> Result<Option<Self>> {
        diesel::delete(
            timeline_entry_sources::table
                .filter(timeline_entry_sources::entry_id.eq(self.id))
                .filter(timeline_entry_sources::community_id.eq(community_id)),
        )
        .execute(conn)?;
        if self.count_sources(conn)? == 0 {
            diesel::delete(self).execute(conn)?;
            return Ok(None);
        }
        self.sync_flag(conn).map(Some)
    }

    /// Recomputes `has_many_sources` from the stored provenance.
    pub fn sync_flag(&self, conn: &Connection) -> Result<Self> {
        let has_many_sources = self.count_sources(conn)? >= 2;
        if has_many_sources != self.has_many_sources {
            diesel::update(self)
                .set(timeline_entries::has_many_sources.eq(has_many_sources))
                .execute(conn)?;
        }
        Ok(TimelineEntry {
            has_many_sources,
            ..self.clone()
        })
    }
}
