//! Keeps timelines in sync with placements and memberships.
//!
//! Each function here is called by the operation that changed who can see
//! what, inside that operation's transaction, and is safe to run more than
//! once for the same change.

use super::TimelineEntry;
use crate::{
    community_members::CommunityMember,
    config::TimelineConfig,
    content::{Content, ContentRef},
    placements::Placement,
    Connection, Result,
};
use chrono::Utc;
use std::collections::HashSet;
use tracing::debug;

/// Content was attached to a community: whoever already sees it now also sees
/// it through this community, and every other member but the author gets a
/// fresh entry.
pub(crate) fn placed(
    conn: &Connection,
    community_id: i32,
    content: ContentRef,
    author_id: i32,
) -> Result<usize> {
    let mut served = HashSet::new();
    served.insert(author_id);
    for entry in TimelineEntry::list_for_content(conn, content)? {
        entry.add_source(conn, community_id)?;
        served.insert(entry.user_id);
    }

    let now = Utc::now().naive_utc();
    let mut delivered = 0;
    for member in CommunityMember::member_ids(conn, community_id)? {
        if served.insert(member) {
            TimelineEntry::deliver(conn, member, content, community_id, now)?;
            delivered += 1;
        }
    }
    debug!(community_id, content_id = content.id, delivered, "content placed");
    Ok(delivered)
}

/// Content was detached from a community.
pub(crate) fn unplaced(conn: &Connection, community_id: i32, content: ContentRef) -> Result<()> {
    for entry in TimelineEntry::with_source_for_content(conn, community_id, content)? {
        entry.remove_source(conn, community_id)?;
    }
    Ok(())
}

/// Someone joined a community: the latest content of its blog line is copied
/// into their timeline, dated from when it was placed.
pub(crate) fn joined(
    conn: &Connection,
    config: &TimelineConfig,
    community_id: i32,
    user_id: i32,
) -> Result<usize> {
    let mut backfilled = 0;
    for placement in Placement::latest(conn, community_id, config.backfill_size)? {
        let content = placement.content().resolve(conn)?;
        if content.author_id() == user_id {
            continue;
        }
        TimelineEntry::deliver(
            conn,
            user_id,
            content.content_ref(),
            community_id,
            placement.creation_date,
        )?;
        backfilled += 1;
    }
    debug!(community_id, user_id, backfilled, "timeline backfilled");
    Ok(backfilled)
}

/// Someone left a community, or was removed from it.
pub(crate) fn left(conn: &Connection, community_id: i32, user_id: i32) -> Result<()> {
    for entry in TimelineEntry::with_source_for_user(conn, community_id, user_id)? {
        entry.remove_source(conn, community_id)?;
    }
    Ok(())
}

/// A community is going away: it stops being a source for anyone.
pub(crate) fn dissolved(conn: &Connection, community_id: i32) -> Result<()> {
    for entry in TimelineEntry::with_source(conn, community_id)? {
        entry.remove_source(conn, community_id)?;
    }
    Ok(())
}

/// Content is being deleted: it leaves every community it was attached to.
pub(crate) fn withdrawn(conn: &Connection, content: ContentRef) -> Result<()> {
    for placement in Placement::list_for_content(conn, content)? {
        unplaced(conn, placement.community_id, content)?;
        placement.delete(conn)?;
    }
    Ok(())
}
