//! What can be placed in a community: posts and comments.
//!
//! Both are records owned by the surrounding application. The engine only
//! needs to know who wrote them, when, and which communities they are attached
//! to, which is what the [`Content`] trait exposes.

use crate::{
    comments::Comment, placements::Placement, posts::Post, Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{
    backend::Backend,
    deserialize::{self, FromSql},
    serialize::{self, Output, ToSql},
    sql_types::Integer,
};
use std::convert::TryFrom;
use std::io::Write;

/// Represented in database as an integer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[sql_type = "Integer"]
pub enum ContentKind {
    Post,
    Comment,
}

impl TryFrom<i32> for ContentKind {
    type Error = Error;

    fn try_from(i: i32) -> Result<Self> {
        match i {
            0 => Ok(ContentKind::Post),
            1 => Ok(ContentKind::Comment),
            _ => Err(Error::InvalidValue),
        }
    }
}

impl From<ContentKind> for i32 {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Post => 0,
            ContentKind::Comment => 1,
        }
    }
}

impl<DB> ToSql<Integer, DB> for ContentKind
where
    DB: Backend,
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: Write>(&self, out: &mut Output<W, DB>) -> serialize::Result {
        <i32 as ToSql<Integer, DB>>::to_sql(&i32::from(*self), out)
    }
}

impl<DB> FromSql<Integer, DB> for ContentKind
where
    DB: Backend,
    i32: FromSql<Integer, DB>,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let kind = <i32 as FromSql<Integer, DB>>::from_sql(bytes)?;
        ContentKind::try_from(kind).map_err(|_| format!("invalid content kind {}", kind).into())
    }
}

/// Identifies one post or comment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i32,
}

impl ContentRef {
    pub fn post(id: i32) -> Self {
        ContentRef {
            kind: ContentKind::Post,
            id,
        }
    }

    pub fn comment(id: i32) -> Self {
        ContentRef {
            kind: ContentKind::Comment,
            id,
        }
    }

    pub fn resolve(self, conn: &Connection) -> Result<ResolvedContent> {
        ResolvedContent::resolve(conn, self)
    }
}

/// The narrow view the engine has of a post or a comment.
pub trait Content {
    fn content_ref(&self) -> ContentRef;

    fn author_id(&self) -> i32;

    fn creation_date(&self) -> NaiveDateTime;

    /// Communities this item is attached to, in the order it was attached to them
    fn communities(&self, conn: &Connection) -> Result<Vec<i32>> {
        Placement::communities_of(conn, self.content_ref())
    }
}

/// A placement or timeline entry turned back into the record it points to.
#[derive(Clone, Debug)]
pub enum ResolvedContent {
    Post(Post),
    Comment(Comment),
}

impl ResolvedContent {
    pub fn resolve(conn: &Connection, content: ContentRef) -> Result<Self> {
        match content.kind {
            ContentKind::Post => Post::get(conn, content.id).map(ResolvedContent::Post),
            ContentKind::Comment => Comment::get(conn, content.id).map(ResolvedContent::Comment),
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            ResolvedContent::Post(post) => Some(post),
            ResolvedContent::Comment(_) => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            ResolvedContent::Comment(comment) => Some(comment),
            ResolvedContent::Post(_) => None,
        }
    }
}

impl Content for ResolvedContent {
    fn content_ref(&self) -> ContentRef {
        match self {
            ResolvedContent::Post(post) => post.content_ref(),
            ResolvedContent::Comment(comment) => comment.content_ref(),
        }
    }

    fn author_id(&self) -> i32 {
        match self {
            ResolvedContent::Post(post) => post.author_id,
            ResolvedContent::Comment(comment) => comment.author_id,
        }
    }

    fn creation_date(&self) -> NaiveDateTime {
        match self {
            ResolvedContent::Post(post) => post.creation_date,
            ResolvedContent::Comment(comment) => comment.creation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind() {
        for i in 0..2 {
            assert_eq!(i, i32::from(ContentKind::try_from(i).unwrap()));
        }
        assert!(ContentKind::try_from(2).is_err());
        assert!(ContentKind::try_from(-1).is_err());
    }
}
