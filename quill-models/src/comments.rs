use crate::{
    content::{Content, ContentRef},
    posts::Post,
    schema::comments,
    timeline::fanout,
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub creation_date: NaiveDateTime,
}

impl NewComment {
    pub fn new(author: &User, post: &Post, content: &str) -> Self {
        NewComment {
            post_id: post.id,
            author_id: author.id,
            content: content.to_owned(),
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Comment {
    insert!(comments, NewComment);
    get!(comments);

    /// Withdraws the comment from every community and timeline, then deletes it.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        conn.transaction(|| {
            fanout::withdrawn(conn, self.content_ref())?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })
    }
}

impl Content for Comment {
    fn content_ref(&self) -> ContentRef {
        ContentRef::comment(self.id)
    }

    fn author_id(&self) -> i32 {
        self.author_id
    }

    fn creation_date(&self) -> NaiveDateTime {
        self.creation_date
    }
}
