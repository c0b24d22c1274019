use crate::{
    comments::Comment,
    content::{Content, ContentRef},
    schema::{comments, likes, posts, reshares},
    timeline::fanout,
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub creation_date: NaiveDateTime,
}

impl NewPost {
    pub fn new(author: &User, title: &str, content: &str) -> Self {
        NewPost {
            author_id: author.id,
            title: title.to_owned(),
            content: content.to_owned(),
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);
    list_by!(posts, list_by_author, author_id as i32);

    pub fn get_author(&self, conn: &Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_comments(&self, conn: &Connection) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(self.id))
            .order(comments::creation_date.asc())
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn is_reshared_by(&self, conn: &Connection, user: &User) -> Result<bool> {
        reshares::table
            .filter(reshares::post_id.eq(self.id))
            .filter(reshares::user_id.eq(user.id))
            .count()
            .get_result::<i64>(conn)
            .map_err(Error::from)
            .map(|r| r > 0)
    }

    pub fn is_liked_by(&self, conn: &Connection, user: &User) -> Result<bool> {
        likes::table
            .filter(likes::post_id.eq(self.id))
            .filter(likes::user_id.eq(user.id))
            .count()
            .get_result::<i64>(conn)
            .map_err(Error::from)
            .map(|r| r > 0)
    }

    /// Withdraws the post and its comments from every community and timeline,
    /// then deletes it.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        conn.transaction(|| {
            for comment in self.get_comments(conn)? {
                comment.delete(conn)?;
            }
            fanout::withdrawn(conn, self.content_ref())?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })
    }
}

impl Content for Post {
    fn content_ref(&self) -> ContentRef {
        ContentRef::post(self.id)
    }

    fn author_id(&self) -> i32 {
        self.author_id
    }

    fn creation_date(&self) -> NaiveDateTime {
        self.creation_date
    }
}
