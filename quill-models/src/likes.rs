use crate::{posts::Post, schema::likes, users::User, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// A user marking a post as a favorite.
#[derive(Clone, Queryable, Identifiable)]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "likes"]
pub struct NewLike {
    pub user_id: i32,
    pub post_id: i32,
    pub creation_date: NaiveDateTime,
}

impl NewLike {
    pub fn new(user: &User, post: &Post) -> Self {
        NewLike {
            user_id: user.id,
            post_id: post.id,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Like {
    insert!(likes, NewLike);
    get!(likes);
    find_by!(likes, find_by_user_on_post, user_id as i32, post_id as i32);

    pub fn delete(&self, conn: &crate::Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }
}
