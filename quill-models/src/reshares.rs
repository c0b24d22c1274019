use crate::{posts::Post, schema::reshares, users::User, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// A user sharing a post again with their own audience.
#[derive(Clone, Queryable, Identifiable)]
pub struct Reshare {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "reshares"]
pub struct NewReshare {
    pub user_id: i32,
    pub post_id: i32,
    pub creation_date: NaiveDateTime,
}

impl NewReshare {
    pub fn new(user: &User, post: &Post) -> Self {
        NewReshare {
            user_id: user.id,
            post_id: post.id,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Reshare {
    insert!(reshares, NewReshare);
    get!(reshares);
    find_by!(reshares, find_by_user_on_post, user_id as i32, post_id as i32);

    pub fn delete(&self, conn: &crate::Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Ok(())
    }
}
