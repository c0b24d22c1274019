//! Reading the blog line of a community.

use crate::{
    content::ResolvedContent, placements::Placement, users::User, Connection, Error, Result,
};

/// What a user has already done with a post.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewerFlags {
    pub reblogged: bool,
    pub favorited: bool,
}

/// One element of a blog line.
#[derive(Clone, Debug)]
pub struct LineItem {
    pub placement_id: i32,
    pub is_reblog: bool,
    pub content: ResolvedContent,
    /// Only set for posts, when the line is read by someone
    pub viewer: Option<ViewerFlags>,
}

/// A page of a blog line.
///
/// The placements are fetched when the page is created, the content they
/// point to is only loaded while iterating. Iterating again after
/// [`Blogline::rewind`] yields the same items.
#[derive(Clone)]
pub struct Blogline<'a> {
    conn: &'a Connection,
    viewer: Option<&'a User>,
    placements: Vec<Placement>,
    position: usize,
}

impl<'a> Blogline<'a> {
    /// Fetches up to `limit` placements of a community, older than the
    /// placement `cursor` if it is given, most recent first.
    pub fn fetch(
        conn: &'a Connection,
        community_id: i32,
        cursor: Option<i32>,
        limit: i64,
        viewer: Option<&'a User>,
    ) -> Result<Self> {
        let placements = match cursor {
            Some(cursor) => {
                let cursor = Placement::get(conn, cursor)?;
                if cursor.community_id != community_id {
                    return Err(Error::NotFound);
                }
                Placement::page(conn, community_id, &cursor, limit)?
            }
            None => Placement::latest(conn, community_id, limit)?,
        };
        Ok(Blogline {
            conn,
            viewer,
            placements,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// The cursor to pass to get the next page
    pub fn next_cursor(&self) -> Option<i32> {
        self.placements.last().map(|p| p.id)
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    fn resolve(&self, placement: &Placement) -> Result<LineItem> {
        let content = placement.content().resolve(self.conn)?;
        let viewer = match (self.viewer, content.as_post()) {
            (Some(user), Some(post)) => Some(ViewerFlags {
                reblogged: post.is_reshared_by(self.conn, user)?,
                favorited: post.is_liked_by(self.conn, user)?,
            }),
            _ => None,
        };
        Ok(LineItem {
            placement_id: placement.id,
            is_reblog: placement.is_reblog,
            content,
            viewer,
        })
    }
}

impl<'a> Iterator for Blogline<'a> {
    type Item = Result<LineItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.position;
        if index >= self.placements.len() {
            return None;
        }
        self.position += 1;
        Some(self.resolve(&self.placements[index]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.placements.len() - self.position;
        (left, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comments::{Comment, NewComment},
        communities::tests::fill_database,
        content::Content,
        likes::{Like, NewLike},
        posts::tests::new_post,
        tests::db,
    };
    use diesel::Connection;

    #[test]
    fn pages() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            let posts = (0..5)
                .map(|i| {
                    let post = new_post(conn, &users[1], &format!("Post {}", i));
                    community.attach(conn, &users[1], &post).unwrap();
                    post
                })
                .collect::<Vec<_>>();

            let mut page = community.blogline(conn, None, 3, None).unwrap();
            assert_eq!(page.len(), 3);
            let ids = page
                .by_ref()
                .map(|item| item.unwrap().content.content_ref().id)
                .collect::<Vec<_>>();
            assert_eq!(ids, vec![posts[4].id, posts[3].id, posts[2].id]);
            assert!(page.next().is_none());

            page.rewind();
            assert_eq!(page.count(), 3);

            let cursor = community
                .blogline(conn, None, 3, None)
                .unwrap()
                .next_cursor();
            let rest = community
                .blogline(conn, cursor, 3, None)
                .unwrap()
                .map(|item| item.unwrap().content.content_ref().id)
                .collect::<Vec<_>>();
            assert_eq!(rest, vec![posts[1].id, posts[0].id]);

            let oldest = Placement::find(conn, community.id, posts[0].content_ref())
                .unwrap()
                .unwrap();
            assert!(community
                .blogline(conn, Some(oldest.id), 3, None)
                .unwrap()
                .is_empty());
            Ok(())
        });
    }

    #[test]
    fn viewer_flags() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Hello");
            community.attach(conn, &users[1], &post).unwrap();
            let comment = Comment::insert(conn, NewComment::new(&users[2], &post, "Hi")).unwrap();
            community.attach(conn, &users[2], &comment).unwrap();
            Like::insert(conn, NewLike::new(&users[2], &post)).unwrap();

            let items = community
                .blogline(conn, None, 10, Some(&users[2]))
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert_eq!(items.len(), 2);
            assert!(items[0].content.as_comment().is_some());
            assert!(items[0].viewer.is_none());
            assert_eq!(
                items[1].viewer,
                Some(ViewerFlags {
                    reblogged: false,
                    favorited: true,
                })
            );
            assert!(!items[1].is_reblog);

            let anonymous = community
                .blogline(conn, None, 10, None)
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert!(anonymous.iter().all(|item| item.viewer.is_none()));
            Ok(())
        });
    }

    #[test]
    fn reblogs() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let post = new_post(conn, &users[3], "Elsewhere");
            let placement = Placement::record(conn, communities[0].id, post.content_ref(), true).unwrap();

            let item = communities[0]
                .blogline(conn, None, 10, None)
                .unwrap()
                .next()
                .unwrap()
                .unwrap();
            assert_eq!(item.placement_id, placement.id);
            assert!(item.is_reblog);

            assert!(matches!(
                communities[1].blogline(conn, Some(placement.id), 10, None),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }
}
