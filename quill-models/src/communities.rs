use crate::{
    authority,
    blogline::Blogline,
    community_bans::{CommunityBan, NewCommunityBan},
    community_members::{AccessLevel, CommunityMember, NewCommunityMember},
    config::TimelineConfig,
    content::Content,
    invitation_requests::{InvitationRequest, NewInvitationRequest},
    placements::Placement,
    schema::{communities, invitation_requests},
    timeline::fanout,
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};
use tracing::{debug, info};

/// A group of users sharing a blog line.
///
/// Its owner is the member with admin level 0. They can't leave, be banned or
/// lose their admin rights.
#[derive(Queryable, Identifiable, Clone, Debug)]
#[table_name = "communities"]
pub struct Community {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub public: bool,
    pub default_access: AccessLevel,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "communities"]
pub struct NewCommunity {
    pub name: String,
    pub owner_id: i32,
    pub public: bool,
    pub default_access: AccessLevel,
    pub creation_date: NaiveDateTime,
}

impl NewCommunity {
    pub fn new(name: &str, owner: &User, public: bool, default_access: AccessLevel) -> Self {
        NewCommunity {
            name: name.to_owned(),
            owner_id: owner.id,
            public,
            default_access,
            creation_date: Utc::now().naive_utc(),
        }
    }
}

impl Community {
    get!(communities);
    find_by!(communities, find_by_name, name as &str);

    pub fn list(conn: &Connection) -> Result<Vec<Self>> {
        communities::table
            .order(communities::id.asc())
            .load::<Self>(conn)
            .map_err(Error::from)
    }

    /// Creates a community, with its owner as its first member.
    pub fn create(conn: &Connection, new: NewCommunity) -> Result<Self> {
        conn.transaction(|| {
            let name = new.name.clone();
            diesel::insert_into(communities::table)
                .values(new)
                .execute(conn)?;
            let community = Self::find_by_name(conn, &name)?;
            CommunityMember::insert(
                conn,
                NewCommunityMember::owner(community.id, community.owner_id),
            )?;
            info!(community_id = community.id, name = %community.name, "community created");
            Ok(community)
        })
    }

    /// Deletes the community and everything that belongs to it. Nobody's
    /// permission is checked.
    pub fn destroy(&self, conn: &Connection) -> Result<()> {
        conn.transaction(|| {
            let members = CommunityMember::delete_for_community(conn, self.id)?;
            fanout::dissolved(conn, self.id)?;
            Placement::delete_for_community(conn, self.id)?;
            CommunityBan::delete_for_community(conn, self.id)?;
            InvitationRequest::delete_for_community(conn, self.id)?;
            diesel::delete(self).execute(conn)?;
            info!(community_id = self.id, members, "community destroyed");
            Ok(())
        })
    }

    pub fn membership(&self, conn: &Connection, user: &User) -> Result<Option<CommunityMember>> {
        CommunityMember::find(conn, self.id, user.id)
    }

    /// Makes `user` a member with the current default access, and fills their
    /// timeline with the latest content of the community.
    pub fn join(
        &self,
        conn: &Connection,
        config: &TimelineConfig,
        user: &User,
    ) -> Result<CommunityMember> {
        conn.transaction(|| {
            if CommunityMember::exists(conn, self.id, user.id)? {
                return Err(Error::AlreadyMember);
            }
            if CommunityBan::exists(conn, self.id, user.id)? {
                return Err(Error::Banned);
            }
            if let Some(request) = InvitationRequest::find(conn, self.id, user.id)? {
                request.delete(conn)?;
            }
            let member = CommunityMember::insert(
                conn,
                NewCommunityMember::regular(self.id, user.id, self.default_access),
            )?;
            fanout::joined(conn, config, self.id, user.id)?;
            info!(community_id = self.id, user_id = user.id, "user joined");
            Ok(member)
        })
    }

    /// Removes `user` from the community. Without `admin`, the user is
    /// leaving on their own.
    pub fn leave(&self, conn: &Connection, user: &User, admin: Option<&User>) -> Result<()> {
        conn.transaction(|| {
            let subject = self.membership(conn, user)?.ok_or(Error::NotAMember)?;
            let actor = match admin {
                Some(admin) if admin.id != user.id => self.membership(conn, admin)?,
                _ => Some(subject.clone()),
            };
            authority::can_remove(actor.as_ref(), Some(&subject))?;

            subject.delete(conn)?;
            fanout::left(conn, self.id, user.id)?;
            info!(
                community_id = self.id,
                user_id = user.id,
                admin_id = ?admin.map(|a| a.id),
                "user left"
            );
            Ok(())
        })
    }

    pub fn set_default_access(&self, conn: &Connection, access: AccessLevel) -> Result<Self> {
        diesel::update(self)
            .set(communities::default_access.eq(access))
            .execute(conn)?;
        Ok(Community {
            default_access: access,
            ..self.clone()
        })
    }

    /// Changes the access level of several members at once: either all of
    /// them are updated, or none.
    pub fn set_access(&self, conn: &Connection, user_ids: &[i32], access: AccessLevel) -> Result<()> {
        conn.transaction(|| CommunityMember::set_access(conn, self.id, user_ids, access))
    }

    pub fn mute(&self, conn: &Connection, user: &User, admin: &User) -> Result<()> {
        conn.transaction(|| {
            let actor = self.membership(conn, admin)?;
            let subject = self.membership(conn, user)?;
            authority::can_mute(actor.as_ref(), subject.as_ref())?;

            let mut subject = subject.ok_or(Error::NotAMember)?;
            subject.muted = true;
            subject.update(conn)?;
            debug!(community_id = self.id, user_id = user.id, "user muted");
            Ok(())
        })
    }

    pub fn unmute(&self, conn: &Connection, user: &User, admin: &User) -> Result<()> {
        conn.transaction(|| {
            let actor = self.membership(conn, admin)?;
            let subject = self.membership(conn, user)?;
            authority::can_unmute(actor.as_ref(), subject.as_ref())?;

            let mut subject = subject.ok_or(Error::NotAMember)?;
            subject.muted = false;
            subject.update(conn)?;
            debug!(community_id = self.id, user_id = user.id, "user unmuted");
            Ok(())
        })
    }

    /// Makes `user` an admin, one level below `admin`. New admins are unmuted
    /// and can write.
    pub fn promote(&self, conn: &Connection, user: &User, admin: &User) -> Result<CommunityMember> {
        conn.transaction(|| {
            let actor = self.membership(conn, admin)?;
            let subject = self.membership(conn, user)?;
            let level = authority::can_promote(actor.as_ref(), subject.as_ref())?;

            let mut subject = subject.ok_or(Error::NotAMember)?;
            subject.is_admin = true;
            subject.admin_level = Some(level);
            subject.muted = false;
            subject.access = AccessLevel::Write;
            subject.update(conn)?;
            info!(community_id = self.id, user_id = user.id, level, "admin promoted");
            Ok(subject)
        })
    }

    pub fn demote(&self, conn: &Connection, user: &User, admin: &User) -> Result<CommunityMember> {
        conn.transaction(|| {
            let actor = self.membership(conn, admin)?;
            let subject = self.membership(conn, user)?;
            authority::can_demote(actor.as_ref(), subject.as_ref())?;

            let mut subject = subject.ok_or(Error::NotAMember)?;
            subject.is_admin = false;
            subject.admin_level = None;
            subject.update(conn)?;
            info!(community_id = self.id, user_id = user.id, "admin demoted");
            Ok(subject)
        })
    }

    pub fn has_member(&self, conn: &Connection, user: &User) -> Result<bool> {
        CommunityMember::exists(conn, self.id, user.id)
    }

    pub fn has_writer(&self, conn: &Connection, user: &User) -> Result<bool> {
        Ok(self
            .membership(conn, user)?
            .map_or(false, |m| m.can_write()))
    }

    pub fn has_admin(&self, conn: &Connection, user: &User) -> Result<bool> {
        Ok(self.membership(conn, user)?.map_or(false, |m| m.is_admin))
    }

    pub fn has_muted(&self, conn: &Connection, user: &User) -> Result<bool> {
        Ok(self.membership(conn, user)?.map_or(false, |m| m.muted))
    }

    pub fn has_banned(&self, conn: &Connection, user: &User) -> Result<bool> {
        CommunityBan::exists(conn, self.id, user.id)
    }

    pub fn admin_level_of(&self, conn: &Connection, user: &User) -> Result<i32> {
        let member = self.membership(conn, user)?.ok_or(Error::NotAMember)?;
        authority::acting_admin(Some(&member))
    }

    pub fn list_members(&self, conn: &Connection) -> Result<Vec<i32>> {
        CommunityMember::member_ids(conn, self.id)
    }

    pub fn list_writers(&self, conn: &Connection) -> Result<Vec<i32>> {
        CommunityMember::writer_ids(conn, self.id)
    }

    pub fn list_admins(&self, conn: &Connection) -> Result<Vec<i32>> {
        CommunityMember::admin_ids(conn, self.id)
    }

    /// Adds some content of `user` to the blog line, and to the timeline of
    /// every member.
    pub fn attach<C: Content>(&self, conn: &Connection, user: &User, content: &C) -> Result<Placement> {
        conn.transaction(|| {
            let actor = self.membership(conn, user)?;
            authority::can_attach(actor.as_ref(), content.author_id())?;

            let placement = Placement::record(conn, self.id, content.content_ref(), false)?;
            fanout::placed(conn, self.id, content.content_ref(), content.author_id())?;
            Ok(placement)
        })
    }

    /// Takes content out of the blog line. Timelines forget about it, unless
    /// it also reached them through another community.
    pub fn detach<C: Content>(&self, conn: &Connection, user: &User, content: &C) -> Result<Placement> {
        conn.transaction(|| {
            let actor = self.membership(conn, user)?;
            let author = CommunityMember::find(conn, self.id, content.author_id())?;
            authority::can_detach(actor.as_ref(), author.as_ref(), content.author_id())?;

            let placement = Placement::remove(conn, self.id, content.content_ref())?;
            fanout::unplaced(conn, self.id, content.content_ref())?;
            Ok(placement)
        })
    }

    /// Bans a member, or someone who asked to join. Members are removed from
    /// the community.
    pub fn ban(&self, conn: &Connection, user: &User, admin: &User) -> Result<CommunityBan> {
        conn.transaction(|| {
            let actor = self.membership(conn, admin)?;
            let subject = self.membership(conn, user)?;
            let request = InvitationRequest::find(conn, self.id, user.id)?;
            let banned = CommunityBan::exists(conn, self.id, user.id)?;
            authority::can_ban(actor.as_ref(), subject.as_ref(), request.is_some(), banned)?;

            if let Some(request) = request {
                request.delete(conn)?;
            }
            let ban = CommunityBan::insert(conn, NewCommunityBan::new(self.id, user.id))?;
            if subject.is_some() {
                self.leave(conn, user, Some(admin))?;
            }
            info!(community_id = self.id, user_id = user.id, admin_id = admin.id, "user banned");
            Ok(ban)
        })
    }

    /// Lifts a ban. The user has to join again.
    pub fn unban(&self, conn: &Connection, user: &User, admin: &User) -> Result<()> {
        conn.transaction(|| {
            authority::acting_admin(self.membership(conn, admin)?.as_ref())?;
            let ban = CommunityBan::find(conn, self.id, user.id)?.ok_or(Error::NotBanned)?;
            ban.delete(conn)?;
            info!(community_id = self.id, user_id = user.id, "user unbanned");
            Ok(())
        })
    }

    fn check_private(&self) -> Result<()> {
        if self.public {
            Err(Error::InvitationsNotSupported)
        } else {
            Ok(())
        }
    }

    pub fn create_invitation_request(&self, conn: &Connection, user: &User) -> Result<InvitationRequest> {
        self.check_private()?;
        conn.transaction(|| {
            if CommunityBan::exists(conn, self.id, user.id)? {
                return Err(Error::Banned);
            }
            if self.has_member(conn, user)? {
                return Err(Error::AlreadyMember);
            }
            if InvitationRequest::exists(conn, self.id, user.id)? {
                return Err(Error::InvitationAlreadyExists);
            }
            InvitationRequest::insert(conn, NewInvitationRequest::new(self.id, user.id))
        })
    }

    /// Lets someone who asked for it join the community.
    pub fn accept_invitation_request(
        &self,
        conn: &Connection,
        config: &TimelineConfig,
        user: &User,
        admin: &User,
    ) -> Result<CommunityMember> {
        self.check_private()?;
        conn.transaction(|| {
            authority::acting_admin(self.membership(conn, admin)?.as_ref())?;
            if self.has_member(conn, user)? {
                return Err(Error::AlreadyMember);
            }
            if !InvitationRequest::exists(conn, self.id, user.id)? {
                return Err(Error::NoSuchInvitation);
            }
            self.join(conn, config, user)
        })
    }

    pub fn reject_invitation_request(&self, conn: &Connection, user: &User, admin: &User) -> Result<()> {
        self.check_private()?;
        conn.transaction(|| {
            let request =
                InvitationRequest::find(conn, self.id, user.id)?.ok_or(Error::NoSuchInvitation)?;
            authority::acting_admin(self.membership(conn, admin)?.as_ref())?;
            request.delete(conn)
        })
    }

    pub fn has_invitation_request(&self, conn: &Connection, user: &User) -> Result<bool> {
        self.check_private()?;
        InvitationRequest::exists(conn, self.id, user.id)
    }

    /// Users waiting for an answer, oldest request first
    pub fn list_invitation_requests(&self, conn: &Connection) -> Result<Vec<i32>> {
        self.check_private()?;
        invitation_requests::table
            .filter(invitation_requests::community_id.eq(self.id))
            .order(invitation_requests::id.asc())
            .select(invitation_requests::user_id)
            .load(conn)
            .map_err(Error::from)
    }

    /// Reads the blog line, most recent first, starting after the placement
    /// `cursor` if it is given.
    pub fn blogline<'a>(
        &self,
        conn: &'a Connection,
        cursor: Option<i32>,
        limit: i64,
        viewer: Option<&'a User>,
    ) -> Result<Blogline<'a>> {
        Blogline::fetch(conn, self.id, cursor, limit, viewer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        comments::{Comment, NewComment},
        posts::tests::new_post,
        tests::db,
        timeline::{tests::assert_consistent, TimelineEntry},
        users::tests as user_tests,
    };
    use diesel::Connection;

    pub(crate) fn new_community(conn: &crate::Connection, owner: &User, name: &str, public: bool) -> Community {
        Community::create(conn, NewCommunity::new(name, owner, public, AccessLevel::Write)).unwrap()
    }

    /// A public community owned by `owner` where alice and bob are members,
    /// and a private one owned by `owner` too, without members.
    pub(crate) fn fill_database(conn: &crate::Connection) -> (Vec<User>, Vec<Community>) {
        let users = user_tests::fill_database(conn);
        let config = TimelineConfig::default();
        let public = new_community(conn, &users[0], "public", true);
        public.join(conn, &config, &users[1]).unwrap();
        public.join(conn, &config, &users[2]).unwrap();
        let private = new_community(conn, &users[0], "private", false);
        (users, vec![public, private])
    }

    #[test]
    fn create_and_join() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(conn);
            let config = TimelineConfig::default();
            let community = new_community(conn, &users[0], "scenario-a", true);

            assert_eq!(community.list_admins(conn).unwrap(), vec![users[0].id]);
            assert_eq!(community.admin_level_of(conn, &users[0]).unwrap(), 0);
            assert!(community.has_writer(conn, &users[0]).unwrap());

            let member = community.join(conn, &config, &users[1]).unwrap();
            assert_eq!(member.access, AccessLevel::Write);
            assert!(!member.is_admin);
            assert!(community.has_member(conn, &users[1]).unwrap());
            assert!(TimelineEntry::list_for_user(conn, users[1].id)
                .unwrap()
                .is_empty());
            assert!(matches!(
                community.join(conn, &config, &users[1]),
                Err(Error::AlreadyMember)
            ));
            assert_eq!(
                community.list_members(conn).unwrap(),
                vec![users[0].id, users[1].id]
            );
            assert_eq!(users[1].communities(conn).unwrap().len(), 1);
            Ok(())
        });
    }

    #[test]
    fn default_access() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let community = communities[0].set_default_access(conn, AccessLevel::Read).unwrap();
            assert_eq!(
                Community::get(conn, community.id).unwrap().default_access,
                AccessLevel::Read
            );

            community.join(conn, &config, &users[3]).unwrap();
            assert!(community.has_member(conn, &users[3]).unwrap());
            assert!(!community.has_writer(conn, &users[3]).unwrap());
            assert_eq!(
                community.list_writers(conn).unwrap(),
                vec![users[0].id, users[1].id, users[2].id]
            );
            Ok(())
        });
    }

    #[test]
    fn bulk_access() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];

            community
                .set_access(conn, &[users[1].id, users[2].id], AccessLevel::Read)
                .unwrap();
            assert!(!community.has_writer(conn, &users[1]).unwrap());
            assert!(!community.has_writer(conn, &users[2]).unwrap());

            assert!(matches!(
                community.set_access(conn, &[users[1].id, users[4].id], AccessLevel::Write),
                Err(Error::ArityMismatch {
                    expected: 2,
                    found: 1
                })
            ));
            assert!(!community.has_writer(conn, &users[1]).unwrap());
            assert!(matches!(
                community.set_access(conn, &[users[0].id, users[1].id], AccessLevel::Read),
                Err(Error::CannotDowngradeAdmin)
            ));
            assert!(community.has_writer(conn, &users[0]).unwrap());
            Ok(())
        });
    }

    #[test]
    fn leaving() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];

            assert!(matches!(
                community.leave(conn, &users[0], None),
                Err(Error::CannotModifyOwner)
            ));
            assert!(matches!(
                community.leave(conn, &users[3], None),
                Err(Error::NotAMember)
            ));
            assert!(matches!(
                community.leave(conn, &users[1], Some(&users[2])),
                Err(Error::NotAnAdmin)
            ));
            community.leave(conn, &users[1], None).unwrap();
            assert!(!community.has_member(conn, &users[1]).unwrap());
            community.leave(conn, &users[2], Some(&users[0])).unwrap();
            assert_eq!(community.list_members(conn).unwrap(), vec![users[0].id]);
            Ok(())
        });
    }

    #[test]
    fn rejoining_skips_own_content() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Mine");
            community.attach(conn, &users[1], &post).unwrap();
            let other = new_post(conn, &users[2], "Theirs");
            community.attach(conn, &users[2], &other).unwrap();

            community.leave(conn, &users[1], None).unwrap();
            community.join(conn, &config, &users[1]).unwrap();
            assert!(TimelineEntry::find(conn, users[1].id, post.content_ref())
                .unwrap()
                .is_none());
            let entries = TimelineEntry::list_for_user(conn, users[1].id).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].content(), other.content_ref());
            assert!(TimelineEntry::find(conn, users[2].id, post.content_ref())
                .unwrap()
                .is_some());
            assert_consistent(conn);
            Ok(())
        });
    }

    #[test]
    fn seniority() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let community = &communities[0];
            community.join(conn, &config, &users[3]).unwrap();

            community.mute(conn, &users[1], &users[0]).unwrap();
            let first = community.promote(conn, &users[1], &users[0]).unwrap();
            assert_eq!(first.admin_level, Some(1));
            assert!(!first.muted);
            let second = community.promote(conn, &users[2], &users[0]).unwrap();
            assert_eq!(second.admin_level, Some(1));
            let junior = community.promote(conn, &users[3], &users[1]).unwrap();
            assert_eq!(junior.admin_level, Some(2));
            assert_eq!(
                community.list_admins(conn).unwrap(),
                vec![users[0].id, users[1].id, users[2].id, users[3].id]
            );

            assert!(matches!(
                community.demote(conn, &users[0], &users[1]),
                Err(Error::CannotModifyOwner)
            ));
            assert!(matches!(
                community.mute(conn, &users[2], &users[1]),
                Err(Error::InsufficientSeniority)
            ));
            assert!(matches!(
                community.mute(conn, &users[1], &users[1]),
                Err(Error::CannotMuteSelf)
            ));
            assert!(matches!(
                community.promote(conn, &users[3], &users[0]),
                Err(Error::AlreadyAdmin)
            ));

            community.mute(conn, &users[3], &users[2]).unwrap();
            assert!(community.has_muted(conn, &users[3]).unwrap());
            assert!(matches!(
                community.unmute(conn, &users[3], &users[3]),
                Err(Error::InsufficientSeniority)
            ));
            community.unmute(conn, &users[3], &users[1]).unwrap();
            assert!(matches!(
                community.unmute(conn, &users[3], &users[1]),
                Err(Error::NotMuted)
            ));

            community.demote(conn, &users[3], &users[1]).unwrap();
            assert!(!community.has_admin(conn, &users[3]).unwrap());
            assert!(matches!(
                community.admin_level_of(conn, &users[3]),
                Err(Error::NotAnAdmin)
            ));
            community.demote(conn, &users[2], &users[2]).unwrap();
            assert_eq!(
                community.list_admins(conn).unwrap(),
                vec![users[0].id, users[1].id]
            );
            Ok(())
        });
    }

    #[test]
    fn attach_and_detach() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Hello");

            assert!(matches!(
                community.attach(conn, &users[2], &post),
                Err(Error::NotAuthor)
            ));
            assert!(matches!(
                community.attach(conn, &users[3], &post),
                Err(Error::NotAMember)
            ));
            community.attach(conn, &users[1], &post).unwrap();
            assert!(matches!(
                community.attach(conn, &users[1], &post),
                Err(Error::AlreadyAttached)
            ));
            assert_eq!(post.communities(conn).unwrap(), vec![community.id]);

            // every member but the author sees it
            for user in &[&users[0], &users[2]] {
                let entry = TimelineEntry::find(conn, user.id, post.content_ref())
                    .unwrap()
                    .unwrap();
                assert_eq!(
                    entry.provenance(conn).unwrap().iter().collect::<Vec<_>>(),
                    vec![&community.id]
                );
            }
            assert!(TimelineEntry::find(conn, users[1].id, post.content_ref())
                .unwrap()
                .is_none());

            assert!(matches!(
                community.detach(conn, &users[2], &post),
                Err(Error::NotAuthor)
            ));
            community.detach(conn, &users[1], &post).unwrap();
            assert!(matches!(
                community.detach(conn, &users[1], &post),
                Err(Error::NotAttached)
            ));
            assert!(TimelineEntry::list_for_content(conn, post.content_ref())
                .unwrap()
                .is_empty());

            // and the same state comes back
            community.attach(conn, &users[1], &post).unwrap();
            assert_eq!(
                TimelineEntry::list_for_content(conn, post.content_ref())
                    .unwrap()
                    .len(),
                2
            );
            assert_consistent(conn);
            Ok(())
        });
    }

    #[test]
    fn muted_members_cant_attach() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Hello");
            community.mute(conn, &users[1], &users[0]).unwrap();
            assert!(matches!(
                community.attach(conn, &users[1], &post),
                Err(Error::Muted)
            ));
            Ok(())
        });
    }

    #[test]
    fn admins_detach() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            community.promote(conn, &users[2], &users[0]).unwrap();

            let from_owner = new_post(conn, &users[0], "Rules");
            let from_member = new_post(conn, &users[1], "Hello");
            community.attach(conn, &users[0], &from_owner).unwrap();
            community.attach(conn, &users[1], &from_member).unwrap();

            assert!(matches!(
                community.detach(conn, &users[2], &from_owner),
                Err(Error::InsufficientSeniority)
            ));
            community.detach(conn, &users[2], &from_member).unwrap();
            assert!(from_member.communities(conn).unwrap().is_empty());
            Ok(())
        });
    }

    #[test]
    fn comments_are_placed_too() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Hello");
            let comment =
                Comment::insert(conn, NewComment::new(&users[2], &post, "Nice")).unwrap();

            community.attach(conn, &users[2], &comment).unwrap();
            assert!(TimelineEntry::find(conn, users[1].id, comment.content_ref())
                .unwrap()
                .is_some());
            assert!(TimelineEntry::find(conn, users[1].id, post.content_ref())
                .unwrap()
                .is_none());

            comment.delete(conn).unwrap();
            assert!(TimelineEntry::list_for_content(conn, comment.content_ref())
                .unwrap()
                .is_empty());
            assert!(community.blogline(conn, None, 10, None).unwrap().is_empty());
            Ok(())
        });
    }

    #[test]
    fn banning() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let community = &communities[0];
            let post = new_post(conn, &users[1], "Hello");
            community.attach(conn, &users[1], &post).unwrap();

            assert!(matches!(
                community.ban(conn, &users[0], &users[0]),
                Err(Error::CannotModifyOwner)
            ));
            assert!(matches!(
                community.ban(conn, &users[1], &users[2]),
                Err(Error::NotAnAdmin)
            ));
            assert!(matches!(
                community.ban(conn, &users[3], &users[0]),
                Err(Error::NotAMember)
            ));

            community.ban(conn, &users[2], &users[0]).unwrap();
            assert!(community.has_banned(conn, &users[2]).unwrap());
            assert!(!community.has_member(conn, &users[2]).unwrap());
            assert!(TimelineEntry::find(conn, users[2].id, post.content_ref())
                .unwrap()
                .is_none());
            assert!(matches!(
                community.ban(conn, &users[2], &users[0]),
                Err(Error::AlreadyBanned)
            ));
            assert!(matches!(
                community.join(conn, &config, &users[2]),
                Err(Error::Banned)
            ));

            assert!(matches!(
                community.unban(conn, &users[3], &users[0]),
                Err(Error::NotBanned)
            ));
            community.unban(conn, &users[2], &users[0]).unwrap();
            assert!(!community.has_member(conn, &users[2]).unwrap());
            community.join(conn, &config, &users[2]).unwrap();
            Ok(())
        });
    }

    #[test]
    fn invitations() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let (public, private) = (&communities[0], &communities[1]);

            assert!(matches!(
                public.create_invitation_request(conn, &users[3]),
                Err(Error::InvitationsNotSupported)
            ));
            assert!(matches!(
                public.has_invitation_request(conn, &users[3]),
                Err(Error::InvitationsNotSupported)
            ));

            private.create_invitation_request(conn, &users[1]).unwrap();
            private.create_invitation_request(conn, &users[2]).unwrap();
            private.create_invitation_request(conn, &users[3]).unwrap();
            assert!(matches!(
                private.create_invitation_request(conn, &users[1]),
                Err(Error::InvitationAlreadyExists)
            ));
            assert_eq!(
                private.list_invitation_requests(conn).unwrap(),
                vec![users[1].id, users[2].id, users[3].id]
            );

            assert!(matches!(
                private.accept_invitation_request(conn, &config, &users[1], &users[2]),
                Err(Error::NotAnAdmin)
            ));
            private
                .accept_invitation_request(conn, &config, &users[1], &users[0])
                .unwrap();
            assert!(private.has_member(conn, &users[1]).unwrap());
            assert!(!private.has_invitation_request(conn, &users[1]).unwrap());
            assert!(matches!(
                private.accept_invitation_request(conn, &config, &users[1], &users[0]),
                Err(Error::AlreadyMember)
            ));
            assert!(matches!(
                private.create_invitation_request(conn, &users[1]),
                Err(Error::AlreadyMember)
            ));

            private
                .reject_invitation_request(conn, &users[2], &users[0])
                .unwrap();
            assert!(matches!(
                private.reject_invitation_request(conn, &users[2], &users[0]),
                Err(Error::NoSuchInvitation)
            ));
            assert!(matches!(
                private.accept_invitation_request(conn, &config, &users[4], &users[0]),
                Err(Error::NoSuchInvitation)
            ));

            // pending requests can be banned
            private.ban(conn, &users[3], &users[0]).unwrap();
            assert!(!private.has_invitation_request(conn, &users[3]).unwrap());
            assert!(matches!(
                private.create_invitation_request(conn, &users[3]),
                Err(Error::Banned)
            ));

            // joining directly clears the request
            private.create_invitation_request(conn, &users[4]).unwrap();
            private.join(conn, &config, &users[4]).unwrap();
            assert!(private.list_invitation_requests(conn).unwrap().is_empty());
            Ok(())
        });
    }

    #[test]
    fn destruction() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, communities) = fill_database(conn);
            let config = TimelineConfig::default();
            let (first, second) = (&communities[0], &communities[1]);
            second.join(conn, &config, &users[1]).unwrap();
            second.join(conn, &config, &users[2]).unwrap();
            let post = new_post(conn, &users[1], "Hello");
            first.attach(conn, &users[1], &post).unwrap();
            second.attach(conn, &users[1], &post).unwrap();

            first.destroy(conn).unwrap();
            assert!(Community::get(conn, first.id).is_err());
            assert_eq!(post.communities(conn).unwrap(), vec![second.id]);
            let entry = TimelineEntry::find(conn, users[2].id, post.content_ref())
                .unwrap()
                .unwrap();
            assert!(!entry.has_many_sources);
            assert_eq!(
                entry.provenance(conn).unwrap().iter().collect::<Vec<_>>(),
                vec![&second.id]
            );
            assert_eq!(users[2].communities(conn).unwrap().len(), 1);
            assert_consistent(conn);
            Ok(())
        });
    }
}
