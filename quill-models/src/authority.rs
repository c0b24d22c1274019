//! Who may do what to whom inside a community.
//!
//! Every function here takes the membership rows of the people involved
//! (`None` when they are not members) and either allows the action or tells
//! why it is refused. Nothing is read from or written to the database.
//!
//! Admins are ranked by their level: the owner is at level 0 and everyone
//! promoted by an admin of level `n` gets level `n + 1`. A smaller level is
//! more senior, and acting on another admin requires being strictly more
//! senior than them.

use crate::{community_members::CommunityMember, Error, Result};

/// The membership of someone acting as a member
pub fn member(membership: Option<&CommunityMember>) -> Result<&CommunityMember> {
    membership.ok_or(Error::NotAMember)
}

/// The level of someone acting as an admin
pub fn acting_admin(actor: Option<&CommunityMember>) -> Result<i32> {
    match actor {
        Some(CommunityMember {
            is_admin: true,
            admin_level: Some(level),
            ..
        }) => Ok(*level),
        _ => Err(Error::NotAnAdmin),
    }
}

/// Checks that an admin of level `actor_level` can act on `subject`.
///
/// Regular members can be acted on by any admin.
pub fn outranks(actor_level: i32, subject: &CommunityMember) -> Result<()> {
    match subject.admin_level {
        Some(level) if subject.is_admin && actor_level >= level => {
            Err(Error::InsufficientSeniority)
        }
        _ => Ok(()),
    }
}

/// Returns the level the subject will have once promoted.
pub fn can_promote(
    actor: Option<&CommunityMember>,
    subject: Option<&CommunityMember>,
) -> Result<i32> {
    let level = acting_admin(actor)?;
    let subject = member(subject)?;
    if subject.is_admin {
        return Err(Error::AlreadyAdmin);
    }
    Ok(level + 1)
}

/// An admin can always step down, unless they own the community.
pub fn can_demote(actor: Option<&CommunityMember>, subject: Option<&CommunityMember>) -> Result<()> {
    let subject = member(subject)?;
    if !subject.is_admin {
        return Err(Error::NotAnAdmin);
    }
    let level = acting_admin(actor)?;
    if subject.is_owner() {
        return Err(Error::CannotModifyOwner);
    }
    if actor.map(|a| a.user_id) == Some(subject.user_id) {
        return Ok(());
    }
    outranks(level, subject)
}

/// Checks that `actor` can make `subject` leave the community. A member
/// leaving on their own passes themselves as the actor.
pub fn can_remove(actor: Option<&CommunityMember>, subject: Option<&CommunityMember>) -> Result<()> {
    let subject = member(subject)?;
    if subject.is_owner() {
        return Err(Error::CannotModifyOwner);
    }
    if actor.map(|a| a.user_id) == Some(subject.user_id) {
        return Ok(());
    }
    let level = acting_admin(actor)?;
    outranks(level, subject)
}

pub fn can_mute(actor: Option<&CommunityMember>, subject: Option<&CommunityMember>) -> Result<()> {
    let level = acting_admin(actor)?;
    let subject = member(subject)?;
    if subject.muted {
        return Err(Error::AlreadyMuted);
    }
    if actor.map(|a| a.user_id) == Some(subject.user_id) {
        return Err(Error::CannotMuteSelf);
    }
    outranks(level, subject)
}

pub fn can_unmute(actor: Option<&CommunityMember>, subject: Option<&CommunityMember>) -> Result<()> {
    let level = acting_admin(actor)?;
    let subject = member(subject)?;
    if !subject.muted {
        return Err(Error::NotMuted);
    }
    outranks(level, subject)
}

/// Banning applies to members and to people waiting for an invitation.
pub fn can_ban(
    actor: Option<&CommunityMember>,
    subject: Option<&CommunityMember>,
    has_request: bool,
    already_banned: bool,
) -> Result<()> {
    let level = acting_admin(actor)?;
    if already_banned {
        return Err(Error::AlreadyBanned);
    }
    match subject {
        Some(subject) => {
            if subject.is_owner() {
                return Err(Error::CannotModifyOwner);
            }
            outranks(level, subject)
        }
        None if has_request => Ok(()),
        None => Err(Error::NotAMember),
    }
}

pub fn can_attach(actor: Option<&CommunityMember>, author_id: i32) -> Result<()> {
    let actor = member(actor)?;
    if actor.muted {
        return Err(Error::Muted);
    }
    if actor.user_id != author_id {
        return Err(Error::NotAuthor);
    }
    Ok(())
}

/// The author can always take their content back. Admins can take anything
/// down, except what a more senior admin posted.
pub fn can_detach(
    actor: Option<&CommunityMember>,
    author: Option<&CommunityMember>,
    author_id: i32,
) -> Result<()> {
    let actor = member(actor)?;
    if actor.user_id == author_id {
        return Ok(());
    }
    let level = acting_admin(Some(actor)).map_err(|_| Error::NotAuthor)?;
    match author {
        Some(author) => outranks(level, author),
        None => Ok(()),
    }
}
