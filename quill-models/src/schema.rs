table! {
    comments (id) {
        id -> Int4,
        post_id -> Int4,
        author_id -> Int4,
        content -> Text,
        creation_date -> Timestamp,
    }
}

table! {
    communities (id) {
        id -> Int4,
        name -> Varchar,
        owner_id -> Int4,
        public -> Bool,
        default_access -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    community_bans (id) {
        id -> Int4,
        community_id -> Int4,
        user_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    community_members (id) {
        id -> Int4,
        community_id -> Int4,
        user_id -> Int4,
        access -> Int4,
        is_admin -> Bool,
        admin_level -> Nullable<Int4>,
        muted -> Bool,
        creation_date -> Timestamp,
    }
}

table! {
    invitation_requests (id) {
        id -> Int4,
        community_id -> Int4,
        user_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    likes (id) {
        id -> Int4,
        user_id -> Int4,
        post_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    placements (id) {
        id -> Int4,
        community_id -> Int4,
        content_kind -> Int4,
        content_id -> Int4,
        is_reblog -> Bool,
        creation_date -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Int4,
        author_id -> Int4,
        title -> Varchar,
        content -> Text,
        creation_date -> Timestamp,
    }
}

table! {
    reshares (id) {
        id -> Int4,
        user_id -> Int4,
        post_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    timeline_entries (id) {
        id -> Int4,
        user_id -> Int4,
        content_kind -> Int4,
        content_id -> Int4,
        has_many_sources -> Bool,
        creation_date -> Timestamp,
    }
}

table! {
    timeline_entry_sources (id) {
        id -> Int4,
        entry_id -> Int4,
        community_id -> Int4,
    }
}

table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        display_name -> Varchar,
        creation_date -> Timestamp,
    }
}

joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));
joinable!(communities -> users (owner_id));
joinable!(community_bans -> communities (community_id));
joinable!(community_members -> communities (community_id));
joinable!(community_members -> users (user_id));
joinable!(invitation_requests -> communities (community_id));
joinable!(likes -> posts (post_id));
joinable!(likes -> users (user_id));
joinable!(placements -> communities (community_id));
joinable!(posts -> users (author_id));
joinable!(reshares -> posts (post_id));
joinable!(reshares -> users (user_id));
joinable!(timeline_entries -> users (user_id));
joinable!(timeline_entry_sources -> communities (community_id));
joinable!(timeline_entry_sources -> timeline_entries (entry_id));

allow_tables_to_appear_in_same_query!(
    comments,
    communities,
    community_bans,
    community_members,
    invitation_requests,
    likes,
    placements,
    posts,
    reshares,
    timeline_entries,
    timeline_entry_sources,
    users,
);
