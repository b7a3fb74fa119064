//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. The
//! `diesel print-schema` command regenerates them from a live database.

diesel::table! {
    /// Registered accounts. Rows are soft-deleted through `status`.
    users (id) {
        id -> Int8,
        unique_name -> Nullable<Varchar>,
        nick_name -> Varchar,
        /// Stored lowercase; unique among live accounts.
        email -> Varchar,
        hashed_password -> Varchar,
        avatar_uri -> Nullable<Varchar>,
        user_verified -> Bool,
        country_code -> Varchar,
        /// Most recently issued session token.
        session_key -> Nullable<Text>,
        description -> Text,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Personal and team spaces.
    spaces (id) {
        id -> Int8,
        owner_id -> Int8,
        name -> Varchar,
        description -> Text,
        icon_uri -> Varchar,
        space_type -> Varchar,
        creator_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Space membership with a role per member.
    space_users (space_id, user_id) {
        space_id -> Int8,
        user_id -> Int8,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Personal access tokens. Times are unix seconds.
    api_keys (id) {
        id -> Int8,
        /// Hex SHA-256 of the decimal id.
        key -> Varchar,
        name -> Varchar,
        status -> Varchar,
        user_id -> Int8,
        expire_at -> Int8,
        created_at -> Int8,
        updated_at -> Int8,
        /// Null until the first successful verification.
        last_used_at -> Nullable<Int8>,
        /// Zero while the key is live.
        deleted_at -> Int8,
    }
}

diesel::joinable!(space_users -> spaces (space_id));

diesel::allow_tables_to_appear_in_same_query!(api_keys, space_users, spaces, users);
