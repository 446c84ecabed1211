//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the deployed schema exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.
//! Notable constraints the repositories rely on:
//!
//! - `users.email` and `users.federated_id` are unique.
//! - `vocabulary_lists` carries a compound unique constraint on
//!   `(owner_id, name)`, the authoritative per-owner name check.
//! - `api_call_logs.user_id` is nullable so audit records can outlive the
//!   user that caused them.

diesel::table! {
    /// User accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Normalised email address, globally unique.
        email -> Varchar,
        /// Name as provided at registration or by the identity provider.
        name -> Nullable<Varchar>,
        /// Profile display name, user controlled.
        display_name -> Nullable<Varchar>,
        /// Avatar URL, usually provided by the identity provider.
        picture_url -> Nullable<Varchar>,
        /// Argon2id PHC string; absent for setup-incomplete accounts.
        password_hash -> Nullable<Varchar>,
        /// Federated identity id, unique when present.
        federated_id -> Nullable<Varchar>,
        /// Administrator flag.
        is_admin -> Bool,
        /// Blocked accounts are rejected at every entry point.
        is_blocked -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Named vocabulary lists, one owner each.
    vocabulary_lists (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// List name, unique per owner.
        name -> Varchar,
        /// Owning user.
        owner_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Enriched word records, owned exclusively by their list.
    vocabulary_entries (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The word as the user entered it; immutable after creation.
        original_word -> Varchar,
        /// Part of speech reported by the dictionary.
        word_type -> Nullable<Varchar>,
        /// Phonetic transcription.
        ipa -> Nullable<Varchar>,
        /// English definition.
        definition_en -> Nullable<Text>,
        /// Translated definition.
        definition_vi -> Nullable<Text>,
        /// English example sentence.
        example_en -> Nullable<Text>,
        /// Record creation timestamp.
        added_at -> Timestamptz,
        /// Parent list.
        list_id -> Uuid,
        /// Denormalised owner, always equal to the parent list's owner.
        owner_id -> Uuid,
    }
}

diesel::table! {
    /// Append-only audit log of external API calls.
    api_call_logs (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Adapter tag, e.g. `dictionary_api`.
        api_name -> Varchar,
        /// When the call happened.
        timestamp -> Timestamptz,
        /// Whether the call produced usable data.
        success -> Bool,
        /// HTTP status, when one was obtained.
        status_code -> Nullable<Int4>,
        /// Truncated error message for failures.
        error_message -> Nullable<Text>,
        /// Truncated request summary, e.g. the word looked up.
        request_summary -> Nullable<Text>,
        /// Acting user; detached (NULL) when that user is deleted.
        user_id -> Nullable<Uuid>,
    }
}

diesel::joinable!(vocabulary_lists -> users (owner_id));
diesel::joinable!(vocabulary_entries -> vocabulary_lists (list_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    vocabulary_lists,
    vocabulary_entries,
    api_call_logs,
);
