//! Row structs bridging Diesel and the domain aggregates.
//!
//! Rows are plain data; conversion into domain types revalidates the value
//! types and reports failures as strings, which the repositories fold into
//! their query error variants. Stored data failing validation indicates
//! schema drift, not a user error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::audit::{ApiCallRecord, ApiName};
use crate::domain::user::{EmailAddress, FederatedId, StoredPasswordHash, User, UserId};
use crate::domain::vocabulary::{
    EntryId, ListId, ListName, VocabularyEntry, VocabularyList,
};

use super::schema::{api_call_logs, users, vocabulary_entries, vocabulary_lists};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    pub password_hash: Option<String>,
    pub federated_id: Option<String>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_ref().to_owned(),
            name: user.name.clone(),
            display_name: user.display_name.clone(),
            picture_url: user.picture_url.clone(),
            password_hash: user
                .password_hash
                .as_ref()
                .map(|hash| hash.as_str().to_owned()),
            federated_id: user
                .federated_id
                .as_ref()
                .map(|id| id.as_ref().to_owned()),
            is_admin: user.is_admin,
            is_blocked: user.is_blocked,
            created_at: user.created_at,
        }
    }

    pub fn into_domain(self) -> Result<User, String> {
        let email = EmailAddress::new(&self.email)
            .map_err(|err| format!("stored email invalid: {err}"))?;
        let federated_id = self
            .federated_id
            .map(FederatedId::new)
            .transpose()
            .map_err(|err| format!("stored federated id invalid: {err}"))?;
        Ok(User {
            id: UserId::from_uuid(self.id),
            email,
            name: self.name,
            display_name: self.display_name,
            picture_url: self.picture_url,
            password_hash: self.password_hash.map(StoredPasswordHash::from_phc_string),
            federated_id,
            is_admin: self.is_admin,
            is_blocked: self.is_blocked,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = vocabulary_lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListRow {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ListRow {
    pub fn from_domain(list: &VocabularyList) -> Self {
        Self {
            id: *list.id.as_uuid(),
            name: list.name.as_ref().to_owned(),
            owner_id: *list.owner_id.as_uuid(),
            created_at: list.created_at,
        }
    }

    pub fn into_domain(self) -> Result<VocabularyList, String> {
        let name =
            ListName::new(&self.name).map_err(|err| format!("stored list name invalid: {err}"))?;
        Ok(VocabularyList {
            id: ListId::from_uuid(self.id),
            name,
            owner_id: UserId::from_uuid(self.owner_id),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = vocabulary_entries)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EntryRow {
    pub id: Uuid,
    pub original_word: String,
    pub word_type: Option<String>,
    pub ipa: Option<String>,
    pub definition_en: Option<String>,
    pub definition_vi: Option<String>,
    pub example_en: Option<String>,
    pub added_at: DateTime<Utc>,
    pub list_id: Uuid,
    pub owner_id: Uuid,
}

impl EntryRow {
    pub fn from_domain(entry: &VocabularyEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            original_word: entry.original_word.clone(),
            word_type: entry.word_type.clone(),
            ipa: entry.ipa.clone(),
            definition_en: entry.definition_en.clone(),
            definition_vi: entry.definition_vi.clone(),
            example_en: entry.example_en.clone(),
            added_at: entry.added_at,
            list_id: *entry.list_id.as_uuid(),
            owner_id: *entry.owner_id.as_uuid(),
        }
    }

    pub fn into_domain(self) -> VocabularyEntry {
        VocabularyEntry {
            id: EntryId::from_uuid(self.id),
            original_word: self.original_word,
            word_type: self.word_type,
            ipa: self.ipa,
            definition_en: self.definition_en,
            definition_vi: self.definition_vi,
            example_en: self.example_en,
            added_at: self.added_at,
            list_id: ListId::from_uuid(self.list_id),
            owner_id: UserId::from_uuid(self.owner_id),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = api_call_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApiLogRow {
    pub id: Uuid,
    pub api_name: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
    pub request_summary: Option<String>,
    pub user_id: Option<Uuid>,
}

impl ApiLogRow {
    pub fn from_record(record: &ApiCallRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            api_name: record.api.as_str().to_owned(),
            timestamp: record.timestamp,
            success: record.success,
            status_code: record.status_code.map(i32::from),
            error_message: record.error_message.clone(),
            request_summary: record.request_summary.clone(),
            user_id: record.user_id.map(|id| *id.as_uuid()),
        }
    }

    pub fn into_domain(self) -> ApiCallRecord {
        let api = match self.api_name.as_str() {
            "dictionary_api" => ApiName::Dictionary,
            // Unknown tags are folded into the translation bucket rather
            // than failing a read-only admin view.
            _ => ApiName::Translation,
        };
        ApiCallRecord {
            api,
            timestamp: self.timestamp,
            success: self.success,
            status_code: self
                .status_code
                .and_then(|code| u16::try_from(code).ok()),
            error_message: self.error_message,
            request_summary: self.request_summary,
            user_id: self.user_id.map(UserId::from_uuid),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Round-trip coverage for row conversions.
    use super::*;

    #[test]
    fn user_row_round_trips() {
        let user = User::register(
            EmailAddress::new("ada@example.com").expect("valid email"),
            Some("Ada".to_owned()),
            "secret1",
        )
        .expect("valid registration");

        let restored = UserRow::from_domain(&user)
            .into_domain()
            .expect("row converts back");
        assert_eq!(restored, user);
    }

    #[test]
    fn api_log_row_maps_unknown_status_codes_away() {
        let record = ApiCallRecord::failure(
            crate::domain::audit::ApiName::Dictionary,
            "word: cat",
            Some(404),
            "status 404",
            None,
        );
        let row = ApiLogRow::from_record(&record);
        assert_eq!(row.api_name, "dictionary_api");
        assert_eq!(row.status_code, Some(404));
        let restored = row.into_domain();
        assert_eq!(restored.status_code, Some(404));
        assert!(!restored.success);
    }
}
