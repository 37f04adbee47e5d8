//! Projection of raw store items into canonical records.
//!
//! Projection is a pure mapping and never fails: missing or malformed fields
//! degrade to the defaults in [`fields`](super::fields), because the external
//! metadata schema may lag behind the canonical model.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DocumentRecord, DocumentType, LifecycleStatus, RecordUpdate, UserRef};

use super::{
    fields,
    store::{RawItem, SourceCollection},
};

fn field<'a>(raw: &'a RawItem, name: &str) -> &'a str {
    raw.fields
        .get(name)
        .map_or_else(|| fields::default_value(name), String::as_str)
}

fn optional_field(raw: &RawItem, name: &str) -> Option<String> {
    let value = field(raw, name);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn user_from_fields(raw: &RawItem, name: &str, id: &str, email: &str) -> UserRef {
    let user = UserRef {
        id: field(raw, id).to_string(),
        display_name: field(raw, name).to_string(),
        email: field(raw, email).to_string(),
    };
    if user.is_empty() { UserRef::system() } else { user }
}

/// Parses an external date value leniently.
///
/// Only the leading `YYYY-MM-DD` portion is considered, so both plain dates
/// and full timestamps are accepted; anything else projects to `None`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Projects a raw store item into a canonical [`DocumentRecord`].
///
/// The source collection determines the status default and which file-URL
/// field the item's own URL populates; a record is never attributed to both
/// collections.
#[must_use]
pub fn project(raw: &RawItem, source: SourceCollection) -> DocumentRecord {
    let document_type = field(raw, fields::DOCUMENT_TYPE)
        .parse::<DocumentType>()
        .unwrap_or(DocumentType::Other);
    let lifecycle_status = field(raw, fields::LIFECYCLE_STATUS)
        .parse::<LifecycleStatus>()
        .unwrap_or_else(|_| fields::default_status(source));

    let title = match field(raw, fields::TITLE) {
        "" => raw.display_name.clone(),
        title => title.to_string(),
    };
    let external_item_id = match field(raw, fields::EXTERNAL_ITEM_ID) {
        "" => raw.id.clone(),
        id => id.to_string(),
    };

    let authoring_file_url = match source {
        SourceCollection::Authoring => raw.web_url.clone(),
        SourceCollection::Published => String::new(),
    };
    let published_file_url = match source {
        SourceCollection::Authoring => String::new(),
        SourceCollection::Published => raw.web_url.clone(),
    };

    DocumentRecord {
        id: raw.id.clone(),
        external_item_id,
        document_code: field(raw, fields::DOCUMENT_CODE).to_string(),
        title,
        document_type,
        process_or_function: field(raw, fields::PROCESS_OR_FUNCTION).to_string(),
        department_or_site: field(raw, fields::DEPARTMENT_OR_SITE).to_string(),
        revision: field(raw, fields::REVISION).to_string(),
        lifecycle_status,
        owner: user_from_fields(raw, fields::OWNER, fields::OWNER_ID, fields::OWNER_EMAIL),
        approver: user_from_fields(
            raw,
            fields::APPROVER,
            fields::APPROVER_ID,
            fields::APPROVER_EMAIL,
        ),
        effective_date: parse_date(field(raw, fields::EFFECTIVE_DATE)),
        next_review_date: parse_date(field(raw, fields::NEXT_REVIEW_DATE)),
        supersedes_document_id: optional_field(raw, fields::SUPERSEDES_DOCUMENT_ID),
        superseded_by_document_id: optional_field(raw, fields::SUPERSEDED_BY_DOCUMENT_ID),
        keywords: fields::split_keywords(field(raw, fields::KEYWORDS)),
        summary: field(raw, fields::SUMMARY).to_string(),
        created_at: raw.created,
        updated_at: raw.modified,
        created_by: UserRef::system(),
        updated_by: UserRef::system(),
        authoring_file_url,
        published_file_url,
        archive_file_url: field(raw, fields::ARCHIVE_FILE_URL).to_string(),
    }
}

/// Converts a transition's [`RecordUpdate`] into the metadata fields to
/// persist.
#[must_use]
pub fn update_fields(update: &RecordUpdate) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(
        fields::LIFECYCLE_STATUS.to_string(),
        update.lifecycle_status.to_string(),
    );
    if let Some(revision) = &update.revision {
        map.insert(fields::REVISION.to_string(), revision.clone());
    }
    if let Some(date) = update.effective_date {
        map.insert(fields::EFFECTIVE_DATE.to_string(), date.to_string());
    }
    if let Some(date) = update.next_review_date {
        map.insert(fields::NEXT_REVIEW_DATE.to_string(), date.to_string());
    }
    if let Some(url) = &update.published_file_url {
        map.insert(fields::PUBLISHED_FILE_URL.to_string(), url.clone());
    }
    if let Some(id) = &update.superseded_by_document_id {
        map.insert(fields::SUPERSEDED_BY_DOCUMENT_ID.to_string(), id.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use test_case::test_case;

    use super::*;

    fn raw(fields: &[(&str, &str)]) -> RawItem {
        let now = Utc::now();
        RawItem {
            id: "17".to_string(),
            display_name: "SOP-QMS-001 Calibration.docx".to_string(),
            web_url: "https://store/authoring/17".to_string(),
            created: now,
            modified: now,
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn bare_item_projects_to_defaults() {
        let record = project(&raw(&[]), SourceCollection::Authoring);

        assert_eq!(record.document_code, "");
        assert_eq!(record.document_type, DocumentType::Other);
        assert_eq!(record.lifecycle_status, LifecycleStatus::Draft);
        assert_eq!(record.title, "SOP-QMS-001 Calibration.docx");
        assert_eq!(record.owner, UserRef::system());
        assert_eq!(record.approver, UserRef::system());
        assert!(record.keywords.is_empty());
        assert!(record.effective_date.is_none());
        assert!(record.supersedes_document_id.is_none());
    }

    #[test]
    fn status_default_follows_source() {
        let item = raw(&[]);
        assert_eq!(
            project(&item, SourceCollection::Published).lifecycle_status,
            LifecycleStatus::Published
        );
    }

    #[test]
    fn populated_fields_are_carried_through() {
        let item = raw(&[
            (fields::TITLE, "Calibration Procedure"),
            (fields::DOCUMENT_CODE, "SOP-QMS-001"),
            (fields::DOCUMENT_TYPE, "SOP"),
            (fields::LIFECYCLE_STATUS, "Approved"),
            (fields::REVISION, "B"),
            (fields::OWNER, "Olive Owner"),
            (fields::OWNER_ID, "owner-1"),
            (fields::OWNER_EMAIL, "olive@example.com"),
            (fields::EFFECTIVE_DATE, "2026-09-01T00:00:00Z"),
            (fields::KEYWORDS, "calibration;quality"),
        ]);
        let record = project(&item, SourceCollection::Authoring);

        assert_eq!(record.document_code, "SOP-QMS-001");
        assert_eq!(record.document_type, DocumentType::Sop);
        assert_eq!(record.lifecycle_status, LifecycleStatus::Approved);
        assert_eq!(record.title, "Calibration Procedure");
        assert_eq!(record.owner.display_name, "Olive Owner");
        assert_eq!(
            record.effective_date,
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(record.keywords, vec!["calibration", "quality"]);
    }

    #[test]
    fn unknown_type_and_status_degrade() {
        let item = raw(&[
            (fields::DOCUMENT_TYPE, "Blueprint"),
            (fields::LIFECYCLE_STATUS, "Archived"),
        ]);
        let record = project(&item, SourceCollection::Authoring);
        assert_eq!(record.document_type, DocumentType::Other);
        assert_eq!(record.lifecycle_status, LifecycleStatus::Draft);
    }

    #[test]
    fn file_url_attribution_is_exclusive() {
        let item = raw(&[]);

        let from_authoring = project(&item, SourceCollection::Authoring);
        assert_eq!(from_authoring.authoring_file_url, item.web_url);
        assert_eq!(from_authoring.published_file_url, "");

        let from_published = project(&item, SourceCollection::Published);
        assert_eq!(from_published.authoring_file_url, "");
        assert_eq!(from_published.published_file_url, item.web_url);
    }

    #[test]
    fn projection_is_deterministic() {
        let item = raw(&[
            (fields::DOCUMENT_CODE, "POL-HR-002"),
            (fields::KEYWORDS, "a;b;c"),
        ]);
        assert_eq!(
            project(&item, SourceCollection::Published),
            project(&item, SourceCollection::Published)
        );
    }

    #[test_case("2026-09-01", Some((2026, 9, 1)); "plain date")]
    #[test_case("2026-09-01T12:34:56Z", Some((2026, 9, 1)); "timestamp")]
    #[test_case("not a date", None; "garbage")]
    #[test_case("", None; "empty")]
    #[test_case("2026-13-01", None; "invalid month")]
    fn lenient_date_parsing(input: &str, expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_date(input), expected);
    }

    #[test]
    fn update_fields_carries_only_set_values() {
        use crate::domain::LifecycleStatus;

        let update = RecordUpdate {
            lifecycle_status: LifecycleStatus::Obsolete,
            revision: None,
            effective_date: None,
            next_review_date: None,
            published_file_url: None,
            superseded_by_document_id: Some("doc-9".to_string()),
            updated_by: UserRef::system(),
        };
        let map = update_fields(&update);
        assert_eq!(map[fields::LIFECYCLE_STATUS], "Obsolete");
        assert_eq!(map[fields::SUPERSEDED_BY_DOCUMENT_ID], "doc-9");
        assert!(!map.contains_key(fields::REVISION));
        assert!(!map.contains_key(fields::PUBLISHED_FILE_URL));
    }
}
