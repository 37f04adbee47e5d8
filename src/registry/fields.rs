//! External metadata field names and projection defaults.
//!
//! Both collections expose the same custom columns, prefixed `dm_`. The
//! default table here is the single source of truth for what a missing field
//! projects to.

use crate::domain::LifecycleStatus;

use super::store::SourceCollection;

/// The built-in title column.
pub const TITLE: &str = "Title";

/// Document code, e.g. `SOP-QMS-001`.
pub const DOCUMENT_CODE: &str = "dm_document_code";
/// Item id of the backing record in the external store.
pub const EXTERNAL_ITEM_ID: &str = "dm_sharepoint_item_id";
/// Document classification.
pub const DOCUMENT_TYPE: &str = "dm_document_type";
/// Process or function the document belongs to.
pub const PROCESS_OR_FUNCTION: &str = "dm_process_or_function";
/// Department or site the document belongs to.
pub const DEPARTMENT_OR_SITE: &str = "dm_department_or_site";
/// Revision label.
pub const REVISION: &str = "dm_revision";
/// Lifecycle status.
pub const LIFECYCLE_STATUS: &str = "dm_lifecycle_status";
/// Owner display name.
pub const OWNER: &str = "dm_owner";
/// Owner identity-provider id.
pub const OWNER_ID: &str = "dm_owner_id";
/// Owner email.
pub const OWNER_EMAIL: &str = "dm_owner_email";
/// Approver display name.
pub const APPROVER: &str = "dm_approver";
/// Approver identity-provider id.
pub const APPROVER_ID: &str = "dm_approver_id";
/// Approver email.
pub const APPROVER_EMAIL: &str = "dm_approver_email";
/// Effective date (ISO `YYYY-MM-DD`).
pub const EFFECTIVE_DATE: &str = "dm_effective_date";
/// Next review date (ISO `YYYY-MM-DD`).
pub const NEXT_REVIEW_DATE: &str = "dm_next_review_date";
/// Id of the document this one supersedes.
pub const SUPERSEDES_DOCUMENT_ID: &str = "dm_supersedes_document_id";
/// Id of the document that superseded this one.
pub const SUPERSEDED_BY_DOCUMENT_ID: &str = "dm_superseded_by_document_id";
/// Keywords, `;`-joined.
pub const KEYWORDS: &str = "dm_keywords";
/// Summary text.
pub const SUMMARY: &str = "dm_summary";
/// URL of the file in the authoring collection.
pub const AUTHORING_FILE_URL: &str = "dm_authoring_file_url";
/// URL of the file in the published collection.
pub const PUBLISHED_FILE_URL: &str = "dm_published_file_url";
/// URL of the archived file.
pub const ARCHIVE_FILE_URL: &str = "dm_archive_file_url";

/// The delimiter used to pack the keyword list into one metadata column.
pub const KEYWORD_DELIMITER: char = ';';

/// The default value a missing field projects to.
///
/// Every string column defaults to empty except the document type, which
/// degrades to `Other`. Status defaults are per-source; see
/// [`default_status`].
#[must_use]
pub fn default_value(field: &str) -> &'static str {
    match field {
        DOCUMENT_TYPE => "Other",
        _ => "",
    }
}

/// The lifecycle status a missing or unparseable status field projects to,
/// by source collection.
#[must_use]
pub const fn default_status(source: SourceCollection) -> LifecycleStatus {
    match source {
        SourceCollection::Authoring => LifecycleStatus::Draft,
        SourceCollection::Published => LifecycleStatus::Published,
    }
}

/// Splits a packed keyword column into the ordered keyword list, dropping
/// empty tokens.
///
/// Tokens are kept verbatim, whitespace included, so any `;`-free keyword
/// list survives a join-then-split round trip unchanged.
#[must_use]
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(KEYWORD_DELIMITER)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Joins a keyword list into the packed column representation.
#[must_use]
pub fn join_keywords(keywords: &[String]) -> String {
    keywords.join(&KEYWORD_DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_round_trip_is_lossless() {
        let keywords: Vec<String> = ["calibration", "quality", "iso 9001"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let packed = join_keywords(&keywords);
        assert_eq!(packed, "calibration;quality;iso 9001");
        assert_eq!(split_keywords(&packed), keywords);
    }

    #[test]
    fn split_drops_only_truly_empty_tokens() {
        assert_eq!(split_keywords(";a;;b; ;"), vec!["a", "b", " "]);
        assert!(split_keywords("").is_empty());
    }

    #[test]
    fn whitespace_padded_keywords_survive_the_round_trip() {
        let keywords: Vec<String> = [" leading", "trailing ", "in between"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(split_keywords(&join_keywords(&keywords)), keywords);
    }

    #[test]
    fn unknown_fields_default_to_empty() {
        assert_eq!(default_value(SUMMARY), "");
        assert_eq!(default_value(DOCUMENT_TYPE), "Other");
    }

    #[test]
    fn status_default_depends_on_source() {
        assert_eq!(
            default_status(SourceCollection::Authoring),
            LifecycleStatus::Draft
        );
        assert_eq!(
            default_status(SourceCollection::Published),
            LifecycleStatus::Published
        );
    }
}
