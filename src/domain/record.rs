//! The canonical document entity.
//!
//! A [`DocumentRecord`] is a read-projection of an item held in one of the
//! external collections, plus any pending local edits. The external store is
//! the system of record.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a controlled document.
///
/// Transitions between states are validated by the
/// [state machine](crate::domain::lifecycle); only the forward path
/// `Draft → UnderReview → Approved → Published` is supported, with
/// `Obsolete` reachable from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    /// Being authored; not yet submitted for review.
    Draft,
    /// Submitted and awaiting an approval decision.
    UnderReview,
    /// Approved with a revision label and effective dates.
    Approved,
    /// Released to the published collection.
    Published,
    /// Retired, optionally superseded by another document.
    Obsolete,
}

impl LifecycleStatus {
    /// Returns the canonical external string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::UnderReview => "UnderReview",
            Self::Approved => "Approved",
            Self::Published => "Published",
            Self::Obsolete => "Obsolete",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognised lifecycle status.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown lifecycle status '{0}'")]
pub struct UnknownStatusError(String);

impl FromStr for LifecycleStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "UnderReview" => Ok(Self::UnderReview),
            "Approved" => Ok(Self::Approved),
            "Published" => Ok(Self::Published),
            "Obsolete" => Ok(Self::Obsolete),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// The classification of a controlled document.
///
/// Used (together with the process or function) to derive the document code
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// A standard.
    Standard,
    /// A general procedure.
    Procedure,
    /// A standard operating procedure.
    #[serde(rename = "SOP")]
    Sop,
    /// A policy document.
    Policy,
    /// A work instruction.
    WorkInstruction,
    /// A manual.
    Manual,
    /// A form or template.
    Form,
    /// Anything that does not fit the other classifications.
    Other,
}

impl DocumentType {
    /// Returns the canonical external string for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Procedure => "Procedure",
            Self::Sop => "SOP",
            Self::Policy => "Policy",
            Self::WorkInstruction => "WorkInstruction",
            Self::Manual => "Manual",
            Self::Form => "Form",
            Self::Other => "Other",
        }
    }

    /// Returns the leading document-code token for this type.
    #[must_use]
    pub const fn type_prefix(self) -> &'static str {
        match self {
            Self::Standard => "STD",
            Self::Procedure => "PROC",
            Self::Sop => "SOP",
            Self::Policy => "POL",
            Self::WorkInstruction => "WI",
            Self::Manual => "MAN",
            Self::Form => "FORM",
            Self::Other => "DOC",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognised document type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown document type '{0}'")]
pub struct UnknownTypeError(String);

impl FromStr for DocumentType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(Self::Standard),
            "Procedure" => Ok(Self::Procedure),
            "SOP" => Ok(Self::Sop),
            "Policy" => Ok(Self::Policy),
            "WorkInstruction" => Ok(Self::WorkInstruction),
            "Manual" => Ok(Self::Manual),
            "Form" => Ok(Self::Form),
            "Other" => Ok(Self::Other),
            other => Err(UnknownTypeError(other.to_string())),
        }
    }
}

/// A reference to a user in the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Identity-provider object id. Empty for the anonymous system user.
    pub id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Primary email address.
    pub email: String,
}

impl UserRef {
    /// The anonymous "System" user, used wherever source metadata carries no
    /// user information. Records surfaced to callers never have an absent
    /// owner or approver.
    #[must_use]
    pub fn system() -> Self {
        Self {
            id: String::new(),
            display_name: "System".to_string(),
            email: String::new(),
        }
    }

    /// Whether this reference carries no identifying information at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.display_name.is_empty() && self.email.is_empty()
    }
}

/// The canonical document entity.
///
/// String URL fields are empty (rather than optional) when the record was not
/// sourced from, or written to, the corresponding collection, matching the
/// external metadata schema, which has no notion of null text columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Identifier of this record.
    pub id: String,
    /// Identifier of the backing item in the external store.
    pub external_item_id: String,
    /// Unique human-readable code, e.g. `SOP-QMS-001`. Assigned exactly once
    /// at creation and never mutated afterwards.
    pub document_code: String,
    /// Document title.
    pub title: String,
    /// Classification of the document.
    pub document_type: DocumentType,
    /// The process or function the document belongs to.
    pub process_or_function: String,
    /// The department or site the document belongs to.
    pub department_or_site: String,
    /// Free-form revision label, set when the document is approved.
    pub revision: String,
    /// Current lifecycle state.
    pub lifecycle_status: LifecycleStatus,
    /// Document owner. Never absent; defaults to the system user.
    pub owner: UserRef,
    /// Designated approver. Never absent; defaults to the system user.
    pub approver: UserRef,
    /// Date the approved document takes effect. Unset until approval.
    pub effective_date: Option<NaiveDate>,
    /// Date the document is due for periodic review. Unset until approval.
    pub next_review_date: Option<NaiveDate>,
    /// Advisory link to the document this one supersedes.
    pub supersedes_document_id: Option<String>,
    /// Advisory link to the document that superseded this one.
    pub superseded_by_document_id: Option<String>,
    /// Ordered keyword list. Stored externally as a `;`-joined string.
    pub keywords: Vec<String>,
    /// Short description of the document.
    pub summary: String,
    /// When the backing item was created.
    pub created_at: DateTime<Utc>,
    /// When the backing item was last modified.
    pub updated_at: DateTime<Utc>,
    /// Who created the backing item.
    pub created_by: UserRef,
    /// Who last modified the backing item.
    pub updated_by: UserRef,
    /// URL of the file in the authoring collection, if sourced from there.
    pub authoring_file_url: String,
    /// URL of the file in the published collection, if sourced from there.
    pub published_file_url: String,
    /// URL of the archived file, if any.
    pub archive_file_url: String,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(LifecycleStatus::Draft, "Draft")]
    #[test_case(LifecycleStatus::UnderReview, "UnderReview")]
    #[test_case(LifecycleStatus::Approved, "Approved")]
    #[test_case(LifecycleStatus::Published, "Published")]
    #[test_case(LifecycleStatus::Obsolete, "Obsolete")]
    fn status_round_trip(status: LifecycleStatus, s: &str) {
        assert_eq!(status.to_string(), s);
        assert_eq!(s.parse::<LifecycleStatus>().unwrap(), status);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "Retired".parse::<LifecycleStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown lifecycle status 'Retired'");
    }

    #[test_case(DocumentType::Standard, "STD")]
    #[test_case(DocumentType::Procedure, "PROC")]
    #[test_case(DocumentType::Sop, "SOP")]
    #[test_case(DocumentType::Policy, "POL")]
    #[test_case(DocumentType::WorkInstruction, "WI")]
    #[test_case(DocumentType::Manual, "MAN")]
    #[test_case(DocumentType::Form, "FORM")]
    #[test_case(DocumentType::Other, "DOC")]
    fn type_prefixes(document_type: DocumentType, prefix: &str) {
        assert_eq!(document_type.type_prefix(), prefix);
    }

    #[test]
    fn document_type_string_round_trip() {
        for ty in [
            DocumentType::Standard,
            DocumentType::Sop,
            DocumentType::WorkInstruction,
            DocumentType::Other,
        ] {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
    }

    #[test]
    fn system_user_is_anonymous() {
        let user = UserRef::system();
        assert_eq!(user.display_name, "System");
        assert!(user.id.is_empty());
        assert!(!user.is_empty());
    }

    #[test]
    fn serde_uses_external_names() {
        let json = serde_json::to_string(&DocumentType::Sop).unwrap();
        assert_eq!(json, "\"SOP\"");

        let user = UserRef::system();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["displayName"], "System");
    }
}
