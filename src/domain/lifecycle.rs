//! The lifecycle state machine.
//!
//! Transitions are pure functions: given the current record, the acting
//! user's capabilities, and the transition input, they produce the set of
//! fields to persist ([`RecordUpdate`]) or a typed error. The input record is
//! never mutated; callers persist the update through the store and then
//! re-project.
//!
//! Only the forward path is implemented: `Draft → UnderReview → Approved →
//! Published`, plus `Obsolete` from any non-Obsolete state. There is no
//! rejection path back to `Draft`.

use chrono::NaiveDate;
use tracing::info;

use super::{
    access::Actor,
    record::{DocumentRecord, LifecycleStatus, UserRef},
};

/// Errors raised by transition attempts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition is not defined for the record's current
    /// state.
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        /// The record's current lifecycle state.
        from: LifecycleStatus,
        /// The requested target state.
        to: LifecycleStatus,
    },

    /// The actor lacks the capability the transition requires. Carries only
    /// the attempted target, never whether the record itself would have
    /// permitted the transition.
    #[error("not permitted to transition this document to {to}")]
    Permission {
        /// The requested target state.
        to: LifecycleStatus,
    },

    /// A required transition input is missing or empty.
    #[error("invalid transition input: {0}")]
    Validation(String),
}

/// Input for the `UnderReview → Approved` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    /// Revision label to stamp on the approved document. Must be non-empty.
    pub revision: String,
    /// Date the document takes effect. Mandatory.
    pub effective_date: Option<NaiveDate>,
    /// Date the document is due for periodic review. Mandatory.
    pub next_review_date: Option<NaiveDate>,
}

/// Input for the transition to `Obsolete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Obsolescence {
    /// The document that supersedes this one, if any. Advisory link only.
    pub superseded_by_document_id: Option<String>,
    /// Free-form note. Logged for audit, not persisted to the record.
    pub notes: Option<String>,
}

/// The fields a successful transition requires the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// The new lifecycle state.
    pub lifecycle_status: LifecycleStatus,
    /// New revision label, set on approval.
    pub revision: Option<String>,
    /// New effective date, set on approval.
    pub effective_date: Option<NaiveDate>,
    /// New next-review date, set on approval.
    pub next_review_date: Option<NaiveDate>,
    /// URL of the published file, set on publication.
    pub published_file_url: Option<String>,
    /// Link to the superseding document, set on obsolescence.
    pub superseded_by_document_id: Option<String>,
    /// The actor responsible for the change.
    pub updated_by: UserRef,
}

impl RecordUpdate {
    fn status_only(lifecycle_status: LifecycleStatus, updated_by: UserRef) -> Self {
        Self {
            lifecycle_status,
            revision: None,
            effective_date: None,
            next_review_date: None,
            published_file_url: None,
            superseded_by_document_id: None,
            updated_by,
        }
    }

    /// Applies this update to a copy of the given record.
    #[must_use]
    pub fn apply_to(&self, record: &DocumentRecord) -> DocumentRecord {
        let mut updated = record.clone();
        updated.lifecycle_status = self.lifecycle_status;
        if let Some(revision) = &self.revision {
            updated.revision.clone_from(revision);
        }
        if let Some(date) = self.effective_date {
            updated.effective_date = Some(date);
        }
        if let Some(date) = self.next_review_date {
            updated.next_review_date = Some(date);
        }
        if let Some(url) = &self.published_file_url {
            updated.published_file_url.clone_from(url);
        }
        if let Some(id) = &self.superseded_by_document_id {
            updated.superseded_by_document_id = Some(id.clone());
        }
        updated.updated_by = self.updated_by.clone();
        updated
    }
}

/// Whether the transition from `from` to `to` appears in the transition
/// table.
const fn transition_defined(from: LifecycleStatus, to: LifecycleStatus) -> bool {
    use LifecycleStatus::{Approved, Draft, Obsolete, Published, UnderReview};
    matches!(
        (from, to),
        (Draft, UnderReview) | (UnderReview, Approved) | (Approved, Published)
    ) || matches!((from, to), (Draft | UnderReview | Approved | Published, Obsolete))
}

fn capability_granted(record: &DocumentRecord, actor: &Actor, to: LifecycleStatus) -> bool {
    let caps = actor.capabilities;
    match to {
        LifecycleStatus::UnderReview => {
            let is_owner = !actor.user.id.is_empty() && actor.user.id == record.owner.id;
            caps.can_author() || is_owner
        }
        LifecycleStatus::Approved => caps.can_approve(),
        LifecycleStatus::Published => caps.can_publish(),
        LifecycleStatus::Obsolete => caps.can_administer(),
        LifecycleStatus::Draft => false,
    }
}

/// Checks whether `actor` may move `record` to the `target` state.
///
/// State is checked before capability, so an undefined transition reports
/// [`TransitionError::InvalidTransition`] regardless of who asks; a defined
/// transition without the required capability fails closed with a
/// [`TransitionError::Permission`] that names only the attempted target.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] or
/// [`TransitionError::Permission`] as above.
pub fn authorize(
    record: &DocumentRecord,
    actor: &Actor,
    target: LifecycleStatus,
) -> Result<(), TransitionError> {
    if !transition_defined(record.lifecycle_status, target) {
        return Err(TransitionError::InvalidTransition {
            from: record.lifecycle_status,
            to: target,
        });
    }
    if !capability_granted(record, actor, target) {
        return Err(TransitionError::Permission { to: target });
    }
    Ok(())
}

/// `Draft → UnderReview`: submit a draft for approval.
///
/// Requires the author capability, or that the actor owns the record. Notes
/// are advisory and logged only.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] if the record is not a
/// draft, or [`TransitionError::Permission`] if the actor may not submit it.
pub fn request_approval(
    record: &DocumentRecord,
    actor: &Actor,
    notes: Option<&str>,
) -> Result<RecordUpdate, TransitionError> {
    authorize(record, actor, LifecycleStatus::UnderReview)?;
    if let Some(notes) = notes {
        info!(document = %record.document_code, notes, "approval requested");
    }
    Ok(RecordUpdate::status_only(
        LifecycleStatus::UnderReview,
        actor.user.clone(),
    ))
}

/// `UnderReview → Approved`: record an approval decision.
///
/// Requires the approver capability. The revision label and both dates are
/// mandatory.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`], [`TransitionError::Permission`],
/// or [`TransitionError::Validation`] when the revision is empty or a date is
/// missing.
pub fn approve(
    record: &DocumentRecord,
    actor: &Actor,
    approval: &Approval,
) -> Result<RecordUpdate, TransitionError> {
    authorize(record, actor, LifecycleStatus::Approved)?;

    if approval.revision.trim().is_empty() {
        return Err(TransitionError::Validation(
            "revision must not be empty".to_string(),
        ));
    }
    let effective_date = approval.effective_date.ok_or_else(|| {
        TransitionError::Validation("effective date is required".to_string())
    })?;
    let next_review_date = approval.next_review_date.ok_or_else(|| {
        TransitionError::Validation("next review date is required".to_string())
    })?;

    let mut update = RecordUpdate::status_only(LifecycleStatus::Approved, actor.user.clone());
    update.revision = Some(approval.revision.clone());
    update.effective_date = Some(effective_date);
    update.next_review_date = Some(next_review_date);
    Ok(update)
}

/// `Approved → Published`: release the document.
///
/// Requires the publish capability (admin or QHSE). The caller materializes
/// the published file first, by whatever means, and passes its URL; an empty
/// URL is rejected.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`], [`TransitionError::Permission`],
/// or [`TransitionError::Validation`] when the URL is empty.
pub fn publish(
    record: &DocumentRecord,
    actor: &Actor,
    published_file_url: &str,
) -> Result<RecordUpdate, TransitionError> {
    authorize(record, actor, LifecycleStatus::Published)?;

    if published_file_url.trim().is_empty() {
        return Err(TransitionError::Validation(
            "published file URL must not be empty".to_string(),
        ));
    }

    let mut update = RecordUpdate::status_only(LifecycleStatus::Published, actor.user.clone());
    update.published_file_url = Some(published_file_url.to_string());
    Ok(update)
}

/// `any non-Obsolete → Obsolete`: retire the document.
///
/// Requires the administer capability. The superseding-document link is
/// optional and advisory; notes are logged only.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] when the record is already
/// obsolete, or [`TransitionError::Permission`].
pub fn mark_obsolete(
    record: &DocumentRecord,
    actor: &Actor,
    obsolescence: &Obsolescence,
) -> Result<RecordUpdate, TransitionError> {
    authorize(record, actor, LifecycleStatus::Obsolete)?;

    if let Some(notes) = &obsolescence.notes {
        info!(document = %record.document_code, notes, "document marked obsolete");
    }

    let mut update = RecordUpdate::status_only(LifecycleStatus::Obsolete, actor.user.clone());
    update
        .superseded_by_document_id
        .clone_from(&obsolescence.superseded_by_document_id);
    Ok(update)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use test_case::test_case;

    use super::*;
    use crate::domain::record::DocumentType;

    fn record(status: LifecycleStatus) -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id: "doc-1".to_string(),
            external_item_id: "42".to_string(),
            document_code: "SOP-QMS-001".to_string(),
            title: "Calibration".to_string(),
            document_type: DocumentType::Sop,
            process_or_function: "QMS".to_string(),
            department_or_site: "HQ".to_string(),
            revision: String::new(),
            lifecycle_status: status,
            owner: UserRef {
                id: "owner-1".to_string(),
                display_name: "Olive Owner".to_string(),
                email: "olive@example.com".to_string(),
            },
            approver: UserRef::system(),
            effective_date: None,
            next_review_date: None,
            supersedes_document_id: None,
            superseded_by_document_id: None,
            keywords: Vec::new(),
            summary: String::new(),
            created_at: now,
            updated_at: now,
            created_by: UserRef::system(),
            updated_by: UserRef::system(),
            authoring_file_url: "https://store/auth/doc".to_string(),
            published_file_url: String::new(),
            archive_file_url: String::new(),
        }
    }

    fn actor(roles: &[&str]) -> Actor {
        Actor::new(
            UserRef {
                id: "actor-1".to_string(),
                display_name: "Alex Actor".to_string(),
                email: "alex@example.com".to_string(),
            },
            roles.iter().map(ToString::to_string).collect(),
        )
    }

    fn approval() -> Approval {
        Approval {
            revision: "B".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            next_review_date: NaiveDate::from_ymd_opt(2027, 9, 1),
        }
    }

    #[test]
    fn full_forward_walk() {
        let draft = record(LifecycleStatus::Draft);
        let author = actor(&["Author"]);
        let approver = actor(&["Approver"]);
        let qhse = actor(&["QHSE"]);
        let admin = actor(&["Admin"]);

        let update = request_approval(&draft, &author, Some("ready")).unwrap();
        let under_review = update.apply_to(&draft);
        assert_eq!(under_review.lifecycle_status, LifecycleStatus::UnderReview);

        let update = approve(&under_review, &approver, &approval()).unwrap();
        let approved = update.apply_to(&under_review);
        assert_eq!(approved.lifecycle_status, LifecycleStatus::Approved);
        assert_eq!(approved.revision, "B");
        assert!(approved.effective_date.is_some());

        let update = publish(&approved, &qhse, "https://store/pub/doc").unwrap();
        let published = update.apply_to(&approved);
        assert_eq!(published.lifecycle_status, LifecycleStatus::Published);
        assert_eq!(published.published_file_url, "https://store/pub/doc");

        let update = mark_obsolete(
            &published,
            &admin,
            &Obsolescence {
                superseded_by_document_id: Some("doc-9".to_string()),
                notes: Some("replaced".to_string()),
            },
        )
        .unwrap();
        assert_eq!(update.lifecycle_status, LifecycleStatus::Obsolete);
        assert_eq!(update.superseded_by_document_id.as_deref(), Some("doc-9"));
        let obsolete = update.apply_to(&published);
        assert_eq!(
            obsolete.superseded_by_document_id.as_deref(),
            Some("doc-9")
        );
        assert_eq!(obsolete.updated_by.id, "actor-1");
    }

    #[test]
    fn skipping_states_is_invalid_regardless_of_capabilities() {
        let draft = record(LifecycleStatus::Draft);
        let admin = actor(&["Admin", "QHSE", "Approver", "Author"]);
        let err = publish(&draft, &admin, "https://store/pub/doc").unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: LifecycleStatus::Draft,
                to: LifecycleStatus::Published,
            }
        );
    }

    #[test]
    fn obsolete_is_terminal() {
        let obsolete = record(LifecycleStatus::Obsolete);
        let admin = actor(&["Admin"]);
        let err = mark_obsolete(&obsolete, &admin, &Obsolescence::default()).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn missing_capability_fails_closed() {
        let under_review = record(LifecycleStatus::UnderReview);
        let author = actor(&["Author"]);
        let err = approve(&under_review, &author, &approval()).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Permission {
                to: LifecycleStatus::Approved
            }
        );
        // The message names only the attempted target.
        assert_eq!(
            err.to_string(),
            "not permitted to transition this document to Approved"
        );
    }

    #[test]
    fn owner_may_request_approval_without_author_role() {
        let draft = record(LifecycleStatus::Draft);
        let owner = Actor::new(
            UserRef {
                id: "owner-1".to_string(),
                display_name: "Olive Owner".to_string(),
                email: "olive@example.com".to_string(),
            },
            Vec::new(),
        );
        assert!(request_approval(&draft, &owner, None).is_ok());

        let stranger = Actor::new(
            UserRef {
                id: "other".to_string(),
                display_name: "Someone Else".to_string(),
                email: String::new(),
            },
            Vec::new(),
        );
        assert!(matches!(
            request_approval(&draft, &stranger, None),
            Err(TransitionError::Permission { .. })
        ));
    }

    #[test]
    fn anonymous_actor_does_not_match_anonymous_owner() {
        let mut draft = record(LifecycleStatus::Draft);
        draft.owner = UserRef::system();
        let anonymous = Actor::new(UserRef::system(), Vec::new());
        assert!(matches!(
            request_approval(&draft, &anonymous, None),
            Err(TransitionError::Permission { .. })
        ));
    }

    #[test_case("", true; "empty revision")]
    #[test_case("   ", true; "whitespace revision")]
    #[test_case("B", false; "valid revision")]
    fn approve_validates_revision(revision: &str, expect_err: bool) {
        let under_review = record(LifecycleStatus::UnderReview);
        let approver = actor(&["Approver"]);
        let input = Approval {
            revision: revision.to_string(),
            ..approval()
        };
        let result = approve(&under_review, &approver, &input);
        assert_eq!(
            matches!(result, Err(TransitionError::Validation(_))),
            expect_err
        );
    }

    #[test]
    fn approve_requires_both_dates() {
        let under_review = record(LifecycleStatus::UnderReview);
        let approver = actor(&["Approver"]);
        for input in [
            Approval {
                effective_date: None,
                ..approval()
            },
            Approval {
                next_review_date: None,
                ..approval()
            },
        ] {
            assert!(matches!(
                approve(&under_review, &approver, &input),
                Err(TransitionError::Validation(_))
            ));
        }
    }

    #[test]
    fn publish_rejects_empty_url() {
        let approved = record(LifecycleStatus::Approved);
        let admin = actor(&["Admin"]);
        assert!(matches!(
            publish(&approved, &admin, ""),
            Err(TransitionError::Validation(_))
        ));
    }

    #[test]
    fn qhse_cannot_mark_obsolete() {
        let published = record(LifecycleStatus::Published);
        let qhse = actor(&["QHSE"]);
        assert!(matches!(
            mark_obsolete(&published, &qhse, &Obsolescence::default()),
            Err(TransitionError::Permission { .. })
        ));
    }

    #[test]
    fn transition_does_not_mutate_input() {
        let draft = record(LifecycleStatus::Draft);
        let author = actor(&["Author"]);
        let before = draft.clone();
        let _ = request_approval(&draft, &author, None).unwrap();
        assert_eq!(draft, before);
    }
}
