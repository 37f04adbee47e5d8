//! The registry workflow service.
//!
//! [`Registry`] ties projection, allocation, access control, and the
//! lifecycle state machine together over an abstract [`DocumentStore`]: the
//! same operations a workflow backend would expose, minus the transport.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::domain::{
    Actor, DocumentRecord, DocumentType, LifecycleStatus, TransitionError, code, lifecycle,
    lifecycle::{Approval, Obsolescence},
};

use super::{
    allocator::CodeAllocator,
    fields, projector,
    store::{DocumentStore, NewItem, RawItem, SourceCollection, StoreError},
};

/// How many times `create` recomputes the code after a conflict before
/// giving up.
const ALLOCATION_ATTEMPTS: u32 = 3;

/// Errors raised by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A lifecycle transition was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No document with the given id exists in either collection.
    #[error("document '{0}' not found")]
    NotFound(String),

    /// The actor lacks the capability the operation requires.
    #[error("not permitted to {0}")]
    Permission(&'static str),

    /// Every allocation attempt collided with a concurrently created code.
    #[error("could not allocate a unique document code after {0} attempts")]
    AllocationConflict(u32),
}

/// Input for creating a new draft document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Document title.
    pub title: String,
    /// Classification, used to derive the code prefix.
    pub document_type: DocumentType,
    /// Process or function, used to derive the code prefix.
    pub process_or_function: String,
    /// Department or site.
    pub department_or_site: String,
    /// Keywords.
    pub keywords: Vec<String>,
    /// Summary text.
    pub summary: String,
    /// File name for the authoring copy.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// A partial metadata update. Absent fields are left unchanged.
///
/// There is deliberately no way to change the document code or the lifecycle
/// status here: codes are immutable and status changes go through the
/// transition operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    /// New title.
    pub title: Option<String>,
    /// New process or function.
    pub process_or_function: Option<String>,
    /// New department or site.
    pub department_or_site: Option<String>,
    /// New keyword list.
    pub keywords: Option<Vec<String>>,
    /// New summary.
    pub summary: Option<String>,
}

impl MetadataUpdate {
    fn into_fields(self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(title) = self.title {
            map.insert(fields::TITLE.to_string(), title);
        }
        if let Some(process) = self.process_or_function {
            map.insert(fields::PROCESS_OR_FUNCTION.to_string(), process);
        }
        if let Some(department) = self.department_or_site {
            map.insert(fields::DEPARTMENT_OR_SITE.to_string(), department);
        }
        if let Some(keywords) = self.keywords {
            map.insert(
                fields::KEYWORDS.to_string(),
                fields::join_keywords(&keywords),
            );
        }
        if let Some(summary) = self.summary {
            map.insert(fields::SUMMARY.to_string(), summary);
        }
        map
    }
}

/// Filters and pagination for listing documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Keep only documents in this state.
    pub status: Option<LifecycleStatus>,
    /// Keep only documents of this type.
    pub document_type: Option<DocumentType>,
    /// Case-insensitive substring match over code, title, summary, and
    /// keywords.
    pub search: Option<String>,
    /// 1-based page number. Zero is treated as the first page.
    pub page: usize,
    /// Page size. Zero disables pagination.
    pub page_size: usize,
}

impl DocumentQuery {
    fn matches(&self, record: &DocumentRecord) -> bool {
        if self.status.is_some_and(|s| s != record.lifecycle_status) {
            return false;
        }
        if self
            .document_type
            .is_some_and(|t| t != record.document_type)
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let matched = record.document_code.to_lowercase().contains(&needle)
                || record.title.to_lowercase().contains(&needle)
                || record.summary.to_lowercase().contains(&needle)
                || record
                    .keywords
                    .iter()
                    .any(|k| k.to_lowercase().contains(&needle));
            if !matched {
                return false;
            }
        }
        true
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The records on this page.
    pub items: Vec<T>,
    /// Total matching records across all pages.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    /// Page size used.
    pub page_size: usize,
}

/// How the published file comes to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishInput {
    /// A manually supplied rendered file, bypassing conversion.
    Rendered {
        /// File name for the published copy.
        file_name: String,
        /// Rendered file content.
        content: Vec<u8>,
    },
    /// Move the authoring file as-is; conversion is the store's concern.
    AutoConvert,
}

/// The registry workflow service over a document store.
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> Registry<'a, S> {
    /// Creates a registry over the given store.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// A code allocator over the same store.
    #[must_use]
    pub const fn allocator(&self) -> CodeAllocator<'a, S> {
        CodeAllocator::new(self.store)
    }

    /// Lists documents from both collections, filtered and paginated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] when either collection cannot be
    /// listed.
    pub fn list(&self, query: &DocumentQuery) -> Result<Page<DocumentRecord>, RegistryError> {
        let mut records = Vec::new();
        for collection in [SourceCollection::Authoring, SourceCollection::Published] {
            for item in self.store.list_items(collection)? {
                let record = projector::project(&item, collection);
                if query.matches(&record) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| {
            a.document_code
                .cmp(&b.document_code)
                .then_with(|| a.title.cmp(&b.title))
        });

        let total = records.len();
        let page = query.page.max(1);
        let items = if query.page_size == 0 {
            records
        } else {
            records
                .into_iter()
                .skip((page - 1) * query.page_size)
                .take(query.page_size)
                .collect()
        };
        Ok(Page {
            items,
            total,
            page,
            page_size: query.page_size,
        })
    }

    /// Fetches a single document by store item id, searching the authoring
    /// collection first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no item with the id exists in
    /// either collection.
    pub fn get(&self, id: &str) -> Result<DocumentRecord, RegistryError> {
        let (collection, raw) = self.locate(id)?;
        Ok(projector::project(&raw, collection))
    }

    /// Creates a new draft in the authoring collection, allocating its
    /// document code.
    ///
    /// Allocation and creation form one optimistic transaction: the store
    /// enforces code uniqueness, and on conflict the code is recomputed and
    /// the create retried a bounded number of times.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Permission`] when the actor cannot author,
    /// [`RegistryError::AllocationConflict`] when every attempt collided, or
    /// [`RegistryError::Store`] on other store failures.
    pub fn create(
        &self,
        new: &NewDocument,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        if !actor.capabilities.can_author() {
            return Err(RegistryError::Permission("create documents"));
        }

        let prefix = code::code_prefix(new.document_type, &new.process_or_function);
        for attempt in 1..=ALLOCATION_ATTEMPTS {
            let sequence = self.allocator().next_sequence(&prefix);
            let document_code = format!("{prefix}{sequence}");
            let item = NewItem {
                display_name: new.file_name.clone(),
                fields: creation_fields(new, &document_code, actor),
                content: new.content.clone(),
            };
            match self.store.create_item(SourceCollection::Authoring, item) {
                Ok(raw) => {
                    info!(code = %document_code, "document created");
                    return Ok(projector::project(&raw, SourceCollection::Authoring));
                }
                Err(StoreError::CodeConflict(code)) => {
                    warn!(%code, attempt, "code conflict, recomputing");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Err(RegistryError::AllocationConflict(ALLOCATION_ATTEMPTS))
    }

    /// Updates a document's descriptive metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Permission`] when the actor can neither
    /// author nor owns the record, [`RegistryError::NotFound`], or
    /// [`RegistryError::Store`].
    pub fn update(
        &self,
        id: &str,
        update: MetadataUpdate,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        let (collection, raw) = self.locate(id)?;
        let record = projector::project(&raw, collection);
        let is_owner = !actor.user.id.is_empty() && actor.user.id == record.owner.id;
        if !(actor.capabilities.can_author() || is_owner) {
            return Err(RegistryError::Permission("update this document"));
        }
        let updated = self
            .store
            .update_metadata(collection, &raw.id, update.into_fields())?;
        Ok(projector::project(&updated, collection))
    }

    /// Submits a draft for review.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Transition`], or
    /// [`RegistryError::Store`].
    pub fn request_approval(
        &self,
        id: &str,
        notes: Option<&str>,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        self.transition(id, |record| lifecycle::request_approval(record, actor, notes))
    }

    /// Records an approval decision.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Transition`], or
    /// [`RegistryError::Store`].
    pub fn approve(
        &self,
        id: &str,
        approval: &Approval,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        self.transition(id, |record| lifecycle::approve(record, actor, approval))
    }

    /// Publishes an approved document.
    ///
    /// The published file is materialized first (either the supplied rendered
    /// file is created in the published collection, or the authoring file is
    /// moved there) and its URL feeds the lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Transition`], or
    /// [`RegistryError::Store`].
    pub fn publish(
        &self,
        id: &str,
        input: PublishInput,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        let (collection, raw) = self.locate(id)?;
        let record = projector::project(&raw, collection);

        // Authorize before touching any files.
        lifecycle::authorize(&record, actor, LifecycleStatus::Published)?;

        let published_item = match input {
            PublishInput::Rendered { file_name, content } => {
                // Create the published copy before removing the authoring
                // item, so a failed create leaves the draft intact. The code
                // field is withheld here (the still-present authoring copy
                // holds it, and the store enforces uniqueness) and restored
                // by the metadata write below.
                let mut metadata = raw.fields.clone();
                metadata.remove(fields::DOCUMENT_CODE);
                let published = self.store.create_item(
                    SourceCollection::Published,
                    NewItem {
                        display_name: file_name,
                        fields: metadata,
                        content,
                    },
                )?;
                self.store.delete_item(collection, &raw.id)?;
                published
            }
            PublishInput::AutoConvert => {
                if collection == SourceCollection::Published {
                    raw
                } else {
                    self.store
                        .move_item(collection, &raw.id, SourceCollection::Published, None)?
                }
            }
        };

        let update = lifecycle::publish(&record, actor, &published_item.web_url)?;
        let mut stamped = projector::update_fields(&update);
        stamped.insert(
            fields::DOCUMENT_CODE.to_string(),
            record.document_code.clone(),
        );
        let updated =
            self.store
                .update_metadata(SourceCollection::Published, &published_item.id, stamped)?;
        Ok(projector::project(&updated, SourceCollection::Published))
    }

    /// Marks a document obsolete.
    ///
    /// When a superseding document is named, the reverse link on that record
    /// is maintained best-effort: a failure there is logged and does not fail
    /// the obsolescence.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Transition`], or
    /// [`RegistryError::Store`].
    pub fn mark_obsolete(
        &self,
        id: &str,
        obsolescence: &Obsolescence,
        actor: &Actor,
    ) -> Result<DocumentRecord, RegistryError> {
        let record =
            self.transition(id, |record| lifecycle::mark_obsolete(record, actor, obsolescence))?;

        if let Some(superseding_id) = &obsolescence.superseded_by_document_id {
            let mut reverse = BTreeMap::new();
            reverse.insert(
                fields::SUPERSEDES_DOCUMENT_ID.to_string(),
                record.id.clone(),
            );
            let result = self
                .locate(superseding_id)
                .and_then(|(collection, raw)| {
                    self.store
                        .update_metadata(collection, &raw.id, reverse)
                        .map_err(RegistryError::from)
                });
            if let Err(error) = result {
                // Advisory link only; the obsolescence itself stands.
                warn!(%superseding_id, %error, "could not set reverse supersedes link");
            }
        }
        Ok(record)
    }

    /// Deletes a document from whichever collection holds it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Permission`] when the actor is not an
    /// administrator, [`RegistryError::NotFound`], or [`RegistryError::Store`].
    pub fn delete(&self, id: &str, actor: &Actor) -> Result<(), RegistryError> {
        if !actor.capabilities.can_administer() {
            return Err(RegistryError::Permission("delete documents"));
        }
        let (collection, raw) = self.locate(id)?;
        self.store.delete_item(collection, &raw.id)?;
        info!(code = %raw.fields.get(fields::DOCUMENT_CODE).map_or("", String::as_str), "document deleted");
        Ok(())
    }

    fn transition(
        &self,
        id: &str,
        apply: impl FnOnce(&DocumentRecord) -> Result<lifecycle::RecordUpdate, TransitionError>,
    ) -> Result<DocumentRecord, RegistryError> {
        let (collection, raw) = self.locate(id)?;
        let record = projector::project(&raw, collection);
        let update = apply(&record)?;
        let updated =
            self.store
                .update_metadata(collection, &raw.id, projector::update_fields(&update))?;
        Ok(projector::project(&updated, collection))
    }

    fn locate(&self, id: &str) -> Result<(SourceCollection, RawItem), RegistryError> {
        for collection in [SourceCollection::Authoring, SourceCollection::Published] {
            if let Some(item) = self
                .store
                .list_items(collection)?
                .into_iter()
                .find(|item| item.id == id)
            {
                return Ok((collection, item));
            }
        }
        Err(RegistryError::NotFound(id.to_string()))
    }
}

fn creation_fields(
    new: &NewDocument,
    document_code: &str,
    actor: &Actor,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(fields::TITLE.to_string(), new.title.clone());
    map.insert(fields::DOCUMENT_CODE.to_string(), document_code.to_string());
    map.insert(
        fields::DOCUMENT_TYPE.to_string(),
        new.document_type.to_string(),
    );
    map.insert(
        fields::PROCESS_OR_FUNCTION.to_string(),
        new.process_or_function.clone(),
    );
    map.insert(
        fields::DEPARTMENT_OR_SITE.to_string(),
        new.department_or_site.clone(),
    );
    map.insert(
        fields::KEYWORDS.to_string(),
        fields::join_keywords(&new.keywords),
    );
    map.insert(fields::SUMMARY.to_string(), new.summary.clone());
    map.insert(
        fields::LIFECYCLE_STATUS.to_string(),
        LifecycleStatus::Draft.to_string(),
    );
    map.insert(fields::OWNER.to_string(), actor.user.display_name.clone());
    map.insert(fields::OWNER_ID.to_string(), actor.user.id.clone());
    map.insert(fields::OWNER_EMAIL.to_string(), actor.user.email.clone());
    map
}
