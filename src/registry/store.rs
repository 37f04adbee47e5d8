//! Seams to the external world.
//!
//! The registry depends on two trait interfaces rather than a concrete
//! backend: a [`DocumentStore`] holding the two collections, and an
//! [`IdentityProvider`] vending tokens and the current account. A
//! filesystem-backed store lives in [`crate::storage`]; a transport-backed
//! one would implement the same traits.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserRef;

/// Which of the two external collections an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCollection {
    /// In-progress (pre-publication) documents.
    Authoring,
    /// The registry of record for published documents.
    Published,
}

impl fmt::Display for SourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Authoring => "authoring",
            Self::Published => "published",
        })
    }
}

/// A raw item as the external store reports it.
///
/// `fields` carries the collection's metadata columns by their external
/// names; nothing here is validated or defaulted, that is the projector's
/// job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// Store-assigned item identifier.
    pub id: String,
    /// Display name, typically the file name.
    pub display_name: String,
    /// URL of the backing file in the store.
    pub web_url: String,
    /// When the item was created.
    pub created: DateTime<Utc>,
    /// When the item was last modified.
    pub modified: DateTime<Utc>,
    /// Metadata columns by external name.
    pub fields: BTreeMap<String, String>,
}

/// Payload for creating a new item in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Display name for the new item (file name).
    pub display_name: String,
    /// Metadata columns to set, by external name.
    pub fields: BTreeMap<String, String>,
    /// File content.
    pub content: Vec<u8>,
}

/// Errors raised by document-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced item does not exist in the collection.
    #[error("item '{id}' not found in {collection} collection")]
    NotFound {
        /// The collection that was searched.
        collection: SourceCollection,
        /// The item id that was requested.
        id: String,
    },

    /// An item with the same document code already exists.
    #[error("document code '{0}' already exists")]
    CodeConflict(String),

    /// Transport failure reaching the store.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem failure in a local store.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A metadata sidecar could not be read or written.
    #[error("sidecar error: {0}")]
    Sidecar(#[from] serde_yaml::Error),
}

/// The document store seam: two collections of items with metadata.
///
/// Implementations provide at least per-item atomic field updates; no
/// cross-item transactions are assumed.
pub trait DocumentStore {
    /// Lists every item in the given collection.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the collection cannot be read.
    fn list_items(&self, collection: SourceCollection) -> Result<Vec<RawItem>, StoreError>;

    /// Creates a new item, enforcing document-code uniqueness across both
    /// collections.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CodeConflict`] when the payload's document code
    /// is already taken, or another [`StoreError`] on failure.
    fn create_item(
        &self,
        collection: SourceCollection,
        item: NewItem,
    ) -> Result<RawItem, StoreError>;

    /// Merges the given metadata fields into an existing item and returns the
    /// updated item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item does not exist, or
    /// another [`StoreError`] on failure.
    fn update_metadata(
        &self,
        collection: SourceCollection,
        item_id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<RawItem, StoreError>;

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item does not exist, or
    /// another [`StoreError`] on failure.
    fn delete_item(&self, collection: SourceCollection, item_id: &str) -> Result<(), StoreError>;

    /// Moves an item between collections, optionally renaming it, and
    /// returns the item as it exists at the destination.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item does not exist, or
    /// another [`StoreError`] on failure.
    fn move_item(
        &self,
        from: SourceCollection,
        item_id: &str,
        to: SourceCollection,
        new_name: Option<&str>,
    ) -> Result<RawItem, StoreError>;
}

/// Errors raised by the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No account is signed in.
    #[error("no account is signed in")]
    NoAccount,

    /// Token acquisition failed.
    #[error("token acquisition failed: {0}")]
    Token(String),
}

/// The identity-provider seam.
///
/// Tokens are ephemeral; implementations never persist them.
pub trait IdentityProvider {
    /// Acquires an access token for the external store.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] when no account is available or the token
    /// cannot be obtained.
    fn acquire_token(&self) -> Result<String, IdentityError>;

    /// The signed-in account, if any.
    fn current_account(&self) -> Option<UserRef>;
}
