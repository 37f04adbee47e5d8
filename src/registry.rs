//! The document registry.
//!
//! Two external collections (authoring and published) are treated as one
//! logical registry. [`store`] defines the seam to the external world;
//! [`projector`] normalizes raw items into canonical records; [`allocator`]
//! computes the next document-code sequence; [`service`] ties the pieces
//! together into the workflow operations.

/// External field names and the projection default table.
pub mod fields;

/// The store and identity-provider seams.
pub mod store;
pub use store::{
    DocumentStore, IdentityError, IdentityProvider, NewItem, RawItem, SourceCollection, StoreError,
};

/// Raw item → canonical record projection.
pub mod projector;

/// Document-code sequence allocation.
pub mod allocator;
pub use allocator::{CodeAllocator, PrefixMatch};

/// The workflow service over an abstract store.
pub mod service;
pub use service::{
    DocumentQuery, MetadataUpdate, NewDocument, Page, PublishInput, Registry, RegistryError,
};
