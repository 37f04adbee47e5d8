//! Controlled Document Management
//!
//! Documents move through a regulated lifecycle (draft, review, approval,
//! publication, obsolescence) and carry a unique, human-readable document
//! code allocated against two external collections.

/// Core domain types: records, codes, capabilities, and the lifecycle state
/// machine.
pub mod domain;
pub use domain::{
    Actor, Capabilities, Config, DocumentCode, DocumentRecord, DocumentType, LifecycleStatus,
    RecordUpdate, TransitionError, UserRef,
};

/// Registry plumbing: raw-record projection, code allocation, and the
/// workflow service over an abstract document store.
pub mod registry;
pub use registry::{CodeAllocator, DocumentStore, Registry, SourceCollection, StoreError};

/// Filesystem-backed document store and local identity.
pub mod storage;
pub use storage::{DirectoryStore, LocalIdentity};
