//! Domain models for controlled documents.
//!
//! This module contains the core domain types: the document record and its
//! lifecycle status, document codes, actor capabilities, the lifecycle state
//! machine, and configuration.

/// Document record, lifecycle status, and user references.
pub mod record;
pub use record::{DocumentRecord, DocumentType, LifecycleStatus, UserRef};

/// Document code types and parsing.
pub mod code;
pub use code::{DocumentCode, Error as CodeError};

/// Role-derived capabilities and actor sessions.
pub mod access;
pub use access::{Actor, Capabilities};

/// The lifecycle state machine.
pub mod lifecycle;
pub use lifecycle::{Approval, Obsolescence, RecordUpdate, TransitionError};

mod config;
pub use config::{ActorConfig, Config};
