//! Filesystem-backed storage.
//!
//! [`DirectoryStore`] implements the [`DocumentStore`](crate::registry::DocumentStore)
//! seam over two collection directories, with item metadata kept in versioned
//! YAML sidecar files. [`LocalIdentity`] is the matching
//! [`IdentityProvider`](crate::registry::IdentityProvider), backed by the
//! workspace configuration.

/// The directory-backed store and local identity.
pub mod directory;

/// Versioned YAML metadata sidecars.
pub mod sidecar;

pub use directory::{DirectoryStore, LocalIdentity};
pub use sidecar::Sidecar;
