//! Metadata sidecar files.
//!
//! Each content file in a collection directory is paired with a
//! `<name>.meta.yaml` sidecar carrying the item's id, timestamps, and
//! metadata columns. The on-disk format is versioned so it can evolve
//! without breaking existing workspaces.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The suffix appended to a content file's name to form its sidecar's name.
pub const SIDECAR_SUFFIX: &str = ".meta.yaml";

/// An item's stored metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Sidecar {
    /// Store-assigned item id.
    pub id: Uuid,
    /// When the item was created.
    pub created: DateTime<Utc>,
    /// When the item was last modified.
    pub modified: DateTime<Utc>,
    /// Metadata columns by external name.
    pub fields: BTreeMap<String, String>,
}

impl Sidecar {
    /// Creates a sidecar for a brand-new item, stamped with the current time.
    #[must_use]
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created: now,
            modified: now,
            fields,
        }
    }
}

/// The serialized versions of the sidecar format.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        id: Uuid,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
}

impl From<Versions> for Sidecar {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                id,
                created,
                modified,
                fields,
            } => Self {
                id,
                created,
                modified,
                fields,
            },
        }
    }
}

impl From<Sidecar> for Versions {
    fn from(sidecar: Sidecar) -> Self {
        Self::V1 {
            id: sidecar.id,
            created: sidecar.created,
            modified: sidecar.modified,
            fields: sidecar.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip() {
        let mut fields = BTreeMap::new();
        fields.insert("dm_document_code".to_string(), "SOP-QMS-001".to_string());
        let sidecar = Sidecar::new(fields);

        let yaml = serde_yaml::to_string(&sidecar).unwrap();
        assert!(yaml.contains("_version: '1'"));
        let parsed: Sidecar = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, sidecar);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let yaml = "_version: '1'\nid: 8c2c9e9e-0000-4000-8000-000000000000\ncreated: 2026-01-01T00:00:00Z\nmodified: 2026-01-02T00:00:00Z\n";
        let sidecar: Sidecar = serde_yaml::from_str(yaml).unwrap();
        assert!(sidecar.fields.is_empty());
    }
}
