//! A filesystem backed document store.
//!
//! Each collection is a directory under the workspace root; every content
//! file is paired with a [`Sidecar`] holding its metadata. Files without a
//! sidecar are still listed (the file name stands in for the id and the code)
//! and are adopted, gaining a sidecar and a store id, on their first metadata
//! write.

use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    domain::{Actor, ActorConfig, Config, UserRef},
    registry::{
        fields,
        store::{
            DocumentStore, IdentityError, IdentityProvider, NewItem, RawItem, SourceCollection,
            StoreError,
        },
    },
};

use super::sidecar::{SIDECAR_SUFFIX, Sidecar};

/// A document store over two collection directories.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    config: Config,
}

impl DirectoryStore {
    /// Creates a store rooted at the given path.
    #[must_use]
    pub const fn new(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// Creates both collection directories.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a directory cannot be created.
    pub fn init(&self) -> Result<(), StoreError> {
        for collection in [SourceCollection::Authoring, SourceCollection::Published] {
            fs::create_dir_all(self.collection_dir(collection))?;
        }
        Ok(())
    }

    fn collection_dir(&self, collection: SourceCollection) -> PathBuf {
        let name = match collection {
            SourceCollection::Authoring => &self.config.authoring_collection,
            SourceCollection::Published => &self.config.published_collection,
        };
        self.root.join(name)
    }

    fn find(
        &self,
        collection: SourceCollection,
        item_id: &str,
    ) -> Result<RawItem, StoreError> {
        self.list_items(collection)?
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: item_id.to_string(),
            })
    }

    /// Whether any item in either collection already carries the code.
    /// A collection directory that does not exist yet counts as empty.
    fn code_exists(&self, code: &str) -> Result<bool, StoreError> {
        for collection in [SourceCollection::Authoring, SourceCollection::Published] {
            if !self.collection_dir(collection).is_dir() {
                continue;
            }
            let taken = self.list_items(collection)?.iter().any(|item| {
                item.fields
                    .get(fields::DOCUMENT_CODE)
                    .is_some_and(|existing| existing == code)
            });
            if taken {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn sidecar_path(content_path: &Path) -> PathBuf {
    let mut name = content_path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    name.push_str(SIDECAR_SUFFIX);
    content_path.with_file_name(name)
}

fn read_sidecar(path: &Path) -> Result<Sidecar, StoreError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

fn write_sidecar(path: &Path, sidecar: &Sidecar) -> Result<(), StoreError> {
    let content = serde_yaml::to_string(sidecar)?;
    fs::write(path, content)?;
    Ok(())
}

fn raw_item(content_path: &Path) -> Result<RawItem, StoreError> {
    let display_name = content_path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    let web_url = content_path.display().to_string();

    let sidecar_file = sidecar_path(content_path);
    if sidecar_file.is_file() {
        let sidecar = read_sidecar(&sidecar_file)?;
        return Ok(RawItem {
            id: sidecar.id.to_string(),
            display_name,
            web_url,
            created: sidecar.created,
            modified: sidecar.modified,
            fields: sidecar.fields,
        });
    }

    // No sidecar: the file name stands in for the id, and projection falls
    // back to it for the code as well.
    let metadata = fs::metadata(content_path)?;
    let modified = metadata
        .modified()
        .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
    let created = metadata
        .created()
        .map_or(modified, DateTime::<Utc>::from);
    Ok(RawItem {
        id: display_name.clone(),
        display_name,
        web_url,
        created,
        modified,
        fields: BTreeMap::new(),
    })
}

impl DocumentStore for DirectoryStore {
    fn list_items(&self, collection: SourceCollection) -> Result<Vec<RawItem>, StoreError> {
        let dir = self.collection_dir(collection);
        let mut items = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Network(format!("cannot list {collection} collection: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().ends_with(SIDECAR_SUFFIX) {
                continue;
            }
            items.push(raw_item(entry.path())?);
        }
        items.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(items)
    }

    fn create_item(
        &self,
        collection: SourceCollection,
        item: NewItem,
    ) -> Result<RawItem, StoreError> {
        if let Some(code) = item.fields.get(fields::DOCUMENT_CODE)
            && !code.is_empty()
            && self.code_exists(code)?
        {
            return Err(StoreError::CodeConflict(code.clone()));
        }

        let content_path = self.collection_dir(collection).join(&item.display_name);
        if content_path.exists() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{}' already exists", item.display_name),
            )));
        }

        fs::write(&content_path, &item.content)?;
        let sidecar = Sidecar::new(item.fields);
        write_sidecar(&sidecar_path(&content_path), &sidecar)?;

        debug!(name = %item.display_name, %collection, "item created");
        raw_item(&content_path)
    }

    fn update_metadata(
        &self,
        collection: SourceCollection,
        item_id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<RawItem, StoreError> {
        let item = self.find(collection, item_id)?;
        let content_path = PathBuf::from(&item.web_url);
        let sidecar_file = sidecar_path(&content_path);

        let mut sidecar = if sidecar_file.is_file() {
            read_sidecar(&sidecar_file)?
        } else {
            // Adopt a sidecar-less file; it gains a store id here.
            let mut adopted = Sidecar::new(BTreeMap::new());
            adopted.created = item.created;
            adopted
        };
        sidecar.fields.extend(fields);
        sidecar.modified = Utc::now();
        write_sidecar(&sidecar_file, &sidecar)?;

        raw_item(&content_path)
    }

    fn delete_item(&self, collection: SourceCollection, item_id: &str) -> Result<(), StoreError> {
        let item = self.find(collection, item_id)?;
        let content_path = PathBuf::from(&item.web_url);
        let sidecar_file = sidecar_path(&content_path);
        fs::remove_file(&content_path)?;
        if sidecar_file.is_file() {
            fs::remove_file(&sidecar_file)?;
        }
        debug!(name = %item.display_name, %collection, "item deleted");
        Ok(())
    }

    fn move_item(
        &self,
        from: SourceCollection,
        item_id: &str,
        to: SourceCollection,
        new_name: Option<&str>,
    ) -> Result<RawItem, StoreError> {
        let item = self.find(from, item_id)?;
        let source_path = PathBuf::from(&item.web_url);
        let target_name = new_name.unwrap_or(&item.display_name);
        let target_path = self.collection_dir(to).join(target_name);
        if target_path.exists() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{target_name}' already exists in {to} collection"),
            )));
        }

        fs::rename(&source_path, &target_path)?;
        let source_sidecar = sidecar_path(&source_path);
        if source_sidecar.is_file() {
            let mut sidecar = read_sidecar(&source_sidecar)?;
            sidecar.modified = Utc::now();
            write_sidecar(&sidecar_path(&target_path), &sidecar)?;
            fs::remove_file(&source_sidecar)?;
        }

        debug!(name = %item.display_name, %from, %to, "item moved");
        raw_item(&target_path)
    }
}

/// The workspace-configured identity: a name, an email, and a role list.
///
/// There is no token service behind a local workspace; the "token" is a
/// fixed session marker, and it is never persisted.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    actor: ActorConfig,
}

impl LocalIdentity {
    /// Creates an identity from the configured actor.
    #[must_use]
    pub const fn new(actor: ActorConfig) -> Self {
        Self { actor }
    }

    /// The acting user with capabilities derived from the configured roles.
    ///
    /// Falls back to the anonymous system user when no operator is
    /// configured.
    #[must_use]
    pub fn actor(&self) -> Actor {
        let user = self.current_account().unwrap_or_else(UserRef::system);
        Actor::new(user, self.actor.roles.clone())
    }
}

impl IdentityProvider for LocalIdentity {
    fn acquire_token(&self) -> Result<String, IdentityError> {
        if self.current_account().is_none() {
            return Err(IdentityError::NoAccount);
        }
        Ok("local-session".to_string())
    }

    fn current_account(&self) -> Option<UserRef> {
        if self.actor.name.is_empty() && self.actor.email.is_empty() {
            return None;
        }
        Some(UserRef {
            id: self.actor.email.clone(),
            display_name: self.actor.name.clone(),
            email: self.actor.email.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, DirectoryStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(tmp.path().to_path_buf(), Config::default());
        store.init().unwrap();
        (tmp, store)
    }

    fn new_item(name: &str, code: &str) -> NewItem {
        let mut fields_map = BTreeMap::new();
        if !code.is_empty() {
            fields_map.insert(fields::DOCUMENT_CODE.to_string(), code.to_string());
        }
        NewItem {
            display_name: name.to_string(),
            fields: fields_map,
            content: b"content".to_vec(),
        }
    }

    #[test]
    fn create_then_list() {
        let (_tmp, store) = store();
        let created = store
            .create_item(
                SourceCollection::Authoring,
                new_item("calibration.docx", "SOP-QMS-001"),
            )
            .unwrap();

        let items = store.list_items(SourceCollection::Authoring).unwrap();
        assert_eq!(items, vec![created.clone()]);
        assert_eq!(items[0].fields[fields::DOCUMENT_CODE], "SOP-QMS-001");
        assert!(store
            .list_items(SourceCollection::Published)
            .unwrap()
            .is_empty());
        // Ids are store-assigned uuids, not file names.
        assert_ne!(created.id, created.display_name);
    }

    #[test]
    fn code_uniqueness_spans_both_collections() {
        let (_tmp, store) = store();
        store
            .create_item(
                SourceCollection::Published,
                new_item("released.pdf", "SOP-QMS-001"),
            )
            .unwrap();

        let err = store
            .create_item(
                SourceCollection::Authoring,
                new_item("draft.docx", "SOP-QMS-001"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::CodeConflict(code) if code == "SOP-QMS-001"));
    }

    #[test]
    fn update_merges_fields_and_bumps_modified() {
        let (_tmp, store) = store();
        let created = store
            .create_item(
                SourceCollection::Authoring,
                new_item("draft.docx", "SOP-QMS-001"),
            )
            .unwrap();

        let mut update = BTreeMap::new();
        update.insert(fields::REVISION.to_string(), "B".to_string());
        let updated = store
            .update_metadata(SourceCollection::Authoring, &created.id, update)
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.fields[fields::DOCUMENT_CODE], "SOP-QMS-001");
        assert_eq!(updated.fields[fields::REVISION], "B");
        assert!(updated.modified >= created.modified);
    }

    #[test]
    fn update_missing_item_is_not_found() {
        let (_tmp, store) = store();
        let err = store
            .update_metadata(SourceCollection::Authoring, "nope", BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn move_between_collections_with_rename() {
        let (_tmp, store) = store();
        let created = store
            .create_item(
                SourceCollection::Authoring,
                new_item("draft.docx", "SOP-QMS-001"),
            )
            .unwrap();

        let moved = store
            .move_item(
                SourceCollection::Authoring,
                &created.id,
                SourceCollection::Published,
                Some("released.pdf"),
            )
            .unwrap();

        assert_eq!(moved.id, created.id);
        assert_eq!(moved.display_name, "released.pdf");
        assert!(store
            .list_items(SourceCollection::Authoring)
            .unwrap()
            .is_empty());
        assert_eq!(
            store.list_items(SourceCollection::Published).unwrap(),
            vec![moved]
        );
    }

    #[test]
    fn delete_removes_content_and_sidecar() {
        let (tmp, store) = store();
        let created = store
            .create_item(
                SourceCollection::Authoring,
                new_item("draft.docx", "SOP-QMS-001"),
            )
            .unwrap();

        store
            .delete_item(SourceCollection::Authoring, &created.id)
            .unwrap();
        assert!(store
            .list_items(SourceCollection::Authoring)
            .unwrap()
            .is_empty());
        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("authoring"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn sidecar_less_files_are_listed_by_name() {
        let (tmp, store) = store();
        fs::write(tmp.path().join("authoring/SOP-QMS-007 legacy.docx"), b"x").unwrap();

        let items = store.list_items(SourceCollection::Authoring).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "SOP-QMS-007 legacy.docx");
        assert!(items[0].fields.is_empty());
    }

    #[test]
    fn missing_collection_directory_fails_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(tmp.path().to_path_buf(), Config::default());
        assert!(store.list_items(SourceCollection::Authoring).is_err());
    }

    #[test]
    fn local_identity_builds_actor_from_config() {
        let identity = LocalIdentity::new(ActorConfig {
            name: "Olive Owner".to_string(),
            email: "olive@example.com".to_string(),
            roles: vec!["Approver".to_string()],
        });
        assert_eq!(identity.acquire_token().unwrap(), "local-session");
        let actor = identity.actor();
        assert_eq!(actor.user.display_name, "Olive Owner");
        assert!(actor.capabilities.can_approve());

        let anonymous = LocalIdentity::new(ActorConfig::default());
        assert!(anonymous.current_account().is_none());
        assert!(matches!(
            anonymous.acquire_token(),
            Err(IdentityError::NoAccount)
        ));
        assert_eq!(anonymous.actor().user, UserRef::system());
    }
}
