//! Homebrew content: player-authored spells and items.
//!
//! Each kind lives in its own list under its own storage key and is loaded and
//! saved independently of the character roster.

use crate::persist::{KeyValueStore, PersistError, CUSTOM_ITEMS_KEY, CUSTOM_SPELLS_KEY};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from homebrew edits.
#[derive(Debug, Error)]
pub enum HomebrewError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("No entry with id {0}")]
    NotFound(String),

    #[error("Failed to save homebrew: {0}")]
    Persist(#[from] PersistError),
}

/// A homebrew record stored in a [`HomebrewLibrary`].
pub trait HomebrewEntry: Clone + Serialize + DeserializeOwned {
    /// Storage key for the whole list.
    const STORAGE_KEY: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn name(&self) -> &str;
}

/// A custom spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSpell {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CustomSpell {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
        }
    }
}

impl HomebrewEntry for CustomSpell {
    const STORAGE_KEY: &'static str = CUSTOM_SPELLS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A custom item. `cost` is free text ("30c", "a favor").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomItemDef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub description: String,
}

impl CustomItemDef {
    pub fn new(
        name: impl Into<String>,
        cost: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            cost: cost.into(),
            description: description.into(),
        }
    }
}

impl HomebrewEntry for CustomItemDef {
    const STORAGE_KEY: &'static str = CUSTOM_ITEMS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An ordered list of homebrew entries of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomebrewLibrary<T> {
    entries: Vec<T>,
}

impl<T> Default for HomebrewLibrary<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: HomebrewEntry> HomebrewLibrary<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the list from storage. Missing or unreadable data yields an empty
    /// library; failures are logged.
    pub fn load<S: KeyValueStore>(storage: &S) -> Self {
        let raw = match storage.get(T::STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(),
            Err(e) => {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "Failed to read homebrew");
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(mut entries) => {
                for entry in entries.iter_mut().filter(|e| e.id().is_empty()) {
                    entry.set_id(Uuid::new_v4().to_string());
                }
                Self { entries }
            }
            Err(e) => {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "Homebrew data is corrupt");
                Self::new()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, storage: &mut S) -> Result<(), PersistError> {
        let json = serde_json::to_string(&self.entries)?;
        storage.set(T::STORAGE_KEY, &json)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Append an entry under a fresh id and return the id.
    pub fn add(&mut self, mut entry: T) -> Result<String, HomebrewError> {
        if entry.name().trim().is_empty() {
            return Err(HomebrewError::EmptyName);
        }
        let id = Uuid::new_v4().to_string();
        entry.set_id(id.clone());
        self.entries.push(entry);
        Ok(id)
    }

    /// Replace the entry with `id`, keeping its id and position.
    pub fn update(&mut self, id: &str, mut entry: T) -> Result<(), HomebrewError> {
        if entry.name().trim().is_empty() {
            return Err(HomebrewError::EmptyName);
        }
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| HomebrewError::NotFound(id.to_string()))?;
        entry.set_id(id.to_string());
        *slot = entry;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<T, HomebrewError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| HomebrewError::NotFound(id.to_string()))?;
        Ok(self.entries.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    #[test]
    fn test_add_rejects_blank_names() {
        let mut spells = HomebrewLibrary::<CustomSpell>::new();
        assert!(matches!(
            spells.add(CustomSpell::new("   ", "nothing")),
            Err(HomebrewError::EmptyName)
        ));
        assert!(spells.is_empty());
    }

    #[test]
    fn test_update_keeps_id_and_position() {
        let mut items = HomebrewLibrary::<CustomItemDef>::new();
        let first = items.add(CustomItemDef::new("Eel lamp", "12c", "Glows wet")).unwrap();
        items.add(CustomItemDef::new("Bone dice", "1c", "")).unwrap();

        items
            .update(&first, CustomItemDef::new("Eel lantern", "15c", "Glows wetter"))
            .unwrap();
        assert_eq!(items.entries()[0].id, first);
        assert_eq!(items.entries()[0].name, "Eel lantern");
        assert_eq!(items.entries()[0].cost, "15c");

        assert!(matches!(
            items.update("missing", CustomItemDef::new("x", "", "")),
            Err(HomebrewError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut spells = HomebrewLibrary::<CustomSpell>::new();
        let id = spells.add(CustomSpell::new("Moth Swarm", "")).unwrap();
        assert_eq!(spells.remove(&id).unwrap().name, "Moth Swarm");
        assert!(matches!(spells.remove(&id), Err(HomebrewError::NotFound(_))));
    }

    #[test]
    fn test_lists_persist_under_separate_keys() {
        let mut storage = MemoryStore::new();
        let mut spells = HomebrewLibrary::<CustomSpell>::new();
        spells.add(CustomSpell::new("Lantern Eye", "See through flame")).unwrap();
        spells.save(&mut storage).unwrap();

        let mut items = HomebrewLibrary::<CustomItemDef>::new();
        items.add(CustomItemDef::new("Salt rope", "5c", "")).unwrap();
        items.save(&mut storage).unwrap();

        let spells_back = HomebrewLibrary::<CustomSpell>::load(&storage);
        let items_back = HomebrewLibrary::<CustomItemDef>::load(&storage);
        assert_eq!(spells_back, spells);
        assert_eq!(items_back, items);
        assert!(storage.get(CUSTOM_SPELLS_KEY).unwrap().is_some());
        assert!(storage.get(CUSTOM_ITEMS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_corrupt_homebrew_loads_empty() {
        let mut storage = MemoryStore::new();
        storage.set(CUSTOM_SPELLS_KEY, "not json").unwrap();
        assert!(HomebrewLibrary::<CustomSpell>::load(&storage).is_empty());
        assert!(HomebrewLibrary::<CustomItemDef>::load(&storage).is_empty());
    }

    #[test]
    fn test_entries_without_ids_get_one() {
        let mut storage = MemoryStore::new();
        storage
            .set(CUSTOM_ITEMS_KEY, r#"[{"name": "Old map", "cost": "3c"}]"#)
            .unwrap();
        let items = HomebrewLibrary::<CustomItemDef>::load(&storage);
        assert_eq!(items.len(), 1);
        assert!(!items.entries()[0].id.is_empty());
        assert_eq!(items.entries()[0].description, "");
    }
}
