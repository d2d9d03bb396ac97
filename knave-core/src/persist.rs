//! Character persistence.
//!
//! Storage is a flat string key/value space, the same shape a browser's local
//! storage has. [`SheetStore`] sits on top of it, owns the roster, and writes
//! the whole character list back after every change.

use crate::character::{Character, CharacterId, ItemId};
use crate::character_builder::generate_character;
use crate::roster::{Roster, RosterError};
use crate::rules::RuleSet;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key holding the JSON array of every character.
pub const CHARACTERS_KEY: &str = "knave_characters_list";

/// Key older versions used for their single character.
pub const LEGACY_CHARACTER_KEY: &str = "knave_character_data";

/// Key an unreadable character list is copied to before it is replaced.
pub const CHARACTERS_BACKUP_KEY: &str = "knave_characters_backup";

/// Key holding the homebrew spell list.
pub const CUSTOM_SPELLS_KEY: &str = "knave_custom_spells";

/// Key holding the homebrew item list.
pub const CUSTOM_ITEMS_KEY: &str = "knave_custom_items";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Errors from sheet store mutations.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Failed to save characters: {0}")]
    Persist(#[from] PersistError),
}

// ============================================================================
// Key/Value Storage
// ============================================================================

/// A string key/value store.
pub trait KeyValueStore {
    /// The value under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// In-memory storage, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a directory, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Where the roster came from on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The character list key.
    List,
    /// The character list key, with some entries that could not be read.
    PartialList,
    /// A single character under the legacy key.
    Legacy,
    /// Nothing usable was stored; a fresh character was generated.
    Fresh,
}

/// Give blank ids a fresh value, for records written by hand or by old versions.
fn repair_ids(character: &mut Character) {
    if character.id.0.trim().is_empty() {
        character.id = CharacterId::new();
    }
    for item in &mut character.inventory {
        if item.id.0.trim().is_empty() {
            item.id = ItemId::new();
        }
    }
}

/// Parse the stored list one entry at a time.
///
/// Entries that fail to parse are logged and skipped; the rest survive.
/// Returns the readable characters and whether anything was skipped.
fn parse_list(raw: &str) -> (Vec<Character>, bool) {
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Stored character list is corrupt");
            return (Vec::new(), true);
        }
    };

    let total = entries.len();
    let characters: Vec<Character> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Character>(entry) {
            Ok(character) => Some(character),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping unreadable character");
                None
            }
        })
        .collect();

    if total == 0 {
        tracing::warn!("Stored character list is empty");
    }
    let skipped = characters.len() < total;
    (characters, skipped)
}

fn read_legacy<S: KeyValueStore>(storage: &S) -> Option<Character> {
    let raw = match storage.get(LEGACY_CHARACTER_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read legacy character");
            return None;
        }
    };
    match serde_json::from_str::<Character>(&raw) {
        Ok(character) => Some(character),
        Err(e) => {
            tracing::warn!(error = %e, "Legacy character data is corrupt");
            None
        }
    }
}

/// Read the roster from storage, migrating or generating as needed.
///
/// Never fails: anything unreadable is logged and replaced by one fresh
/// default character.
pub fn load_roster<S: KeyValueStore>(
    storage: &S,
    rules: &RuleSet,
    rng: &mut StdRng,
) -> (Roster, LoadSource) {
    let listed = storage.get(CHARACTERS_KEY).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read character list");
        None
    });

    let loaded = match listed {
        Some(raw) => match parse_list(&raw) {
            (list, _) if list.is_empty() => None,
            (list, false) => Some((list, LoadSource::List)),
            (list, true) => Some((list, LoadSource::PartialList)),
        },
        None => read_legacy(storage).map(|character| (vec![character], LoadSource::Legacy)),
    };
    let (mut characters, source) =
        loaded.unwrap_or_else(|| (vec![generate_character(rng, rules)], LoadSource::Fresh));

    characters.iter_mut().for_each(repair_ids);
    tracing::info!(count = characters.len(), source = ?source, "Loaded characters");

    let roster = match Roster::from_characters(characters) {
        Some(roster) => roster,
        None => Roster::new(generate_character(rng, rules)),
    };
    (roster, source)
}

// ============================================================================
// Sheet Store
// ============================================================================

/// The roster plus the storage it mirrors to.
///
/// Every mutating method saves the full list before returning. If the save
/// fails the in-memory change is kept and the error is returned.
pub struct SheetStore<S: KeyValueStore> {
    storage: S,
    rules: RuleSet,
    rng: StdRng,
    roster: Roster,
    source: LoadSource,
}

impl<S: KeyValueStore> SheetStore<S> {
    /// Load the roster from `storage`. Migrated, repaired or freshly
    /// generated rosters are written back straight away, after any stored
    /// list that could not be fully read is copied to
    /// [`CHARACTERS_BACKUP_KEY`].
    pub fn load(storage: S, rules: RuleSet, mut rng: StdRng) -> Self {
        let (roster, source) = load_roster(&storage, &rules, &mut rng);
        let mut store = Self {
            storage,
            rules,
            rng,
            roster,
            source,
        };
        if source != LoadSource::List {
            store.back_up_stored_list();
            if let Err(e) = store.save() {
                tracing::error!(error = %e, "Failed to write initial character list");
            }
        }
        store
    }

    /// Copy whatever sits under [`CHARACTERS_KEY`] to the backup key.
    fn back_up_stored_list(&mut self) {
        let raw = match self.storage.get(CHARACTERS_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() && raw.trim() != "[]" => raw,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read character list for backup");
                return;
            }
        };
        match self.storage.set(CHARACTERS_BACKUP_KEY, &raw) {
            Ok(()) => tracing::warn!(
                key = CHARACTERS_BACKUP_KEY,
                "Backed up unreadable character list"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to back up character list"),
        }
    }

    /// Serialize the whole roster to [`CHARACTERS_KEY`].
    pub fn save(&mut self) -> Result<(), PersistError> {
        let json = serde_json::to_string(self.roster.characters())?;
        self.storage.set(CHARACTERS_KEY, &json)?;
        tracing::debug!(count = self.roster.len(), "Saved characters");
        Ok(())
    }

    fn save_logged(&mut self) -> Result<(), PersistError> {
        self.save().map_err(|e| {
            tracing::error!(error = %e, "Failed to save characters");
            e
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn active(&self) -> &Character {
        self.roster.active()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn load_source(&self) -> LoadSource {
        self.source
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Apply `edit` to the active character, then save.
    pub fn update_active<T>(
        &mut self,
        edit: impl FnOnce(&mut Character, &RuleSet, &mut StdRng) -> T,
    ) -> Result<T, PersistError> {
        let out = edit(self.roster.active_mut(), &self.rules, &mut self.rng);
        self.save_logged()?;
        Ok(out)
    }

    /// Generate a default character, append it, select it, save.
    pub fn create_character(&mut self) -> Result<CharacterId, PersistError> {
        let character = generate_character(&mut self.rng, &self.rules);
        let id = self.roster.add(character);
        tracing::info!(id = %id, "Created character");
        self.save_logged()?;
        Ok(id)
    }

    pub fn delete_character(&mut self, id: &CharacterId) -> Result<Character, SheetError> {
        let removed = self.roster.remove(id)?;
        tracing::info!(id = %id, "Deleted character");
        self.save_logged()?;
        Ok(removed)
    }

    /// Change the active character. Selection is not persisted.
    pub fn select(&mut self, id: &CharacterId) -> Result<(), RosterError> {
        self.roster.select(id)
    }
}
