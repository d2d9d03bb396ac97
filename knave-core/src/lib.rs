//! Character keeper for the Knave tabletop role-playing game.
//!
//! This crate provides:
//! - Dice and random table rolling
//! - Character sheets for both rules editions, with derived armor class,
//!   slot capacity and level
//! - Starting gear and reroll actions
//! - A roster persisted to a key/value store after every change
//! - Plain text and Markdown exports
//! - Homebrew spell and item libraries
//!
//! # Quick Start
//!
//! ```ignore
//! use knave_core::{session_rng, to_plain_text, MemoryStore, RuleSet, SheetStore};
//!
//! let mut store = SheetStore::load(MemoryStore::new(), RuleSet::default(), session_rng(None));
//! store.update_active(|character, _, _| character.name = "Wren".into())?;
//! println!("{}", to_plain_text(store.active(), store.rules()));
//! ```

pub mod character;
pub mod character_builder;
pub mod dice;
pub mod export;
pub mod homebrew;
pub mod input;
pub mod persist;
pub mod roster;
pub mod rules;
pub mod tables;

// Primary public API
pub use character::{
    Attribute, AttributeScore, Attributes, Character, CharacterId, HitPoints, Item, ItemEdit,
    ItemEditError, ItemId, ItemKind, TraitKind, Traits,
};
pub use character_builder::{generate_character, CharacterBuilder};
pub use dice::{session_rng, DiceError, DiceExpression, RollResult};
pub use export::{
    item_details, to_markdown, to_plain_text, write_export, ExportError, ExportFormat,
};
pub use homebrew::{CustomItemDef, CustomSpell, HomebrewError, HomebrewLibrary};
pub use persist::{
    FileStore, KeyValueStore, LoadSource, MemoryStore, PersistError, SheetError, SheetStore,
};
pub use roster::{Roster, RosterError};
pub use rules::{Edition, Encumbrance, RuleSet};
pub use tables::{find_table, roll_tables, RandomTable, RollRequest, TableRoll, TABLES};
