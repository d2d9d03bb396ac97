//! The list of characters a player keeps.
//!
//! A roster is never empty and always has one active character.

use crate::character::{Character, CharacterId};
use thiserror::Error;

/// Errors from roster operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Cannot delete the last remaining character")]
    LastCharacter,

    #[error("No character with id {0}")]
    NotFound(CharacterId),
}

/// An ordered, non-empty list of characters with a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    characters: Vec<Character>,
    active: usize,
}

impl Roster {
    /// A roster holding one character, which is active.
    pub fn new(first: Character) -> Self {
        Self {
            characters: vec![first],
            active: 0,
        }
    }

    /// Build from a loaded list. Returns `None` for an empty list.
    pub fn from_characters(characters: Vec<Character>) -> Option<Self> {
        if characters.is_empty() {
            return None;
        }
        Some(Self {
            characters,
            active: 0,
        })
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// A built roster is never empty.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn active(&self) -> &Character {
        &self.characters[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Character {
        &mut self.characters[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    fn position(&self, id: &CharacterId) -> Result<usize, RosterError> {
        self.characters
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| RosterError::NotFound(id.clone()))
    }

    /// Append a character and make it active.
    pub fn add(&mut self, character: Character) -> CharacterId {
        let id = character.id.clone();
        self.characters.push(character);
        self.active = self.characters.len() - 1;
        id
    }

    pub fn select(&mut self, id: &CharacterId) -> Result<(), RosterError> {
        self.active = self.position(id)?;
        Ok(())
    }

    /// Delete a character.
    ///
    /// Refuses to delete the only character. If the active character is
    /// removed, the first remaining character becomes active.
    pub fn remove(&mut self, id: &CharacterId) -> Result<Character, RosterError> {
        let index = self.position(id)?;
        if self.characters.len() == 1 {
            return Err(RosterError::LastCharacter);
        }

        let removed = self.characters.remove(index);
        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AttributeScore, Attributes};

    fn named(name: &str) -> Character {
        let mut character = Character::new(Attributes::from_fn(|_| AttributeScore::points(0)), 4);
        character.name = name.to_string();
        character
    }

    #[test]
    fn test_add_selects_new_character() {
        let mut roster = Roster::new(named("A"));
        roster.add(named("B"));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.active().name, "B");
    }

    #[test]
    fn test_cannot_delete_last_character() {
        let first = named("Solo");
        let id = first.id.clone();
        let mut roster = Roster::new(first);

        assert_eq!(roster.remove(&id), Err(RosterError::LastCharacter));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.active().name, "Solo");
    }

    #[test]
    fn test_remove_active_falls_back_to_first() {
        let mut roster = Roster::new(named("A"));
        roster.add(named("B"));
        let c = roster.add(named("C"));

        let removed = roster.remove(&c).unwrap();
        assert_eq!(removed.name, "C");
        assert_eq!(roster.active().name, "A");
    }

    #[test]
    fn test_remove_before_active_keeps_selection() {
        let a = named("A");
        let a_id = a.id.clone();
        let mut roster = Roster::new(a);
        roster.add(named("B"));
        roster.add(named("C"));

        roster.remove(&a_id).unwrap();
        assert_eq!(roster.active().name, "C");
        assert_eq!(roster.active_index(), 1);
    }

    #[test]
    fn test_select_unknown_id() {
        let mut roster = Roster::new(named("A"));
        let missing = CharacterId("nope".into());
        assert_eq!(
            roster.select(&missing),
            Err(RosterError::NotFound(missing.clone()))
        );
    }

    #[test]
    fn test_from_empty_list() {
        assert!(Roster::from_characters(Vec::new()).is_none());
    }
}
