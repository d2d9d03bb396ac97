//! Character generation.
//!
//! Builds fresh sheets under a [`RuleSet`] and implements the "reroll"
//! actions that regenerate one part of an existing sheet.

use crate::character::{Attribute, Character, Item, TraitKind, Traits};
use crate::dice::{d20, pick, DiceExpression};
use crate::rules::{GearScript, RuleSet};
use crate::tables::{
    armor_for_roll, roll_trait, HelmetShield, DUNGEONEERING_GEAR, GENERAL_GEAR_1, GENERAL_GEAR_2,
    SPELLS,
};
use rand::Rng;

/// Dice for the second edition coin purse, multiplied by [`COIN_MULTIPLIER`].
pub const COIN_DICE: &str = "3d6";

pub const COIN_MULTIPLIER: u32 = 10;

/// Builder for new characters.
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    rules: RuleSet,
    name: Option<String>,
    random_traits: bool,
    starting_gear: bool,
}

impl CharacterBuilder {
    /// A builder producing a bare sheet: rolled attributes and hit points only.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            name: None,
            random_traits: false,
            starting_gear: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Also roll every trait.
    pub fn random_traits(mut self) -> Self {
        self.random_traits = true;
        self
    }

    /// Also hand out the edition's starting kit.
    pub fn starting_gear(mut self) -> Self {
        self.starting_gear = true;
        self
    }

    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Character {
        let stats = self.rules.roll_attributes(rng);
        let hp = self.rules.roll_hit_points(rng, 1);
        let mut character = Character::new(stats, hp);

        if let Some(name) = self.name {
            character.name = name;
        }
        if self.random_traits {
            character.traits = roll_traits(rng);
        }
        if self.starting_gear {
            character.inventory = starting_gear(rng, &self.rules, &character);
        }

        tracing::debug!(
            id = %character.id,
            edition = %self.rules.edition,
            hp = character.hp.max,
            "Generated character"
        );
        character
    }
}

/// A default sheet: level 1, no xp, empty traits and inventory.
pub fn generate_character<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet) -> Character {
    CharacterBuilder::new(*rules).build(rng)
}

/// Roll every trait table once.
pub fn roll_traits<R: Rng + ?Sized>(rng: &mut R) -> Traits {
    let mut traits = Traits::default();
    for kind in TraitKind::all() {
        traits.set(kind, roll_trait(rng, kind));
    }
    traits
}

/// The edition's scripted starting kit, in sheet order.
pub fn starting_gear<R: Rng + ?Sized>(
    rng: &mut R,
    rules: &RuleSet,
    character: &Character,
) -> Vec<Item> {
    let mut kit = vec![
        Item::food("Travel rations (2 days)", 1),
        Item::weapon("Weapon of choice", 1, "d6").with_quality(3),
    ];

    let body = armor_for_roll(d20(rng));
    if body.slots > 0 {
        let defense = match rules.gear_script {
            GearScript::FirstEdition => body.armor_class,
            GearScript::SecondEdition => body.bonus,
        };
        kit.push(Item::armor(body.name, body.slots, defense).with_quality(body.quality));
    }

    let extras = HelmetShield::for_roll(d20(rng));
    if extras.has_helmet() {
        kit.push(Item::armor("Helmet", 1, 1).with_quality(1));
    }
    if extras.has_shield() {
        kit.push(Item::armor("Shield", 1, 1).with_quality(1));
    }

    match rules.gear_script {
        GearScript::FirstEdition => {
            kit.push(gear_pick(rng, DUNGEONEERING_GEAR));
            kit.push(gear_pick(rng, DUNGEONEERING_GEAR));
            kit.push(gear_pick(rng, GENERAL_GEAR_1));
            kit.push(gear_pick(rng, GENERAL_GEAR_2));
        }
        GearScript::SecondEdition => {
            kit.push(gear_pick(rng, DUNGEONEERING_GEAR));
            kit.push(gear_pick(rng, GENERAL_GEAR_1));
            kit.push(gear_pick(rng, GENERAL_GEAR_2));

            kit.push(Item::gear(format!("Coins ({})", roll_coins(rng)), 0));

            let spellbooks = character.stats.get(Attribute::Intelligence).bonus();
            for _ in 0..spellbooks {
                let spell = pick(rng, SPELLS).copied().unwrap_or_default();
                kit.push(Item::gear(format!("Spellbook: {spell}"), 1));
            }
        }
    }

    kit
}

fn gear_pick<R: Rng + ?Sized>(rng: &mut R, table: &'static [&'static str]) -> Item {
    Item::gear(pick(rng, table).copied().unwrap_or_default(), 1)
}

fn roll_coins<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    match DiceExpression::parse(COIN_DICE) {
        Ok(expr) => expr.roll_with_rng(rng).total.max(0) as u32 * COIN_MULTIPLIER,
        Err(e) => {
            tracing::error!(error = %e, "Coin dice failed to parse");
            0
        }
    }
}

// ============================================================================
// Reroll Actions
// ============================================================================

/// Reroll all six attributes.
pub fn reroll_attributes<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet, character: &mut Character) {
    character.stats = rules.roll_attributes(rng);
}

/// Reroll hit points as `level` hit dice; current is reset to the new maximum.
pub fn reroll_hit_points<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet, character: &mut Character) {
    let total = rules.roll_hit_points(rng, character.level);
    character.hp.reset(total);
}

pub fn randomize_traits<R: Rng + ?Sized>(rng: &mut R, character: &mut Character) {
    character.traits = roll_traits(rng);
}

/// Replace the inventory with a fresh starting kit.
pub fn generate_starting_gear<R: Rng + ?Sized>(
    rng: &mut R,
    rules: &RuleSet,
    character: &mut Character,
) {
    character.inventory = starting_gear(rng, rules, character);
}

/// Regenerate attributes, hit points, traits and gear in one go. Name, level,
/// experience and memo are kept.
pub fn reroll_everything<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet, character: &mut Character) {
    reroll_attributes(rng, rules, character);
    reroll_hit_points(rng, rules, character);
    randomize_traits(rng, character);
    generate_starting_gear(rng, rules, character);
}
