//! Edition rules.
//!
//! The two editions of the game disagree on how attributes are generated, how
//! armor stacks, how many slots a character can carry and which die gives hit
//! points. A [`RuleSet`] bundles one choice for each, and everything that
//! depends on the edition takes a `&RuleSet` instead of branching on its own.

use crate::character::{Attribute, AttributeScore, Attributes, Character, Item, MAX_LEVEL};
use crate::dice::{d6, DieType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Armor class with no armor at all.
pub const UNARMORED_AC: u32 = 11;

/// Armor class ceiling for the capped-sum formula.
pub const MAX_AC: u32 = 18;

/// Armor at or above this defense counts as body armor.
pub const BODY_ARMOR_THRESHOLD: u32 = 10;

/// Base slot count for the second edition.
pub const BASE_SLOTS: u32 = 10;

/// How attributes are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatMethod {
    /// 3d6 per attribute; bonus is the lowest die, defense is bonus + 10.
    DropLowest,
    /// 3d6 once; each face adds a point to its attribute.
    PointDistribution,
}

impl StatMethod {
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Attributes {
        match self {
            StatMethod::DropLowest => {
                Attributes::from_fn(|_| AttributeScore::from_dice([d6(rng), d6(rng), d6(rng)]))
            }
            StatMethod::PointDistribution => {
                let mut stats = Attributes::from_fn(|_| AttributeScore::points(0));
                for _ in 0..3 {
                    let face = d6(rng);
                    if let Some(attribute) = Attribute::from_die_face(face) {
                        if let AttributeScore::Points { value } = stats.get_mut(attribute) {
                            *value += 1;
                        }
                    }
                }
                stats
            }
        }
    }
}

/// How armor class is derived from the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorFormula {
    /// 11 + every armor piece's defense, at most 18.
    CappedSum,
    /// Best body armor (defense >= 10, else 11) plus every smaller piece.
    BodyPlusAccessories,
}

impl ArmorFormula {
    pub fn armor_class(&self, inventory: &[Item]) -> u32 {
        let armor = inventory.iter().filter(|i| i.is_armor());
        match self {
            ArmorFormula::CappedSum => {
                let total = saturating_total(armor.map(Item::defense));
                UNARMORED_AC.saturating_add(total).min(MAX_AC)
            }
            ArmorFormula::BodyPlusAccessories => {
                let (body, accessories): (Vec<&Item>, Vec<&Item>) =
                    armor.partition(|i| i.defense() >= BODY_ARMOR_THRESHOLD);
                let base = body
                    .iter()
                    .map(|i| i.defense())
                    .fold(UNARMORED_AC, u32::max);
                base.saturating_add(saturating_total(accessories.iter().map(|i| i.defense())))
            }
        }
    }
}

fn saturating_total(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

/// How many inventory slots a character has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityFormula {
    /// Equal to constitution defense.
    ConstitutionDefense,
    /// 10 + constitution value.
    TenPlusConstitution,
}

impl CapacityFormula {
    pub fn capacity(&self, stats: &Attributes) -> u32 {
        match self {
            CapacityFormula::ConstitutionDefense => stats.constitution.defense(),
            CapacityFormula::TenPlusConstitution => {
                BASE_SLOTS.saturating_add(stats.constitution.bonus())
            }
        }
    }
}

/// Which scripted starting kit to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearScript {
    FirstEdition,
    SecondEdition,
}

/// Rules edition presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edition {
    First,
    Second,
}

impl Edition {
    pub fn name(&self) -> &'static str {
        match self {
            Edition::First => "First Edition",
            Edition::Second => "Second Edition",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1e" | "first" => Ok(Edition::First),
            "2" | "2e" | "second" => Ok(Edition::Second),
            other => Err(format!("Unknown edition: {other}")),
        }
    }
}

/// Slot usage against capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encumbrance {
    pub used: u32,
    pub capacity: u32,
}

impl Encumbrance {
    pub fn is_overencumbered(&self) -> bool {
        self.used > self.capacity
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.used)
    }
}

/// One consistent set of edition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub edition: Edition,
    pub stat_method: StatMethod,
    pub armor_formula: ArmorFormula,
    pub capacity_formula: CapacityFormula,
    pub hit_die: DieType,
    pub gear_script: GearScript,
}

impl RuleSet {
    pub fn first_edition() -> Self {
        Self {
            edition: Edition::First,
            stat_method: StatMethod::DropLowest,
            armor_formula: ArmorFormula::BodyPlusAccessories,
            capacity_formula: CapacityFormula::ConstitutionDefense,
            hit_die: DieType::D8,
            gear_script: GearScript::FirstEdition,
        }
    }

    pub fn second_edition() -> Self {
        Self {
            edition: Edition::Second,
            stat_method: StatMethod::PointDistribution,
            armor_formula: ArmorFormula::CappedSum,
            capacity_formula: CapacityFormula::TenPlusConstitution,
            hit_die: DieType::D6,
            gear_script: GearScript::SecondEdition,
        }
    }

    pub fn for_edition(edition: Edition) -> Self {
        match edition {
            Edition::First => Self::first_edition(),
            Edition::Second => Self::second_edition(),
        }
    }

    pub fn roll_attributes<R: Rng + ?Sized>(&self, rng: &mut R) -> Attributes {
        self.stat_method.roll(rng)
    }

    /// Sum of `level` hit dice, rolling at least one and at most [`MAX_LEVEL`].
    pub fn roll_hit_points<R: Rng + ?Sized>(&self, rng: &mut R, level: u32) -> u32 {
        (0..level.clamp(1, MAX_LEVEL))
            .fold(0u32, |hp, _| hp.saturating_add(self.hit_die.roll(rng)))
    }

    pub fn armor_class(&self, character: &Character) -> u32 {
        self.armor_formula.armor_class(&character.inventory)
    }

    pub fn slot_capacity(&self, character: &Character) -> u32 {
        self.capacity_formula.capacity(&character.stats)
    }

    pub fn encumbrance(&self, character: &Character) -> Encumbrance {
        Encumbrance {
            used: character.slots_used(),
            capacity: self.slot_capacity(character),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::second_edition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::session_rng;

    fn armor(defense: u32) -> Item {
        Item::armor("Armor", 1, defense)
    }

    #[test]
    fn test_capped_sum_unarmored() {
        let inventory = vec![Item::gear("Rope", 1), Item::weapon("Axe", 1, "d6")];
        assert_eq!(ArmorFormula::CappedSum.armor_class(&inventory), 11);
        assert_eq!(ArmorFormula::CappedSum.armor_class(&[]), 11);
    }

    #[test]
    fn test_capped_sum_adds_and_caps() {
        let inventory = vec![armor(1), armor(2), Item::gear("Rope", 1)];
        assert_eq!(ArmorFormula::CappedSum.armor_class(&inventory), 14);

        let heavy = vec![armor(3), armor(3), armor(1), armor(1), armor(2)];
        assert_eq!(ArmorFormula::CappedSum.armor_class(&heavy), 18);

        let exact = vec![armor(7)];
        assert_eq!(ArmorFormula::CappedSum.armor_class(&exact), 18);
    }

    #[test]
    fn test_body_plus_accessories() {
        let formula = ArmorFormula::BodyPlusAccessories;
        assert_eq!(formula.armor_class(&[]), 11);
        assert_eq!(formula.armor_class(&[armor(1)]), 12);
        assert_eq!(formula.armor_class(&[armor(13)]), 13);
        // Only the best body armor counts.
        assert_eq!(formula.armor_class(&[armor(12), armor(14), armor(1), armor(1)]), 16);
        // Armor with zero defense counts as an accessory adding nothing.
        assert_eq!(formula.armor_class(&[armor(0)]), 11);
    }

    #[test]
    fn test_capacity_formulas() {
        let rolled = Attributes::from_fn(|_| AttributeScore::from_dice([4, 5, 6]));
        assert_eq!(CapacityFormula::ConstitutionDefense.capacity(&rolled), 14);

        let mut points = Attributes::from_fn(|_| AttributeScore::points(0));
        points.constitution = AttributeScore::points(2);
        assert_eq!(CapacityFormula::TenPlusConstitution.capacity(&points), 12);
    }

    #[test]
    fn test_point_distribution_hands_out_three_points() {
        let mut rng = session_rng(Some(5));
        for _ in 0..200 {
            let stats = StatMethod::PointDistribution.roll(&mut rng);
            let total: u32 = stats.iter().map(|(_, s)| s.bonus()).sum();
            assert_eq!(total, 3);
            assert!(stats.iter().all(|(_, s)| matches!(s, AttributeScore::Points { .. })));
        }
    }

    #[test]
    fn test_drop_lowest_scores_are_consistent() {
        let mut rng = session_rng(Some(8));
        for _ in 0..200 {
            let stats = StatMethod::DropLowest.roll(&mut rng);
            for (_, score) in stats.iter() {
                match score {
                    AttributeScore::Rolled { dice, bonus, defense } => {
                        assert_eq!(*bonus, *dice.iter().min().unwrap());
                        assert_eq!(*defense, bonus + 10);
                        assert!(dice.iter().all(|d| (1..=6).contains(d)));
                    }
                    AttributeScore::Points { .. } => panic!("expected rolled score"),
                }
            }
        }
    }

    #[test]
    fn test_hit_points_use_level_dice() {
        let mut rng = session_rng(Some(2));
        let rules = RuleSet::first_edition();
        for level in 1..6 {
            let hp = rules.roll_hit_points(&mut rng, level);
            assert!((level..=level * 8).contains(&hp));
        }
        assert!((1..=8).contains(&rules.roll_hit_points(&mut rng, 0)));
    }

    #[test]
    fn test_hit_points_at_level_ceiling() {
        let mut rng = session_rng(Some(3));
        let rules = RuleSet::second_edition();
        let hp = rules.roll_hit_points(&mut rng, u32::MAX);
        assert!((MAX_LEVEL..=MAX_LEVEL * 6).contains(&hp));
    }

    #[test]
    fn test_armor_sums_saturate() {
        let inventory = vec![armor(u32::MAX), armor(5)];
        assert_eq!(ArmorFormula::CappedSum.armor_class(&inventory), 18);

        let stacked = vec![armor(14), armor(9), armor(u32::MAX)];
        assert_eq!(ArmorFormula::BodyPlusAccessories.armor_class(&stacked), u32::MAX);

        let mut stats = Attributes::from_fn(|_| AttributeScore::points(0));
        stats.constitution = AttributeScore::points(u32::MAX);
        assert_eq!(CapacityFormula::TenPlusConstitution.capacity(&stats), u32::MAX);
    }

    #[test]
    fn test_encumbrance() {
        let rules = RuleSet::second_edition();
        let mut character = Character::new(Attributes::from_fn(|_| AttributeScore::points(1)), 4);
        character.add_item(Item::gear("Tent", 12));
        let load = rules.encumbrance(&character);
        assert_eq!(load.capacity, 11);
        assert!(load.is_overencumbered());
        assert_eq!(load.free(), 0);
    }

    #[test]
    fn test_edition_parse() {
        assert_eq!("1".parse::<Edition>(), Ok(Edition::First));
        assert_eq!("Second".parse::<Edition>(), Ok(Edition::Second));
        assert!("third".parse::<Edition>().is_err());
        assert_eq!(RuleSet::for_edition(Edition::First).hit_die, DieType::D8);
    }
}
