//! Character sheet types.
//!
//! A [`Character`] owns its attributes, traits and inventory outright. Derived
//! values that depend on the edition (armor class, slot capacity) live in
//! [`crate::rules`]; everything here is edition-independent.

use crate::input::parse_or;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Experience points needed per level.
pub const XP_PER_LEVEL: u32 = 1000;

/// Lowest value a point-distribution attribute can be adjusted to.
pub const ATTRIBUTE_MIN: u32 = 0;

/// Highest value a point-distribution attribute can be adjusted to.
pub const ATTRIBUTE_MAX: u32 = 10;

/// Defense is always bonus + 10 for rolled scores.
pub const DEFENSE_OFFSET: u32 = 10;

/// Highest level whose experience minimum still fits in a `u32`.
pub const MAX_LEVEL: u32 = u32::MAX / XP_PER_LEVEL + 1;

/// Most slots a single item can take.
pub const MAX_ITEM_SLOTS: u32 = 100;

// ============================================================================
// Lenient Numbers
// ============================================================================

/// Any JSON scalar that might stand in for a count.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// Read a count the way hand-edited and older saves write it.
///
/// Negative numbers become 0, huge ones `u32::MAX`, fractions are truncated,
/// numeric strings are parsed and anything else (including `null`) is 0.
fn clamped_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let wide = match Option::<LooseNumber>::deserialize(deserializer)? {
        Some(LooseNumber::Signed(n)) => n,
        Some(LooseNumber::Unsigned(n)) => i64::try_from(n).unwrap_or(i64::MAX),
        Some(LooseNumber::Float(f)) => f as i64,
        Some(LooseNumber::Text(s)) => parse_or(&s, 0i64),
        None => 0,
    };
    Ok(wide.clamp(0, u32::MAX as i64) as u32)
}

fn clamped_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(clamped_u32(deserializer)?.clamp(1, MAX_LEVEL))
}

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
///
/// Stored as a string so ids written by older versions survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for an item, unique within one inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The six attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Attribute {
    pub fn all() -> [Attribute; 6] {
        [
            Attribute::Strength,
            Attribute::Dexterity,
            Attribute::Constitution,
            Attribute::Intelligence,
            Attribute::Wisdom,
            Attribute::Charisma,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Dexterity => "Dexterity",
            Attribute::Constitution => "Constitution",
            Attribute::Intelligence => "Intelligence",
            Attribute::Wisdom => "Wisdom",
            Attribute::Charisma => "Charisma",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Constitution => "CON",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Charisma => "CHA",
        }
    }

    /// The attribute a d6 face points at in point distribution (1 = STR .. 6 = CHA).
    pub fn from_die_face(face: u32) -> Option<Attribute> {
        match face {
            1 => Some(Attribute::Strength),
            2 => Some(Attribute::Dexterity),
            3 => Some(Attribute::Constitution),
            4 => Some(Attribute::Intelligence),
            5 => Some(Attribute::Wisdom),
            6 => Some(Attribute::Charisma),
            _ => None,
        }
    }

    /// Parse a full name or abbreviation, case-insensitively.
    pub fn parse(s: &str) -> Option<Attribute> {
        let s = s.trim().to_lowercase();
        Attribute::all()
            .into_iter()
            .find(|a| a.name().to_lowercase() == s || a.abbreviation().to_lowercase() == s)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One attribute's score.
///
/// The shape depends on how the sheet was generated: rolled scores keep the
/// three dice they came from, distributed scores are a bare value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeScore {
    Rolled {
        dice: [u32; 3],
        #[serde(deserialize_with = "clamped_u32")]
        bonus: u32,
        #[serde(deserialize_with = "clamped_u32")]
        defense: u32,
    },
    Points {
        #[serde(deserialize_with = "clamped_u32")]
        value: u32,
    },
}

impl AttributeScore {
    /// Build a rolled score: bonus is the lowest die.
    pub fn from_dice(dice: [u32; 3]) -> Self {
        let bonus = dice.iter().copied().min().unwrap_or(0);
        AttributeScore::Rolled {
            dice,
            bonus,
            defense: bonus + DEFENSE_OFFSET,
        }
    }

    pub fn points(value: u32) -> Self {
        AttributeScore::Points { value }
    }

    /// The value added to checks.
    pub fn bonus(&self) -> u32 {
        match self {
            AttributeScore::Rolled { bonus, .. } => *bonus,
            AttributeScore::Points { value } => *value,
        }
    }

    /// The target number opponents roll against.
    pub fn defense(&self) -> u32 {
        match self {
            AttributeScore::Rolled { defense, .. } => *defense,
            AttributeScore::Points { value } => value.saturating_add(DEFENSE_OFFSET),
        }
    }

    /// Shift the score by `delta`, staying within [`ATTRIBUTE_MIN`, `ATTRIBUTE_MAX`].
    ///
    /// Rolled scores move bonus and defense together and keep their dice.
    pub fn adjust(&mut self, delta: i32) {
        let shifted = |current: u32| -> u32 {
            (current as i64 + delta as i64).clamp(ATTRIBUTE_MIN as i64, ATTRIBUTE_MAX as i64) as u32
        };
        match self {
            AttributeScore::Rolled { bonus, defense, .. } => {
                *bonus = shifted(*bonus);
                *defense = *bonus + DEFENSE_OFFSET;
            }
            AttributeScore::Points { value } => *value = shifted(*value),
        }
    }
}

/// Scores for all six attributes.
///
/// One named field per attribute, so no attribute can be missing or repeated.
/// Aliases accept sheets saved with localized attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(alias = "力量")]
    pub strength: AttributeScore,
    #[serde(alias = "敏捷")]
    pub dexterity: AttributeScore,
    #[serde(alias = "体质")]
    pub constitution: AttributeScore,
    #[serde(alias = "智力")]
    pub intelligence: AttributeScore,
    #[serde(alias = "睿知", alias = "感知")]
    pub wisdom: AttributeScore,
    #[serde(alias = "魅力")]
    pub charisma: AttributeScore,
}

impl Attributes {
    /// Build all six scores from a function of the attribute.
    pub fn from_fn(mut f: impl FnMut(Attribute) -> AttributeScore) -> Self {
        Self {
            strength: f(Attribute::Strength),
            dexterity: f(Attribute::Dexterity),
            constitution: f(Attribute::Constitution),
            intelligence: f(Attribute::Intelligence),
            wisdom: f(Attribute::Wisdom),
            charisma: f(Attribute::Charisma),
        }
    }

    pub fn get(&self, attribute: Attribute) -> &AttributeScore {
        match attribute {
            Attribute::Strength => &self.strength,
            Attribute::Dexterity => &self.dexterity,
            Attribute::Constitution => &self.constitution,
            Attribute::Intelligence => &self.intelligence,
            Attribute::Wisdom => &self.wisdom,
            Attribute::Charisma => &self.charisma,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut AttributeScore {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Charisma => &mut self.charisma,
        }
    }

    /// Exchange two attributes' scores.
    pub fn swap(&mut self, a: Attribute, b: Attribute) {
        if a == b {
            return;
        }
        let score_a = self.get(a).clone();
        let score_b = std::mem::replace(self.get_mut(b), score_a);
        *self.get_mut(a) = score_b;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeScore)> {
        Attribute::all().into_iter().map(move |a| (a, self.get(a)))
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Descriptive trait categories, each with its own random table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    Physique,
    Face,
    Skin,
    Hair,
    Clothing,
    Virtue,
    Vice,
    Speech,
    Background,
    Misfortune,
    Alignment,
}

impl TraitKind {
    pub fn all() -> [TraitKind; 11] {
        [
            TraitKind::Physique,
            TraitKind::Face,
            TraitKind::Skin,
            TraitKind::Hair,
            TraitKind::Clothing,
            TraitKind::Virtue,
            TraitKind::Vice,
            TraitKind::Speech,
            TraitKind::Background,
            TraitKind::Misfortune,
            TraitKind::Alignment,
        ]
    }

    /// Lowercase key, as used in saved sheets and table ids.
    pub fn key(&self) -> &'static str {
        match self {
            TraitKind::Physique => "physique",
            TraitKind::Face => "face",
            TraitKind::Skin => "skin",
            TraitKind::Hair => "hair",
            TraitKind::Clothing => "clothing",
            TraitKind::Virtue => "virtue",
            TraitKind::Vice => "vice",
            TraitKind::Speech => "speech",
            TraitKind::Background => "background",
            TraitKind::Misfortune => "misfortune",
            TraitKind::Alignment => "alignment",
        }
    }

    /// Parse a key or label, case-insensitively.
    pub fn parse(s: &str) -> Option<TraitKind> {
        let s = s.trim().to_lowercase();
        TraitKind::all().into_iter().find(|k| k.key() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraitKind::Physique => "Physique",
            TraitKind::Face => "Face",
            TraitKind::Skin => "Skin",
            TraitKind::Hair => "Hair",
            TraitKind::Clothing => "Clothing",
            TraitKind::Virtue => "Virtue",
            TraitKind::Vice => "Vice",
            TraitKind::Speech => "Speech",
            TraitKind::Background => "Background",
            TraitKind::Misfortune => "Misfortune",
            TraitKind::Alignment => "Alignment",
        }
    }
}

/// Free-text descriptive traits. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Traits {
    pub physique: String,
    pub face: String,
    pub skin: String,
    pub hair: String,
    pub clothing: String,
    pub virtue: String,
    pub vice: String,
    pub speech: String,
    pub background: String,
    pub misfortune: String,
    pub alignment: String,
}

impl Traits {
    pub fn get(&self, kind: TraitKind) -> &str {
        match kind {
            TraitKind::Physique => &self.physique,
            TraitKind::Face => &self.face,
            TraitKind::Skin => &self.skin,
            TraitKind::Hair => &self.hair,
            TraitKind::Clothing => &self.clothing,
            TraitKind::Virtue => &self.virtue,
            TraitKind::Vice => &self.vice,
            TraitKind::Speech => &self.speech,
            TraitKind::Background => &self.background,
            TraitKind::Misfortune => &self.misfortune,
            TraitKind::Alignment => &self.alignment,
        }
    }

    pub fn set(&mut self, kind: TraitKind, value: impl Into<String>) {
        let slot = match kind {
            TraitKind::Physique => &mut self.physique,
            TraitKind::Face => &mut self.face,
            TraitKind::Skin => &mut self.skin,
            TraitKind::Hair => &mut self.hair,
            TraitKind::Clothing => &mut self.clothing,
            TraitKind::Virtue => &mut self.virtue,
            TraitKind::Vice => &mut self.vice,
            TraitKind::Speech => &mut self.speech,
            TraitKind::Background => &mut self.background,
            TraitKind::Misfortune => &mut self.misfortune,
            TraitKind::Alignment => &mut self.alignment,
        };
        *slot = value.into();
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking. `current` never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    #[serde(deserialize_with = "clamped_u32")]
    pub current: u32,
    #[serde(deserialize_with = "clamped_u32")]
    pub max: u32,
}

impl HitPoints {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Change the maximum, pulling `current` down if it no longer fits.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(max);
    }

    /// Set current hit points, clamped to `[0, max]`.
    pub fn set_current(&mut self, current: u32) {
        self.current = current.min(self.max);
    }

    /// Replace both values with a fresh total, as after a reroll.
    pub fn reset(&mut self, total: u32) {
        *self = Self::new(total);
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// What an item is, with the fields that only make sense for that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Weapon {
        /// Damage dice, e.g. "d6". Display only.
        #[serde(default)]
        damage: String,
    },
    Armor {
        #[serde(default, deserialize_with = "clamped_u32")]
        defense: u32,
    },
    Gear,
    Food,
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Weapon { .. } => "weapon",
            ItemKind::Armor { .. } => "armor",
            ItemKind::Gear => "gear",
            ItemKind::Food => "food",
        }
    }

    /// Weapons and armor wear out; everything else starts without durability.
    pub fn default_quality(&self) -> u32 {
        match self {
            ItemKind::Weapon { .. } | ItemKind::Armor { .. } => 3,
            ItemKind::Gear | ItemKind::Food => 0,
        }
    }
}

/// An inventory line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    pub name: String,
    #[serde(default, deserialize_with = "clamped_u32")]
    pub slots: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
    /// Durability points. Stored for the player; nothing here decrements it.
    #[serde(default, deserialize_with = "clamped_u32")]
    pub quality: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, slots: u32, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            slots,
            quality: kind.default_quality(),
            kind,
            description: None,
        }
    }

    pub fn gear(name: impl Into<String>, slots: u32) -> Self {
        Self::new(name, slots, ItemKind::Gear)
    }

    pub fn food(name: impl Into<String>, slots: u32) -> Self {
        Self::new(name, slots, ItemKind::Food)
    }

    pub fn weapon(name: impl Into<String>, slots: u32, damage: impl Into<String>) -> Self {
        Self::new(
            name,
            slots,
            ItemKind::Weapon {
                damage: damage.into(),
            },
        )
    }

    pub fn armor(name: impl Into<String>, slots: u32, defense: u32) -> Self {
        Self::new(name, slots, ItemKind::Armor { defense })
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn is_armor(&self) -> bool {
        matches!(self.kind, ItemKind::Armor { .. })
    }

    /// Armor defense; zero for anything that isn't armor.
    pub fn defense(&self) -> u32 {
        match self.kind {
            ItemKind::Armor { defense } => defense,
            _ => 0,
        }
    }

    pub fn damage(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Weapon { damage } => Some(damage),
            _ => None,
        }
    }

    /// Change one field. Defense only applies to armor and damage only to
    /// weapons; on a mismatch the item is left as it was.
    pub fn apply(&mut self, edit: ItemEdit) -> Result<(), ItemEditError> {
        match edit {
            ItemEdit::Name(name) => self.name = name,
            ItemEdit::Slots(slots) => self.slots = slots.min(MAX_ITEM_SLOTS),
            ItemEdit::Quality(quality) => self.quality = quality,
            ItemEdit::Defense(value) => match &mut self.kind {
                ItemKind::Armor { defense } => *defense = value,
                _ => return Err(ItemEditError::NotArmor(self.name.clone())),
            },
            ItemEdit::Damage(value) => match &mut self.kind {
                ItemKind::Weapon { damage } => *damage = value,
                _ => return Err(ItemEditError::NotWeapon(self.name.clone())),
            },
            ItemEdit::Kind(kind) => {
                if kind.name() != self.kind.name() {
                    self.kind = kind;
                }
            }
            ItemEdit::Description(text) => {
                let text = text.trim();
                self.description = (!text.is_empty()).then(|| text.to_string());
            }
        }
        Ok(())
    }
}

/// A single field change to an inventory line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEdit {
    Name(String),
    Slots(u32),
    Quality(u32),
    Defense(u32),
    Damage(String),
    /// Switch to another kind. Switching to the current kind keeps its fields.
    Kind(ItemKind),
    /// Blank text clears the description.
    Description(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemEditError {
    #[error("{0} is not armor")]
    NotArmor(String),

    #[error("{0} is not a weapon")]
    NotWeapon(String),
}

// ============================================================================
// Character
// ============================================================================

fn default_level() -> u32 {
    1
}

/// Level reached with `xp` experience points.
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Minimum experience points for `level` (levels below 1 count as 1).
pub fn xp_for_level(level: u32) -> u32 {
    (level.max(1) - 1).saturating_mul(XP_PER_LEVEL)
}

/// A player character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[serde(default)]
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_level", deserialize_with = "clamped_level")]
    pub level: u32,
    #[serde(default, deserialize_with = "clamped_u32")]
    pub xp: u32,
    pub hp: HitPoints,
    pub stats: Attributes,
    #[serde(default)]
    pub traits: Traits,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub is_dead: bool,
}

impl Character {
    /// A level 1 character with the given scores and hit points, everything else blank.
    pub fn new(stats: Attributes, max_hp: u32) -> Self {
        Self {
            id: CharacterId::new(),
            name: String::new(),
            level: 1,
            xp: 0,
            hp: HitPoints::new(max_hp),
            stats,
            traits: Traits::default(),
            inventory: Vec::new(),
            memo: String::new(),
            is_dead: false,
        }
    }

    /// Set experience and derive the level from it.
    pub fn set_xp(&mut self, xp: u32) {
        self.xp = xp;
        self.level = level_for_xp(xp);
    }

    /// Set the level (within `1..=MAX_LEVEL`) and move experience to that
    /// level's minimum.
    pub fn set_level(&mut self, level: u32) {
        self.level = level.clamp(1, MAX_LEVEL);
        self.xp = xp_for_level(self.level);
    }

    /// Total slots taken by the inventory, saturating at `u32::MAX`.
    pub fn slots_used(&self) -> u32 {
        self.inventory
            .iter()
            .fold(0u32, |used, item| used.saturating_add(item.slots))
    }

    /// Append an item and return its id.
    pub fn add_item(&mut self, item: Item) -> ItemId {
        let id = item.id.clone();
        self.inventory.push(item);
        id
    }

    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        let index = self.inventory.iter().position(|i| &i.id == id)?;
        Some(self.inventory.remove(index))
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.inventory.iter().find(|i| &i.id == id)
    }

    /// Edit one item in place. Returns `None` if no item has that id.
    pub fn update_item<T>(&mut self, id: &ItemId, edit: impl FnOnce(&mut Item) -> T) -> Option<T> {
        self.inventory.iter_mut().find(|i| &i.id == id).map(edit)
    }

    /// Name shown in lists; falls back for unnamed sheets.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unnamed Knave"
        } else {
            &self.name
        }
    }
}
