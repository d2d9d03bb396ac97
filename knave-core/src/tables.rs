//! Random tables.
//!
//! Trait, gear and game-master tables, plus the roller behind the GM panel:
//! a list of [`RollRequest`]s is resolved against the table registry in one go.

use crate::character::TraitKind;
use crate::dice::{pick, pick_weighted};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most results a single request may ask for.
pub const MAX_ROLLS_PER_REQUEST: u32 = 50;

// ============================================================================
// Traits
// ============================================================================

pub const PHYSIQUE: &[&str] = &[
    "Athletic", "Brawny", "Corpulent", "Delicate", "Gaunt", "Hulking", "Lanky", "Ripped",
    "Rugged", "Scrawny", "Short", "Sinewy", "Slender", "Flabby", "Statuesque", "Stout", "Tiny",
    "Towering", "Willowy", "Wiry",
];

pub const FACE: &[&str] = &[
    "Bloated", "Blunt", "Bony", "Chiseled", "Delicate", "Elongated", "Patrician", "Pinched",
    "Hawkish", "Broken", "Impish", "Narrow", "Ratlike", "Round", "Sunken", "Sharp", "Soft",
    "Square", "Wide", "Wolfish",
];

pub const SKIN: &[&str] = &[
    "Battle scar", "Birthmark", "Burn scar", "Dark", "Makeup", "Oily", "Pale", "Perfect",
    "Pierced", "Pockmarked", "Reeking", "Tattooed", "Rosy", "Rough", "Sallow", "Sunburned",
    "Tanned", "War paint", "Weathered", "Whip scar",
];

pub const HAIR: &[&str] = &[
    "Bald", "Braided", "Bristly", "Cropped", "Curly", "Disheveled", "Dreadlocks", "Filthy",
    "Frizzy", "Greased", "Limp", "Long", "Luxurious", "Mohawk", "Oily", "Ponytail", "Silky",
    "Topknot", "Wavy", "Wispy",
];

pub const CLOTHING: &[&str] = &[
    "Antique", "Bloody", "Ceremonial", "Decorated", "Eccentric", "Elegant", "Fashionable",
    "Filthy", "Flamboyant", "Stained", "Foreign", "Frayed", "Frumpy", "Livery", "Oversized",
    "Patched", "Perfumed", "Rancid", "Torn", "Undersized",
];

pub const VIRTUE: &[&str] = &[
    "Ambitious", "Cautious", "Courageous", "Courteous", "Curious", "Disciplined", "Focused",
    "Generous", "Gregarious", "Honest", "Honorable", "Humble", "Idealistic", "Just", "Loyal",
    "Merciful", "Righteous", "Serene", "Stoic", "Tolerant",
];

pub const VICE: &[&str] = &[
    "Aggressive", "Arrogant", "Bitter", "Cowardly", "Cruel", "Deceitful", "Flippant",
    "Gluttonous", "Greedy", "Irascible", "Lazy", "Nervous", "Prejudiced", "Reckless", "Rude",
    "Suspicious", "Vain", "Vengeful", "Wasteful", "Whiny",
];

pub const SPEECH: &[&str] = &[
    "Blunt", "Booming", "Breathy", "Cryptic", "Drawling", "Droning", "Flowery", "Formal",
    "Gravelly", "Hoarse", "Mumbling", "Precise", "Quaint", "Rambling", "Rapid-fire", "Dialect",
    "Slow", "Squeaky", "Stuttering", "Whispery",
];

pub const BACKGROUND: &[&str] = &[
    "Alchemist", "Beggar", "Butcher", "Burglar", "Charlatan", "Cleric", "Cook", "Cultist",
    "Gambler", "Herbalist", "Magician", "Mariner", "Mercenary", "Merchant", "Outlaw",
    "Performer", "Pickpocket", "Smuggler", "Student", "Tracker",
];

pub const MISFORTUNE: &[&str] = &[
    "Abandoned", "Addicted", "Blackmailed", "Condemned", "Cursed", "Defrauded", "Demoted",
    "Discredited", "Disowned", "Exiled", "Framed", "Haunted", "Kidnapped", "Mutilated", "Poor",
    "Pursued", "Rejected", "Replaced", "Robbed", "Suspected",
];

/// Alignment on a d20: 1-5 law, 6-15 neutrality, 16-20 chaos.
pub const ALIGNMENT: &[(&str, u32)] = &[("Law", 5), ("Neutrality", 10), ("Chaos", 5)];

/// Uniform entries for a trait table. Alignment is flattened to its names.
pub fn trait_entries(kind: TraitKind) -> &'static [&'static str] {
    match kind {
        TraitKind::Physique => PHYSIQUE,
        TraitKind::Face => FACE,
        TraitKind::Skin => SKIN,
        TraitKind::Hair => HAIR,
        TraitKind::Clothing => CLOTHING,
        TraitKind::Virtue => VIRTUE,
        TraitKind::Vice => VICE,
        TraitKind::Speech => SPEECH,
        TraitKind::Background => BACKGROUND,
        TraitKind::Misfortune => MISFORTUNE,
        TraitKind::Alignment => &["Law", "Neutrality", "Chaos"],
    }
}

/// Roll one trait. Alignment uses its weighted d20 bands.
pub fn roll_trait<R: Rng + ?Sized>(rng: &mut R, kind: TraitKind) -> &'static str {
    let rolled = match kind {
        TraitKind::Alignment => pick_weighted(rng, ALIGNMENT).copied(),
        _ => pick(rng, trait_entries(kind)).copied(),
    };
    rolled.unwrap_or_default()
}

// ============================================================================
// Equipment
// ============================================================================

/// A d20 band on the starting armor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmorBand {
    pub low: u32,
    pub high: u32,
    pub name: &'static str,
    /// Armor class the piece sets (body armor, first edition).
    pub armor_class: u32,
    /// Armor class bonus the piece adds (second edition).
    pub bonus: u32,
    pub slots: u32,
    pub quality: u32,
}

pub const STARTING_ARMOR: &[ArmorBand] = &[
    ArmorBand { low: 1, high: 3, name: "No armor", armor_class: 11, bonus: 0, slots: 0, quality: 0 },
    ArmorBand { low: 4, high: 14, name: "Gambeson", armor_class: 12, bonus: 1, slots: 1, quality: 3 },
    ArmorBand { low: 15, high: 19, name: "Brigandine", armor_class: 13, bonus: 2, slots: 2, quality: 4 },
    ArmorBand { low: 20, high: 20, name: "Chain", armor_class: 14, bonus: 3, slots: 3, quality: 5 },
];

/// The armor band a d20 roll lands in; out-of-range rolls fall back to no armor.
pub fn armor_for_roll(roll: u32) -> &'static ArmorBand {
    STARTING_ARMOR
        .iter()
        .find(|band| (band.low..=band.high).contains(&roll))
        .unwrap_or(&STARTING_ARMOR[0])
}

/// Result of the d20 helmet and shield roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelmetShield {
    None,
    Helmet,
    Shield,
    Both,
}

impl HelmetShield {
    /// 1-13 none, 14-16 helmet, 17-19 shield, 20 both.
    pub fn for_roll(roll: u32) -> Self {
        match roll {
            14..=16 => HelmetShield::Helmet,
            17..=19 => HelmetShield::Shield,
            20 => HelmetShield::Both,
            _ => HelmetShield::None,
        }
    }

    pub fn has_helmet(&self) -> bool {
        matches!(self, HelmetShield::Helmet | HelmetShield::Both)
    }

    pub fn has_shield(&self) -> bool {
        matches!(self, HelmetShield::Shield | HelmetShield::Both)
    }
}

pub const DUNGEONEERING_GEAR: &[&str] = &[
    "Rope, 50ft", "Pulleys", "Candles, 5", "Chain, 10ft", "Chalk, 10", "Crowbar", "Tinderbox",
    "Grappling hook", "Hammer", "Waterskin", "Lantern", "Lamp oil", "Padlock", "Manacles",
    "Mirror", "Pole, 10ft", "Sack", "Tent", "Spikes, 5", "Torches, 5",
];

pub const GENERAL_GEAR_1: &[&str] = &[
    "Air bladder", "Bear trap", "Shovel", "Bellows", "Grease", "Saw", "Bucket", "Caltrops",
    "Chisel", "Drill", "Fishing rod", "Marbles", "Glue", "Pick", "Hourglass", "Net", "Tongs",
    "Lockpicks", "Metal file", "Nails",
];

pub const GENERAL_GEAR_2: &[&str] = &[
    "Incense", "Sponge", "Lens", "Perfume", "Horn", "Bottle", "Soap", "Spyglass", "Tar pot",
    "Twine", "Fake jewels", "Blank book", "Card deck", "Dice set", "Cook pots", "Face paint",
    "Whistle", "Instrument", "Quill & ink", "Small bell",
];

pub const SPELLS: &[&str] = &[
    "Adhere", "Animate Object", "Anthropomorphize", "Arcane Eye", "Astral Prison",
    "Attract", "Auditory Illusion", "Babble", "Beast Form", "Befuddle", "Bend Fate",
    "Bird Person", "Body Swap", "Charm", "Command", "Comprehend", "Cone of Foam", "Control Plants",
    "Control Weather", "Counterspell", "Deafen", "Detect Magic", "Disassemble", "Disguise",
    "Displace", "Earthquake", "Elasticity", "Elemental Wall", "Filch", "Fog Cloud", "Frenzy",
    "Gate", "Gravity Shift", "Greed", "Haste", "Hatred", "Hear Whispers", "Hover", "Hypnotize",
    "Icy Touch", "Identify Owner", "Illuminate", "Invisible Tether", "Knock", "Leap", "Liquid Air",
    "Magic Dampener", "Manse", "Marble Madness", "Masquerade", "Miniaturize", "Mirror Walk",
    "Multiarm", "Night Sphere", "Objectify", "Ooze Form", "Pacify", "Phantom Coach",
    "Phobia", "Pit", "Primeval Surge", "Psychometry", "Pull", "Push", "Raise Dead",
    "Raise Spirit", "Read Mind", "Repel", "Scry", "Sculpt Elements", "Sense", "Shroud",
    "Shuffle", "Sleep", "Smoke Form", "Snail Knight", "Sniff", "Sort", "Spider Climb",
    "Summon Cube", "Swarm", "Telekinesis", "Telepathy", "Teleport", "Thaumaturgic Anchor",
    "Thicket", "Summon Idol", "Time Jump", "Summon Animal", "True Sight", "Upwell",
    "Vision", "Visual Illusion", "Ward", "Web", "Wizard Mark", "X-Ray Vision",
];

// ============================================================================
// Game Master Tables
// ============================================================================

pub const NPC_IDENTITIES: &[&str] = &[
    "Acrobat", "Alchemist", "Apothecary", "Armorer", "Baker", "Barber", "Beggar", "Blacksmith",
    "Bookbinder", "Bounty hunter", "Brewer", "Butcher", "Candlemaker", "Cartographer",
    "Chandler", "Clerk", "Cobbler", "Cook", "Courtesan", "Cutpurse", "Diplomat", "Drover",
    "Duelist", "Executioner", "Falconer", "Ferryman", "Fisher", "Fortune teller", "Gambler",
    "Gravedigger", "Guard", "Herald", "Hermit", "Hunter", "Innkeeper", "Jailer", "Jester",
    "Knight", "Locksmith", "Mason", "Mercenary", "Merchant", "Miller", "Miner", "Minstrel",
    "Monk", "Noble", "Pilgrim", "Poacher", "Priest", "Ratcatcher", "Sage", "Sailor", "Scribe",
    "Shepherd", "Smuggler", "Soldier", "Squire", "Tailor", "Tanner", "Tax collector",
    "Thief", "Tinker", "Torturer", "Watchman", "Weaver", "Witch", "Woodcutter",
];

pub const TRAVEL_HAZARDS: &[&str] = &[
    "Encounter",
    "Sign of a nearby encounter",
    "Environmental hazard",
    "Lost or delayed",
    "Exhaustion: rest or take a penalty",
    "Nothing of note",
];

pub const WEATHER: &[&str] = &[
    "Blizzard or hurricane", "Hail", "Heavy rain", "Fog", "Overcast", "Clear", "Mild breeze",
    "Light rain", "Strong wind", "Thunderstorm", "Heat wave",
];

pub const TRAVEL_EVENTS: &[&str] = &[
    "A road shrine with fresh offerings",
    "An abandoned cart, one wheel broken",
    "Crows circling something in the grass",
    "A bridge that was not on the map",
    "Smoke rising beyond the next hill",
    "A lone traveler heading the other way, in a hurry",
    "Footprints that stop in the middle of the road",
    "A toll post with no one manning it",
    "A ring of mushrooms, unusually large",
    "Bells ringing from a valley with no village",
    "A wounded animal following the party",
    "A patrol searching for a deserter",
    "Old battlefield, bones and rusted iron",
    "A stream running the wrong way",
    "Merchant caravan camped for the night",
    "A hanged man with a note pinned to him",
    "Standing stones humming faintly",
    "A child selling charms by the roadside",
    "Fresh graves, unmarked",
    "A traveling shrine carried by pilgrims",
];

pub const CAREERS: &[&str] = &[
    "Acolyte", "Acrobat", "Actor", "Alchemist", "Antiquarian", "Arcanist", "Architect",
    "Assassin", "Astrologer", "Baker", "Bandit", "Barber", "Beast tamer", "Beekeeper",
    "Blacksmith", "Boatman", "Bookbinder", "Brewer", "Burglar", "Butcher", "Carpenter",
    "Cartographer", "Cattle herder", "Chandler", "Cheesemaker", "Clockmaker", "Cobbler",
    "Cook", "Counterfeiter", "Courier", "Courtier", "Cultist", "Cutpurse", "Dyer", "Falconer",
    "Fisher", "Forger", "Fortune teller", "Gambler", "Gladiator", "Gravedigger", "Herbalist",
    "Hunter", "Jailer", "Jester", "Locksmith", "Mercenary", "Miner", "Minstrel", "Monk",
];

/// A named table the GM panel can roll on.
#[derive(Debug, Clone)]
pub struct RandomTable {
    pub id: String,
    pub name: String,
    pub entries: &'static [&'static str],
}

impl RandomTable {
    fn new(id: impl Into<String>, name: impl Into<String>, entries: &'static [&'static str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entries,
        }
    }

    /// Roll one entry.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        pick(rng, self.entries).copied().unwrap_or_default()
    }
}

lazy_static::lazy_static! {
    /// Every table the GM panel offers, in display order.
    pub static ref TABLES: Vec<RandomTable> = {
        let mut tables = vec![
            RandomTable::new("npc_identity", "NPC Identity (d100)", NPC_IDENTITIES),
            RandomTable::new("travel_hazards", "Travel Hazards (d6)", TRAVEL_HAZARDS),
            RandomTable::new("weather", "Weather (2d6)", WEATHER),
            RandomTable::new("travel_events", "Travel Events (d100)", TRAVEL_EVENTS),
            RandomTable::new("careers", "Careers (d100)", CAREERS),
            RandomTable::new("spells", "Spells (d100)", SPELLS),
            RandomTable::new("dungeon_gear", "Dungeoneering Gear (d20)", DUNGEONEERING_GEAR),
            RandomTable::new("general_gear_1", "General Gear I (d20)", GENERAL_GEAR_1),
            RandomTable::new("general_gear_2", "General Gear II (d20)", GENERAL_GEAR_2),
        ];
        tables.extend(TraitKind::all().into_iter().map(|kind| {
            RandomTable::new(
                format!("trait_{}", kind.key()),
                format!("Trait - {} (d20)", kind.label()),
                trait_entries(kind),
            )
        }));
        tables
    };
}

/// Look a table up by id.
pub fn find_table(id: &str) -> Option<&'static RandomTable> {
    TABLES.iter().find(|t| t.id == id)
}

/// One line of the GM panel: roll `count` times on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    pub table_id: String,
    pub count: u32,
}

impl RollRequest {
    /// Count is clamped to `1..=MAX_ROLLS_PER_REQUEST`.
    pub fn new(table_id: impl Into<String>, count: u32) -> Self {
        Self {
            table_id: table_id.into(),
            count: count.clamp(1, MAX_ROLLS_PER_REQUEST),
        }
    }
}

/// Results for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRoll {
    pub table_name: String,
    pub rolled: Vec<String>,
}

/// Resolve every request in order. Requests naming an unknown table are skipped.
pub fn roll_tables<R: Rng + ?Sized>(rng: &mut R, requests: &[RollRequest]) -> Vec<TableRoll> {
    requests
        .iter()
        .filter_map(|request| {
            let Some(table) = find_table(&request.table_id) else {
                tracing::warn!(table_id = %request.table_id, "Skipping roll on unknown table");
                return None;
            };
            let count = request.count.clamp(1, MAX_ROLLS_PER_REQUEST);
            let rolled = (0..count).map(|_| table.roll(rng).to_string()).collect();
            Some(TableRoll {
                table_name: table.name.clone(),
                rolled,
            })
        })
        .collect()
}
