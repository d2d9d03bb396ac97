//! Line commands for the headless front end.
//!
//! [`Command::parse`] turns one input line into a command; [`Session::execute`]
//! runs it against the sheet store and returns the text to print.

use std::fmt::Write as _;
use std::path::PathBuf;

use knave_core::character_builder::{
    generate_starting_gear, randomize_traits, reroll_attributes, reroll_everything,
    reroll_hit_points,
};
use knave_core::dice::{self, DiceError, DiceExpression};
use knave_core::input::{coerce_count, coerce_level, coerce_max_hp, coerce_slots, coerce_xp};
use knave_core::{
    find_table, item_details, roll_tables, to_plain_text, write_export, Attribute, CustomItemDef,
    CustomSpell, ExportError, ExportFormat, HomebrewError, HomebrewLibrary, Item, ItemEdit,
    ItemEditError, ItemId, ItemKind, KeyValueStore, PersistError, RollRequest, RosterError,
    SheetError, SheetStore, TraitKind, TABLES,
};
use thiserror::Error;

pub const HELP: &str = "\
Characters:
  list                          List characters (* marks the active one)
  new                           Create a character and select it
  select <n>                    Make character n active
  delete <n>                    Delete character n
  show                          Show the active sheet
Sheet:
  name <text>                   Set the name
  xp <n> | level <n>            Set experience or level (each updates the other)
  hp <n> | maxhp <n>            Set current or maximum hit points
  reroll stats|hp|traits|all    Reroll part of the sheet
  swap <attr> <attr>            Swap two attributes
  adjust <attr> <delta>         Shift an attribute, clamped to 0..10
  trait <kind> <text>           Set a trait, e.g. trait vice Cowardly (no text clears it)
  memo <text>                   Replace the notes
  dead                          Toggle the deceased marker
Inventory:
  gear                          Replace the inventory with a starting kit
  add <type> <slots> <name> [damage|defense]
                                Add weapon, armor, gear or food
  edit <n> <field> <value>      Change item n: name, slots, quality, defense,
                                damage, type or note
  remove <n>                    Remove inventory line n
  export text|markdown [path]   Print the sheet, or write it to a file
Tables:
  tables                        List random tables
  roll <table> [count]          Roll on a table
  dice <expr>                   Roll dice, e.g. 3d6 or 4d6kh3+1
Homebrew:
  spell add <name> | <description>
  spell edit <n> <name> | <description>
  spells | spell remove <n>
  item add <name> | <cost> | <description>
  item edit <n> <name> | <cost> | <description>
  items | item remove <n>
Other:
  help                          Show this help
  quit                          Exit";

/// Errors from parsing or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type help for help.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("No entry numbered {0}")]
    BadIndex(usize),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Unknown item type: {0} (weapon, armor, gear, food)")]
    UnknownItemType(String),

    #[error("Unknown table: {0}. Type tables for the list.")]
    UnknownTable(String),

    #[error("Unknown trait: {0}")]
    UnknownTrait(String),

    #[error(transparent)]
    Item(#[from] ItemEditError),

    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Failed to save: {0}")]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Homebrew(#[from] HomebrewError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Which part of the sheet `reroll` regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerollTarget {
    Stats,
    HitPoints,
    Traits,
    All,
}

/// One parsed input line. Indices are 1-based, as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    List,
    New,
    Select(usize),
    Delete(usize),
    Show,
    Name(String),
    Xp(u32),
    Level(u32),
    Hp(u32),
    MaxHp(u32),
    Reroll(RerollTarget),
    Swap(Attribute, Attribute),
    Adjust(Attribute, i32),
    Gear,
    Add(Item),
    Edit(usize, ItemEdit),
    Remove(usize),
    Trait(TraitKind, String),
    Memo(String),
    Dead,
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Tables,
    Roll {
        table: String,
        count: u32,
    },
    Dice(String),
    SpellAdd(CustomSpell),
    SpellUpdate(usize, CustomSpell),
    Spells,
    SpellRemove(usize),
    ItemAdd(CustomItemDef),
    ItemUpdate(usize, CustomItemDef),
    Items,
    ItemRemove(usize),
}

/// First whitespace-separated word and the trimmed remainder.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn index(arg: &str, usage: &'static str) -> Result<usize, CommandError> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// The `n`th entry of a list, counting from 1.
fn nth<T>(list: &[T], n: usize) -> Option<&T> {
    n.checked_sub(1).and_then(|i| list.get(i))
}

fn attribute(arg: &str) -> Result<Attribute, CommandError> {
    Attribute::parse(arg).ok_or_else(|| CommandError::UnknownAttribute(arg.to_string()))
}

/// A kind with its default fields: d6 damage, zero defense.
fn item_kind(arg: &str) -> Result<ItemKind, CommandError> {
    match arg.trim().to_lowercase().as_str() {
        "weapon" => Ok(ItemKind::Weapon {
            damage: "d6".to_string(),
        }),
        "armor" | "armour" => Ok(ItemKind::Armor { defense: 0 }),
        "gear" => Ok(ItemKind::Gear),
        "food" => Ok(ItemKind::Food),
        other => Err(CommandError::UnknownItemType(other.to_string())),
    }
}

fn parse_item(args: &str) -> Result<Item, CommandError> {
    const USAGE: &str = "add <weapon|armor|gear|food> <slots> <name> [damage|defense]";
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(CommandError::Usage(USAGE));
    }
    let slots = coerce_slots(tokens[1]);
    let name_tokens = &tokens[2..];
    let name = name_tokens.join(" ");

    let item = match tokens[0].to_lowercase().as_str() {
        "weapon" => match name_tokens {
            [rest @ .., last] if !rest.is_empty() && DiceExpression::parse(last).is_ok() => {
                Item::weapon(rest.join(" "), slots, *last)
            }
            _ => Item::weapon(name, slots, "d6"),
        },
        "armor" | "armour" => match name_tokens {
            [rest @ .., last] if !rest.is_empty() && last.parse::<u32>().is_ok() => {
                Item::armor(rest.join(" "), slots, last.parse().unwrap_or(1))
            }
            _ => Item::armor(name, slots, 1),
        },
        "gear" => Item::gear(name, slots),
        "food" => Item::food(name, slots),
        other => return Err(CommandError::UnknownItemType(other.to_string())),
    };
    Ok(item)
}

fn parse_edit(args: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "edit <n> name|slots|quality|defense|damage|type|note <value>";
    let (n, rest) = split_word(args);
    let n = index(n, USAGE)?;
    let (field, value) = split_word(rest);
    let edit = match field.to_lowercase().as_str() {
        "name" if !value.is_empty() => ItemEdit::Name(value.to_string()),
        "slots" => ItemEdit::Slots(coerce_slots(value)),
        "quality" => ItemEdit::Quality(coerce_count(value)),
        "defense" | "defence" => ItemEdit::Defense(coerce_count(value)),
        "damage" if !value.is_empty() => ItemEdit::Damage(value.to_string()),
        "type" => ItemEdit::Kind(item_kind(value)?),
        "note" | "description" => ItemEdit::Description(value.to_string()),
        _ => return Err(CommandError::Usage(USAGE)),
    };
    Ok(Command::Edit(n, edit))
}

/// `<name> | <description>`
fn spell_fields(args: &str) -> CustomSpell {
    let (name, description) = args.split_once('|').unwrap_or((args, ""));
    CustomSpell::new(name.trim(), description.trim())
}

/// `<name> | <cost> | <description>`
fn item_def_fields(args: &str) -> CustomItemDef {
    let mut parts = args.splitn(3, '|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let cost = parts.next().unwrap_or_default();
    let description = parts.next().unwrap_or_default();
    CustomItemDef::new(name, cost, description)
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let (head, rest) = split_word(line);
        let command = match head.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "list" => Command::List,
            "new" => Command::New,
            "select" => Command::Select(index(rest, "select <n>")?),
            "delete" => Command::Delete(index(rest, "delete <n>")?),
            "show" => Command::Show,
            "name" => Command::Name(rest.to_string()),
            "xp" => Command::Xp(coerce_xp(rest)),
            "level" => Command::Level(coerce_level(rest)),
            "hp" => Command::Hp(coerce_count(rest)),
            "maxhp" => Command::MaxHp(coerce_max_hp(rest)),
            "reroll" => Command::Reroll(match rest.to_lowercase().as_str() {
                "stats" => RerollTarget::Stats,
                "hp" => RerollTarget::HitPoints,
                "traits" => RerollTarget::Traits,
                "all" => RerollTarget::All,
                _ => return Err(CommandError::Usage("reroll stats|hp|traits|all")),
            }),
            "swap" => {
                let (a, b) = split_word(rest);
                if a.is_empty() || b.is_empty() {
                    return Err(CommandError::Usage("swap <attr> <attr>"));
                }
                Command::Swap(attribute(a)?, attribute(b)?)
            }
            "adjust" => {
                let (a, delta) = split_word(rest);
                let delta = delta
                    .parse::<i32>()
                    .map_err(|_| CommandError::Usage("adjust <attr> <delta>"))?;
                Command::Adjust(attribute(a)?, delta)
            }
            "gear" => Command::Gear,
            "add" => Command::Add(parse_item(rest)?),
            "edit" => parse_edit(rest)?,
            "remove" => Command::Remove(index(rest, "remove <n>")?),
            "trait" => {
                let (kind, text) = split_word(rest);
                if kind.is_empty() {
                    return Err(CommandError::Usage("trait <kind> <text>"));
                }
                let kind =
                    TraitKind::parse(kind).ok_or_else(|| CommandError::UnknownTrait(kind.to_string()))?;
                Command::Trait(kind, text.to_string())
            }
            "memo" => Command::Memo(rest.to_string()),
            "dead" => Command::Dead,
            "export" => {
                let (format, path) = split_word(rest);
                if format.is_empty() {
                    return Err(CommandError::Usage("export text|markdown [path]"));
                }
                Command::Export {
                    format: format.parse()?,
                    path: (!path.is_empty()).then(|| PathBuf::from(path)),
                }
            }
            "tables" => Command::Tables,
            "roll" => {
                let (table, count) = split_word(rest);
                if table.is_empty() {
                    return Err(CommandError::Usage("roll <table> [count]"));
                }
                Command::Roll {
                    table: table.to_string(),
                    count: knave_core::input::parse_or(count, 1),
                }
            }
            "dice" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("dice <expr>"));
                }
                Command::Dice(rest.to_string())
            }
            "spell" => {
                let (action, args) = split_word(rest);
                match action.to_lowercase().as_str() {
                    "add" => Command::SpellAdd(spell_fields(args)),
                    "edit" => {
                        let (n, fields) = split_word(args);
                        let n = index(n, "spell edit <n> <name> | <description>")?;
                        Command::SpellUpdate(n, spell_fields(fields))
                    }
                    "remove" => Command::SpellRemove(index(args, "spell remove <n>")?),
                    _ => return Err(CommandError::Usage("spell add <name> | <description>")),
                }
            }
            "spells" => Command::Spells,
            "item" => {
                let (action, args) = split_word(rest);
                match action.to_lowercase().as_str() {
                    "add" => Command::ItemAdd(item_def_fields(args)),
                    "edit" => {
                        let (n, fields) = split_word(args);
                        let n = index(n, "item edit <n> <name> | <cost> | <description>")?;
                        Command::ItemUpdate(n, item_def_fields(fields))
                    }
                    "remove" => Command::ItemRemove(index(args, "item remove <n>")?),
                    _ => {
                        return Err(CommandError::Usage(
                            "item add <name> | <cost> | <description>",
                        ))
                    }
                }
            }
            "items" => Command::Items,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// What the front end should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// The roster, homebrew libraries and storage for one run.
pub struct Session<S: KeyValueStore> {
    store: SheetStore<S>,
    spells: HomebrewLibrary<CustomSpell>,
    items: HomebrewLibrary<CustomItemDef>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: SheetStore<S>) -> Self {
        let spells = HomebrewLibrary::load(store.storage());
        let items = HomebrewLibrary::load(store.storage());
        Self {
            store,
            spells,
            items,
        }
    }

    pub fn store(&self) -> &SheetStore<S> {
        &self.store
    }

    fn character_id(&self, n: usize) -> Result<knave_core::CharacterId, CommandError> {
        nth(self.store.roster().characters(), n)
            .map(|c| c.id.clone())
            .ok_or(CommandError::BadIndex(n))
    }

    fn item_id(&self, n: usize) -> Result<ItemId, CommandError> {
        nth(&self.store.active().inventory, n)
            .map(|i| i.id.clone())
            .ok_or(CommandError::BadIndex(n))
    }

    fn summary(&self) -> String {
        let character = self.store.active();
        format!(
            "{}: level {}, {} XP, HP {}/{}",
            character.display_name(),
            character.level,
            character.xp,
            character.hp.current,
            character.hp.max
        )
    }

    pub async fn execute(&mut self, command: Command) -> Result<Reply, CommandError> {
        let text = match command {
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
            Command::List => {
                let active = self.store.roster().active_index();
                let mut out = String::new();
                for (i, c) in self.store.roster().characters().iter().enumerate() {
                    let marker = if i == active { '*' } else { ' ' };
                    let dead = if c.is_dead { " [deceased]" } else { "" };
                    let _ = writeln!(
                        out,
                        "{marker} {}. {} (level {}){dead}",
                        i + 1,
                        c.display_name(),
                        c.level
                    );
                }
                out.trim_end().to_string()
            }
            Command::New => {
                self.store.create_character()?;
                format!("Created character #{}", self.store.roster().len())
            }
            Command::Select(n) => {
                let id = self.character_id(n)?;
                self.store.select(&id)?;
                format!("Selected {}", self.store.active().display_name())
            }
            Command::Delete(n) => {
                let id = self.character_id(n)?;
                let removed = self.store.delete_character(&id)?;
                format!("Deleted {}", removed.display_name())
            }
            Command::Show => to_plain_text(self.store.active(), self.store.rules()),
            Command::Name(name) => {
                self.store.update_active(|c, _, _| c.name = name)?;
                format!("Name set to {}", self.store.active().display_name())
            }
            Command::Xp(xp) => {
                self.store.update_active(|c, _, _| c.set_xp(xp))?;
                self.summary()
            }
            Command::Level(level) => {
                self.store.update_active(|c, _, _| c.set_level(level))?;
                self.summary()
            }
            Command::Hp(hp) => {
                self.store.update_active(|c, _, _| c.hp.set_current(hp))?;
                self.summary()
            }
            Command::MaxHp(max) => {
                self.store.update_active(|c, _, _| c.hp.set_max(max))?;
                self.summary()
            }
            Command::Reroll(target) => {
                self.store.update_active(|c, rules, rng| match target {
                    RerollTarget::Stats => reroll_attributes(rng, rules, c),
                    RerollTarget::HitPoints => reroll_hit_points(rng, rules, c),
                    RerollTarget::Traits => randomize_traits(rng, c),
                    RerollTarget::All => reroll_everything(rng, rules, c),
                })?;
                to_plain_text(self.store.active(), self.store.rules())
            }
            Command::Swap(a, b) => {
                self.store.update_active(|c, _, _| c.stats.swap(a, b))?;
                format!("Swapped {a} and {b}")
            }
            Command::Adjust(attribute, delta) => {
                self.store
                    .update_active(|c, _, _| c.stats.get_mut(attribute).adjust(delta))?;
                let score = self.store.active().stats.get(attribute);
                format!("{attribute}: +{} (defense {})", score.bonus(), score.defense())
            }
            Command::Gear => {
                self.store
                    .update_active(|c, rules, rng| generate_starting_gear(rng, rules, c))?;
                to_plain_text(self.store.active(), self.store.rules())
            }
            Command::Add(item) => {
                let name = item.name.clone();
                self.store.update_active(|c, _, _| c.add_item(item))?;
                let load = self.store.rules().encumbrance(self.store.active());
                format!("Added {name} ({}/{} slots)", load.used, load.capacity)
            }
            Command::Edit(n, edit) => {
                let id = self.item_id(n)?;
                self.store
                    .update_active(|c, _, _| c.update_item(&id, |item| item.apply(edit)))?
                    .ok_or(CommandError::BadIndex(n))??;
                let item = self
                    .store
                    .active()
                    .item(&id)
                    .ok_or(CommandError::BadIndex(n))?;
                format!("{n}. {} [{}]", item.name, item_details(item))
            }
            Command::Remove(n) => {
                let id = self.item_id(n)?;
                let removed = self.store.update_active(|c, _, _| c.remove_item(&id))?;
                match removed {
                    Some(item) => format!("Removed {}", item.name),
                    None => return Err(CommandError::BadIndex(n)),
                }
            }
            Command::Trait(kind, text) => {
                self.store
                    .update_active(|c, _, _| c.traits.set(kind, text.trim()))?;
                match self.store.active().traits.get(kind) {
                    "" => format!("{} cleared", kind.label()),
                    value => format!("{}: {value}", kind.label()),
                }
            }
            Command::Memo(memo) => {
                self.store.update_active(|c, _, _| c.memo = memo)?;
                "Notes updated".to_string()
            }
            Command::Dead => {
                self.store.update_active(|c, _, _| c.is_dead = !c.is_dead)?;
                let character = self.store.active();
                if character.is_dead {
                    format!("{} is marked deceased", character.display_name())
                } else {
                    format!("{} lives", character.display_name())
                }
            }
            Command::Export { format, path } => {
                let rendered = format.render(self.store.active(), self.store.rules());
                match path {
                    Some(path) => {
                        write_export(&path, &rendered).await?;
                        format!("Exported to {}", path.display())
                    }
                    None => rendered,
                }
            }
            Command::Tables => TABLES
                .iter()
                .map(|t| format!("{:<22} {}", t.id, t.name))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Roll { table, count } => {
                if find_table(&table).is_none() {
                    return Err(CommandError::UnknownTable(table));
                }
                let results = roll_tables(self.store.rng(), &[RollRequest::new(table, count)]);
                let mut out = String::new();
                for result in results {
                    let _ = writeln!(out, "{}:", result.table_name);
                    for (i, entry) in result.rolled.iter().enumerate() {
                        let _ = writeln!(out, "  {}. {entry}", i + 1);
                    }
                }
                out.trim_end().to_string()
            }
            Command::Dice(notation) => {
                let result = dice::roll(self.store.rng(), &notation)?;
                format!("{notation}: {result}")
            }
            Command::SpellAdd(spell) => {
                let name = spell.name.clone();
                self.spells.add(spell)?;
                self.spells.save(self.store.storage_mut())?;
                format!("Added spell {name}")
            }
            Command::SpellUpdate(n, spell) => {
                let id = nth(self.spells.entries(), n)
                    .map(|s| s.id.clone())
                    .ok_or(CommandError::BadIndex(n))?;
                let name = spell.name.clone();
                self.spells.update(&id, spell)?;
                self.spells.save(self.store.storage_mut())?;
                format!("Updated spell {name}")
            }
            Command::Spells => {
                if self.spells.is_empty() {
                    "No homebrew spells".to_string()
                } else {
                    self.spells
                        .entries()
                        .iter()
                        .enumerate()
                        .map(|(i, s)| format!("{}. {} - {}", i + 1, s.name, s.description))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::SpellRemove(n) => {
                let id = nth(self.spells.entries(), n)
                    .map(|s| s.id.clone())
                    .ok_or(CommandError::BadIndex(n))?;
                let removed = self.spells.remove(&id)?;
                self.spells.save(self.store.storage_mut())?;
                format!("Removed spell {}", removed.name)
            }
            Command::ItemAdd(item) => {
                let name = item.name.clone();
                self.items.add(item)?;
                self.items.save(self.store.storage_mut())?;
                format!("Added item {name}")
            }
            Command::ItemUpdate(n, item) => {
                let id = nth(self.items.entries(), n)
                    .map(|i| i.id.clone())
                    .ok_or(CommandError::BadIndex(n))?;
                let name = item.name.clone();
                self.items.update(&id, item)?;
                self.items.save(self.store.storage_mut())?;
                format!("Updated item {name}")
            }
            Command::Items => {
                if self.items.is_empty() {
                    "No homebrew items".to_string()
                } else {
                    self.items
                        .entries()
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            format!("{}. {} [{}] - {}", i + 1, item.name, item.cost, item.description)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::ItemRemove(n) => {
                let id = nth(self.items.entries(), n)
                    .map(|i| i.id.clone())
                    .ok_or(CommandError::BadIndex(n))?;
                let removed = self.items.remove(&id)?;
                self.items.save(self.store.storage_mut())?;
                format!("Removed item {}", removed.name)
            }
        };
        Ok(Reply::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knave_core::{session_rng, ItemKind, MemoryStore, RuleSet};

    fn session() -> Session<MemoryStore> {
        let store = SheetStore::load(MemoryStore::new(), RuleSet::default(), session_rng(Some(11)));
        Session::new(store)
    }

    async fn run(session: &mut Session<MemoryStore>, line: &str) -> String {
        match session.execute(Command::parse(line).unwrap()).await.unwrap() {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
        assert_eq!(Command::parse("  QUIT ").unwrap(), Command::Quit);
        assert_eq!(Command::parse("select 2").unwrap(), Command::Select(2));
        assert_eq!(Command::parse("name  Ada Grey ").unwrap(), Command::Name("Ada Grey".into()));
        assert_eq!(
            Command::parse("reroll hp").unwrap(),
            Command::Reroll(RerollTarget::HitPoints)
        );
        assert_eq!(
            Command::parse("swap str wis").unwrap(),
            Command::Swap(Attribute::Strength, Attribute::Wisdom)
        );
        assert_eq!(
            Command::parse("adjust con -2").unwrap(),
            Command::Adjust(Attribute::Constitution, -2)
        );
    }

    #[test]
    fn test_parse_coerces_numbers() {
        assert_eq!(Command::parse("xp lots").unwrap(), Command::Xp(0));
        assert_eq!(Command::parse("level 0").unwrap(), Command::Level(1));
        assert_eq!(Command::parse("maxhp -5").unwrap(), Command::MaxHp(1));
        assert_eq!(Command::parse("hp").unwrap(), Command::Hp(0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Command::parse("dance"), Err(CommandError::Unknown(_))));
        assert!(matches!(Command::parse("select 0"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("reroll luck"), Err(CommandError::Usage(_))));
        assert!(matches!(
            Command::parse("swap str luck"),
            Err(CommandError::UnknownAttribute(_))
        ));
        assert!(matches!(
            Command::parse("add potion 1 Tonic"),
            Err(CommandError::UnknownItemType(_))
        ));
        assert!(matches!(
            Command::parse("export png"),
            Err(CommandError::Export(ExportError::UnknownFormat(_)))
        ));
    }

    #[test]
    fn test_parse_items() {
        let Command::Add(sword) = Command::parse("add weapon 2 Long Sword d8").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(sword.name, "Long Sword");
        assert_eq!(sword.slots, 2);
        assert_eq!(sword.damage(), Some("d8"));

        let Command::Add(club) = Command::parse("add weapon 1 d8").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(club.name, "d8");
        assert_eq!(club.damage(), Some("d6"));

        let Command::Add(mail) = Command::parse("add armor 3 Chain Mail 3").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(mail.name, "Chain Mail");
        assert_eq!(mail.defense(), 3);

        let Command::Add(bread) = Command::parse("add food 1 Black bread").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(bread.kind, ItemKind::Food);
    }

    #[test]
    fn test_parse_homebrew() {
        let Command::SpellAdd(spell) =
            Command::parse("spell add Grave Whisper | Speak with a corpse").unwrap()
        else {
            panic!("expected spell add");
        };
        assert_eq!(spell.name, "Grave Whisper");
        assert_eq!(spell.description, "Speak with a corpse");

        let Command::ItemAdd(item) = Command::parse("item add Tin whistle | 2c").unwrap() else {
            panic!("expected item add");
        };
        assert_eq!(item.cost, "2c");
        assert_eq!(item.description, "");
    }

    #[tokio::test]
    async fn test_inventory_flow() {
        let mut session = session();
        run(&mut session, "name Tamsin").await;
        run(&mut session, "add weapon 2 Spear d8").await;
        let reply = run(&mut session, "add gear 1 Rope").await;
        assert!(reply.starts_with("Added Rope (3/"));

        let sheet = run(&mut session, "show").await;
        assert!(sheet.contains("Tamsin"));
        assert!(sheet.contains("1. Spear"));

        assert_eq!(run(&mut session, "remove 1").await, "Removed Spear");
        assert!(matches!(
            session.execute(Command::Remove(5)).await,
            Err(CommandError::BadIndex(5))
        ));
        assert_eq!(session.store().active().inventory.len(), 1);
    }

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            Command::parse("edit 2 quality -1").unwrap(),
            Command::Edit(2, ItemEdit::Quality(0))
        );
        assert_eq!(
            Command::parse("edit 1 slots 4294967295").unwrap(),
            Command::Edit(1, ItemEdit::Slots(knave_core::character::MAX_ITEM_SLOTS))
        );
        assert_eq!(
            Command::parse("edit 1 type armour").unwrap(),
            Command::Edit(1, ItemEdit::Kind(ItemKind::Armor { defense: 0 }))
        );
        assert_eq!(
            Command::parse("trait Vice Gluttony and sloth").unwrap(),
            Command::Trait(TraitKind::Vice, "Gluttony and sloth".into())
        );
        assert!(matches!(Command::parse("edit 1 weight 3"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("edit 1 name"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("edit x name Y"), Err(CommandError::Usage(_))));
        assert!(matches!(
            Command::parse("edit 1 type potion"),
            Err(CommandError::UnknownItemType(_))
        ));
        assert!(matches!(
            Command::parse("trait mood grim"),
            Err(CommandError::UnknownTrait(_))
        ));
    }

    #[tokio::test]
    async fn test_item_field_edits_are_saved() {
        let mut session = session();
        run(&mut session, "add armor 2 Brigandine 3").await;
        run(&mut session, "add weapon 1 Dagger d6").await;

        assert_eq!(
            run(&mut session, "edit 1 defense 13").await,
            "1. Brigandine [defense 13, quality 3, 2 slots]"
        );
        run(&mut session, "edit 1 quality 1").await;
        run(&mut session, "edit 2 damage d8").await;
        run(&mut session, "edit 2 name Long knife").await;
        run(&mut session, "edit 2 note Bone handle").await;

        assert!(matches!(
            session.execute(Command::parse("edit 2 defense 1").unwrap()).await,
            Err(CommandError::Item(ItemEditError::NotArmor(_)))
        ));
        assert!(matches!(
            session.execute(Command::parse("edit 9 quality 1").unwrap()).await,
            Err(CommandError::BadIndex(9))
        ));

        let saved = session
            .store()
            .storage()
            .get(knave_core::persist::CHARACTERS_KEY)
            .unwrap()
            .unwrap();
        let list: Vec<knave_core::Character> = serde_json::from_str(&saved).unwrap();
        let inventory = &list[0].inventory;
        assert_eq!(inventory[0].defense(), 13);
        assert_eq!(inventory[0].quality, 1);
        assert_eq!(inventory[1].name, "Long knife");
        assert_eq!(inventory[1].damage(), Some("d8"));
        assert_eq!(inventory[1].description.as_deref(), Some("Bone handle"));

        let sheet = run(&mut session, "show").await;
        assert!(sheet.contains("2. Long knife [d8, quality 3, 1 slot] - Bone handle"));
    }

    #[tokio::test]
    async fn test_trait_edits() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "trait background Disgraced knight").await,
            "Background: Disgraced knight"
        );
        assert_eq!(session.store().active().traits.background, "Disgraced knight");
        assert!(run(&mut session, "show").await.contains("Background: Disgraced knight"));

        assert_eq!(run(&mut session, "trait background").await, "Background cleared");
        assert_eq!(session.store().active().traits.background, "");
    }

    #[tokio::test]
    async fn test_huge_inputs_stay_bounded() {
        let mut session = session();
        run(&mut session, "add gear 4294967295 Boulder").await;
        run(&mut session, "add gear 1 Pebble").await;
        let used = session.store().rules().encumbrance(session.store().active()).used;
        assert_eq!(used, knave_core::character::MAX_ITEM_SLOTS + 1);

        run(&mut session, "level 4294967295").await;
        let level = session.store().active().level;
        assert_eq!(level, knave_core::character::MAX_LEVEL);
        let xp = session.store().active().xp;
        run(&mut session, &format!("xp {xp}")).await;
        assert_eq!(session.store().active().level, level);

        assert!(matches!(
            session.execute(Command::parse("dice 4000000000d6").unwrap()).await,
            Err(CommandError::Dice(DiceError::TooManyDice(_)))
        ));
        assert!(matches!(
            session.execute(Command::parse("dice 2147483647+1").unwrap()).await,
            Err(CommandError::Dice(DiceError::InvalidNotation(_)))
        ));
    }

    #[tokio::test]
    async fn test_roster_flow() {
        let mut session = session();
        assert!(matches!(
            session.execute(Command::Delete(1)).await,
            Err(CommandError::Sheet(SheetError::Roster(RosterError::LastCharacter)))
        ));

        run(&mut session, "new").await;
        run(&mut session, "name Second").await;
        let list = run(&mut session, "list").await;
        assert!(list.contains("* 2. Second (level 1)"));

        run(&mut session, "select 1").await;
        assert_eq!(session.store().roster().active_index(), 0);
        assert_eq!(run(&mut session, "delete 2").await, "Deleted Second");
        assert_eq!(session.store().roster().len(), 1);
    }

    #[tokio::test]
    async fn test_level_and_xp_stay_in_step() {
        let mut session = session();
        run(&mut session, "xp 3500").await;
        assert_eq!(session.store().active().level, 4);
        run(&mut session, "level 2").await;
        assert_eq!(session.store().active().xp, 1000);
    }

    #[tokio::test]
    async fn test_hp_commands_clamp() {
        let mut session = session();
        run(&mut session, "maxhp 4").await;
        run(&mut session, "hp 10").await;
        let hp = session.store().active().hp;
        assert_eq!((hp.current, hp.max), (4, 4));
        run(&mut session, "maxhp 2").await;
        assert_eq!(session.store().active().hp.current, 2);
    }

    #[tokio::test]
    async fn test_roll_and_dice() {
        let mut session = session();
        let rolled = run(&mut session, "roll weather 3").await;
        assert!(rolled.starts_with("Weather"));
        assert!(rolled.contains("  3. "));

        assert!(matches!(
            session.execute(Command::parse("roll nothing").unwrap()).await,
            Err(CommandError::UnknownTable(_))
        ));

        let dice = run(&mut session, "dice 2d6+1").await;
        assert!(dice.starts_with("2d6+1: ["));
        assert!(matches!(
            session.execute(Command::Dice("banana".into())).await,
            Err(CommandError::Dice(_))
        ));
    }

    #[tokio::test]
    async fn test_homebrew_is_saved() {
        let mut session = session();
        run(&mut session, "spell add Moth Lure | Moths gather").await;
        run(&mut session, "item add Eel oil | 4c | Burns blue").await;
        assert!(run(&mut session, "spells").await.contains("1. Moth Lure - Moths gather"));
        assert!(run(&mut session, "items").await.contains("1. Eel oil [4c] - Burns blue"));

        let stored = HomebrewLibrary::<CustomSpell>::load(session.store().storage());
        assert_eq!(stored.len(), 1);

        assert_eq!(
            run(&mut session, "spell edit 1 Moth Storm | Moths swarm").await,
            "Updated spell Moth Storm"
        );
        run(&mut session, "item edit 1 Eel oil | 5c | Burns green").await;
        let stored = HomebrewLibrary::<CustomSpell>::load(session.store().storage());
        assert_eq!(stored.entries()[0].description, "Moths swarm");
        let stored = HomebrewLibrary::<CustomItemDef>::load(session.store().storage());
        assert_eq!(stored.entries()[0].cost, "5c");
        assert!(matches!(
            session.execute(Command::parse("spell edit 4 X | y").unwrap()).await,
            Err(CommandError::BadIndex(4))
        ));

        run(&mut session, "spell remove 1").await;
        let stored = HomebrewLibrary::<CustomSpell>::load(session.store().storage());
        assert!(stored.is_empty());

        assert!(matches!(
            session.execute(Command::parse("spell add  | nameless").unwrap()).await,
            Err(CommandError::Homebrew(HomebrewError::EmptyName))
        ));
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.md");
        let mut session = session();
        run(&mut session, "name Orrin").await;

        let reply = run(&mut session, &format!("export markdown {}", path.display())).await;
        assert!(reply.starts_with("Exported to"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Orrin"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut session = session();
        assert_eq!(session.execute(Command::Quit).await.unwrap(), Reply::Quit);
    }
}
