//! Character sheet export.
//!
//! Renders a sheet as plain text or Markdown and writes it to disk.

use crate::character::{Character, Item, ItemKind, TraitKind};
use crate::rules::RuleSet;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;

/// Errors from exporting a sheet.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
}

impl ExportFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn render(&self, character: &Character, rules: &RuleSet) -> String {
        match self {
            ExportFormat::Text => to_plain_text(character, rules),
            ExportFormat::Markdown => to_markdown(character, rules),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(ExportFormat::Text),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// The per-item modifiers shown after the name, e.g. `d8, quality 3, 2 slots`.
pub fn item_details(item: &Item) -> String {
    let mut parts = Vec::new();
    match &item.kind {
        ItemKind::Weapon { damage } if !damage.is_empty() => parts.push(damage.clone()),
        ItemKind::Armor { defense } => parts.push(format!("defense {defense}")),
        _ => {}
    }
    if item.quality > 0 {
        parts.push(format!("quality {}", item.quality));
    }
    parts.push(match item.slots {
        1 => "1 slot".to_string(),
        n => format!("{n} slots"),
    });
    parts.join(", ")
}

/// ` - <description>` for items that carry one, otherwise empty.
fn description_suffix(item: &Item) -> String {
    match item.description.as_deref() {
        Some(text) if !text.trim().is_empty() => format!(" - {}", text.trim()),
        _ => String::new(),
    }
}

/// Render a sheet as plain text.
pub fn to_plain_text(character: &Character, rules: &RuleSet) -> String {
    let mut out = String::new();
    let load = rules.encumbrance(character);

    let _ = writeln!(out, "{}", character.display_name());
    if character.is_dead {
        let _ = writeln!(out, "[DECEASED]");
    }
    let _ = writeln!(out, "Level {} ({} XP)", character.level, character.xp);
    let _ = writeln!(out, "HP: {}/{}", character.hp.current, character.hp.max);
    let _ = writeln!(out, "AC: {}", rules.armor_class(character));
    out.push('\n');

    let _ = writeln!(out, "Attributes:");
    for (attribute, score) in character.stats.iter() {
        let _ = writeln!(
            out,
            "  {} +{} (defense {})",
            attribute.abbreviation(),
            score.bonus(),
            score.defense()
        );
    }
    out.push('\n');

    let _ = writeln!(out, "Traits:");
    for kind in TraitKind::all() {
        let value = character.traits.get(kind);
        if !value.is_empty() {
            let _ = writeln!(out, "  {}: {}", kind.label(), value);
        }
    }
    out.push('\n');

    let _ = writeln!(out, "Inventory ({}/{} slots):", load.used, load.capacity);
    if load.is_overencumbered() {
        let _ = writeln!(out, "  (overencumbered)");
    }
    for (index, item) in character.inventory.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} [{}]{}",
            index + 1,
            item.name,
            item_details(item),
            description_suffix(item)
        );
    }

    if !character.memo.trim().is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Notes:");
        let _ = writeln!(out, "{}", character.memo);
    }
    out
}

/// Render a sheet as Markdown.
pub fn to_markdown(character: &Character, rules: &RuleSet) -> String {
    let mut out = String::new();
    let load = rules.encumbrance(character);

    let _ = write!(out, "# {}", character.display_name());
    if character.is_dead {
        out.push_str(" (deceased)");
    }
    out.push_str("\n\n");

    let _ = writeln!(
        out,
        "**Level** {} | **XP** {} | **HP** {}/{} | **AC** {}",
        character.level,
        character.xp,
        character.hp.current,
        character.hp.max,
        rules.armor_class(character)
    );
    out.push('\n');

    out.push_str("## Attributes\n\n");
    out.push_str("| Attribute | Bonus | Defense |\n|---|---|---|\n");
    for (attribute, score) in character.stats.iter() {
        let _ = writeln!(
            out,
            "| {} | +{} | {} |",
            attribute.name(),
            score.bonus(),
            score.defense()
        );
    }
    out.push('\n');

    out.push_str("## Traits\n\n");
    for kind in TraitKind::all() {
        let value = character.traits.get(kind);
        if !value.is_empty() {
            let _ = writeln!(out, "- **{}**: {}", kind.label(), value);
        }
    }
    out.push('\n');

    let _ = writeln!(out, "## Inventory ({}/{} slots)\n", load.used, load.capacity);
    if load.is_overencumbered() {
        out.push_str("_Overencumbered._\n\n");
    }
    for item in &character.inventory {
        let _ = writeln!(
            out,
            "- {} ({}){}",
            item.name,
            item_details(item),
            description_suffix(item)
        );
    }

    if !character.memo.trim().is_empty() {
        out.push_str("\n## Notes\n\n");
        let _ = writeln!(out, "{}", character.memo);
    }
    out
}

/// Write rendered output to `path`, replacing any existing file.
pub async fn write_export(path: impl AsRef<Path>, contents: &str) -> Result<(), ExportError> {
    let path = path.as_ref();
    fs::write(path, contents).await?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "Exported character");
    Ok(())
}
