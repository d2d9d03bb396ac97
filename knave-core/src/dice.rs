//! Dice and random table primitives.
//!
//! Everything random in the crate funnels through [`uniform01`], so a seeded
//! generator makes a whole session reproducible. Also supports standard dice
//! notation (XdY+Z, keep highest/lowest) for weapon damage and coin rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Random Source
// ============================================================================

/// Create the session generator.
///
/// Without a seed the generator is seeded from the operating system and is a
/// CSPRNG, so rolls cannot be predicted by the player. A seed gives a
/// reproducible sequence.
pub fn session_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// A uniform value in `[0, 1)`.
pub fn uniform01<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Roll a single die with `sides` faces: `floor(uniform01() * sides) + 1`.
///
/// A zero-sided die is treated as a d1.
pub fn d<R: Rng + ?Sized>(rng: &mut R, sides: u32) -> u32 {
    let sides = sides.max(1);
    (uniform01(rng) * sides as f64).floor() as u32 + 1
}

pub fn d6<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    d(rng, 6)
}

pub fn d8<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    d(rng, 8)
}

pub fn d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    d(rng, 20)
}

pub fn d100<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    d(rng, 100)
}

/// Pick one entry uniformly. Returns `None` only for an empty slice.
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = (uniform01(rng) * items.len() as f64).floor() as usize;
    items.get(index.min(items.len() - 1))
}

/// Pick one entry with probability proportional to its weight.
///
/// Zero-weight entries are never chosen. Returns `None` if every weight is zero.
pub fn pick_weighted<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    entries: &'a [(T, u32)],
) -> Option<&'a T> {
    let total: u32 = entries.iter().map(|(_, weight)| *weight).sum();
    if total == 0 {
        return None;
    }

    let mut roll = d(rng, total);
    for (value, weight) in entries {
        if roll <= *weight {
            return Some(value);
        }
        roll -= weight;
    }
    None
}

// ============================================================================
// Dice Notation
// ============================================================================

/// Error type for dice parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice (at most {0} per roll)")]
    TooManyDice(u32),
    #[error("Cannot keep {keep} dice when only rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
}

/// Die types used by the game's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }

    /// Roll this die once.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        d(rng, self.sides())
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Most dice one expression may roll, across all of its components.
pub const MAX_DICE: u32 = 1000;

/// Largest flat modifier an expression may carry, either sign.
pub const MAX_MODIFIER: i32 = 1_000_000;

/// A single die component of a dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die_type: DieType,
    pub keep_highest: Option<u32>,
    pub keep_lowest: Option<u32>,
}

/// A complete dice expression (e.g., 3d6+2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
    pub original: String,
}

/// Split `3d6+2-1` into `(1, "3d6"), (1, "2"), (-1, "1")`.
///
/// A leading sign applies to the first term; any other empty term is kept so
/// the caller can reject it.
fn signed_terms(s: &str) -> Vec<(i32, &str)> {
    let mut terms = Vec::new();
    let mut sign = 1;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if ch == '+' || ch == '-' {
            if i > 0 {
                terms.push((sign, &s[start..i]));
            }
            sign = if ch == '+' { 1 } else { -1 };
            start = i + 1;
        }
    }
    terms.push((sign, &s[start..]));
    terms
}

fn parse_number<T: FromStr>(raw: &str, term: &str) -> Result<T, DiceError> {
    raw.parse()
        .map_err(|_| DiceError::InvalidNotation(term.to_string()))
}

/// Parse one `NdS`, `NdSkhK` or `NdSklK` term.
fn parse_dice_term(term: &str, count: &str, rest: &str) -> Result<DiceComponent, DiceError> {
    let count: u32 = if count.is_empty() {
        1
    } else {
        parse_number(count, term)?
    };

    let (sides, keep_highest, keep_lowest) = match (rest.split_once("kh"), rest.split_once("kl")) {
        (Some((sides, keep)), _) => (sides, Some(parse_number(keep, term)?), None),
        (None, Some((sides, keep))) => (sides, None, Some(parse_number(keep, term)?)),
        (None, None) => (rest, None, None),
    };

    let sides: u32 = parse_number(sides, term)?;
    let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

    if let Some(keep) = keep_highest.or(keep_lowest) {
        if keep > count {
            return Err(DiceError::InvalidKeepCount {
                keep,
                count,
                notation: term.to_string(),
            });
        }
    }

    Ok(DiceComponent {
        count,
        die_type,
        keep_highest,
        keep_lowest,
    })
}

impl DiceExpression {
    /// Parse a dice notation string.
    ///
    /// Rejects expressions rolling more than [`MAX_DICE`] dice or carrying a
    /// modifier beyond [`MAX_MODIFIER`], so rolling can never overflow.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let original = notation.trim().to_lowercase();
        let compact: String = original.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut dice: u32 = 0;

        for (sign, term) in signed_terms(&compact) {
            if term.is_empty() {
                return Err(DiceError::InvalidNotation(compact.clone()));
            }
            match term.split_once('d') {
                // Dice are always added; "-d6" has no meaning on a sheet.
                Some(_) if sign < 0 => return Err(DiceError::InvalidNotation(term.to_string())),
                Some((count, rest)) => {
                    let component = parse_dice_term(term, count, rest)?;
                    dice = dice
                        .checked_add(component.count)
                        .filter(|n| *n <= MAX_DICE)
                        .ok_or(DiceError::TooManyDice(MAX_DICE))?;
                    components.push(component);
                }
                None => {
                    let value: i32 = parse_number(term, term)?;
                    modifier = value
                        .checked_mul(sign)
                        .and_then(|v| modifier.checked_add(v))
                        .filter(|m| m.abs() <= MAX_MODIFIER)
                        .ok_or_else(|| DiceError::InvalidNotation(compact.clone()))?;
                }
            }
        }

        if components.is_empty() && modifier == 0 {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            components,
            modifier,
            original,
        })
    }

    /// Roll the expression with the given generator.
    pub fn roll_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        let component_results: Vec<ComponentResult> = self
            .components
            .iter()
            .map(|component| {
                let rolls: Vec<u32> = (0..component.count.min(MAX_DICE))
                    .map(|_| component.die_type.roll(rng))
                    .collect();

                let mut kept = rolls.clone();
                if let Some(keep) = component.keep_highest {
                    kept.sort_unstable_by(|a, b| b.cmp(a));
                    kept.truncate(keep as usize);
                } else if let Some(keep) = component.keep_lowest {
                    kept.sort_unstable();
                    kept.truncate(keep as usize);
                }

                let subtotal = kept.iter().fold(0u32, |sum, &r| sum.saturating_add(r));
                ComponentResult {
                    die_type: component.die_type,
                    rolls,
                    kept,
                    subtotal,
                }
            })
            .collect();

        let dice_total = component_results
            .iter()
            .fold(0i64, |sum, c| sum + i64::from(c.subtotal));
        let total = (dice_total + i64::from(self.modifier)).clamp(i32::MIN as i64, i32::MAX as i64);

        RollResult {
            expression: self.clone(),
            component_results,
            modifier: self.modifier,
            total: total as i32,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of rolling a single dice component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    pub die_type: DieType,
    pub rolls: Vec<u32>,
    pub kept: Vec<u32>,
    pub subtotal: u32,
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub component_results: Vec<ComponentResult>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice for display; dropped dice are parenthesized.
    pub fn dice_display(&self) -> String {
        let dice_parts: Vec<String> = self
            .component_results
            .iter()
            .map(|c| {
                let mut kept_used = vec![false; c.kept.len()];
                let shown: Vec<String> = c
                    .rolls
                    .iter()
                    .map(|&roll| {
                        let slot = c
                            .kept
                            .iter()
                            .enumerate()
                            .position(|(i, &k)| k == roll && !kept_used[i]);
                        match slot {
                            Some(i) => {
                                kept_used[i] = true;
                                roll.to_string()
                            }
                            None => format!("({roll})"),
                        }
                    })
                    .collect();
                format!("[{}]", shown.join(", "))
            })
            .collect();

        let dice_str = dice_parts.join(" + ");
        match self.modifier {
            0 => dice_str,
            m if m > 0 => format!("{dice_str} + {m}"),
            m => format!("{} - {}", dice_str, m.abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, notation: &str) -> Result<RollResult, DiceError> {
    let expr = DiceExpression::parse(notation)?;
    Ok(expr.roll_with_rng(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        session_rng(Some(42))
    }

    #[test]
    fn test_d_stays_in_range() {
        let mut rng = rng();
        for sides in [1, 2, 4, 6, 8, 20, 100] {
            for _ in 0..1000 {
                let value = d(&mut rng, sides);
                assert!((1..=sides).contains(&value), "d{sides} rolled {value}");
            }
        }
    }

    #[test]
    fn test_zero_sided_die_is_d1() {
        let mut rng = rng();
        assert_eq!(d(&mut rng, 0), 1);
    }

    #[test]
    fn test_d6_is_uniform() {
        let mut rng = rng();
        let trials = 60_000;
        let mut counts = [0u32; 6];
        for _ in 0..trials {
            counts[(d6(&mut rng) - 1) as usize] += 1;
        }

        let expected = trials as f64 / 6.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 5 degrees of freedom; p = 0.0001 critical value is ~25.7
        assert!(chi_square < 25.7, "chi-square {chi_square} counts {counts:?}");
    }

    #[test]
    fn test_d20_is_uniform() {
        let mut rng = rng();
        let trials = 100_000;
        let mut counts = [0u32; 20];
        for _ in 0..trials {
            counts[(d20(&mut rng) - 1) as usize] += 1;
        }

        let expected = trials as f64 / 20.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();

        // 19 degrees of freedom; p = 0.0001 critical value is ~50.0
        assert!(chi_square < 50.0, "chi-square {chi_square}");
    }

    #[test]
    fn test_pick_returns_member() {
        let mut rng = rng();
        let table = ["rope", "chalk", "lantern"];
        for _ in 0..500 {
            let picked = pick(&mut rng, &table).expect("non-empty table");
            assert!(table.contains(picked));
        }
    }

    #[test]
    fn test_pick_empty_is_none() {
        let mut rng = rng();
        let empty: [u8; 0] = [];
        assert!(pick(&mut rng, &empty).is_none());
    }

    #[test]
    fn test_pick_weighted_skips_zero_weight() {
        let mut rng = rng();
        let entries = [("never", 0), ("always", 3)];
        for _ in 0..200 {
            assert_eq!(pick_weighted(&mut rng, &entries), Some(&"always"));
        }
        let none: [(&str, u32); 1] = [("x", 0)];
        assert!(pick_weighted(&mut rng, &none).is_none());
    }

    #[test]
    fn test_pick_weighted_respects_weights() {
        let mut rng = rng();
        let entries = [("law", 5), ("neutrality", 10), ("chaos", 5)];
        let mut neutral = 0;
        for _ in 0..10_000 {
            if pick_weighted(&mut rng, &entries) == Some(&"neutrality") {
                neutral += 1;
            }
        }
        assert!((4_500..5_500).contains(&neutral), "neutral = {neutral}");
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let mut a = session_rng(Some(7));
        let mut b = session_rng(Some(7));
        let rolls_a: Vec<u32> = (0..20).map(|_| d20(&mut a)).collect();
        let rolls_b: Vec<u32> = (0..20).map(|_| d20(&mut b)).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert_eq!(expr.components.len(), 1);
        assert_eq!(expr.components[0].count, 1);
        assert_eq!(expr.components[0].die_type, DieType::D20);
        assert_eq!(expr.modifier, 0);
    }

    #[test]
    fn test_parse_bare_die() {
        let expr = DiceExpression::parse("d6").unwrap();
        assert_eq!(expr.components[0].count, 1);
        assert_eq!(expr.components[0].die_type, DieType::D6);
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse("1d8+1").unwrap();
        assert_eq!(expr.modifier, 1);

        let expr = DiceExpression::parse("2d6-2").unwrap();
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn test_invalid_notation() {
        assert!(matches!(
            DiceExpression::parse("3d7"),
            Err(DiceError::InvalidDieSize(7))
        ));
        assert!(matches!(DiceExpression::parse(""), Err(DiceError::NoDice)));
        assert!(DiceExpression::parse("banana").is_err());
        assert!(matches!(
            DiceExpression::parse("3d6kh4"),
            Err(DiceError::InvalidKeepCount { keep: 4, count: 3, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_dangling_signs() {
        assert!(DiceExpression::parse("3d6+").is_err());
        assert!(DiceExpression::parse("1d4++2").is_err());
        assert!(DiceExpression::parse("-d6").is_err());
        assert_eq!(DiceExpression::parse("+2").unwrap().modifier, 2);
        assert_eq!(DiceExpression::parse("d6 - 1 + 3").unwrap().modifier, 2);
    }

    #[test]
    fn test_modifier_overflow_is_an_error() {
        let mut rng = rng();
        assert!(matches!(
            roll(&mut rng, "2147483647+1"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(
            roll(&mut rng, "-2147483648-1"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(DiceExpression::parse("d6+1000001").is_err());
        assert_eq!(DiceExpression::parse("d6+1000000").unwrap().modifier, MAX_MODIFIER);
    }

    #[test]
    fn test_dice_count_is_capped() {
        let mut rng = rng();
        assert!(matches!(
            roll(&mut rng, "4000000000d6"),
            Err(DiceError::TooManyDice(MAX_DICE))
        ));
        assert!(matches!(
            DiceExpression::parse("600d6+600d6"),
            Err(DiceError::TooManyDice(_))
        ));
        assert!(DiceExpression::parse("99999999999d6").is_err());

        let result = roll(&mut rng, "1000d100+1000000").unwrap();
        assert_eq!(result.component_results[0].rolls.len(), 1000);
        assert!((1_001_000..=1_100_000).contains(&result.total));
    }

    #[test]
    fn test_keep_lowest_matches_min() {
        let mut rng = rng();
        for _ in 0..200 {
            let result = roll(&mut rng, "3d6kl1").unwrap();
            let component = &result.component_results[0];
            assert_eq!(component.rolls.len(), 3);
            assert_eq!(result.total as u32, *component.rolls.iter().min().unwrap());
        }
    }

    #[test]
    fn test_roll_with_modifier_range() {
        let mut rng = rng();
        for _ in 0..200 {
            let result = roll(&mut rng, "3d6+2").unwrap();
            assert!((5..=20).contains(&result.total));
        }
    }

    #[test]
    fn test_dice_display_marks_dropped() {
        let result = RollResult {
            expression: DiceExpression::parse("3d6kl1").unwrap(),
            component_results: vec![ComponentResult {
                die_type: DieType::D6,
                rolls: vec![4, 2, 5],
                kept: vec![2],
                subtotal: 2,
            }],
            modifier: 0,
            total: 2,
        };
        assert_eq!(result.dice_display(), "[(4), 2, (5)]");
        assert_eq!(result.to_string(), "[(4), 2, (5)] = 2");
    }
}
