//! Coercion of free-form numeric input.
//!
//! Sheet fields are edited as text. Anything that doesn't parse, or parses to
//! a value outside the field's range, is replaced by the nearest safe value
//! rather than rejected.

use crate::character::{MAX_ITEM_SLOTS, MAX_LEVEL};
use std::str::FromStr;

/// Parse `raw`, falling back to `default` on anything unparsable.
pub fn parse_or<T: FromStr>(raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or(default)
}

/// Parse a signed number and clamp it to `[min, max]`; garbage becomes `min`.
fn clamped(raw: &str, min: i64, max: i64) -> i64 {
    parse_or(raw, min).clamp(min, max)
}

/// Experience points: non-negative, garbage is 0.
pub fn coerce_xp(raw: &str) -> u32 {
    clamped(raw, 0, u32::MAX as i64) as u32
}

/// Level: between 1 and [`MAX_LEVEL`], garbage is 1.
pub fn coerce_level(raw: &str) -> u32 {
    clamped(raw, 1, MAX_LEVEL as i64) as u32
}

/// Maximum hit points: at least 1, garbage is 1.
pub fn coerce_max_hp(raw: &str) -> u32 {
    clamped(raw, 1, u32::MAX as i64) as u32
}

/// Current hit points, quality and other counts: non-negative, garbage is 0.
pub fn coerce_count(raw: &str) -> u32 {
    clamped(raw, 0, u32::MAX as i64) as u32
}

/// Slots for one item: between 0 and [`MAX_ITEM_SLOTS`], garbage is 0.
pub fn coerce_slots(raw: &str) -> u32 {
    clamped(raw, 0, MAX_ITEM_SLOTS as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp() {
        assert_eq!(coerce_xp("2500"), 2500);
        assert_eq!(coerce_xp(" 12 "), 12);
        assert_eq!(coerce_xp("-40"), 0);
        assert_eq!(coerce_xp("lots"), 0);
        assert_eq!(coerce_xp(""), 0);
    }

    #[test]
    fn test_level_and_max_hp_floor_at_one() {
        assert_eq!(coerce_level("0"), 1);
        assert_eq!(coerce_level("abc"), 1);
        assert_eq!(coerce_level("7"), 7);
        assert_eq!(coerce_max_hp("-3"), 1);
        assert_eq!(coerce_max_hp(""), 1);
        assert_eq!(coerce_max_hp("9"), 9);
    }

    #[test]
    fn test_huge_values_saturate() {
        assert_eq!(coerce_count("99999999999"), u32::MAX);
        assert_eq!(coerce_count("-1"), 0);
        assert_eq!(coerce_xp("4294967296"), u32::MAX);
    }

    #[test]
    fn test_level_and_slots_are_bounded() {
        assert_eq!(coerce_level("4294967295"), MAX_LEVEL);
        assert_eq!(coerce_level("5000000"), MAX_LEVEL);
        assert_eq!(coerce_level("4294968"), 4_294_968);
        assert_eq!(coerce_slots("4294967295"), MAX_ITEM_SLOTS);
        assert_eq!(coerce_slots("3"), 3);
        assert_eq!(coerce_slots("-2"), 0);
        assert_eq!(coerce_slots("heavy"), 0);
    }

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or("3", 0i32), 3);
        assert_eq!(parse_or("x", -1i32), -1);
    }
}
