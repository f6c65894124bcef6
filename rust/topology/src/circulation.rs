// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text heuristics for vertical circulation.
//!
//! Upstream data rarely tags stairs and elevators explicitly, so they are
//! recognized from the space id and name. All string sniffing is confined to
//! this module; the layout engine only branches on [`CoreType`], [`CoreSide`]
//! and the opaque stacking key.

use serde::{Deserialize, Serialize};

use crate::model::SpaceSpec;

/// Circulation role of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreType {
    Stair,
    Elevator,
    Generic,
}

impl CoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreType::Stair => "stair",
            CoreType::Elevator => "elevator",
            CoreType::Generic => "generic",
        }
    }
}

impl std::fmt::Display for CoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the plan a core asks to be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoreSide {
    /// `west`, `left` or `north`.
    First,
    /// `east`, `right` or `south`.
    Second,
}

/// Classifies a space as stair, elevator or neither.
pub fn classify(spec: &SpaceSpec) -> CoreType {
    let text = format!("{} {}", spec.id, spec.name).to_lowercase();
    if text.contains("stair") {
        CoreType::Stair
    } else if text.contains("elevator") || text.contains("lift") {
        CoreType::Elevator
    } else {
        CoreType::Generic
    }
}

/// Returns the explicit side hint carried in the id or name, if any.
pub fn side_hint(spec: &SpaceSpec) -> Option<CoreSide> {
    let text = format!("{} {}", spec.id, spec.name).to_lowercase();
    let hint = tokens(&text).find_map(|tok| match tok {
        "west" | "left" | "north" => Some(CoreSide::First),
        "east" | "right" | "south" => Some(CoreSide::Second),
        _ => None,
    });
    hint
}

/// Key shared by the same core on every storey, e.g. `stair:stair_a` for
/// both `Stair A 1F` and `Stair A 2F`.
pub fn stack_key(spec: &SpaceSpec) -> String {
    let source = if spec.name.trim().is_empty() {
        spec.id.to_lowercase()
    } else {
        spec.name.to_lowercase()
    };

    let mut kept: Vec<&str> = Vec::new();
    let mut after_storey_word = false;
    for tok in tokens(&source) {
        if is_storey_word(tok) {
            after_storey_word = true;
            continue;
        }
        let numeric = tok.chars().all(|c| c.is_ascii_digit());
        if is_storey_marker(tok) || (numeric && after_storey_word) {
            after_storey_word = false;
            continue;
        }
        after_storey_word = false;
        kept.push(tok);
    }

    let base = if kept.is_empty() {
        source.clone()
    } else {
        kept.join("_")
    };
    format!("{}:{}", classify(spec), base)
}

/// Stable ordering key so cores keep the same left-to-right order on every
/// storey.
pub fn grouping_key(spec: &SpaceSpec) -> (CoreType, String, String) {
    (classify(spec), stack_key(spec), spec.id.clone())
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}

fn is_storey_word(tok: &str) -> bool {
    matches!(tok, "level" | "floor" | "storey" | "story" | "lvl" | "fl")
}

/// `f1`, `l2`, `1f`, `2fl`, `3l`
fn is_storey_marker(tok: &str) -> bool {
    let digits = tok.chars().filter(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits == tok.len() {
        return false;
    }
    let prefixed = tok
        .strip_prefix('f')
        .or_else(|| tok.strip_prefix('l'))
        .map(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    let suffixed = tok
        .strip_suffix("fl")
        .or_else(|| tok.strip_suffix('f'))
        .or_else(|| tok.strip_suffix('l'))
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    prefixed || suffixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpaceCategory;

    #[test]
    fn classify_by_substring() {
        assert_eq!(classify(&SpaceSpec::new("Stair_North")), CoreType::Stair);
        assert_eq!(classify(&SpaceSpec::new("s1").with_name("Main Staircase")), CoreType::Stair);
        assert_eq!(classify(&SpaceSpec::new("ELEVATOR-2")), CoreType::Elevator);
        assert_eq!(classify(&SpaceSpec::new("x").with_name("lift lobby")), CoreType::Elevator);
        assert_eq!(classify(&SpaceSpec::new("office")), CoreType::Generic);
    }

    #[test]
    fn core_category_without_keyword_is_generic_type() {
        let shaft = SpaceSpec::new("shaft").with_category(SpaceCategory::Core);
        assert_eq!(classify(&shaft), CoreType::Generic);
        assert!(shaft.is_vertical_core());
    }

    #[test]
    fn side_hints_from_tokens() {
        assert_eq!(side_hint(&SpaceSpec::new("stair_west")), Some(CoreSide::First));
        assert_eq!(side_hint(&SpaceSpec::new("s").with_name("Stair Right")), Some(CoreSide::Second));
        assert_eq!(side_hint(&SpaceSpec::new("stair_south_f2")), Some(CoreSide::Second));
        assert_eq!(side_hint(&SpaceSpec::new("stair_1")), None);
        // substrings do not count
        assert_eq!(side_hint(&SpaceSpec::new("northwind_stair")), None);
    }

    #[test]
    fn stack_key_ignores_storey_markers() {
        let a = stack_key(&SpaceSpec::new("stair_a_f1"));
        let b = stack_key(&SpaceSpec::new("stair_a_f2"));
        assert_eq!(a, b);
        assert_eq!(a, "stair:stair_a");

        let n1 = stack_key(&SpaceSpec::new("s1").with_name("Elevator 1F"));
        let n2 = stack_key(&SpaceSpec::new("s2").with_name("Elevator 2F"));
        assert_eq!(n1, n2);

        let l1 = stack_key(&SpaceSpec::new("lift-level-1"));
        let l2 = stack_key(&SpaceSpec::new("lift-level-2"));
        assert_eq!(l1, l2);
    }

    #[test]
    fn stack_key_keeps_distinct_cores_apart() {
        let a = stack_key(&SpaceSpec::new("stair_1"));
        let b = stack_key(&SpaceSpec::new("stair_2"));
        assert_ne!(a, b);
        assert_ne!(stack_key(&SpaceSpec::new("stair_x")), stack_key(&SpaceSpec::new("elevator_x")));
    }

    #[test]
    fn grouping_orders_stairs_before_elevators() {
        let mut specs = vec![
            SpaceSpec::new("elevator_a"),
            SpaceSpec::new("stair_b"),
            SpaceSpec::new("stair_a"),
        ];
        specs.sort_by_key(grouping_key);
        let ids: Vec<_> = specs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["stair_a", "stair_b", "elevator_a"]);
    }
}
