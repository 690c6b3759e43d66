//! TM and HM items from tmhm_moves.asm.
//!
//! descriptions.asm has no per-machine labels, so machines only exist in
//! the item map once this has run. Keys go through [`normalize_id`], which
//! is what lets `TM_FLAMETHROWER` in a mart resolve to the same item.

use crate::config::Variant;
use crate::error::Result;
use crate::file_utils::read_source_lines;
use crate::models::{ItemData, ItemLocation, ItemMap};
use crate::normalize::{normalize_id, title_case};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::info;

lazy_static! {
    static ref MACHINE_RE: Regex =
        Regex::new(r"^db\s+([A-Z0-9_]+)\s*;\s*(TM|HM)(\d+)\s*(?:\(([^)]+)\))?").unwrap();
}

const GYM_LEADER_NAMES: [&str; 16] = [
    "Falkner", "Bugsy", "Whitney", "Morty", "Chuck", "Jasmine", "Pryce", "Clair", "Brock", "Misty",
    "Lt. Surge", "Erika", "Janine", "Sabrina", "Blaine", "Blue",
];

/// One `db MOVE ; TMxx (Where)` line.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineEntry {
    /// `TM` or `HM`
    pub kind: String,
    /// Zero-padded to two digits.
    pub number: String,
    pub move_constant: String,
    pub location: Option<String>,
}

impl MachineEntry {
    pub fn item_id(&self) -> String {
        normalize_id(&format!("{}_{}", self.kind, self.move_constant))
    }

    pub fn tm_number(&self) -> String {
        format!("{}{}", self.kind, self.number)
    }

    pub fn move_name(&self) -> String {
        format_move_name(&self.move_constant)
    }
}

/// Add or update one item per machine. Returns how many machines were read.
pub fn extract_tm_hm_items(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<usize> {
    let Some(lines) = read_source_lines(path, "TM/HM moves", variant)? else {
        return Ok(0);
    };

    let machines = parse_tm_hm_moves(&lines);
    for machine in &machines {
        let id = machine.item_id();
        let move_name = machine.move_name();
        let item = items
            .entry(id.clone())
            .or_insert_with(|| ItemData::new(id, "", ""));
        item.name = format!("{} {}", machine.tm_number(), move_name);
        item.tm_number = Some(machine.tm_number());
        item.move_name = Some(move_name);
        if let Some(hint) = machine.location.as_deref() {
            item.add_location(machine_location(hint));
        }
    }

    info!("Extracted {} TM/HM items", machines.len());
    Ok(machines.len())
}

pub fn parse_tm_hm_moves<S: AsRef<str>>(lines: &[S]) -> Vec<MachineEntry> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = MACHINE_RE.captures(line.as_ref().trim())?;
            Some(MachineEntry {
                kind: caps[2].to_string(),
                number: format!("{:0>2}", &caps[3]),
                move_constant: caps[1].to_string(),
                location: caps
                    .get(4)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|hint| !hint.is_empty()),
            })
        })
        .collect()
}

/// `DYNAMICPUNCH` → `Dynamicpunch`, `PSYCHIC_M` → `Psychic`.
pub fn format_move_name(constant: &str) -> String {
    if constant == "PSYCHIC_M" {
        return "Psychic".to_string();
    }
    title_case(&constant.replace('_', " "))
}

/// Turn the comment's location hint into a location.
fn machine_location(hint: &str) -> ItemLocation {
    if let Some((city, _)) = hint.split_once("Dept.") {
        return ItemLocation::new(city.trim(), Some("Department Store".into()), None);
    }
    if let Some((city, _)) = hint.split_once("Game Corner") {
        return ItemLocation::new(city.trim(), Some("Game Corner".into()), None);
    }
    if GYM_LEADER_NAMES.contains(&hint) {
        return ItemLocation::new(format!("{}'s Gym", hint), Some("Gym Leader".into()), None);
    }
    ItemLocation::new(hint, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TMHM: &str = "\
TMHMMoves:
\tdb DYNAMICPUNCH ; TM01 (Chuck)
\tdb PSYCHIC_M    ; TM29 (Goldenrod Dept. Store)
\tdb FLAMETHROWER ; TM35
\tdb CUT          ; HM1 (Ilex Forest)
\tdb 0 ; end
";

    fn write_tmhm(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("tmhm_moves.asm");
        fs::write(&path, TMHM).unwrap();
        path
    }

    #[test]
    fn test_parse_tm_hm_moves() {
        let lines: Vec<&str> = TMHM.lines().collect();
        let machines = parse_tm_hm_moves(&lines);
        assert_eq!(machines.len(), 4);
        assert_eq!(machines[0].item_id(), "tmdynamicpunch");
        assert_eq!(machines[0].location.as_deref(), Some("Chuck"));
        assert_eq!(machines[1].item_id(), "tmpsychicm");
        assert!(machines[2].location.is_none());
        assert_eq!(machines[3].tm_number(), "HM01");
        assert_eq!(machines[3].item_id(), "hmcut");
    }

    #[test]
    fn test_extract_tm_hm_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmhm(&dir);
        let mut items = ItemMap::new();
        let count = extract_tm_hm_items(&mut items, &path, Variant::Polished).unwrap();
        assert_eq!(count, 4);

        let punch = &items["tmdynamicpunch"];
        assert_eq!(punch.name, "TM01 Dynamicpunch");
        assert_eq!(punch.tm_number.as_deref(), Some("TM01"));
        assert_eq!(
            punch.locations.as_ref().unwrap()[0],
            ItemLocation::new("Chuck's Gym", Some("Gym Leader".into()), None)
        );

        let psychic = &items["tmpsychicm"];
        assert_eq!(psychic.move_name.as_deref(), Some("Psychic"));
        assert_eq!(
            psychic.locations.as_ref().unwrap()[0],
            ItemLocation::new("Goldenrod", Some("Department Store".into()), None)
        );

        assert!(items["tmflamethrower"].locations.is_none());
        assert_eq!(items["hmcut"].locations.as_ref().unwrap()[0].area, "Ilex Forest");
    }

    #[test]
    fn test_machine_constants_resolve_in_marts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmhm(&dir);
        let mut items = ItemMap::new();
        extract_tm_hm_items(&mut items, &path, Variant::Polished).unwrap();

        let mut matcher = crate::matching::ItemMatcher::new(&items);
        assert_eq!(
            matcher.resolve("TM_PSYCHIC_M").map(|(key, _)| key),
            Some("tmpsychicm".to_string())
        );
        assert_eq!(
            matcher.resolve("TM_FLAMETHROWER").map(|(key, _)| key),
            Some("tmflamethrower".to_string())
        );
    }

    #[test]
    fn test_existing_item_keeps_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tmhm(&dir);
        let mut items = ItemMap::new();
        items.insert(
            "tmflamethrower".to_string(),
            ItemData::new("tmflamethrower", "TM Flamethrower", "A fire move."),
        );
        extract_tm_hm_items(&mut items, &path, Variant::Polished).unwrap();
        let tm = &items["tmflamethrower"];
        assert_eq!(tm.description, "A fire move.");
        assert_eq!(tm.name, "TM35 Flamethrower");
    }

    #[test]
    fn test_missing_file_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut items = ItemMap::new();
        let count =
            extract_tm_hm_items(&mut items, &dir.path().join("tmhm_moves.asm"), Variant::Polished).unwrap();
        assert_eq!(count, 0);
        assert!(items.is_empty());
    }
}
