//! Non-mart ways to obtain items: Pickup, Rock Smash, fishing and the
//! special shops and prize counters.
//!
//! Every table file has the same shape (a label, then `db`/`dbw` rows, then
//! an optional `db -1`), so one parser reads them all and each method only
//! describes its columns and how a row reads as a location.

use crate::config::Variant;
use crate::error::Result;
use crate::file_utils::read_source_lines;
use crate::items::parse_number;
use crate::matching::{ItemMatcher, MatchReport};
use crate::models::{ItemLocation, ItemMap};
use crate::normalize::split_case_boundaries;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(r"^(\w+):+$").unwrap();
    static ref ROW_RE: Regex = Regex::new(r"^(?:db|dbw|dw)\s+([^;]+)").unwrap();
}

/// A table row: the label it sits under, the item token and the numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub label: String,
    pub item: String,
    pub value: Option<u32>,
}

/// Column layout and presentation of one acquisition table.
struct TableKind {
    source: &'static str,
    what: &'static str,
    area: &'static str,
    item_column: usize,
    value_column: Option<usize>,
    /// Whether the numeric column is a price stored on the location.
    priced: bool,
    details: fn(&TableRow) -> String,
}

const PICKUP: TableKind = TableKind {
    source: "pickup",
    what: "Pickup items",
    area: "Pickup",
    item_column: 0,
    value_column: None,
    priced: false,
    details: pickup_details,
};

const ROCK: TableKind = TableKind {
    source: "rock_smash",
    what: "Rock Smash items",
    area: "Rock Smash",
    item_column: 1,
    value_column: Some(0),
    priced: false,
    details: rarity_details,
};

const FISH: TableKind = TableKind {
    source: "fishing",
    what: "Fishing items",
    area: "Fishing",
    item_column: 1,
    value_column: Some(0),
    priced: false,
    details: fishing_details,
};

const ROOFTOP: TableKind = TableKind {
    source: "rooftop_sale",
    what: "Rooftop sale",
    area: "Goldenrod Dept. Store Rooftop",
    item_column: 0,
    value_column: Some(1),
    priced: true,
    details: rooftop_details,
};

const MANIAC: TableKind = TableKind {
    source: "maniac",
    what: "Collector items",
    area: "Collector",
    item_column: 0,
    value_column: Some(1),
    priced: true,
    details: collector_details,
};

const BARGAIN: TableKind = TableKind {
    source: "bargain_shop",
    what: "Bargain shop",
    area: "Goldenrod Underground Bargain Shop",
    item_column: 0,
    value_column: Some(1),
    priced: true,
    details: bargain_details,
};

const BUENA: TableKind = TableKind {
    source: "buena_prizes",
    what: "Buena prizes",
    area: "Buena's Password Prizes",
    item_column: 0,
    value_column: Some(1),
    priced: false,
    details: prize_details,
};

fn pickup_details(row: &TableRow) -> String {
    let rarity = if row.label.contains("Rare") { "Rare" } else { "Common" };
    rarity.to_string()
}

fn rarity_details(row: &TableRow) -> String {
    format!("{}% chance", row.value.unwrap_or(0))
}

fn fishing_details(row: &TableRow) -> String {
    format!("{}% chance ({})", row.value.unwrap_or(0), rod_name(&row.label))
}

fn rooftop_details(_: &TableRow) -> String {
    "Rooftop sale".to_string()
}

fn collector_details(row: &TableRow) -> String {
    format!("Sells for ¥{}", row.value.unwrap_or(0))
}

fn bargain_details(_: &TableRow) -> String {
    "Bargain".to_string()
}

fn prize_details(row: &TableRow) -> String {
    format!("{} Blue Card points", row.value.unwrap_or(0))
}

pub fn extract_pickup_items(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &PICKUP)
}

pub fn extract_rock_items(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &ROCK)
}

pub fn extract_fish_items(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &FISH)
}

pub fn extract_rooftop_sale(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &ROOFTOP)
}

pub fn extract_maniac_items(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &MANIAC)
}

pub fn extract_bargain_shop(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &BARGAIN)
}

pub fn extract_buena_prizes(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    extract_table(items, path, variant, &BUENA)
}

fn extract_table(items: &mut ItemMap, path: &Path, variant: Variant, kind: &TableKind) -> Result<MatchReport> {
    let mut report = MatchReport::new();
    let Some(lines) = read_source_lines(path, kind.what, variant)? else {
        return Ok(report);
    };

    let rows = parse_table(&lines, kind.item_column, kind.value_column);
    let mut matcher = ItemMatcher::new(items);
    let mut added = 0;
    for row in &rows {
        let Some(key) = report.resolve(&mut matcher, kind.source, &row.item) else {
            continue;
        };
        let price = if kind.priced { row.value } else { None };
        let location = ItemLocation::new(kind.area, Some((kind.details)(row)), price);
        if let Some(item) = items.get_mut(&key) {
            if item.add_location(location) {
                added += 1;
            }
        }
    }

    info!("{}: added {} locations from {} rows", kind.what, added, rows.len());
    Ok(report)
}

/// Read `db`/`dbw` rows, taking the item token from `item_column` and a
/// number from `value_column`. Terminators, padding and rows whose item
/// column is numeric are skipped.
pub fn parse_table<S: AsRef<str>>(lines: &[S], item_column: usize, value_column: Option<usize>) -> Vec<TableRow> {
    let mut rows = Vec::new();
    let mut label = String::new();

    for line in lines {
        let line = line.as_ref().trim();
        if let Some(caps) = LABEL_RE.captures(line) {
            label = caps[1].to_string();
            continue;
        }
        let Some(caps) = ROW_RE.captures(line) else {
            continue;
        };

        let columns: Vec<&str> = caps[1].split(',').map(str::trim).collect();
        if columns.first().is_some_and(|c| *c == "-1") {
            continue;
        }
        let Some(item) = columns.get(item_column).copied() else {
            debug!("Row without an item column: {}", line);
            continue;
        };
        if item.is_empty() || item == "NO_ITEM" || parse_number(item).is_some() {
            continue;
        }
        let value = value_column.and_then(|i| columns.get(i)).and_then(|v| parse_number(v));
        if value_column.is_some() && value.is_none() {
            debug!("Row without a readable number: {}", line);
            continue;
        }

        rows.push(TableRow {
            label: label.clone(),
            item: item.to_string(),
            value,
        });
    }

    rows
}

/// `SuperRodItems` → `Super Rod`.
fn rod_name(label: &str) -> String {
    ["Old", "Good", "Super"]
        .iter()
        .find(|rod| label.contains(*rod))
        .map(|rod| format!("{} Rod", rod))
        .unwrap_or_else(|| split_case_boundaries(label.trim_end_matches("Items")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemData;
    use std::fs;

    fn item_map(ids: &[&str]) -> ItemMap {
        ids.iter()
            .map(|id| (id.to_string(), ItemData::new(*id, *id, "")))
            .collect()
    }

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_pickup_common_and_rare() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pickup_items.asm",
            "BasePickupTable:\n\tdb POTION\n\tdb ANTIDOTE\nRarePickupTable:\n\tdb NUGGET\n\tdb -1\n",
        );
        let mut items = item_map(&["potion", "antidote", "nugget"]);
        let report = extract_pickup_items(&mut items, &path, Variant::Polished).unwrap();
        assert_eq!(report.matched_count(), 3);
        let nugget = &items["nugget"].locations.as_ref().unwrap()[0];
        assert_eq!(nugget.area, "Pickup");
        assert_eq!(nugget.details.as_deref(), Some("Rare"));
        let potion = &items["potion"].locations.as_ref().unwrap()[0];
        assert_eq!(potion.details.as_deref(), Some("Common"));
    }

    #[test]
    fn test_rock_smash_rarity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "rock_items.asm", "RockItems:\n\tdb 1, MAX_REVIVE\n\tdb 24, SOFT_SAND\n\tdb -1\n");
        let mut items = item_map(&["maxrevive", "softsand"]);
        extract_rock_items(&mut items, &path, Variant::Polished).unwrap();
        let sand = &items["softsand"].locations.as_ref().unwrap()[0];
        assert_eq!(sand.area, "Rock Smash");
        assert_eq!(sand.details.as_deref(), Some("24% chance"));
        assert!(sand.price.is_none());
    }

    #[test]
    fn test_fishing_rod_from_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "fish_items.asm",
            "OldRodItems:\n\tdb 10, PEARL\nSuperRodItems:\n\tdb 5, BIG_PEARL\n\tdb -1\n",
        );
        let mut items = item_map(&["pearl", "bigpearl"]);
        extract_fish_items(&mut items, &path, Variant::Polished).unwrap();
        assert_eq!(
            items["pearl"].locations.as_ref().unwrap()[0].details.as_deref(),
            Some("10% chance (Old Rod)")
        );
        assert_eq!(
            items["bigpearl"].locations.as_ref().unwrap()[0].details.as_deref(),
            Some("5% chance (Super Rod)")
        );
    }

    #[test]
    fn test_priced_tables_store_price() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "maniac_items.asm", "ManiacItems:\n\tdbw TINYMUSHROOM, 500\n\tdbw SLOWPOKETAIL, 10000\n\tdb -1\n");
        let mut items = item_map(&["tinymushroom", "slowpoketail"]);
        extract_maniac_items(&mut items, &path, Variant::Polished).unwrap();
        let tail = &items["slowpoketail"].locations.as_ref().unwrap()[0];
        assert_eq!(tail.area, "Collector");
        assert_eq!(tail.details.as_deref(), Some("Sells for ¥10000"));
        assert_eq!(tail.price, Some(10000));
    }

    #[test]
    fn test_buena_points_are_not_a_price() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "buena_prizes.asm", "BuenaPrizeItems:\n\tdb ULTRA_BALL, 2\n\tdb NUGGET, 10\n\tdb -1\n");
        let mut items = item_map(&["ultra", "nugget"]);
        let report = extract_buena_prizes(&mut items, &path, Variant::Polished).unwrap();
        assert_eq!(report.unmatched_count(), 0);
        let ball = &items["ultra"].locations.as_ref().unwrap()[0];
        assert_eq!(ball.details.as_deref(), Some("2 Blue Card points"));
        assert!(ball.price.is_none());
    }

    #[test]
    fn test_bargain_and_rooftop_rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let bargain = write(&dir, "bargain_shop.asm", "BargainShopData:\n\tdbw NUGGET, 4500\n\tdb -1\n");
        let rooftop = write(&dir, "rooftop_sale.asm", "RooftopSale1:\n\tdbw POTION, 150\n\tdb -1\n");
        let mut items = item_map(&["nugget", "potion"]);
        for _ in 0..2 {
            extract_bargain_shop(&mut items, &bargain, Variant::Polished).unwrap();
            extract_rooftop_sale(&mut items, &rooftop, Variant::Polished).unwrap();
        }
        assert_eq!(items["nugget"].location_count(), 1);
        assert_eq!(items["potion"].locations.as_ref().unwrap()[0].price, Some(150));
    }

    #[test]
    fn test_parse_table_skips_malformed_rows() {
        let lines = ["Table:", "db 5", "db 3, NO_ITEM", "db X, POTION", "db 7, ETHER ; comment"];
        let rows = parse_table(&lines, 1, Some(0));
        assert_eq!(
            rows,
            vec![TableRow {
                label: "Table".into(),
                item: "ETHER".into(),
                value: Some(7)
            }]
        );
    }

    #[test]
    fn test_missing_table_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut items = item_map(&["potion"]);
        let report =
            extract_rock_items(&mut items, &dir.path().join("rock_items.asm"), Variant::Polished).unwrap();
        assert!(report.is_empty());
    }
}
