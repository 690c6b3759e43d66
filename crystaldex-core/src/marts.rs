//! Poké Mart inventories from marts.asm.

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
    static ref MART_LABEL_RE: Regex = Regex::new(r"^(\w*(?:Mart\w*|Souvenir|Eevee)):+$").unwrap();
    static ref ENTRY_RE: Regex = Regex::new(r"^(?:db|dbw)\s+([^;]+)").unwrap();
    static ref MART_SUFFIX_RE: Regex = Regex::new(r"Mart\d?$").unwrap();
    static ref LOWER_UPPER_RE: Regex = Regex::new(r"([a-z])([A-Z])").unwrap();
}

const SOURCE: &str = "marts";

/// Add a location for every item sold in every mart.
pub fn extract_mart_data(items: &mut ItemMap, path: &Path, variant: Variant) -> Result<MatchReport> {
    let mut report = MatchReport::new();
    let Some(lines) = read_source_lines(path, "Marts", variant)? else {
        return Ok(report);
    };

    let entries = parse_marts(&lines);
    let mut matcher = ItemMatcher::new(items);
    let mut added = 0;
    for entry in entries {
        let Some(key) = report.resolve(&mut matcher, SOURCE, &entry.item) else {
            continue;
        };
        let details = match entry.price {
            Some(price) => format!("For sale (BP: {})", price),
            None => "For sale".to_string(),
        };
        if let Some(item) = items.get_mut(&key) {
            if item.add_location(ItemLocation::new(entry.area, Some(details), entry.price)) {
                added += 1;
            }
        }
    }

    info!(
        "Added {} mart locations ({} unmatched items)",
        added,
        report.unmatched_count()
    );
    Ok(report)
}

/// One item line inside a mart block.
#[derive(Debug, Clone, PartialEq)]
pub struct MartEntry {
    pub area: String,
    pub item: String,
    pub price: Option<u32>,
}

/// Parse mart blocks into entries, skipping count lines and terminators.
pub fn parse_marts<S: AsRef<str>>(lines: &[S]) -> Vec<MartEntry> {
    let mut entries = Vec::new();
    let mut area: Option<String> = None;

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(caps) = MART_LABEL_RE.captures(line) {
            area = Some(format_mart_name(&caps[1]));
            continue;
        }
        if line.ends_with(':') {
            area = None;
            continue;
        }
        let Some(area) = area.as_ref() else {
            continue;
        };
        let Some(caps) = ENTRY_RE.captures(line) else {
            continue;
        };

        let parts: Vec<&str> = caps[1].split(',').map(str::trim).collect();
        let item = parts[0];
        if item.is_empty() || item == "-1" || parse_number(item).is_some() {
            continue;
        }
        let price = parts.get(1).and_then(|p| parse_number(p));
        if parts.len() > 1 && price.is_none() {
            debug!("Unreadable price in mart line: {}", line);
        }

        entries.push(MartEntry {
            area: area.clone(),
            item: item.to_string(),
            price,
        });
    }

    entries
}

/// Display name for a mart label.
pub fn format_mart_name(label: &str) -> String {
    let known = match label {
        "CherrygroveMart" | "CherrygroveMartAfterDex" => Some("Cherrygrove City Poké Mart"),
        "VioletMart" => Some("Violet City Poké Mart"),
        "AzaleaMart" => Some("Azalea Town Poké Mart"),
        "GoldenrodHarborMart" => Some("Goldenrod Harbor Shop"),
        "UndergroundMart" => Some("Underground Herb Shop"),
        "EcruteakMart" => Some("Ecruteak City Poké Mart"),
        "OlivineMart" => Some("Olivine City Poké Mart"),
        "CianwoodMart" => Some("Cianwood City Pharmacy"),
        "YellowForestMart" => Some("Yellow Forest Shop"),
        "MahoganyMart1" => Some("Mahogany Town Shop (Before Team Rocket)"),
        "MahoganyMart2" => Some("Mahogany Town Poké Mart"),
        "BlackthornMart" => Some("Blackthorn City Poké Mart"),
        "IndigoPlateauMart" => Some("Indigo Plateau Poké Mart"),
        "ViridianMart" => Some("Viridian City Poké Mart"),
        "PewterMart" => Some("Pewter City Poké Mart"),
        "MtMoonMart" => Some("Mt. Moon Shop"),
        "CeruleanMart" => Some("Cerulean City Poké Mart"),
        "LavenderMart" => Some("Lavender Town Poké Mart"),
        "VermilionMart" => Some("Vermilion City Poké Mart"),
        "SaffronMart" => Some("Saffron City Poké Mart"),
        "SilphCoMart" => Some("Silph Co. Shop"),
        "FuchsiaMart" => Some("Fuchsia City Poké Mart"),
        _ => None,
    };
    if let Some(name) = known {
        return name.to_string();
    }

    let prefixed = [
        ("Goldenrod2FMart", "Goldenrod Dept. Store 2F"),
        ("Goldenrod3FMart", "Goldenrod Dept. Store 3F"),
        ("Goldenrod4FMart", "Goldenrod Dept. Store 4F"),
        ("Goldenrod5FTMMart", "Goldenrod Dept. Store 5F TM Shop"),
        ("Celadon2FMart", "Celadon Dept. Store 2F"),
        ("Celadon3FTMMart", "Celadon Dept. Store 3F TM Shop"),
        ("Celadon4FMart", "Celadon Dept. Store 4F"),
        ("Celadon5FMart", "Celadon Dept. Store 5F"),
        ("ShamoutiMart", "Shamouti Island Shop"),
        ("BattleTowerMart", "Battle Tower Exchange"),
        ("BattleFactoryMart", "Battle Factory Exchange"),
    ];
    if let Some((_, name)) = prefixed.iter().find(|(prefix, _)| label.starts_with(prefix)) {
        return name.to_string();
    }

    let name = MART_SUFFIX_RE.replace(label, "");
    let name = LOWER_UPPER_RE.replace_all(&name, "${1} ${2}");
    let name = split_case_boundaries(&name);
    if let Some(base) = name.strip_suffix("Dept") {
        format!("{}Department Store", base)
    } else if let Some(base) = name.strip_suffix("Tm") {
        format!("{}TM Shop", base)
    } else if let Some(base) = name.strip_suffix("Souvenir") {
        format!("{}Souvenir Shop", base)
    } else if let Some(base) = name.strip_suffix("Eevee") {
        format!("{}(With Eevee)", base)
    } else {
        name
    }
}
