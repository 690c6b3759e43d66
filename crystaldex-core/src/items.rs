//! Item extraction from descriptions.asm, attributes.asm and names.asm.

use crate::config::Variant;
use crate::error::Result;
use crate::file_utils::read_source_lines;
use crate::models::{ItemAttributes, ItemData, ItemMap};
use crate::normalize::{format_item_name, normalize_id};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

lazy_static! {
    static ref DESC_LABEL_RE: Regex = Regex::new(r"^(\w+?)Desc(?:ription)?:+$").unwrap();
    static ref TEXT_RE: Regex = Regex::new(r#"^(?:text|next|line|cont|para|db)\s+"([^"]*)""#).unwrap();
    static ref CONSTANT_COMMENT_RE: Regex = Regex::new(r"^;\s*([A-Z][A-Z0-9_]*)\s*$").unwrap();
    static ref ATTRIBUTE_RE: Regex = Regex::new(r"^item_attribute\s+(.+)$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r#"^li\s+"([^"]*)""#).unwrap();
}

/// Build the item map from the three item source files.
///
/// Only the descriptions file is required to produce items; missing
/// attribute or name files leave those fields at their label-derived
/// defaults.
pub fn extract_item_data(
    descriptions: &Path,
    attributes: &Path,
    names: &Path,
    variant: Variant,
) -> Result<ItemMap> {
    info!("Extracting item descriptions from {:?}", descriptions);
    let Some(lines) = read_source_lines(descriptions, "Item descriptions", variant)? else {
        return Ok(ItemMap::new());
    };
    let mut items = parse_descriptions(&lines);

    if let Some(lines) = read_source_lines(attributes, "Item attributes", variant)? {
        let parsed = parse_attributes(&lines);
        let mut applied = 0;
        for (id, attrs) in parsed {
            match items.get_mut(&id) {
                Some(item) => {
                    item.attributes = Some(attrs);
                    applied += 1;
                }
                None => debug!("Attributes for {:?} have no matching description", id),
            }
        }
        info!("Applied attributes to {} items", applied);
    }

    if let Some(lines) = read_source_lines(names, "Item names", variant)? {
        let mut renamed = 0;
        for name in parse_names(&lines) {
            if let Some(item) = items.get_mut(&normalize_id(&name)) {
                item.name = name;
                renamed += 1;
            }
        }
        debug!("Took display names for {} items from names file", renamed);
    }

    info!("Extracted {} items", items.len());
    Ok(items)
}

/// Parse description blocks.
///
/// Labels directly following each other share the next description body.
/// A body runs until `done`, a fragment ending in `@`, or the next label.
pub fn parse_descriptions<S: AsRef<str>>(lines: &[S]) -> ItemMap {
    let mut items = ItemMap::new();
    let mut labels: Vec<String> = Vec::new();
    let mut fragments: Vec<String> = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(caps) = DESC_LABEL_RE.captures(line) {
            if !fragments.is_empty() {
                flush_descriptions(&mut items, &mut labels, &mut fragments);
            }
            labels.push(caps[1].to_string());
            continue;
        }

        if labels.is_empty() {
            continue;
        }

        if let Some(caps) = TEXT_RE.captures(line) {
            let fragment = &caps[1];
            if let Some(last) = fragment.strip_suffix('@') {
                fragments.push(last.to_string());
                flush_descriptions(&mut items, &mut labels, &mut fragments);
            } else {
                fragments.push(fragment.to_string());
            }
        } else if line == "done" || line == "text_end" {
            flush_descriptions(&mut items, &mut labels, &mut fragments);
        }
    }

    if !labels.is_empty() {
        flush_descriptions(&mut items, &mut labels, &mut fragments);
    }

    items
}

fn flush_descriptions(items: &mut ItemMap, labels: &mut Vec<String>, fragments: &mut Vec<String>) {
    let description = join_fragments(fragments);
    for label in labels.drain(..) {
        let id = normalize_id(&label);
        if id.is_empty() {
            continue;
        }
        let name = format_item_name(&label);
        items.insert(id.clone(), ItemData::new(id, name, description.clone()));
    }
    fragments.clear();
}

/// Join text fragments with single spaces. A fragment ending in `-` is a
/// word broken across lines: the hyphen is dropped and the next fragment
/// continues the word.
fn join_fragments(fragments: &[String]) -> String {
    let mut text = String::new();
    for fragment in fragments {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        if text.ends_with('-') {
            text.pop();
        } else if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(fragment);
    }
    text.replace('#', "Poké")
}

/// Parse `item_attribute` lines keyed by the `; ITEM_CONSTANT` comment above them.
pub fn parse_attributes<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, ItemAttributes> {
    let mut attributes = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in lines {
        let line = line.as_ref().trim();
        if let Some(caps) = CONSTANT_COMMENT_RE.captures(line) {
            current = Some(normalize_id(&caps[1]));
            continue;
        }
        let Some(caps) = ATTRIBUTE_RE.captures(line) else {
            continue;
        };
        let Some(id) = current.take() else {
            debug!("item_attribute without a preceding item comment: {}", line);
            continue;
        };
        match parse_attribute_fields(&caps[1]) {
            Some(attrs) => {
                attributes.insert(id, attrs);
            }
            None => warn!("Skipping malformed item_attribute for {:?}: {}", id, line),
        }
    }

    attributes
}

/// Fields: price, held effect, parameter, [property,] pocket, field menu, battle menu.
fn parse_attribute_fields(fields: &str) -> Option<ItemAttributes> {
    let fields = fields.split(';').next().unwrap_or(fields);
    let parts: Vec<&str> = fields.split(',').map(str::trim).collect();
    if parts.len() != 6 && parts.len() != 7 {
        return None;
    }

    let price = parse_number(parts[0])?;
    let pocket = parts[parts.len() - 3];
    let flags = if parts.len() == 7 {
        parts[3]
            .split('|')
            .map(str::trim)
            .filter(|flag| !flag.is_empty() && *flag != "0")
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    Some(ItemAttributes {
        price,
        effect: meaningful(parts[1], "HELD_NONE"),
        parameter: meaningful(parts[2], "0"),
        category: meaningful(pocket, "0"),
        flags,
        field_menu: meaningful(parts[parts.len() - 2], "0"),
        battle_menu: meaningful(parts[parts.len() - 1], "0"),
        is_key_item: pocket == "KEY_ITEM",
    })
}

fn meaningful(value: &str, empty: &str) -> Option<String> {
    if value.is_empty() || value == empty || value == "0" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Accepts decimal and `$`-prefixed hex numbers.
pub(crate) fn parse_number(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix('$') {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Display names from `li "..."` lines, in file order.
pub fn parse_names<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| NAME_RE.captures(line.as_ref().trim()))
        .map(|caps| caps[1].trim_end_matches('@').to_string())
        .filter(|name| !name.is_empty() && name != "?")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DESCRIPTIONS: &str = "\
ItemDescriptions:
PokeBallDesc:
\ttext \"An item for\"
\tnext \"catching #mon.\"
\tdone

FullHealDesc:
\ttext \"Eliminates all\"
\tnext \"status problems.\"
\tdone

ParlyzHealDesc:
\ttext \"Cures paralysis.\"
\tdone
";

    const ATTRIBUTES: &str = "\
; POKE_BALL
\titem_attribute 200, HELD_NONE, 0, CANT_SELECT, BALL, ITEMMENU_NOUSE, ITEMMENU_CLOSE
; FULL_HEAL
\titem_attribute 600, HELD_NONE, 0, 0, ITEM, ITEMMENU_PARTY, ITEMMENU_PARTY
; BICYCLE
\titem_attribute 0, HELD_NONE, 0, KEY_ITEM, ITEMMENU_CLOSE, ITEMMENU_NOUSE
";

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_descriptions() {
        let items = parse_descriptions(&lines(DESCRIPTIONS));
        assert_eq!(items.len(), 3);
        let ball = &items["poke"];
        assert_eq!(ball.name, "Poké Ball");
        assert_eq!(ball.description, "An item for catching Pokémon.");
        assert_eq!(items["fullheal"].description, "Eliminates all status problems.");
        assert!(items.contains_key("parlyzheal"));
    }

    #[test]
    fn test_shared_labels_get_identical_descriptions() {
        let text = "\
TownMapDesc:
PokegearDesc:
\ttext \"Shows where you\"
\tnext \"are.@\"
PotionDesc:
\ttext \"Restores HP.\"
\tdone
";
        let items = parse_descriptions(&lines(text));
        assert_eq!(items["townmap"].description, "Shows where you are.");
        assert_eq!(items["pokegear"].description, items["townmap"].description);
        assert_eq!(items["potion"].description, "Restores HP.");
    }

    #[test]
    fn test_hyphenated_line_breaks_are_joined() {
        let text = "MaxPotionDesc:\n\ttext \"Fully re-\"\n\tnext \"stores HP.\"\n\tdone\n";
        let items = parse_descriptions(&lines(text));
        assert_eq!(items["maxpotion"].description, "Fully restores HP.");

        let text = "XAttackDesc:\n\ttext \"Raises the at-\"\n\tnext \"tack stat.\"\n\tdone\n";
        let items = parse_descriptions(&lines(text));
        assert_eq!(items["xattack"].description, "Raises the attack stat.");
    }

    #[test]
    fn test_parse_attributes_six_and_seven_columns() {
        let attrs = parse_attributes(&lines(ATTRIBUTES));
        let ball = &attrs["poke"];
        assert_eq!(ball.price, 200);
        assert_eq!(ball.category.as_deref(), Some("BALL"));
        assert_eq!(ball.flags, vec!["CANT_SELECT"]);
        assert_eq!(ball.battle_menu.as_deref(), Some("ITEMMENU_CLOSE"));
        assert!(ball.effect.is_none());
        assert!(!ball.is_key_item);

        let bike = &attrs["bicycle"];
        assert!(bike.is_key_item);
        assert!(bike.flags.is_empty());
        assert_eq!(bike.field_menu.as_deref(), Some("ITEMMENU_CLOSE"));
    }

    #[test]
    fn test_extract_item_data_without_attributes_file() {
        let dir = tempfile::tempdir().unwrap();
        let descriptions = dir.path().join("descriptions.asm");
        fs::write(&descriptions, DESCRIPTIONS).unwrap();

        let items = extract_item_data(
            &descriptions,
            &dir.path().join("attributes.asm"),
            &dir.path().join("names.asm"),
            Variant::Polished,
        )
        .unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.values().all(|item| item.attributes.is_none()));
    }

    #[test]
    fn test_extract_item_data_joins_attributes_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let descriptions = dir.path().join("descriptions.asm");
        let attributes = dir.path().join("attributes.asm");
        let names = dir.path().join("names.asm");
        fs::write(&descriptions, DESCRIPTIONS).unwrap();
        fs::write(&attributes, ATTRIBUTES).unwrap();
        fs::write(&names, "ItemNames::\n\tli \"Paralyze Heal\"\n\tli \"Full Heal\"\n").unwrap();

        let items = extract_item_data(&descriptions, &attributes, &names, Variant::Polished).unwrap();
        assert_eq!(items["fullheal"].attributes.as_ref().unwrap().price, 600);
        assert_eq!(items["parlyzheal"].name, "Paralyze Heal");
        assert!(items["parlyzheal"].attributes.is_none());
    }

    #[test]
    fn test_missing_descriptions_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.asm");
        let items = extract_item_data(&missing, &missing, &missing, Variant::Polished).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("3000"), Some(3000));
        assert_eq!(parse_number("$10"), Some(16));
        assert_eq!(parse_number("LEVEL"), None);
    }
}
