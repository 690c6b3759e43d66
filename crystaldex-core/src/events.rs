//! Map script events and in-game NPC trades.

use crate::config::Variant;
use crate::error::Result;
use crate::file_utils::{read_source_lines, scan_map_files};
use crate::matching::{ItemMatcher, MatchReport};
use crate::models::{Coordinates, EventType, EventsByLocation, ItemLocation, ItemMap, LocationEvent, NpcTrade};
use crate::normalize::{
    canonical_species, format_item_name, location_key_display, normalize_id, normalize_location_key,
    split_case_boundaries, title_case,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

lazy_static! {
    static ref COORD_EVENT_RE: Regex =
        Regex::new(r"^coord_event\s+(\d+)\s*,\s*(\d+)\s*,\s*[^,]+,\s*(\w+)").unwrap();
    static ref RIVAL_RE: Regex = Regex::new(r"^loadtrainer\s+(RIVAL\w*)\s*,\s*(\w+)").unwrap();
    static ref ITEMBALL_RE: Regex =
        Regex::new(r"^itemball_event\s+(\d+)\s*,\s*(\d+)\s*,\s*([A-Z0-9_]+)").unwrap();
    static ref HIDDEN_ITEM_RE: Regex =
        Regex::new(r"^bg_event\s+(\d+)\s*,\s*(\d+)\s*,\s*BGEVENT_ITEM(?:\s*\+\s*([A-Z0-9_]+))?").unwrap();
    static ref GIFT_RE: Regex = Regex::new(r"^verbosegiveitem\s+([A-Z0-9_]+)").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^addcellnum\s+PHONE_([A-Z0-9_]+)").unwrap();
    static ref TRADE_RE: Regex = Regex::new(r"^trade\s+NPC_TRADE_([A-Z0-9_]+)").unwrap();

    static ref TRADE_LOCATION_RE: Regex = Regex::new(r"(?i)^;\s*NPC_TRADE_\w+\s+in\s+(.+)$").unwrap();
    static ref WANTS_RE: Regex = Regex::new(r"^dp\s+(\w+)\s*,\s*([\w|\s]+?)\s*;\s*wants").unwrap();
    static ref GIVES_RE: Regex = Regex::new(r"^dp\s+(\w+)\s*,\s*([\w|\s]+?)\s*;\s*gives").unwrap();
    static ref TRADER_RE: Regex = Regex::new(r#"^rawchar\s+"([^"@]+)@*"\s*,\s*\$00"#).unwrap();
    static ref NICKNAME_RE: Regex = Regex::new(r#"^rawchar\s+"([^"@]+)@*""#).unwrap();
}

/// Events from every map file, grouped by normalized location key.
pub fn extract_location_events(maps_dir: &Path, variant: Variant) -> Result<EventsByLocation> {
    let found = scan_map_files(
        maps_dir,
        variant,
        |_| true,
        |_, lines| {
            let events = scan_map_events(lines);
            (!events.is_empty()).then_some(events)
        },
    )?;

    let mut by_location = EventsByLocation::new();
    for (stem, events) in found {
        let location = by_location.entry(normalize_location_key(&stem)).or_default();
        for event in events {
            if !location.contains(&event) {
                location.push(event);
            }
        }
    }

    let total: usize = by_location.values().map(Vec::len).sum();
    info!("Found {} events across {} locations", total, by_location.len());
    Ok(by_location)
}

/// Events in one map file, duplicates collapsed, in file order.
pub fn scan_map_events<S: AsRef<str>>(lines: &[S]) -> Vec<LocationEvent> {
    let mut events: Vec<LocationEvent> = Vec::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.starts_with(';') {
            continue;
        }
        // A Celebi trigger is both a coordinate trigger and the special encounter.
        let celebi = line.contains("CelebiTrigger").then(celebi_event);
        for event in parse_event_line(line).into_iter().chain(celebi) {
            if !events.contains(&event) {
                events.push(event);
            }
        }
    }
    events
}

fn celebi_event() -> LocationEvent {
    LocationEvent {
        details: Some("Time travel encounter with Celebi".into()),
        ..event(EventType::Special, "Celebi Event")
    }
}

fn event(event_type: EventType, description: impl Into<String>) -> LocationEvent {
    LocationEvent {
        event_type,
        description: description.into(),
        coordinates: None,
        details: None,
        item: None,
    }
}

fn coordinates(x: &str, y: &str) -> Option<Coordinates> {
    Some(Coordinates {
        x: x.parse().ok()?,
        y: y.parse().ok()?,
    })
}

fn parse_event_line(line: &str) -> Option<LocationEvent> {
    if let Some(caps) = COORD_EVENT_RE.captures(line) {
        let script = &caps[3];
        if !script.contains("Battle") && !script.contains("Trigger") {
            return None;
        }
        return Some(LocationEvent {
            coordinates: coordinates(&caps[1], &caps[2]),
            ..event(EventType::CoordinateTrigger, split_case_boundaries(script))
        });
    }

    if let Some(caps) = RIVAL_RE.captures(line) {
        return Some(LocationEvent {
            details: Some(format!("{}_{}", &caps[1], &caps[2])),
            ..event(EventType::RivalBattle, "Rival Battle")
        });
    }

    if let Some(caps) = ITEMBALL_RE.captures(line) {
        return Some(LocationEvent {
            coordinates: coordinates(&caps[1], &caps[2]),
            item: Some(normalize_id(&caps[3])),
            ..event(EventType::Item, format_item_name(&caps[3]))
        });
    }

    if let Some(caps) = HIDDEN_ITEM_RE.captures(line) {
        let constant = caps.get(3).map(|m| m.as_str());
        return Some(LocationEvent {
            coordinates: coordinates(&caps[1], &caps[2]),
            item: constant.map(normalize_id),
            ..event(
                EventType::HiddenItem,
                constant.map_or_else(|| "Hidden item".to_string(), format_item_name),
            )
        });
    }

    if let Some(caps) = GIFT_RE.captures(line) {
        return Some(LocationEvent {
            item: Some(normalize_id(&caps[1])),
            ..event(EventType::Gift, format_item_name(&caps[1]))
        });
    }

    if let Some(caps) = PHONE_RE.captures(line) {
        return Some(LocationEvent {
            details: Some(format!("PHONE_{}", &caps[1])),
            ..event(EventType::PhoneCall, title_case(&caps[1].replace('_', " ")))
        });
    }

    if let Some(caps) = TRADE_RE.captures(line) {
        return Some(LocationEvent {
            details: Some(format!("NPC_TRADE_{}", &caps[1])),
            ..event(EventType::Trade, format!("Trade with {}", title_case(&caps[1].replace('_', " "))))
        });
    }

    None
}

const EVENT_SOURCE: &str = "events";

/// Add item-ball, hidden item and gift events to the item map as locations.
pub fn attach_event_items(items: &mut ItemMap, events: &EventsByLocation) -> MatchReport {
    let mut report = MatchReport::new();
    let mut matcher = ItemMatcher::new(items);
    let mut added = 0;

    for (location, location_events) in events {
        let area = location_key_display(location);
        for event in location_events {
            let details = match event.event_type {
                EventType::Item => "Item ball",
                EventType::HiddenItem => "Hidden item",
                EventType::Gift => "Gift",
                _ => continue,
            };
            let Some(token) = event.item.as_deref() else {
                continue;
            };
            let Some(key) = report.resolve(&mut matcher, EVENT_SOURCE, token) else {
                continue;
            };
            if let Some(item) = items.get_mut(&key) {
                if item.add_location(ItemLocation::new(area.clone(), Some(details.to_string()), None)) {
                    added += 1;
                }
            }
        }
    }

    info!("Added {} item locations from map events", added);
    report
}

/// NPC trades grouped by normalized location key.
pub fn extract_npc_trades(path: &Path, variant: Variant) -> Result<BTreeMap<String, Vec<NpcTrade>>> {
    let Some(lines) = read_source_lines(path, "NPC trades", variant)? else {
        return Ok(BTreeMap::new());
    };
    let trades = parse_npc_trades(&lines);
    let total: usize = trades.values().map(Vec::len).sum();
    info!("Found {} NPC trades across {} locations", total, trades.len());
    Ok(trades)
}

#[derive(Default)]
struct PendingTrade {
    wants_pokemon: Option<String>,
    wants_form: Option<String>,
    gives_pokemon: Option<String>,
    gives_form: Option<String>,
    gives_gender: Option<String>,
    nickname: Option<String>,
}

/// Forward scan over npc_trades.asm.
///
/// A `; NPC_TRADE_X in <Location>` comment starts a record, `dp` lines
/// tagged `; wants` / `; gives` fill in the species, the first bare
/// `rawchar` is the nickname and a `rawchar "…", $00` line names the trader
/// and closes the record. Records closed without a location or either
/// species are dropped without a warning; the file has no other way to mark
/// unused trade slots.
pub fn parse_npc_trades<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, Vec<NpcTrade>> {
    let mut trades: BTreeMap<String, Vec<NpcTrade>> = BTreeMap::new();
    let mut location: Option<String> = None;
    let mut pending = PendingTrade::default();

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(caps) = TRADE_LOCATION_RE.captures(line) {
            location = Some(normalize_location_key(caps[1].trim()));
            pending = PendingTrade::default();
        } else if let Some(caps) = WANTS_RE.captures(line) {
            pending.wants_pokemon = Some(canonical_species(&caps[1]));
            pending.wants_form = trade_modifiers(&caps[2]).1;
        } else if let Some(caps) = GIVES_RE.captures(line) {
            pending.gives_pokemon = Some(canonical_species(&caps[1]));
            let (gender, form) = trade_modifiers(&caps[2]);
            pending.gives_gender = gender;
            pending.gives_form = form;
        } else if let Some(caps) = TRADER_RE.captures(line) {
            let record = std::mem::take(&mut pending);
            match (&location, record.wants_pokemon, record.gives_pokemon) {
                (Some(location), Some(wants_pokemon), Some(gives_pokemon)) => {
                    trades.entry(location.clone()).or_default().push(NpcTrade {
                        wants_pokemon,
                        wants_form: record.wants_form,
                        gives_pokemon,
                        gives_form: record.gives_form,
                        gives_gender: record.gives_gender,
                        nickname: record.nickname.unwrap_or_default(),
                        trader_name: caps[1].to_string(),
                    });
                }
                _ => debug!("Dropping incomplete NPC trade closed by {}", line),
            }
        } else if let Some(caps) = NICKNAME_RE.captures(line) {
            if pending.nickname.is_none() {
                pending.nickname = Some(caps[1].to_string());
            }
        }
    }

    trades
}

/// Split a `dp` modifier such as `FEMALE | ALOLAN_FORM` into gender and form.
fn trade_modifiers(raw: &str) -> (Option<String>, Option<String>) {
    let mut gender = None;
    let mut form = None;
    for token in raw.split('|').map(str::trim) {
        match token {
            "" | "0" | "NO_FORM" | "PLAIN_FORM" => {}
            "MALE" | "FEMALE" => gender = Some(token.to_lowercase()),
            other => form = Some(other.to_lowercase()),
        }
    }
    (gender, form)
}
