//! Data models for extracted game data.
//!
//! Everything here is serialized for the site's static data files, so field
//! names are camelCase and absent optionals are omitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Item map keyed by canonical item id. Sorted so substring matching and
/// output are deterministic.
pub type ItemMap = BTreeMap<String, ItemData>;

/// Item record built from descriptions.asm and enriched by location extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `TM01`, `HM05`: set for machines only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tm_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ItemAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ItemLocation>>,
}

impl ItemData {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tm_number: None,
            move_name: None,
            attributes: None,
            locations: None,
        }
    }

    /// Append a location unless an equivalent one is already recorded.
    ///
    /// Priced entries are duplicates when area and price match; unpriced
    /// entries when area and details match. Returns whether it was added.
    pub fn add_location(&mut self, location: ItemLocation) -> bool {
        let locations = self.locations.get_or_insert_with(Vec::new);
        let duplicate = locations.iter().any(|existing| {
            existing.area == location.area
                && match location.price {
                    Some(_) => existing.price == location.price,
                    None => existing.price.is_none() && existing.details == location.details,
                }
        });
        if duplicate {
            return false;
        }
        locations.push(location);
        true
    }

    pub fn location_count(&self) -> usize {
        self.locations.as_ref().map_or(0, Vec::len)
    }
}

/// Attributes from attributes.asm `item_attribute` lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    pub price: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle_menu: Option<String>,
    pub is_key_item: bool,
}

/// Where an item can be obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLocation {
    pub area: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}

impl ItemLocation {
    pub fn new(area: impl Into<String>, details: Option<String>, price: Option<u32>) -> Self {
        Self {
            area: area.into(),
            details,
            price,
        }
    }
}

/// Map tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RivalBattle,
    CoordinateTrigger,
    Special,
    Item,
    HiddenItem,
    Gift,
    Trade,
    PhoneCall,
}

/// Event found in a map script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Canonical item id for item, hidden item and gift events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

/// Events grouped by normalized location key
pub type EventsByLocation = BTreeMap<String, Vec<LocationEvent>>;

/// One Pokémon of a trainer's party.
///
/// `species` and `moves` are lower-case with underscores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerPokemon {
    pub level: u32,
    pub species: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<String>>,
}

/// A trainer's party from parties.asm, keyed elsewhere by `CLASS_ID`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerParty {
    pub name: String,
    pub pokemon: Vec<TrainerPokemon>,
}

/// Parties keyed by `CLASS_ID`
pub type TrainerParties = BTreeMap<String, TrainerParty>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Johto,
    Kanto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymLeader {
    pub name: String,
    pub trainer_class: String,
    pub badge: String,
    pub region: Region,
    pub speciality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pokemon: Option<Vec<TrainerPokemon>>,
}

/// Trainer placed on a map with `generictrainer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTrainer {
    pub id: String,
    pub name: String,
    pub trainer_class: String,
    pub sprite_type: String,
    pub coordinates: Coordinates,
    pub pokemon: Vec<TrainerPokemon>,
}

/// In-game NPC trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcTrade {
    pub wants_pokemon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_form: Option<String>,
    pub gives_pokemon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gives_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gives_gender: Option<String>,
    pub nickname: String,
    pub trader_name: String,
}
