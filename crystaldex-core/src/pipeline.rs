//! Ordered extraction runs and their output files.
//!
//! Item locations accumulate across extractors, so the order matters:
//! items, then a location reset, then TM/HM machines, then marts,
//! acquisition tables and map events. Everything else is independent.

use crate::acquisition::{
    extract_bargain_shop, extract_buena_prizes, extract_fish_items, extract_maniac_items,
    extract_pickup_items, extract_rock_items, extract_rooftop_sale,
};
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::events::{attach_event_items, extract_location_events, extract_npc_trades};
use crate::file_utils::write_json;
use crate::items::extract_item_data;
use crate::marts::extract_mart_data;
use crate::matching::MatchReport;
use crate::models::{EventsByLocation, ItemMap};
use crate::report::write_match_report;
use crate::tmhm::extract_tm_hm_items;
use crate::trainers::{extract_trainer_parties, find_gym_leaders, find_location_trainers, gym_leader_parties};
use std::path::Path;
use tracing::info;

pub const ITEMS_FILE: &str = "items_data.json";
pub const TRAINER_PARTIES_FILE: &str = "trainer_parties.json";
pub const GYM_LEADERS_FILE: &str = "gym_leaders.json";
pub const LOCATION_TRAINERS_FILE: &str = "location_trainers.json";
pub const EVENTS_FILE: &str = "events.json";
pub const NPC_TRADES_FILE: &str = "npc_trades.json";
pub const MATCH_REPORT_FILE: &str = "match_report.csv";
pub const MATCH_SUMMARY_FILE: &str = "match_summary.csv";

/// Which location sources to run after the items are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationSources {
    pub marts: bool,
    pub acquisitions: bool,
    pub events: bool,
}

impl LocationSources {
    pub const NONE: Self = Self {
        marts: false,
        acquisitions: false,
        events: false,
    };
    pub const ALL: Self = Self {
        marts: true,
        acquisitions: true,
        events: true,
    };
}

/// Counts from a run, for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub items: usize,
    pub item_locations: usize,
    pub trainer_parties: usize,
    pub gym_leaders: usize,
    pub location_trainers: usize,
    pub event_locations: usize,
    pub npc_trades: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Build the item map and attach locations from the selected sources.
///
/// Locations are cleared after the items are built, so rerunning never
/// stacks entries from a previous pass. Machines are always added, along
/// with the location hint from their source comment, since location
/// sources name them by constant.
pub fn build_items(config: &ExtractConfig, sources: LocationSources) -> Result<(ItemMap, MatchReport)> {
    let paths = &config.paths;
    let variant = config.variant;
    let mut items = extract_item_data(
        &config.source(&paths.descriptions),
        &config.source(&paths.attributes),
        &config.source(&paths.names),
        variant,
    )?;
    for item in items.values_mut() {
        item.locations = None;
    }
    extract_tm_hm_items(&mut items, &config.source(&paths.tmhm), variant)?;

    let mut report = MatchReport::new();
    if sources.marts {
        report.merge(extract_mart_data(&mut items, &config.source(&paths.marts), variant)?);
    }
    if sources.acquisitions {
        report.merge(extract_pickup_items(&mut items, &config.source(&paths.pickup), variant)?);
        report.merge(extract_rock_items(&mut items, &config.source(&paths.rock), variant)?);
        report.merge(extract_fish_items(&mut items, &config.source(&paths.fish), variant)?);
        report.merge(extract_rooftop_sale(&mut items, &config.source(&paths.rooftop), variant)?);
        report.merge(extract_maniac_items(&mut items, &config.source(&paths.maniac), variant)?);
        report.merge(extract_bargain_shop(&mut items, &config.source(&paths.bargain), variant)?);
        report.merge(extract_buena_prizes(&mut items, &config.source(&paths.buena), variant)?);
    }
    if sources.events {
        let events = extract_location_events(&config.source(&paths.maps), variant)?;
        report.merge(attach_event_items(&mut items, &events));
    }

    Ok((items, report))
}

/// Build items with the selected location sources and write the item file
/// and match report.
pub fn run_items(config: &ExtractConfig, sources: LocationSources, summary: &mut RunSummary) -> Result<()> {
    let (items, report) = build_items(config, sources)?;
    write_json(&config.output(ITEMS_FILE), &items)?;
    if sources != LocationSources::NONE {
        write_match_report(
            &report,
            &config.output(MATCH_REPORT_FILE),
            &config.output(MATCH_SUMMARY_FILE),
        )?;
    }

    summary.items = items.len();
    summary.item_locations = items.values().map(|item| item.location_count()).sum();
    summary.matched = report.matched_count();
    summary.unmatched = report.unmatched_count();
    Ok(())
}

/// Write trainer parties and generic trainers by location.
pub fn run_trainers(config: &ExtractConfig, summary: &mut RunSummary) -> Result<()> {
    let parties = extract_trainer_parties(&config.source(&config.paths.parties), config.variant)?;
    write_json(&config.output(TRAINER_PARTIES_FILE), &parties)?;
    let trainers = find_location_trainers(&parties, &config.source(&config.paths.maps), config.variant)?;
    write_json(&config.output(LOCATION_TRAINERS_FILE), &trainers)?;

    summary.trainer_parties = parties.len();
    summary.location_trainers = trainers.values().map(Vec::len).sum();
    Ok(())
}

/// Write gym leaders by gym location.
pub fn run_gym_leaders(config: &ExtractConfig, summary: &mut RunSummary) -> Result<()> {
    let parties = extract_trainer_parties(&config.source(&config.paths.parties), config.variant)?;
    let leaders = find_gym_leaders(
        &gym_leader_parties(&parties),
        &config.source(&config.paths.maps),
        config.variant,
    )?;
    write_json(&config.output(GYM_LEADERS_FILE), &leaders)?;

    summary.gym_leaders = leaders.len();
    Ok(())
}

/// Write map events by location.
pub fn run_events(config: &ExtractConfig, summary: &mut RunSummary) -> Result<EventsByLocation> {
    let events = extract_location_events(&config.source(&config.paths.maps), config.variant)?;
    write_json(&config.output(EVENTS_FILE), &events)?;

    summary.event_locations = events.len();
    Ok(events)
}

/// Write NPC trades by location.
pub fn run_trades(config: &ExtractConfig, summary: &mut RunSummary) -> Result<()> {
    let trades = extract_npc_trades(&config.source(&config.paths.npc_trades), config.variant)?;
    write_json(&config.output(NPC_TRADES_FILE), &trades)?;

    summary.npc_trades = trades.values().map(Vec::len).sum();
    Ok(())
}

/// Run every extractor and write every output file.
pub fn run_all(config: &ExtractConfig) -> Result<RunSummary> {
    info!(
        "Extracting everything from {:?} into {:?} ({:?})",
        config.source_root, config.output_dir, config.variant
    );
    ensure_output_dir(&config.output_dir)?;

    let mut summary = RunSummary::default();
    run_items(config, LocationSources::ALL, &mut summary)?;
    run_trainers(config, &mut summary)?;
    run_gym_leaders(config, &mut summary)?;
    run_events(config, &mut summary)?;
    run_trades(config, &mut summary)?;

    info!("Extraction finished: {:?}", summary);
    Ok(summary)
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, ExtractConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("rom");
        write(
            &root,
            "data/items/descriptions.asm",
            "PotionDesc:\n\ttext \"Restores HP.\"\n\tdone\n",
        );
        write(&root, "data/moves/tmhm_moves.asm", "TMHMMoves:\n\tdb FLAMETHROWER ; TM35\n");
        write(
            &root,
            "data/items/marts.asm",
            "CherrygroveMart:\n\tdb 2\n\tdb POTION\n\tdbw TM_FLAMETHROWER, 3000\n\tdb -1\n",
        );
        write(&root, "data/items/pickup_items.asm", "BasePickupTable:\n\tdb POTION\n\tdb -1\n");
        write(
            &root,
            "data/trainers/parties.asm",
            "def_trainer_class FALKNER\ndef_trainer 1, \"Falkner\"\ntr_mon 25, FALKNER_1 @ SHARPBEAK\nend_trainer\n",
        );
        write(
            &root,
            "maps/VioletGym.asm",
            "\tobject_event 5, 1, SPRITE_FALKNER, 0\nScript:\n\tloadtrainer FALKNER, 1\n\titemball_event 2, 3, POTION, 1, EVENT_X\n",
        );
        write(
            &root,
            "data/events/npc_trades.asm",
            "; NPC_TRADE_MIKE in Goldenrod City\n\tdp ABRA, NO_FORM ; wants\n\tdp MACHOP, FEMALE ; gives\n\trawchar \"Muscle@\"\n\trawchar \"Mike@\", $00\n",
        );

        let config = ExtractConfig {
            source_root: root,
            output_dir: dir.path().join("output"),
            ..Default::default()
        };
        (dir, config)
    }

    fn read_json(path: PathBuf) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_run_all_writes_every_output() {
        let (_dir, config) = fixture();
        let summary = run_all(&config).unwrap();
        assert_eq!(summary.items, 2);
        assert_eq!(summary.gym_leaders, 1);
        assert_eq!(summary.npc_trades, 1);
        assert_eq!(summary.unmatched, 0);

        let items = read_json(config.output(ITEMS_FILE));
        let potion = items["potion"]["locations"].as_array().unwrap();
        let areas: Vec<&str> = potion.iter().map(|l| l["area"].as_str().unwrap()).collect();
        assert_eq!(areas, vec!["Cherrygrove City Poké Mart", "Pickup", "Violet Gym"]);
        assert_eq!(items["tmflamethrower"]["name"], "TM35 Flamethrower");
        assert_eq!(items["tmflamethrower"]["locations"][0]["price"], 3000);

        let leaders = read_json(config.output(GYM_LEADERS_FILE));
        assert_eq!(leaders["violet_gym"]["badge"], "ZEPHYRBADGE");
        assert_eq!(leaders["violet_gym"]["pokemon"][0]["item"], "sharpbeak");

        let trades = read_json(config.output(NPC_TRADES_FILE));
        assert_eq!(trades["goldenrod_city"][0]["traderName"], "Mike");

        for file in [TRAINER_PARTIES_FILE, LOCATION_TRAINERS_FILE, EVENTS_FILE, MATCH_REPORT_FILE, MATCH_SUMMARY_FILE] {
            assert!(config.output(file).exists(), "{} missing", file);
        }
    }

    #[test]
    fn test_rerun_does_not_stack_locations() {
        let (_dir, config) = fixture();
        run_all(&config).unwrap();
        let first = fs::read_to_string(config.output(ITEMS_FILE)).unwrap();
        run_all(&config).unwrap();
        let second = fs::read_to_string(config.output(ITEMS_FILE)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_items_only_has_no_locations() {
        let (_dir, config) = fixture();
        let (items, report) = build_items(&config, LocationSources::NONE).unwrap();
        assert!(items.values().all(|item| item.locations.is_none()));
        assert!(report.is_empty());
    }

    #[test]
    fn test_empty_source_tree_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractConfig {
            source_root: dir.path().join("missing"),
            output_dir: dir.path().join("output"),
            ..Default::default()
        };
        let summary = run_all(&config).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(fs::read_to_string(config.output(ITEMS_FILE)).unwrap(), "{}");
    }
}
