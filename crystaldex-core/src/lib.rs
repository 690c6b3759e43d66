//! Core library for extracting Polished Crystal disassembly data into JSON.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod events;
pub mod file_utils;
pub mod items;
pub mod marts;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod tmhm;
pub mod trainers;

pub use config::{ExtractConfig, Variant};
pub use error::{CrystaldexError, Result};
pub use normalize::{normalize_id, normalize_location_key};
pub use pipeline::{LocationSources, RunSummary, run_all};
