//! Extraction configuration.
//!
//! Supports TOML configuration files like:
//! ```toml
//! source_root = "polishedcrystal"
//! output_dir = "output"
//! variant = "faithful"
//!
//! [paths]
//! marts = "data/items/marts.asm"
//! maps = "maps"
//! ```
//!
//! Every key is optional; unspecified keys fall back to the disassembly's
//! standard layout.

use crate::error::{CrystaldexError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which side of `if DEF(FAITHFUL)` blocks to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Polished,
    Faithful,
}

/// Source file locations, relative to `source_root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub descriptions: PathBuf,
    pub attributes: PathBuf,
    pub names: PathBuf,
    pub tmhm: PathBuf,
    pub marts: PathBuf,
    pub pickup: PathBuf,
    pub rock: PathBuf,
    pub fish: PathBuf,
    pub rooftop: PathBuf,
    pub maniac: PathBuf,
    pub bargain: PathBuf,
    pub buena: PathBuf,
    pub parties: PathBuf,
    pub npc_trades: PathBuf,
    pub maps: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            descriptions: PathBuf::from("data/items/descriptions.asm"),
            attributes: PathBuf::from("data/items/attributes.asm"),
            names: PathBuf::from("data/items/names.asm"),
            tmhm: PathBuf::from("data/moves/tmhm_moves.asm"),
            marts: PathBuf::from("data/items/marts.asm"),
            pickup: PathBuf::from("data/items/pickup_items.asm"),
            rock: PathBuf::from("data/items/rock_items.asm"),
            fish: PathBuf::from("data/items/fish_items.asm"),
            rooftop: PathBuf::from("data/items/rooftop_sale.asm"),
            maniac: PathBuf::from("data/items/maniac_items.asm"),
            bargain: PathBuf::from("data/items/bargain_shop.asm"),
            buena: PathBuf::from("data/items/buena_prizes.asm"),
            parties: PathBuf::from("data/trainers/parties.asm"),
            npc_trades: PathBuf::from("data/events/npc_trades.asm"),
            maps: PathBuf::from("maps"),
        }
    }
}

/// Complete extraction configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub variant: Variant,
    pub paths: SourcePaths,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("polishedcrystal"),
            output_dir: PathBuf::from("output"),
            variant: Variant::default(),
            paths: SourcePaths::default(),
        }
    }
}

impl ExtractConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrystaldexError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CrystaldexError::Config(format!("Failed to parse config TOML: {}", e)))
    }

    /// Resolve a configured relative path against the source root.
    pub fn source(&self, relative: &Path) -> PathBuf {
        self.source_root.join(relative)
    }

    /// Path of an output file.
    pub fn output(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ExtractConfig::from_str("").unwrap();
        assert_eq!(config.source_root, PathBuf::from("polishedcrystal"));
        assert_eq!(config.variant, Variant::Polished);
        assert_eq!(
            config.source(&config.paths.marts),
            PathBuf::from("polishedcrystal/data/items/marts.asm")
        );
    }

    #[test]
    fn test_partial_paths_override() {
        let toml = r#"
source_root = "rom"
variant = "faithful"

[paths]
marts = "custom/marts.asm"
"#;
        let config = ExtractConfig::from_str(toml).unwrap();
        assert_eq!(config.variant, Variant::Faithful);
        assert_eq!(config.source(&config.paths.marts), PathBuf::from("rom/custom/marts.asm"));
        assert_eq!(config.paths.parties, PathBuf::from("data/trainers/parties.asm"));
    }

    #[test]
    fn test_invalid_variant_is_config_error() {
        let result = ExtractConfig::from_str("variant = \"gold\"");
        assert!(matches!(result, Err(CrystaldexError::Config(_))));
    }
}
