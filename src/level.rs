//! Map data and where it comes from.
//!
//! A map is two tile layers written as glyph rows ("Main" is solid,
//! "Decoration" is not) plus placement records for the player and the
//! map's crawlers.  `.` and space are empty cells.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::Rect;
use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    Player,
    #[serde(alias = "worm")]
    Crawler,
}

/// One entity record from the map, in world pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: PlacementKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    /// Solid tiles.
    #[serde(default)]
    pub main: Vec<String>,
    /// Non-solid scenery.
    #[serde(default)]
    pub decoration: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Placement>,
}

pub fn is_empty_cell(ch: char) -> bool {
    ch == '.' || ch == ' '
}

impl LevelData {
    /// Width and height in tiles, taken from the larger of the two layers.
    pub fn grid_size(&self) -> (usize, usize) {
        let cols = self
            .main
            .iter()
            .chain(&self.decoration)
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(0);
        let rows = self.main.len().max(self.decoration.len());
        (cols, rows)
    }

    pub fn pixel_size(&self, tile_size: f32) -> Vec2 {
        let (cols, rows) = self.grid_size();
        Vec2::new(cols as f32 * tile_size, rows as f32 * tile_size)
    }

    /// `(column, row, glyph)` for every non-empty cell of `layer`.
    pub fn tiles(layer: &[String]) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        layer.iter().enumerate().flat_map(|(row, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, ch)| !is_empty_cell(*ch))
                .map(move |(col, ch)| (col, row, ch))
        })
    }

    pub fn tile_glyphs(&self) -> BTreeSet<char> {
        Self::tiles(&self.main)
            .chain(Self::tiles(&self.decoration))
            .map(|(_, _, ch)| ch)
            .collect()
    }

    pub fn player_spawn(&self) -> Option<&Placement> {
        self.entities.iter().find(|p| p.kind == PlacementKind::Player)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| GameError::LevelInvalid {
            map: self.name.clone(),
            reason: reason.to_string(),
        };
        let (cols, rows) = self.grid_size();
        if cols == 0 || rows == 0 {
            return Err(invalid("map has no tiles"));
        }
        match self
            .entities
            .iter()
            .filter(|p| p.kind == PlacementKind::Player)
            .count()
        {
            0 => Err(invalid("no player placement")),
            1 => Ok(()),
            _ => Err(invalid("more than one player placement")),
        }
    }
}

/// Supplies maps by name.
pub trait LevelProvider {
    fn load(&self, name: &str) -> Result<LevelData>;
}

/// Reads `<base>/maps/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonLevelProvider {
    pub base: PathBuf,
}

impl JsonLevelProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.base.join("maps").join(format!("{}.json", name))
    }
}

impl LevelProvider for JsonLevelProvider {
    fn load(&self, name: &str) -> Result<LevelData> {
        let path = self.path_for(name);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| GameError::AssetMissing(format!("{}: {}", path.display(), e)))?;
        let mut level: LevelData =
            serde_json::from_str(&text).map_err(|e| GameError::LevelInvalid {
                map: name.to_string(),
                reason: e.to_string(),
            })?;
        level.name = name.to_string();
        level.validate()?;
        log::info!("loaded map '{}' from {}", name, path.display());
        Ok(level)
    }
}

/// Maps held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLevels {
    maps: HashMap<String, LevelData>,
}

impl MemoryLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, mut level: LevelData) -> Self {
        level.name = name.to_string();
        self.maps.insert(name.to_string(), level);
        self
    }
}

impl LevelProvider for MemoryLevels {
    fn load(&self, name: &str) -> Result<LevelData> {
        let level = self
            .maps
            .get(name)
            .cloned()
            .ok_or_else(|| GameError::AssetMissing(format!("map '{}'", name)))?;
        level.validate()?;
        Ok(level)
    }
}
