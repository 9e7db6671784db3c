//! Game configuration.
//!
//! Every section has sensible defaults so an empty `{}` file (or no file at
//! all) is a valid configuration.  Values are in pixels and seconds unless
//! the field name says otherwise.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GameError, Result};
use crate::gesture::GestureBinding;
use crate::mode::ModeRules;
use crate::spawner::SpawnPolicy;
use crate::entities::EnemyKind;

/// Inclusive `min..=max` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate or inverted spans collapse to `min`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory holding `maps/`.
    pub base_path: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { base_path: PathBuf::from("assets") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub framerate: u32,
    /// World pixels covered by one terminal column.
    pub cell_width: f32,
    /// World pixels covered by one terminal row.
    pub cell_height: f32,
    /// Size of one map tile in world pixels.
    pub tile_size: f32,
    /// Glyph filling cells no sprite covers.
    pub background: char,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            framerate: 60,
            cell_width: 16.0,
            cell_height: 32.0,
            tile_size: 64.0,
            background: ' ',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub shoot_cooldown: f32,
    /// Animation frames per second while walking.
    pub animation_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 400.0,
            gravity: 3000.0,
            jump_speed: 1200.0,
            shoot_cooldown: 0.5,
            animation_speed: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub lifetime: f32,
    /// Horizontal distance from the player's center to the muzzle.
    pub muzzle_offset: f32,
    pub flash_lifetime: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 850.0,
            lifetime: 1.0,
            muzzle_offset: 34.0,
            flash_lifetime: 0.1,
        }
    }
}

/// Fields given in the file override that kind's defaults one by one, so
/// `{"flyer": {"interval": 0.2}}` only changes the flyer interval.
#[derive(Debug, Clone, Serialize)]
pub struct SpawnerConfig {
    pub flyer: SpawnPolicy,
    pub crawler: SpawnPolicy,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            flyer: SpawnPolicy {
                kind: EnemyKind::Flyer,
                enabled: true,
                interval: 0.1,
                speed: Span::new(300.0, 500.0),
                cap: Some(40),
            },
            crawler: SpawnPolicy {
                kind: EnemyKind::Crawler,
                enabled: false,
                interval: 4.0,
                speed: Span::new(160.0, 200.0),
                cap: Some(12),
            },
        }
    }
}

impl SpawnerConfig {
    pub fn policies(&self) -> Vec<SpawnPolicy> {
        vec![self.flyer.clone(), self.crawler.clone()]
    }
}

/// A partial `SpawnPolicy` as written in a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyOverride {
    enabled: Option<bool>,
    interval: Option<f32>,
    speed: Option<Span>,
    /// Present as `null` means no cap.
    #[serde(deserialize_with = "present")]
    cap: Option<Option<usize>>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Option<usize>>, D::Error> {
    Option::<usize>::deserialize(d).map(Some)
}

impl PolicyOverride {
    fn apply(self, mut policy: SpawnPolicy) -> SpawnPolicy {
        if let Some(enabled) = self.enabled {
            policy.enabled = enabled;
        }
        if let Some(interval) = self.interval {
            policy.interval = interval;
        }
        if let Some(speed) = self.speed {
            policy.speed = speed;
        }
        if let Some(cap) = self.cap {
            policy.cap = cap;
        }
        policy
    }
}

impl<'de> Deserialize<'de> for SpawnerConfig {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct Sections {
            flyer: PolicyOverride,
            crawler: PolicyOverride,
        }
        let sections = Sections::deserialize(d)?;
        let defaults = Self::default();
        Ok(Self {
            flyer: sections.flyer.apply(defaults.flyer),
            crawler: sections.crawler.apply(defaults.crawler),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Crawler patrol speed, sampled per crawler.
    pub crawler_speed: Span,
    /// Flyer sine drift amplitude.
    pub flyer_amplitude: Span,
    /// Flyer sine drift period divisor (milliseconds per radian).
    pub flyer_frequency: Span,
    pub animation_speed: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            crawler_speed: Span::new(160.0, 200.0),
            flyer_amplitude: Span::new(500.0, 600.0),
            flyer_frequency: Span::new(300.0, 600.0),
            animation_speed: 10.0,
        }
    }
}

/// Score awarded per destroyed enemy, keyed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub crawler: u32,
    pub flyer: u32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self { crawler: 10, flyer: 30 }
    }
}

impl ScoreTable {
    pub fn value(&self, kind: EnemyKind) -> u32 {
        match kind {
            EnemyKind::Crawler => self.crawler,
            EnemyKind::Flyer => self.flyer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub enabled: bool,
    /// JSON-lines file of recorded landmark frames.
    pub replay_path: Option<PathBuf>,
    /// Delay between landmark frames, in milliseconds.
    pub cadence_ms: u64,
    /// Margin a landmark comparison must clear before a held control flips.
    pub hysteresis: f32,
    pub bindings: Vec<GestureBinding>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            replay_path: None,
            cadence_ms: 33,
            hysteresis: 0.0,
            bindings: GestureBinding::default_layout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Ring the terminal bell on impacts.
    pub bell: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed RNG seed; entropy is used when absent.
    pub seed: Option<u64>,
    pub assets: AssetConfig,
    pub display: DisplayConfig,
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    pub spawner: SpawnerConfig,
    pub enemies: EnemyConfig,
    pub scores: ScoreTable,
    pub modes: ModeRules,
    pub gesture: GestureConfig,
    pub audio: AudioConfig,
}

impl GameConfig {
    /// Load from a JSON file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::info!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| GameError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}
