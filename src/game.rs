//! One loaded level and its per-frame loop.
//!
//! A frame runs in a fixed order: spawner timers, the player, every other
//! entity, deferred effects, then collision.  Drawing happens afterwards,
//! from the caller, as a read-only pass over the world.

use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::Clip;
use crate::collision::{self, CollisionReport};
use crate::compute::{self, crawler_spec, player_spec, tile_spec, Effect, PlayerAnchor, UpdateCtx};
use crate::config::GameConfig;
use crate::entities::{EntityId, EntityKind, Group, Rect, World};
use crate::error::{GameError, Result};
use crate::input::{ControlEvent, ControlSet};
use crate::level::{LevelData, PlacementKind};
use crate::mode::ModeSession;
use crate::spawner::{SpawnArea, Spawner};
use crate::sprites::SpriteBank;

/// Where a control edge came from.  Each source keeps its own held set so
/// a keyboard release cannot cancel a gesture that is still held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Gesture,
}

/// What happened during one simulated frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub spawned: Vec<EntityId>,
    pub sounds: Vec<Clip>,
    pub collisions: CollisionReport,
}

pub struct Game {
    world: World,
    player: Option<EntityId>,
    spawner: Spawner,
    solids: Vec<Rect>,
    level_size: Vec2,
    viewport: Vec2,
    map: String,
    /// Seconds since the current map was loaded.
    time: f32,
    keyboard: ControlSet,
    gesture: ControlSet,
    rng: StdRng,
    sprites: Arc<SpriteBank>,
    config: Arc<GameConfig>,
}

impl Game {
    /// Build the world for `level`.  Every tile glyph must already be in
    /// `sprites`.
    pub fn new(
        level: &LevelData,
        sprites: Arc<SpriteBank>,
        config: Arc<GameConfig>,
        viewport: Vec2,
        seed: u64,
    ) -> Result<Self> {
        let mut game = Self {
            world: World::new(),
            player: None,
            spawner: Spawner::new(config.spawner.policies()),
            solids: Vec::new(),
            level_size: Vec2::ZERO,
            viewport,
            map: String::new(),
            time: 0.0,
            keyboard: ControlSet::default(),
            gesture: ControlSet::default(),
            rng: StdRng::seed_from_u64(seed),
            sprites,
            config,
        };
        game.load_level(level)?;
        Ok(game)
    }

    /// Drop every entity and rebuild from `level`.  The spawner restarts and
    /// the level clock goes back to zero.  Held controls carry over.
    pub fn load_level(&mut self, level: &LevelData) -> Result<()> {
        level.validate()?;
        self.world.clear();
        self.solids.clear();
        self.player = None;
        self.time = 0.0;

        let tile = self.config.display.tile_size;
        self.level_size = level.pixel_size(tile);

        for (layer, solid) in [(&level.main, true), (&level.decoration, false)] {
            for (col, row, ch) in LevelData::tiles(layer) {
                let sheet = self
                    .sprites
                    .tile(ch)
                    .ok_or_else(|| GameError::AssetMissing(format!("tile '{}' in map '{}'", ch, level.name)))?;
                let pos = Vec2::new(col as f32 * tile, row as f32 * tile);
                let id = self.world.spawn(tile_spec(pos, sheet, solid));
                if solid {
                    if let Some(e) = self.world.get(id) {
                        self.solids.push(e.rect());
                    }
                }
            }
        }

        for placement in &level.entities {
            match placement.kind {
                PlacementKind::Player => {
                    let pos = Vec2::new(placement.x, placement.y);
                    let id = self
                        .world
                        .spawn(player_spec(pos, &self.sprites, &self.config.player));
                    self.player = Some(id);
                }
                PlacementKind::Crawler => {
                    let speed = self.config.enemies.crawler_speed.sample(&mut self.rng);
                    self.world
                        .spawn(crawler_spec(placement.rect(), speed, &self.sprites));
                }
            }
        }

        self.spawner.restart();
        self.map = level.name.clone();
        self.sync_controls();
        log::info!(
            "loaded map '{}': {} entities, {} solid tiles, {}x{} px",
            self.map,
            self.world.len(),
            self.solids.len(),
            self.level_size.x,
            self.level_size.y
        );
        Ok(())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn level_size(&self) -> Vec2 {
        self.level_size
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Point the camera tracks: the player's center, or the middle of the
    /// level when there is no player.
    pub fn focus(&self) -> Vec2 {
        self.player
            .and_then(|id| self.world.get(id))
            .map(|p| p.center())
            .unwrap_or(self.level_size / 2.0)
    }

    /// Controls currently held by either source.
    pub fn held(&self) -> ControlSet {
        self.keyboard.union(&self.gesture)
    }

    pub fn apply_control(&mut self, source: InputSource, event: ControlEvent) {
        match source {
            InputSource::Keyboard => self.keyboard.apply(event),
            InputSource::Gesture => self.gesture.apply(event),
        }
        self.sync_controls();
    }

    fn sync_controls(&mut self) {
        let held = self.held();
        if let Some(EntityKind::Player(p)) = self
            .player
            .and_then(|id| self.world.get_mut(id))
            .map(|e| &mut e.kind)
        {
            p.controls = held;
        }
    }

    /// Simulate one frame and score it into `session`.
    pub fn frame(&mut self, dt: f32, session: &mut ModeSession) -> FrameReport {
        let mut report = FrameReport::default();

        // 1. Spawn
        let area = SpawnArea {
            level_size: self.level_size,
            viewport: self.viewport,
            solids: &self.solids,
        };
        report.spawned = self.spawner.tick(
            dt,
            &mut self.world,
            area,
            &self.sprites,
            &self.config.enemies,
            &mut self.rng,
        );

        // 2. Update: the player first so followers see where it ended up
        let mut effects: Vec<(EntityId, Effect)> = Vec::new();
        let mut ctx = UpdateCtx {
            dt,
            time: self.time,
            level_size: self.level_size,
            solids: &self.solids,
            player: anchor_of(&self.world, self.player),
            player_cfg: &self.config.player,
            projectile_cfg: &self.config.projectile,
            enemy_cfg: &self.config.enemies,
            sprites: &self.sprites,
        };
        if let Some(id) = self.player {
            update_one(&mut self.world, id, &ctx, &mut effects);
        }
        ctx.player = anchor_of(&self.world, self.player);
        for id in self.world.ids(Group::All) {
            if Some(id) != self.player {
                update_one(&mut self.world, id, &ctx, &mut effects);
            }
        }

        for (owner, effect) in effects {
            match effect {
                Effect::DestroySelf => {
                    self.world.destroy(owner);
                }
                Effect::Spawn(spec) => {
                    self.world.spawn(spec);
                }
                Effect::Sound(clip) => report.sounds.push(clip),
            }
        }

        // 3. Collide
        report.collisions = collision::resolve(&mut self.world, session, &self.config.scores);
        if !report.collisions.hits.is_empty() {
            report.sounds.push(Clip::Impact);
        }

        self.time += dt;
        report
    }
}

fn anchor_of(world: &World, player: Option<EntityId>) -> Option<PlayerAnchor> {
    let id = player?;
    let entity = world.get(id)?;
    match &entity.kind {
        EntityKind::Player(p) => Some(PlayerAnchor {
            id,
            center: entity.center(),
            facing: p.facing,
        }),
        _ => None,
    }
}

fn update_one(world: &mut World, id: EntityId, ctx: &UpdateCtx, effects: &mut Vec<(EntityId, Effect)>) {
    let Some(entity) = world.get_mut(id) else {
        return;
    };
    let mut out = Vec::new();
    compute::update_entity(&mut entity.pos, &mut entity.frame, &mut entity.kind, ctx, &mut out);
    effects.extend(out.into_iter().map(|e| (id, e)));
}
