//! Timed enemy spawning.
//!
//! One repeating `Timer` per enabled enemy kind.  A flyer starts just past
//! the right edge of the level plus one viewport, so it scrolls into view,
//! at a random height.  A crawler is dropped onto the walkable surface of a
//! solid tile in the last viewport of the level and patrols the ledge it
//! lands on.  Speeds are random per spawn.  A live cap per kind keeps the
//! population bounded; a capped fire is skipped and the timer keeps running.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::compute::{crawler_spec, flyer_spec};
use crate::config::{EnemyConfig, Span};
use crate::entities::{EnemyKind, EntityId, Rect, World};
use crate::sprites::SpriteBank;
use crate::timer::Timer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnPolicy {
    pub kind: EnemyKind,
    pub enabled: bool,
    /// Seconds between spawns.
    pub interval: f32,
    pub speed: Span,
    /// Maximum live enemies of this kind; `None` for no limit.
    pub cap: Option<usize>,
}

/// Level geometry the spawner needs to place enemies.
#[derive(Debug, Clone, Copy)]
pub struct SpawnArea<'a> {
    pub level_size: Vec2,
    pub viewport: Vec2,
    /// Solid tiles, for placing ground enemies.
    pub solids: &'a [Rect],
}

impl SpawnArea<'_> {
    /// Flyer entry column.
    pub fn spawn_x(&self) -> f32 {
        self.level_size.x + self.viewport.x
    }

    /// The last viewport-wide strip of the level, `(left, right)`.
    pub fn ground_strip(&self) -> (f32, f32) {
        let right = self.level_size.x.max(0.0);
        ((right - self.viewport.x).max(0.0), right)
    }

    /// No solid sits directly on top of `tile`.
    fn is_open(&self, tile: &Rect) -> bool {
        !self
            .solids
            .iter()
            .any(|above| above.bottom() == tile.top() && above.left() == tile.left())
    }

    /// Open tiles overlapping the ground strip.
    fn surfaces(&self) -> Vec<Rect> {
        let (left, right) = self.ground_strip();
        self.solids
            .iter()
            .filter(|s| s.right() > left && s.left() < right && self.is_open(s))
            .copied()
            .collect()
    }

    /// Extend `tile` sideways across adjacent open solids sharing its top.
    fn ledge(&self, tile: Rect) -> Rect {
        let next = |edge: f32, leftwards: bool| {
            self.solids.iter().find(|s| {
                let touches = if leftwards { s.right() == edge } else { s.left() == edge };
                touches && s.top() == tile.top() && self.is_open(s)
            })
        };
        let mut left = tile.left();
        while let Some(s) = next(left, true) {
            left = s.left();
        }
        let mut right = tile.right();
        while let Some(s) = next(right, false) {
            right = s.right();
        }
        Rect::new(left, tile.top(), right - left, tile.h)
    }

    /// Patrol rectangle for a crawler of `height`: resting on a random
    /// ledge in the ground strip, or on a random row of the strip when it
    /// holds no solid tiles.
    pub fn crawler_bounds(&self, height: f32, rng: &mut impl Rng) -> Rect {
        let surfaces = self.surfaces();
        if surfaces.is_empty() {
            let (left, right) = self.ground_strip();
            let floor = rng.gen_range(height.min(self.level_size.y)..=self.level_size.y.max(height));
            return Rect::new(left, floor - height, right - left, height);
        }
        let ledge = self.ledge(surfaces[rng.gen_range(0..surfaces.len())]);
        Rect::new(ledge.left(), ledge.top() - height, ledge.w, height)
    }
}

#[derive(Debug, Clone)]
struct Lane {
    policy: SpawnPolicy,
    timer: Timer,
}

#[derive(Debug, Clone)]
pub struct Spawner {
    lanes: Vec<Lane>,
}

impl Spawner {
    pub fn new(policies: impl IntoIterator<Item = SpawnPolicy>) -> Self {
        let lanes = policies
            .into_iter()
            .filter(|p| p.enabled)
            .map(|policy| Lane {
                timer: Timer::repeating(policy.interval),
                policy,
            })
            .collect();
        Self { lanes }
    }

    /// Restart every lane's timer from zero.
    pub fn restart(&mut self) {
        for lane in &mut self.lanes {
            lane.timer.start();
        }
    }

    pub fn stop(&mut self) {
        for lane in &mut self.lanes {
            lane.timer.stop();
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = EnemyKind> + '_ {
        self.lanes.iter().map(|l| l.policy.kind)
    }

    /// Advance every lane by `dt`, returning the ids of enemies created.
    pub fn tick(
        &mut self,
        dt: f32,
        world: &mut World,
        area: SpawnArea<'_>,
        sprites: &SpriteBank,
        enemy_cfg: &EnemyConfig,
        rng: &mut impl Rng,
    ) -> Vec<EntityId> {
        let mut spawned = Vec::new();
        for lane in &mut self.lanes {
            if !lane.timer.advance(dt) {
                continue;
            }
            let kind = lane.policy.kind;
            if let Some(cap) = lane.policy.cap {
                if world.count_enemies(kind) >= cap {
                    log::trace!("{:?} cap of {} reached, skipping spawn", kind, cap);
                    continue;
                }
            }
            let speed = lane.policy.speed.sample(rng);
            let spec = match kind {
                EnemyKind::Flyer => {
                    let y = rng.gen_range(0.0..=area.level_size.y.max(0.0));
                    flyer_spec(Vec2::new(area.spawn_x(), y), speed, sprites, enemy_cfg, rng)
                }
                EnemyKind::Crawler => {
                    let height = sprites.crawler.frames.first().map_or(0.0, |f| f.height as f32);
                    crawler_spec(area.crawler_bounds(height, rng), speed, sprites)
                }
            };
            spawned.push(world.spawn(spec));
        }
        spawned
    }
}
