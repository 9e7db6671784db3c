//! Entity data and the group-indexed world that owns it.
//!
//! Entities live in one arena keyed by id.  Groups are non-owning id sets
//! that decide which subsystem sees an entity; every entity is in
//! `Group::All`.  `World::destroy` is the only way out and drops the id from
//! every group in the same call, so nothing can observe a dead entity.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::ControlSet;
use crate::sprites::FrameHandle;
use crate::timer::Timer;

pub type EntityId = u32;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle, top-left origin, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap; touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }
}

// ── Classification ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    /// Every live entity. Updated and drawn.
    All,
    /// Solid map tiles the player stands on and bumps into.
    Collision,
    /// Player shots.
    Projectile,
    /// Anything a projectile can destroy.
    Enemy,
}

/// Draw layer, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Background,
    Decoration,
    Gameplay,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Ground patroller placed by the map.
    Crawler,
    /// Sine-drifting flyer spawned off the right edge.
    Flyer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

// ── Per-kind state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub velocity: Vec2,
    pub facing: Facing,
    pub on_floor: bool,
    pub shoot_cooldown: Timer,
    /// Controls currently held, fed by keyboard or gesture edge events.
    pub controls: ControlSet,
    pub anim: f32,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    /// -1.0 or 1.0
    pub direction: f32,
    pub speed: f32,
    pub lifetime: Timer,
}

#[derive(Debug, Clone)]
pub enum Movement {
    /// Walk back and forth inside `bounds`.
    Patrol { bounds: Rect, direction: f32 },
    /// Fly left with a sine drift.
    Drift { amplitude: f32, frequency: f32 },
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub speed: f32,
    pub movement: Movement,
    pub anim: f32,
}

/// Short-lived effect glued to another entity.
#[derive(Debug, Clone)]
pub struct Flash {
    pub follows: EntityId,
    pub offset: Vec2,
    pub lifetime: Timer,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Tile,
    Player(PlayerState),
    Projectile(Projectile),
    Enemy(Enemy),
    Flash(Flash),
}

// ── Entity ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Top-left corner in world pixels.
    pub pos: Vec2,
    pub frame: FrameHandle,
    pub layer: Layer,
    pub kind: EntityKind,
    groups: BTreeSet<Group>,
}

impl Entity {
    pub fn size(&self) -> Vec2 {
        self.frame.size()
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size())
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    pub fn groups(&self) -> &BTreeSet<Group> {
        &self.groups
    }

    pub fn in_group(&self, group: Group) -> bool {
        self.groups.contains(&group)
    }

    pub fn enemy_kind(&self) -> Option<EnemyKind> {
        match &self.kind {
            EntityKind::Enemy(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Integer placement used by mask tests.
    pub fn pixel_pos(&self) -> (i32, i32) {
        (self.pos.x.floor() as i32, self.pos.y.floor() as i32)
    }
}

/// Everything needed to insert an entity; the world assigns the id.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub pos: Vec2,
    pub frame: FrameHandle,
    pub layer: Layer,
    pub kind: EntityKind,
    pub groups: Vec<Group>,
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    groups: BTreeMap<Group, BTreeSet<EntityId>>,
    next_id: EntityId,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            groups: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert an entity.  `Group::All` is always added.
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;

        let mut groups: BTreeSet<Group> = spec.groups.into_iter().collect();
        groups.insert(Group::All);
        for g in &groups {
            self.groups.entry(*g).or_default().insert(id);
        }
        self.entities.insert(
            id,
            Entity {
                id,
                pos: spec.pos,
                frame: spec.frame,
                layer: spec.layer,
                kind: spec.kind,
                groups,
            },
        );
        id
    }

    /// Remove an entity from the arena and from every group it was in.
    /// Returns `None` when it was already gone, so double destruction is
    /// harmless.
    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        for g in entity.groups.iter() {
            if let Some(set) = self.groups.get_mut(g) {
                set.remove(&id);
            }
        }
        Some(entity)
    }

    /// Drop every entity and group.  Ids keep counting up.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.groups.clear();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids in `group`, ascending.
    pub fn ids(&self, group: Group) -> Vec<EntityId> {
        self.groups
            .get(&group)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, group: Group) -> usize {
        self.groups.get(&group).map_or(0, |s| s.len())
    }

    pub fn group_contains(&self, group: Group, id: EntityId) -> bool {
        self.groups.get(&group).is_some_and(|s| s.contains(&id))
    }

    /// Members of `group` in id order.
    pub fn members(&self, group: Group) -> impl Iterator<Item = &Entity> + '_ {
        self.groups
            .get(&group)
            .into_iter()
            .flat_map(|s| s.iter())
            .filter_map(|id| self.entities.get(id))
    }

    pub fn count_enemies(&self, kind: EnemyKind) -> usize {
        self.members(Group::Enemy)
            .filter(|e| e.enemy_kind() == Some(kind))
            .count()
    }
}
