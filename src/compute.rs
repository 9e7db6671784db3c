//! Per-entity behaviour.
//!
//! Each update function mutates only the entity it is given and reports
//! anything that touches the rest of the world (spawns, self-destruction,
//! sounds) as `Effect`s.  The caller applies them once every entity has
//! been updated.  Constructors for every entity kind live here too.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use crate::audio::Clip;
use crate::config::{EnemyConfig, PlayerConfig, ProjectileConfig};
use crate::entities::{
    Enemy, EnemyKind, EntityId, EntityKind, EntitySpec, Facing, Flash, Group, Layer, Movement,
    PlayerState, Projectile, Rect,
};
use crate::input::{Control, ControlSet};
use crate::sprites::{FrameHandle, FrameSet, SpriteBank};
use crate::timer::Timer;

/// Follow-on work requested by an update.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Remove the entity that produced this effect.
    DestroySelf,
    Spawn(EntitySpec),
    Sound(Clip),
}

/// Where the player is, for entities that track it.
#[derive(Debug, Clone, Copy)]
pub struct PlayerAnchor {
    pub id: EntityId,
    pub center: Vec2,
    pub facing: Facing,
}

/// Read-only inputs shared by every update in a frame.
pub struct UpdateCtx<'a> {
    pub dt: f32,
    /// Seconds since the level started.
    pub time: f32,
    pub level_size: Vec2,
    pub solids: &'a [Rect],
    pub player: Option<PlayerAnchor>,
    pub player_cfg: &'a PlayerConfig,
    pub projectile_cfg: &'a ProjectileConfig,
    pub enemy_cfg: &'a EnemyConfig,
    pub sprites: &'a SpriteBank,
}

// ── Constructors ─────────────────────────────────────────────────────────────

pub fn tile_spec(pos: Vec2, sheet: Arc<FrameSet>, solid: bool) -> EntitySpec {
    EntitySpec {
        pos,
        frame: FrameHandle::new(sheet),
        layer: if solid { Layer::Background } else { Layer::Decoration },
        kind: EntityKind::Tile,
        groups: if solid { vec![Group::Collision] } else { Vec::new() },
    }
}

pub fn player_spec(pos: Vec2, sprites: &SpriteBank, cfg: &PlayerConfig) -> EntitySpec {
    let mut cooldown = Timer::one_shot(cfg.shoot_cooldown);
    cooldown.stop();
    EntitySpec {
        pos,
        frame: FrameHandle::new(Arc::clone(&sprites.player)),
        layer: Layer::Gameplay,
        kind: EntityKind::Player(PlayerState {
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            on_floor: false,
            shoot_cooldown: cooldown,
            controls: ControlSet::default(),
            anim: 0.0,
        }),
        groups: Vec::new(),
    }
}

/// A shot leaving the muzzle.  Left-facing shots are shifted by their own
/// width so they start on the correct side of the muzzle.
pub fn bullet_spec(
    player_center: Vec2,
    facing: Facing,
    sprites: &SpriteBank,
    cfg: &ProjectileConfig,
) -> EntitySpec {
    let frame = FrameHandle {
        flip_x: facing == Facing::Left,
        ..FrameHandle::new(Arc::clone(&sprites.bullet))
    };
    let dir = facing.sign();
    let mut x = player_center.x + dir * cfg.muzzle_offset;
    if facing == Facing::Left {
        x -= frame.size().x;
    }
    EntitySpec {
        pos: Vec2::new(x, player_center.y),
        frame,
        layer: Layer::Gameplay,
        kind: EntityKind::Projectile(Projectile {
            direction: dir,
            speed: cfg.speed,
            lifetime: Timer::new(cfg.lifetime, false, true),
        }),
        groups: vec![Group::Projectile],
    }
}

pub fn flash_spec(anchor: PlayerAnchor, sprites: &SpriteBank, cfg: &ProjectileConfig) -> EntitySpec {
    let frame = FrameHandle::new(Arc::clone(&sprites.muzzle_flash));
    let offset = Vec2::new(cfg.muzzle_offset, 8.0);
    EntitySpec {
        pos: flash_pos(anchor, offset, frame.size()),
        frame,
        layer: Layer::Foreground,
        kind: EntityKind::Flash(Flash {
            follows: anchor.id,
            offset,
            lifetime: Timer::new(cfg.flash_lifetime, false, true),
        }),
        groups: Vec::new(),
    }
}

fn flash_pos(anchor: PlayerAnchor, offset: Vec2, size: Vec2) -> Vec2 {
    let center = anchor.center + Vec2::new(offset.x * anchor.facing.sign(), offset.y);
    center - size / 2.0
}

pub fn flyer_spec(
    pos: Vec2,
    speed: f32,
    sprites: &SpriteBank,
    cfg: &EnemyConfig,
    rng: &mut impl Rng,
) -> EntitySpec {
    EntitySpec {
        pos,
        frame: FrameHandle::new(Arc::clone(&sprites.flyer)),
        layer: Layer::Gameplay,
        kind: EntityKind::Enemy(Enemy {
            kind: EnemyKind::Flyer,
            speed,
            movement: Movement::Drift {
                amplitude: cfg.flyer_amplitude.sample(rng),
                frequency: cfg.flyer_frequency.sample(rng).max(1.0),
            },
            anim: 0.0,
        }),
        groups: vec![Group::Enemy],
    }
}

/// A crawler standing on the bottom edge of `area` and patrolling across it.
/// An area narrower than the sprite is widened to fit it.
pub fn crawler_spec(area: Rect, speed: f32, sprites: &SpriteBank) -> EntitySpec {
    let frame = FrameHandle::new(Arc::clone(&sprites.crawler));
    let size = frame.size();
    let bounds = Rect::new(area.x, area.y, area.w.max(size.x), area.h.max(size.y));
    EntitySpec {
        pos: Vec2::new(bounds.left(), bounds.bottom() - size.y),
        frame,
        layer: Layer::Gameplay,
        kind: EntityKind::Enemy(Enemy {
            kind: EnemyKind::Crawler,
            speed,
            movement: Movement::Patrol {
                bounds,
                direction: 1.0,
            },
            anim: 0.0,
        }),
        groups: vec![Group::Enemy],
    }
}

// ── Per-frame update ─────────────────────────────────────────────────────────

/// Advance one entity by `ctx.dt`.
pub fn update_entity(
    pos: &mut Vec2,
    frame: &mut FrameHandle,
    kind: &mut EntityKind,
    ctx: &UpdateCtx,
    out: &mut Vec<Effect>,
) {
    match kind {
        EntityKind::Tile => {}
        EntityKind::Player(p) => update_player(pos, frame, p, ctx, out),
        EntityKind::Projectile(b) => update_projectile(pos, frame.size(), b, ctx, out),
        EntityKind::Enemy(e) => update_enemy(pos, frame, e, ctx, out),
        EntityKind::Flash(f) => update_flash(pos, frame.size(), f, ctx, out),
    }
}

fn axis(controls: &ControlSet, negative: Control, positive: Control) -> f32 {
    (controls.is_held(positive) as i32 - controls.is_held(negative) as i32) as f32
}

pub fn update_player(
    pos: &mut Vec2,
    frame: &mut FrameHandle,
    p: &mut PlayerState,
    ctx: &UpdateCtx,
    out: &mut Vec<Effect>,
) {
    let cfg = ctx.player_cfg;
    let size = frame.size();
    p.shoot_cooldown.advance(ctx.dt);

    // Input
    let dx = axis(&p.controls, Control::MoveLeft, Control::MoveRight);
    p.velocity.x = dx * cfg.speed;
    if dx < 0.0 {
        p.facing = Facing::Left;
    } else if dx > 0.0 {
        p.facing = Facing::Right;
    }
    if p.controls.is_held(Control::Jump) && p.on_floor {
        p.velocity.y = -cfg.jump_speed;
    }
    if p.controls.is_held(Control::Shoot) && !p.shoot_cooldown.is_active() {
        let center = Rect::from_pos_size(*pos, size).center();
        out.push(Effect::Spawn(bullet_spec(
            center,
            p.facing,
            ctx.sprites,
            ctx.projectile_cfg,
        )));
        if let Some(anchor) = ctx.player {
            out.push(Effect::Spawn(flash_spec(
                PlayerAnchor {
                    facing: p.facing,
                    center,
                    ..anchor
                },
                ctx.sprites,
                ctx.projectile_cfg,
            )));
        }
        out.push(Effect::Sound(Clip::Shoot));
        p.shoot_cooldown.start();
    }

    // Horizontal move, then resolve
    pos.x += p.velocity.x * ctx.dt;
    pos.x = pos.x.clamp(0.0, (ctx.level_size.x - size.x).max(0.0));
    for solid in ctx.solids {
        if Rect::from_pos_size(*pos, size).intersects(solid) {
            if p.velocity.x > 0.0 {
                pos.x = solid.left() - size.x;
            } else if p.velocity.x < 0.0 {
                pos.x = solid.right();
            }
        }
    }

    // Gravity, vertical move, then resolve
    p.velocity.y += cfg.gravity * ctx.dt;
    pos.y += p.velocity.y * ctx.dt;
    for solid in ctx.solids {
        if Rect::from_pos_size(*pos, size).intersects(solid) {
            if p.velocity.y > 0.0 {
                pos.y = solid.top() - size.y;
            } else if p.velocity.y < 0.0 {
                pos.y = solid.bottom();
            }
            p.velocity.y = 0.0;
        }
    }

    // Fell out of the map: drop back in from the top
    if pos.y > ctx.level_size.y {
        log::debug!("player fell out of the level at x={:.0}", pos.x);
        pos.y = 0.0;
        p.velocity.y = 0.0;
    }

    let feet = Rect::new(pos.x, pos.y + size.y, size.x, 2.0);
    p.on_floor = ctx.solids.iter().any(|s| feet.intersects(s));

    animate_player(frame, p, ctx.dt, cfg.animation_speed);
}

/// Frame 0 idle, 1 airborne, the rest a walk cycle.
fn animate_player(frame: &mut FrameHandle, p: &mut PlayerState, dt: f32, rate: f32) {
    let count = frame.frame_count();
    frame.flip_x = p.facing == Facing::Left;
    if !p.on_floor && count > 1 {
        frame.index = 1;
    } else if p.velocity.x != 0.0 && count > 2 {
        p.anim += rate * dt;
        frame.index = 2 + (p.anim as usize) % (count - 2);
    } else {
        p.anim = 0.0;
        frame.index = 0;
    }
}

pub fn update_projectile(
    pos: &mut Vec2,
    size: Vec2,
    b: &mut Projectile,
    ctx: &UpdateCtx,
    out: &mut Vec<Effect>,
) {
    pos.x += b.direction * b.speed * ctx.dt;
    let expired = b.lifetime.advance(ctx.dt);
    let rect = Rect::from_pos_size(*pos, size);
    if expired || rect.right() < 0.0 || rect.left() > ctx.level_size.x {
        out.push(Effect::DestroySelf);
    }
}

pub fn update_enemy(
    pos: &mut Vec2,
    frame: &mut FrameHandle,
    e: &mut Enemy,
    ctx: &UpdateCtx,
    out: &mut Vec<Effect>,
) {
    let size = frame.size();
    match &mut e.movement {
        Movement::Patrol { bounds, direction } => {
            pos.x += *direction * e.speed * ctx.dt;
            pos.y = bounds.bottom() - size.y;
            let rect = Rect::from_pos_size(*pos, size);
            if !bounds.contains(&rect) {
                if rect.left() < bounds.left() {
                    pos.x = bounds.left();
                    *direction = 1.0;
                } else if rect.right() > bounds.right() {
                    pos.x = bounds.right() - size.x;
                    *direction = -1.0;
                }
            }
            frame.flip_x = *direction < 0.0;
        }
        Movement::Drift {
            amplitude,
            frequency,
        } => {
            pos.x -= e.speed * ctx.dt;
            pos.y += (ctx.time * 1000.0 / *frequency).sin() * *amplitude * ctx.dt;
            if pos.x + size.x <= 0.0 {
                out.push(Effect::DestroySelf);
            }
        }
    }
    e.anim += ctx.enemy_cfg.animation_speed * ctx.dt;
    frame.index = (e.anim as usize) % frame.frame_count().max(1);
}

pub fn update_flash(
    pos: &mut Vec2,
    size: Vec2,
    f: &mut Flash,
    ctx: &UpdateCtx,
    out: &mut Vec<Effect>,
) {
    match ctx.player {
        Some(anchor) if anchor.id == f.follows => {
            *pos = flash_pos(anchor, f.offset, size);
        }
        _ => {
            out.push(Effect::DestroySelf);
            return;
        }
    }
    if f.lifetime.advance(ctx.dt) {
        out.push(Effect::DestroySelf);
    }
}
