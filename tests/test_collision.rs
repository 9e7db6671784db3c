use std::sync::Arc;

use glam::Vec2;
use rabbit_shooter::collision::*;
use rabbit_shooter::compute::{bullet_spec, crawler_spec, flyer_spec};
use rabbit_shooter::config::{EnemyConfig, ProjectileConfig, ScoreTable};
use rabbit_shooter::entities::*;
use rabbit_shooter::mode::ModeSession;
use rabbit_shooter::sprites::{Frame, FrameHandle, FrameSet, SpriteBank, SpriteKey, TerminalSprites};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn sprites() -> SpriteBank {
    SpriteBank::load(&TerminalSprites::new(16, 32, 64)).unwrap()
}

fn session() -> ModeSession {
    ModeSession::countdown(20.0, "world2".to_string())
}

fn shot_at(world: &mut World, bank: &SpriteBank, pos: Vec2) -> EntityId {
    let mut spec = bullet_spec(Vec2::ZERO, Facing::Right, bank, &ProjectileConfig::default());
    spec.pos = pos;
    world.spawn(spec)
}

fn flyer_at(world: &mut World, bank: &SpriteBank, pos: Vec2) -> EntityId {
    let mut rng = StdRng::seed_from_u64(42);
    world.spawn(flyer_spec(pos, 400.0, bank, &EnemyConfig::default(), &mut rng))
}

/// An enemy drawn with `glyphs`, so tests control its transparent cells.
fn shaped_enemy(world: &mut World, glyphs: &str, pos: Vec2, flip_x: bool) -> EntityId {
    let sheet = Arc::new(FrameSet {
        key: SpriteKey::Flyer,
        frames: vec![Frame::from_glyphs(&[glyphs], 16, 32)],
    });
    world.spawn(EntitySpec {
        pos,
        frame: FrameHandle {
            flip_x,
            ..FrameHandle::new(sheet)
        },
        layer: Layer::Gameplay,
        kind: EntityKind::Enemy(Enemy {
            kind: EnemyKind::Flyer,
            speed: 0.0,
            movement: Movement::Drift {
                amplitude: 0.0,
                frequency: 1.0,
            },
            anim: 0.0,
        }),
        groups: vec![Group::Enemy],
    })
}

// ── Scoring ───────────────────────────────────────────────────────────────────

#[test]
fn one_shot_kills_both_overlapping_enemies() {
    let bank = sprites();
    let mut world = World::new();
    let shot = shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    let a = flyer_at(&mut world, &bank, Vec2::new(90.0, 100.0));
    let b = world.spawn(crawler_spec(Rect::new(80.0, 80.0, 64.0, 64.0), 170.0, &bank));
    let far = flyer_at(&mut world, &bank, Vec2::new(900.0, 100.0));
    let mut s = session();

    let report = resolve(&mut world, &mut s, &ScoreTable::default());

    assert_eq!(s.score, 40);
    assert_eq!(report.points(), 40);
    assert_eq!(report.kills(), 2);
    assert_eq!(report.hits.len(), 1);
    assert_eq!(report.hits[0].projectile, shot);
    for id in [shot, a, b] {
        assert!(!world.contains(id));
    }
    assert!(world.contains(far));
    assert_eq!(world.count(Group::Enemy), 1);
    assert_eq!(world.count(Group::Projectile), 0);
}

#[test]
fn two_flyers_score_their_sum() {
    let bank = sprites();
    let mut world = World::new();
    shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(90.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(95.0, 110.0));
    let mut s = session();
    s.add_score(10);

    resolve(&mut world, &mut s, &ScoreTable::default());
    assert_eq!(s.score, 70);
    assert_eq!(world.count(Group::Enemy), 0);
}

#[test]
fn no_overlap_changes_nothing() {
    let bank = sprites();
    let mut world = World::new();
    shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(400.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(100.0, 500.0));
    let before = world.len();
    let mut s = session();

    let report = resolve(&mut world, &mut s, &ScoreTable::default());
    assert_eq!(s.score, 0);
    assert_eq!(world.len(), before);
    assert!(report.hits.is_empty());
}

#[test]
fn enemy_is_only_scored_once_when_two_shots_touch_it() {
    let bank = sprites();
    let mut world = World::new();
    let first = shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    let second = shot_at(&mut world, &bank, Vec2::new(110.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(95.0, 100.0));
    let mut s = session();

    resolve(&mut world, &mut s, &ScoreTable::default());
    assert_eq!(s.score, 30);
    assert!(!world.contains(first));
    // Nothing left to hit: the second shot flies on
    assert!(world.contains(second));
}

#[test]
fn custom_score_table_is_used() {
    let bank = sprites();
    let mut world = World::new();
    shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    flyer_at(&mut world, &bank, Vec2::new(90.0, 100.0));
    let mut s = session();
    let table = ScoreTable { crawler: 1, flyer: 250 };

    resolve(&mut world, &mut s, &table);
    assert_eq!(s.score, 250);
}

// ── Pixel masks ───────────────────────────────────────────────────────────────

#[test]
fn shot_through_transparent_gap_misses() {
    let bank = sprites();
    let mut world = World::new();
    let enemy = shaped_enemy(&mut world, "#  #", Vec2::new(200.0, 100.0), false);
    let shot = shot_at(&mut world, &bank, Vec2::new(216.0, 100.0));

    let (s_ent, e_ent) = (world.get(shot).unwrap(), world.get(enemy).unwrap());
    assert!(s_ent.rect().intersects(&e_ent.rect()));
    assert!(!masks_collide(s_ent, e_ent));

    let mut s = session();
    resolve(&mut world, &mut s, &ScoreTable::default());
    assert_eq!(s.score, 0);
    assert!(world.contains(enemy));
}

#[test]
fn mirrored_mask_is_respected() {
    let mut world = World::new();
    let bank = sprites();
    let plain = shaped_enemy(&mut world, "#   ", Vec2::new(200.0, 100.0), false);
    let flipped = shaped_enemy(&mut world, "#   ", Vec2::new(200.0, 300.0), true);
    let shot_plain = shot_at(&mut world, &bank, Vec2::new(248.0, 100.0));
    let shot_flipped = shot_at(&mut world, &bank, Vec2::new(248.0, 300.0));

    assert!(!masks_collide(world.get(shot_plain).unwrap(), world.get(plain).unwrap()));
    assert!(masks_collide(world.get(shot_flipped).unwrap(), world.get(flipped).unwrap()));
}

#[test]
fn touching_edges_do_not_collide() {
    let bank = sprites();
    let mut world = World::new();
    let shot = shot_at(&mut world, &bank, Vec2::new(100.0, 100.0));
    let flyer = flyer_at(&mut world, &bank, Vec2::new(116.0, 100.0));
    assert!(!masks_collide(world.get(shot).unwrap(), world.get(flyer).unwrap()));
}
