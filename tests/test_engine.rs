use glam::Vec2;
use rabbit_shooter::audio::Clip;
use rabbit_shooter::config::{GameConfig, Span};
use rabbit_shooter::engine::Engine;
use rabbit_shooter::entities::{EnemyKind, Group};
use rabbit_shooter::error::GameError;
use rabbit_shooter::game::InputSource;
use rabbit_shooter::input::{Command, Control, ControlEvent};
use rabbit_shooter::level::{LevelData, MemoryLevels, Placement, PlacementKind};
use rabbit_shooter::mode::{ModeKind, Screen};
use rabbit_shooter::sprites::TerminalSprites;

const DT: f32 = 1.0 / 60.0;

fn placement(kind: PlacementKind, x: f32, y: f32, width: f32, height: f32) -> Placement {
    Placement {
        kind,
        x,
        y,
        width,
        height,
    }
}

/// Eight tiles wide, floor on the second row.  The player stands at the
/// left edge with a stationary crawler right in front of the muzzle.
fn arena(crawlers: usize) -> LevelData {
    let mut entities = vec![placement(PlacementKind::Player, 0.0, 0.0, 0.0, 0.0)];
    for i in 0..crawlers {
        entities.push(placement(
            PlacementKind::Crawler,
            64.0 + i as f32 * 128.0,
            0.0,
            128.0,
            64.0,
        ));
    }
    LevelData {
        name: String::new(),
        main: vec!["........".to_string(), "########".to_string()],
        decoration: vec![".,......".to_string()],
        entities,
    }
}

fn config() -> GameConfig {
    let mut config = GameConfig::default();
    config.seed = Some(42);
    config.spawner.flyer.enabled = false;
    config.spawner.crawler.enabled = false;
    config.enemies.crawler_speed = Span::new(0.0, 0.0);
    config.scores.crawler = 500;
    config
}

fn levels() -> MemoryLevels {
    MemoryLevels::new()
        .with("world2", arena(1))
        .with("world", arena(3))
}

fn engine() -> Engine {
    Engine::new(
        config(),
        &levels(),
        &TerminalSprites::new(16, 32, 64),
        Vec2::new(512.0, 128.0),
    )
    .unwrap()
}

// ── Startup ───────────────────────────────────────────────────────────────────

#[test]
fn starts_at_menu_without_a_level() {
    let e = engine();
    assert_eq!(e.screen(), &Screen::Menu { selected: 0 });
    assert!(e.game().is_none());
    assert!(!e.is_finished());
}

#[test]
fn missing_map_fails_before_first_frame() {
    let levels = MemoryLevels::new().with("world2", arena(1));
    let result = Engine::new(
        config(),
        &levels,
        &TerminalSprites::new(16, 32, 64),
        Vec2::new(512.0, 128.0),
    );
    assert!(matches!(result, Err(GameError::AssetMissing(_))));
}

#[test]
fn map_without_player_is_rejected() {
    let mut broken = arena(1);
    broken.entities.retain(|p| p.kind != PlacementKind::Player);
    let levels = MemoryLevels::new()
        .with("world2", arena(1))
        .with("world", broken);
    let result = Engine::new(
        config(),
        &levels,
        &TerminalSprites::new(16, 32, 64),
        Vec2::new(512.0, 128.0),
    );
    assert!(matches!(result, Err(GameError::LevelInvalid { .. })));
}

#[test]
fn idle_ticks_outside_play_do_nothing() {
    let mut e = engine();
    e.control(InputSource::Keyboard, ControlEvent::Pressed(Control::Shoot));
    assert!(e.tick(DT).unwrap().is_none());
    assert!(e.game().is_none());
}

// ── Level lifecycle ───────────────────────────────────────────────────────────

#[test]
fn starting_a_session_builds_the_level() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();

    let game = e.game().unwrap();
    assert_eq!(game.map(), "world2");
    assert_eq!(game.level_size(), Vec2::new(512.0, 128.0));
    assert_eq!(game.world().count_enemies(EnemyKind::Crawler), 1);
    assert_eq!(game.world().count(Group::Collision), 8);
    assert!(game.player_id().is_some());
    assert_eq!(e.drain_sounds(), vec![Clip::Music]);
    assert!(e.drain_sounds().is_empty());
}

#[test]
fn player_rests_on_the_floor() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    for _ in 0..30 {
        e.tick(DT).unwrap();
    }
    let game = e.game().unwrap();
    let player = game.world().get(game.player_id().unwrap()).unwrap();
    assert_eq!(player.pos.y, 0.0);
}

#[test]
fn adventure_switches_map_after_threshold_kill() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    e.drain_sounds();

    e.control(InputSource::Keyboard, ControlEvent::Pressed(Control::Shoot));
    let report = e.tick(DT).unwrap().unwrap();
    assert_eq!(report.collisions.kills(), 1);
    assert_eq!(report.collisions.points(), 500);

    let session = e.controller().session().unwrap();
    assert_eq!(session.mode, ModeKind::Adventure);
    assert_eq!(session.map, "world");
    assert_eq!(session.score, 0);

    // Fresh world: the new map's crawlers, nothing carried over
    let game = e.game().unwrap();
    assert_eq!(game.map(), "world");
    assert_eq!(game.time(), 0.0);
    assert_eq!(game.world().count(Group::Projectile), 0);
    assert_eq!(game.world().count_enemies(EnemyKind::Crawler), 3);

    let sounds = e.drain_sounds();
    assert!(sounds.contains(&Clip::Shoot));
    assert!(sounds.contains(&Clip::Impact));
}

#[test]
fn timed_crawlers_walk_on_the_floor_inside_the_level() {
    let mut config = config();
    config.spawner.crawler.enabled = true;
    config.spawner.crawler.interval = 0.1;
    config.spawner.crawler.cap = Some(6);
    let mut e = Engine::new(
        config,
        &levels(),
        &TerminalSprites::new(16, 32, 64),
        Vec2::new(512.0, 128.0),
    )
    .unwrap();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    for _ in 0..600 {
        e.tick(DT).unwrap();
    }

    let game = e.game().unwrap();
    let level = game.level_size();
    assert_eq!(game.world().count_enemies(EnemyKind::Crawler), 6);
    for crawler in game.world().members(Group::Enemy) {
        let rect = crawler.rect();
        assert!(rect.left() >= 0.0 && rect.right() <= level.x, "{:?}", rect);
        assert_eq!(rect.bottom(), 64.0);
    }
}

#[test]
fn countdown_session_ends_and_drops_level() {
    let mut e = engine();
    e.command(Command::Confirm).unwrap();
    e.command(Command::Confirm).unwrap();
    assert_eq!(e.controller().session().unwrap().duration, Some(20.0));

    for _ in 0..39 {
        e.tick(0.5).unwrap();
    }
    assert!(e.game().is_some());
    e.tick(0.5).unwrap();
    assert!(e.game().is_none());
    assert!(matches!(e.screen(), Screen::GameOver { mode: ModeKind::Countdown, .. }));

    e.tick(5.0).unwrap();
    assert_eq!(e.screen(), &Screen::Menu { selected: 0 });
}

#[test]
fn countdown_kill_scores_without_switching() {
    let mut e = engine();
    e.command(Command::Confirm).unwrap();
    e.command(Command::Confirm).unwrap();
    e.control(InputSource::Keyboard, ControlEvent::Pressed(Control::Shoot));
    e.tick(DT).unwrap();

    assert_eq!(e.controller().session().unwrap().score, 500);
    assert_eq!(e.game().unwrap().map(), "world2");
    assert_eq!(e.game().unwrap().world().count_enemies(EnemyKind::Crawler), 0);
}

#[test]
fn pause_freezes_the_world() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    e.tick(DT).unwrap();
    e.command(Command::Pause).unwrap();

    let time = e.game().unwrap().time();
    e.control(InputSource::Keyboard, ControlEvent::Pressed(Control::MoveRight));
    for _ in 0..20 {
        assert!(e.tick(DT).unwrap().is_none());
    }
    let game = e.game().unwrap();
    assert_eq!(game.time(), time);
    let player = game.world().get(game.player_id().unwrap()).unwrap();
    assert_eq!(player.pos.x, 0.0);

    e.command(Command::Pause).unwrap();
    e.tick(DT).unwrap();
    let game = e.game().unwrap();
    let player = game.world().get(game.player_id().unwrap()).unwrap();
    assert!(player.pos.x > 0.0);
}

#[test]
fn keyboard_release_keeps_gesture_hold() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();

    e.control(InputSource::Gesture, ControlEvent::Pressed(Control::MoveRight));
    e.control(InputSource::Keyboard, ControlEvent::Pressed(Control::MoveRight));
    e.control(InputSource::Keyboard, ControlEvent::Released(Control::MoveRight));
    assert!(e.game().unwrap().held().is_held(Control::MoveRight));

    e.control(InputSource::Gesture, ControlEvent::Released(Control::MoveRight));
    assert!(!e.game().unwrap().held().any());
}

#[test]
fn exit_drops_everything() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    e.command(Command::Exit).unwrap();
    assert!(e.is_finished());
    assert!(e.game().is_none());
}

#[test]
fn viewport_follows_resize() {
    let mut e = engine();
    e.command(Command::Down).unwrap();
    e.command(Command::Confirm).unwrap();
    e.set_viewport(Vec2::new(320.0, 96.0));
    assert_eq!(e.viewport(), Vec2::new(320.0, 96.0));
    assert_eq!(e.game().unwrap().viewport(), Vec2::new(320.0, 96.0));
}
