use std::collections::BTreeSet;

use glam::Vec2;
use rabbit_shooter::error::GameError;
use rabbit_shooter::level::*;

const WORLD: &str = include_str!("../assets/maps/world.json");
const WORLD2: &str = include_str!("../assets/maps/world2.json");

fn parse(text: &str) -> LevelData {
    serde_json::from_str(text).unwrap()
}

fn tiny() -> LevelData {
    LevelData {
        name: "tiny".to_string(),
        main: vec!["....".to_string(), "#..=".to_string()],
        decoration: vec![".^".to_string()],
        entities: vec![Placement {
            kind: PlacementKind::Player,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }],
    }
}

// ── Shipped maps ──────────────────────────────────────────────────────────────

#[test]
fn shipped_maps_are_valid() {
    for text in [WORLD, WORLD2] {
        let level = parse(text);
        level.validate().unwrap();
        assert!(level.player_spawn().is_some());
        assert!(level.entities.iter().any(|p| p.kind == PlacementKind::Crawler));
    }
}

#[test]
fn shipped_maps_have_a_floor() {
    for text in [WORLD, WORLD2] {
        let level = parse(text);
        let (_, rows) = level.grid_size();
        let floor = LevelData::tiles(&level.main).filter(|(_, row, _)| *row == rows - 1);
        assert!(floor.count() > 0);
    }
}

#[test]
fn worm_is_an_alias_for_crawler() {
    let p: Placement =
        serde_json::from_str(r#"{"kind": "worm", "x": 1, "y": 2, "width": 3, "height": 4}"#)
            .unwrap();
    assert_eq!(p.kind, PlacementKind::Crawler);
    assert_eq!(p.rect().w, 3.0);
    assert_eq!(p.rect().bottom(), 6.0);
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[test]
fn grid_size_uses_widest_layer() {
    let level = tiny();
    assert_eq!(level.grid_size(), (4, 2));
    assert_eq!(level.pixel_size(64.0), Vec2::new(256.0, 128.0));
}

#[test]
fn tiles_skip_empty_cells() {
    let level = tiny();
    let tiles: Vec<_> = LevelData::tiles(&level.main).collect();
    assert_eq!(tiles, vec![(0, 1, '#'), (3, 1, '=')]);
    assert!(is_empty_cell('.'));
    assert!(is_empty_cell(' '));
    assert!(!is_empty_cell('#'));
}

#[test]
fn tile_glyphs_cover_both_layers() {
    let expected: BTreeSet<char> = ['#', '=', '^'].into_iter().collect();
    assert_eq!(tiny().tile_glyphs(), expected);
}

// ── Validation ────────────────────────────────────────────────────────────────

#[test]
fn empty_map_is_invalid() {
    let mut level = tiny();
    level.main.clear();
    level.decoration.clear();
    assert!(matches!(level.validate(), Err(GameError::LevelInvalid { .. })));
}

#[test]
fn player_must_appear_exactly_once() {
    let mut level = tiny();
    level.entities.clear();
    assert!(level.validate().is_err());

    let mut level = tiny();
    let player = level.entities[0].clone();
    level.entities.push(player);
    let err = level.validate().unwrap_err();
    assert!(err.to_string().contains("more than one player"));
}

// ── Providers ─────────────────────────────────────────────────────────────────

#[test]
fn memory_levels_name_their_maps() {
    let levels = MemoryLevels::new().with("arena", tiny());
    assert_eq!(levels.load("arena").unwrap().name, "arena");
    assert!(matches!(levels.load("nowhere"), Err(GameError::AssetMissing(_))));
}

#[test]
fn json_provider_reads_shipped_maps() {
    let provider = JsonLevelProvider::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    let level = provider.load("world2").unwrap();
    assert_eq!(level.name, "world2");
    assert_eq!(level, LevelData { name: "world2".to_string(), ..parse(WORLD2) });
}

#[test]
fn json_provider_reports_missing_file() {
    let provider = JsonLevelProvider::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    assert!(provider.path_for("nowhere").ends_with("maps/nowhere.json"));
    assert!(matches!(provider.load("nowhere"), Err(GameError::AssetMissing(_))));
}
