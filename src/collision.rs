//! Projectile versus enemy resolution.
//!
//! Runs once per frame after every entity has moved.  A projectile is
//! tested against all live enemies; on a hit the projectile and every
//! enemy it touches in that same test are destroyed and each enemy's
//! kind value is added to the session score.

use crate::config::ScoreTable;
use crate::entities::{EnemyKind, Entity, EntityId, Group, World};
use crate::mode::ModeSession;

/// Rectangle pre-check, then per-pixel mask overlap.
pub fn masks_collide(a: &Entity, b: &Entity) -> bool {
    if !a.rect().intersects(&b.rect()) {
        return false;
    }
    a.frame.mask().overlaps(
        a.pixel_pos(),
        a.frame.flip_x,
        b.frame.mask(),
        b.pixel_pos(),
        b.frame.flip_x,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kill {
    pub enemy: EntityId,
    pub kind: EnemyKind,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub projectile: EntityId,
    pub kills: Vec<Kill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub hits: Vec<Hit>,
}

impl CollisionReport {
    pub fn points(&self) -> u32 {
        self.hits
            .iter()
            .flat_map(|h| h.kills.iter())
            .map(|k| k.points)
            .sum()
    }

    pub fn kills(&self) -> usize {
        self.hits.iter().map(|h| h.kills.len()).sum()
    }
}

/// Resolve this frame's projectile hits, mutating `world` and `session`.
pub fn resolve(world: &mut World, session: &mut ModeSession, scores: &ScoreTable) -> CollisionReport {
    let mut report = CollisionReport::default();

    for projectile_id in world.ids(Group::Projectile) {
        let Some(projectile) = world.get(projectile_id) else {
            continue;
        };
        let touched: Vec<EntityId> = world
            .members(Group::Enemy)
            .filter(|enemy| masks_collide(projectile, enemy))
            .map(|enemy| enemy.id)
            .collect();
        if touched.is_empty() {
            continue;
        }

        world.destroy(projectile_id);
        let mut kills = Vec::with_capacity(touched.len());
        for enemy_id in touched {
            let Some(enemy) = world.destroy(enemy_id) else {
                continue;
            };
            let Some(kind) = enemy.enemy_kind() else {
                continue;
            };
            let points = scores.value(kind);
            session.add_score(points);
            kills.push(Kill {
                enemy: enemy_id,
                kind,
                points,
            });
        }
        log::trace!(
            "projectile {} hit {} enemies, score now {}",
            projectile_id,
            kills.len(),
            session.score
        );
        report.hits.push(Hit {
            projectile: projectile_id,
            kills,
        });
    }

    report
}
