//! Scroll offset and draw ordering.
//!
//! The camera centers on a focus point.  On an axis where the level is
//! larger than the viewport the offset is clamped so nothing outside the
//! level shows; on an axis where the level is smaller it follows the focus
//! freely and the sink's background fill covers the rest.

use std::cmp::Ordering;

use glam::Vec2;

use crate::entities::{Entity, Group, Layer, Rect, World};
use crate::sprites::FrameHandle;

/// One sprite to put on screen.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub frame: FrameHandle,
    /// Top-left corner in viewport pixels.
    pub screen_pos: Vec2,
    pub layer: Layer,
}

/// Receives draw calls in back-to-front order.
pub trait RenderSink {
    fn draw(&mut self, call: &DrawCall);
}

impl RenderSink for Vec<DrawCall> {
    fn draw(&mut self, call: &DrawCall) {
        self.push(call.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub viewport: Vec2,
}

fn axis_offset(focus: f32, viewport: f32, level: f32) -> f32 {
    let centered = focus - viewport / 2.0;
    if level > viewport {
        centered.clamp(0.0, level - viewport)
    } else {
        centered
    }
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self { viewport }
    }

    /// World position of the viewport's top-left corner.
    pub fn offset(&self, focus: Vec2, level_size: Vec2) -> Vec2 {
        Vec2::new(
            axis_offset(focus.x, self.viewport.x, level_size.x),
            axis_offset(focus.y, self.viewport.y, level_size.y),
        )
    }

    /// The world area visible for `focus`.
    pub fn visible(&self, focus: Vec2, level_size: Vec2) -> Rect {
        Rect::from_pos_size(self.offset(focus, level_size), self.viewport)
    }

    /// Visible entities in draw order: by layer, then (gameplay layer only)
    /// by vertical center so lower sprites cover higher ones, then by id.
    pub fn draw_order<'w>(&self, world: &'w World, focus: Vec2, level_size: Vec2) -> Vec<&'w Entity> {
        let view = self.visible(focus, level_size);
        let mut visible: Vec<&Entity> = world
            .members(Group::All)
            .filter(|e| e.rect().intersects(&view))
            .collect();
        visible.sort_by(|a, b| {
            a.layer
                .cmp(&b.layer)
                .then_with(|| match a.layer {
                    Layer::Gameplay => a.center().y.total_cmp(&b.center().y),
                    _ => Ordering::Equal,
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        visible
    }

    /// Emit draw calls for everything visible around `focus`.  Read-only.
    pub fn draw(&self, world: &World, focus: Vec2, level_size: Vec2, sink: &mut dyn RenderSink) {
        let offset = self.offset(focus, level_size);
        for entity in self.draw_order(world, focus, level_size) {
            sink.draw(&DrawCall {
                frame: entity.frame.clone(),
                screen_pos: entity.pos - offset,
                layer: entity.layer,
            });
        }
    }
}
