//! Sprite sheets and per-pixel hit masks.
//!
//! The core treats a frame as an opaque drawable plus a size and a mask.
//! The built-in provider draws with terminal glyphs: each glyph covers one
//! terminal cell worth of world pixels and a blank glyph is transparent.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use crate::error::{GameError, Result};

// ── Mask ──────────────────────────────────────────────────────────────────────

/// Per-pixel opacity, row-major, origin top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; (width * height) as usize],
        }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    /// Expand glyph rows into pixels, `cell_w` × `cell_h` pixels per glyph.
    pub fn from_glyphs(rows: &[String], cell_w: u32, cell_h: u32) -> Self {
        let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut mask = Self::empty(cols * cell_w, rows.len() as u32 * cell_h);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let x0 = col as u32 * cell_w;
                let y0 = row as u32 * cell_h;
                for y in y0..y0 + cell_h {
                    for x in x0..x0 + cell_w {
                        mask.set(x, y, true);
                    }
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = on;
        }
    }

    /// Opacity at `(x, y)`, reading the mirrored image when `flip_x` is set.
    pub fn get(&self, x: u32, y: u32, flip_x: bool) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let x = if flip_x { self.width - 1 - x } else { x };
        self.bits[(y * self.width + x) as usize]
    }

    /// True when any opaque pixel of `self` placed at `at` coincides with an
    /// opaque pixel of `other` placed at `other_at`.
    pub fn overlaps(
        &self,
        at: (i32, i32),
        flip_x: bool,
        other: &Mask,
        other_at: (i32, i32),
        other_flip_x: bool,
    ) -> bool {
        let left = at.0.max(other_at.0);
        let top = at.1.max(other_at.1);
        let right = (at.0 + self.width as i32).min(other_at.0 + other.width as i32);
        let bottom = (at.1 + self.height as i32).min(other_at.1 + other.height as i32);
        if left >= right || top >= bottom {
            return false;
        }
        for y in top..bottom {
            for x in left..right {
                let mine = self.get((x - at.0) as u32, (y - at.1) as u32, flip_x);
                if mine
                    && other.get(
                        (x - other_at.0) as u32,
                        (y - other_at.1) as u32,
                        other_flip_x,
                    )
                {
                    return true;
                }
            }
        }
        false
    }
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// Logical sprite names the core asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    Player,
    Bullet,
    MuzzleFlash,
    Flyer,
    Crawler,
    /// A map tile, identified by its glyph in the map file.
    Tile(char),
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub mask: Mask,
    /// Drawable payload for the terminal sink, one string per row.
    pub glyphs: Vec<String>,
}

impl Frame {
    pub fn from_glyphs(rows: &[&str], cell_w: u32, cell_h: u32) -> Self {
        let glyphs: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        let mask = Mask::from_glyphs(&glyphs, cell_w, cell_h);
        Self {
            width: mask.width(),
            height: mask.height(),
            mask,
            glyphs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameSet {
    pub key: SpriteKey,
    pub frames: Vec<Frame>,
}

impl FrameSet {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Which frame of which sheet an entity currently shows.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    pub sheet: Arc<FrameSet>,
    pub index: usize,
    pub flip_x: bool,
}

impl FrameHandle {
    pub fn new(sheet: Arc<FrameSet>) -> Self {
        Self {
            sheet,
            index: 0,
            flip_x: false,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.sheet.frames[self.index % self.sheet.frames.len()]
    }

    pub fn size(&self) -> Vec2 {
        let f = self.frame();
        Vec2::new(f.width as f32, f.height as f32)
    }

    pub fn mask(&self) -> &Mask {
        &self.frame().mask
    }

    pub fn frame_count(&self) -> usize {
        self.sheet.frames.len()
    }
}

// ── Providers ─────────────────────────────────────────────────────────────────

/// Supplies frame sheets by logical key.
pub trait SpriteProvider {
    fn sheet(&self, key: SpriteKey) -> Result<FrameSet>;
}

/// Glyph-art sprites for the terminal build.
#[derive(Debug, Clone)]
pub struct TerminalSprites {
    pub cell_w: u32,
    pub cell_h: u32,
    pub tile_size: u32,
}

impl TerminalSprites {
    pub fn new(cell_w: u32, cell_h: u32, tile_size: u32) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            tile_size: tile_size.max(1),
        }
    }

    fn set(&self, key: SpriteKey, frames: &[&[&str]]) -> FrameSet {
        FrameSet {
            key,
            frames: frames
                .iter()
                .map(|rows| Frame::from_glyphs(rows, self.cell_w, self.cell_h))
                .collect(),
        }
    }
}

impl SpriteProvider for TerminalSprites {
    fn sheet(&self, key: SpriteKey) -> Result<FrameSet> {
        let set = match key {
            // Frame 0 idle, 1 airborne, 2..3 walk cycle
            SpriteKey::Player => self.set(
                key,
                &[
                    &["(\\/)", "/()\\"],
                    &["(\\/)", "\\()/"],
                    &["(\\/)", "/() "],
                    &["(\\/)", " ()\\"],
                ],
            ),
            SpriteKey::Bullet => self.set(key, &[&["-"]]),
            SpriteKey::MuzzleFlash => self.set(key, &[&["*"]]),
            SpriteKey::Flyer => self.set(key, &[&["<@="], &["<@-"]]),
            SpriteKey::Crawler => self.set(key, &[&["~~=o"], &["=~~o"]]),
            SpriteKey::Tile(' ') | SpriteKey::Tile('.') => {
                return Err(GameError::AssetMissing(format!("{:?}", key)));
            }
            SpriteKey::Tile(ch) => {
                let cols = (self.tile_size / self.cell_w).max(1) as usize;
                let rows = (self.tile_size / self.cell_h).max(1) as usize;
                let row: String = std::iter::repeat(ch).take(cols).collect();
                let rows: Vec<&str> = std::iter::repeat(row.as_str()).take(rows).collect();
                FrameSet {
                    key,
                    frames: vec![Frame::from_glyphs(&rows, self.cell_w, self.cell_h)],
                }
            }
        };
        Ok(set)
    }
}

/// Glyph as it reads when the sprite is mirrored horizontally.
pub fn mirror_glyph(ch: char) -> char {
    match ch {
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '/' => '\\',
        '\\' => '/',
        other => other,
    }
}

// ── Bank ──────────────────────────────────────────────────────────────────────

/// Sheets resolved once at startup and shared by every entity that uses them.
pub struct SpriteBank {
    pub player: Arc<FrameSet>,
    pub bullet: Arc<FrameSet>,
    pub muzzle_flash: Arc<FrameSet>,
    pub flyer: Arc<FrameSet>,
    pub crawler: Arc<FrameSet>,
    tiles: HashMap<char, Arc<FrameSet>>,
}

impl SpriteBank {
    /// Resolve the fixed sheets.  A missing or empty sheet is fatal.
    pub fn load(provider: &dyn SpriteProvider) -> Result<Self> {
        Ok(Self {
            player: Self::fetch(provider, SpriteKey::Player)?,
            bullet: Self::fetch(provider, SpriteKey::Bullet)?,
            muzzle_flash: Self::fetch(provider, SpriteKey::MuzzleFlash)?,
            flyer: Self::fetch(provider, SpriteKey::Flyer)?,
            crawler: Self::fetch(provider, SpriteKey::Crawler)?,
            tiles: HashMap::new(),
        })
    }

    fn fetch(provider: &dyn SpriteProvider, key: SpriteKey) -> Result<Arc<FrameSet>> {
        let set = provider.sheet(key)?;
        if set.is_empty() {
            return Err(GameError::AssetMissing(format!("{:?} has no frames", key)));
        }
        Ok(Arc::new(set))
    }

    /// Load every tile glyph in `glyphs` that is not cached yet.
    pub fn preload_tiles(
        &mut self,
        provider: &dyn SpriteProvider,
        glyphs: impl IntoIterator<Item = char>,
    ) -> Result<()> {
        for ch in glyphs {
            if !self.tiles.contains_key(&ch) {
                let set = Self::fetch(provider, SpriteKey::Tile(ch))?;
                self.tiles.insert(ch, set);
            }
        }
        Ok(())
    }

    pub fn tile(&self, ch: char) -> Option<Arc<FrameSet>> {
        self.tiles.get(&ch).cloned()
    }
}
