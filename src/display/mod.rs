//! Terminal rendering.  All terminal output lives here.
//!
//! The world is drawn through the camera into a `TerminalCanvas`, one
//! glyph per cell, then screens and the HUD are printed on top.  No game
//! logic is performed; this module only translates state into terminal
//! commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use glam::Vec2;

use crate::camera::{Camera, DrawCall, RenderSink};
use crate::engine::Engine;
use crate::entities::Layer;
use crate::mode::{ModeKind, Screen, MENU_OPTIONS};
use crate::sprites::{mirror_glyph, SpriteKey};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_TITLE: Color = Color::Cyan;
const C_SELECTED: Color = Color::Yellow;
const C_OPTION: Color = Color::White;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_TIME: Color = Color::Red;
const C_HUD_MAP: Color = Color::Green;
const C_HINT: Color = Color::DarkGrey;
const C_PLAYER: Color = Color::White;
const C_BULLET: Color = Color::Cyan;
const C_FLASH: Color = Color::Yellow;
const C_FLYER: Color = Color::Yellow;
const C_CRAWLER: Color = Color::Magenta;
const C_TILE: Color = Color::DarkGreen;
const C_DECORATION: Color = Color::DarkGrey;

fn color_for(key: SpriteKey, layer: Layer) -> Color {
    match key {
        SpriteKey::Player => C_PLAYER,
        SpriteKey::Bullet => C_BULLET,
        SpriteKey::MuzzleFlash => C_FLASH,
        SpriteKey::Flyer => C_FLYER,
        SpriteKey::Crawler => C_CRAWLER,
        SpriteKey::Tile(_) if layer == Layer::Decoration => C_DECORATION,
        SpriteKey::Tile(_) => C_TILE,
    }
}

// ── Canvas ────────────────────────────────────────────────────────────────────

/// A grid of coloured glyphs covering the viewport.  Later draw calls
/// overwrite earlier ones, so back-to-front order gives correct layering.
#[derive(Debug, Clone)]
pub struct TerminalCanvas {
    cols: u16,
    rows: u16,
    cell: Vec2,
    background: char,
    cells: Vec<(char, Color)>,
}

impl TerminalCanvas {
    pub fn new(cols: u16, rows: u16, cell: Vec2, background: char) -> Self {
        Self {
            cols,
            rows,
            cell,
            background,
            cells: vec![(background, C_HINT); cols as usize * rows as usize],
        }
    }

    /// World pixels the canvas covers.
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.cols as f32 * self.cell.x, self.rows as f32 * self.cell.y)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self::new(cols, rows, self.cell, self.background);
    }

    pub fn clear(&mut self) {
        self.cells.fill((self.background, C_HINT));
    }

    pub fn get(&self, col: u16, row: u16) -> Option<char> {
        self.cells
            .get(row as usize * self.cols as usize + col as usize)
            .filter(|_| col < self.cols && row < self.rows)
            .map(|(ch, _)| *ch)
    }

    fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return;
        }
        self.cells[row as usize * self.cols as usize + col as usize] = (ch, color);
    }

    fn flush_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, row))?;
            let mut current: Option<Color> = None;
            let mut run = String::new();
            let start = row as usize * self.cols as usize;
            for &(ch, color) in &self.cells[start..start + self.cols as usize] {
                if current != Some(color) {
                    if !run.is_empty() {
                        out.queue(Print(&run))?;
                        run.clear();
                    }
                    out.queue(style::SetForegroundColor(color))?;
                    current = Some(color);
                }
                run.push(ch);
            }
            out.queue(Print(&run))?;
        }
        Ok(())
    }
}

impl RenderSink for TerminalCanvas {
    fn draw(&mut self, call: &DrawCall) {
        let frame = call.frame.frame();
        let color = color_for(call.frame.sheet.key, call.layer);
        let col0 = (call.screen_pos.x / self.cell.x).round() as i32;
        let row0 = (call.screen_pos.y / self.cell.y).round() as i32;
        for (r, line) in frame.glyphs.iter().enumerate() {
            let glyphs: Vec<char> = line.chars().collect();
            let width = glyphs.len();
            for (c, &ch) in glyphs.iter().enumerate() {
                let (c, ch) = if call.frame.flip_x {
                    (width - 1 - c, mirror_glyph(ch))
                } else {
                    (c, ch)
                };
                if ch == ' ' {
                    continue;
                }
                self.put(col0 + c as i32, row0 + r as i32, ch, color);
            }
        }
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame for whatever screen is active.
pub fn render<W: Write>(
    out: &mut W,
    engine: &Engine,
    canvas: &mut TerminalCanvas,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let (width, height) = (canvas.cols, canvas.rows);

    match engine.screen() {
        Screen::Menu { selected } => {
            draw_options(out, width, height, "RABBIT  SHOOTER", &MENU_OPTIONS, *selected)?;
        }
        Screen::TimeSelect { selected } => {
            let labels: Vec<String> = engine
                .controller()
                .rules()
                .countdown_options
                .iter()
                .map(|s| format!("{} seconds", s))
                .collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            draw_options(out, width, height, "COUNTDOWN", &labels, *selected)?;
        }
        Screen::Playing { session, paused } => {
            canvas.clear();
            engine.draw(&Camera::new(canvas.viewport()), canvas);
            canvas.flush_to(out)?;

            let time = session.remaining_secs().map(|s| format!("Time: {:>3}", s));
            draw_hud(out, width, session.score, time.as_deref(), &session.map)?;
            if *paused {
                draw_centered(out, width, height / 2, "-- PAUSED --", C_SELECTED)?;
                draw_centered(out, width, height / 2 + 1, "P : Resume   Q : End", C_HINT)?;
            }
        }
        Screen::GameOver { mode, final_score, .. } => {
            draw_game_over(out, width, height, *mode, *final_score)?;
        }
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn draw_centered<W: Write>(
    out: &mut W,
    width: u16,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = (width / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

// ── Menus ─────────────────────────────────────────────────────────────────────

fn draw_options<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    title: &str,
    options: &[&str],
    selected: usize,
) -> std::io::Result<()> {
    let cy = height / 2;
    draw_centered(out, width, cy.saturating_sub(4), title, C_TITLE)?;

    for (i, label) in options.iter().enumerate() {
        let row = cy.saturating_sub(1) + i as u16;
        let (marker, color) = if i == selected {
            ("> ", C_SELECTED)
        } else {
            ("  ", C_OPTION)
        };
        draw_centered(out, width, row, &format!("{}{:<12}", marker, label), color)?;
    }

    draw_centered(
        out,
        width,
        cy + options.len() as u16 + 1,
        "↑ ↓ : Select   ENTER : Confirm   ESC : Exit",
        C_HINT,
    )
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    width: u16,
    score: u32,
    time: Option<&str>,
    map: &str,
) -> std::io::Result<()> {
    // Score, left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>6}", score)))?;

    // Map, centre
    draw_centered(out, width, 0, &format!("[ {} ]", map), C_HUD_MAP)?;

    // Countdown, right
    if let Some(time) = time {
        let col = width.saturating_sub(time.chars().count() as u16 + 1);
        out.queue(cursor::MoveTo(col, 0))?;
        out.queue(style::SetForegroundColor(C_HUD_TIME))?;
        out.queue(Print(time))?;
    }
    Ok(())
}

// ── Game-over screen ──────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    mode: ModeKind,
    final_score: u32,
) -> std::io::Result<()> {
    let score_line = format!("Final Score: {}", final_score);
    let mode_line = match mode {
        ModeKind::Countdown => "Countdown",
        ModeKind::Adventure => "Adventure",
    };
    let lines: &[(&str, Color)] = &[
        ("╔══════════════════╗", Color::Red),
        ("║    GAME  OVER    ║", Color::Red),
        ("╚══════════════════╝", Color::Red),
        (mode_line, C_HINT),
        (&score_line, C_HUD_SCORE),
        ("ENTER - Menu   ESC - Exit", C_OPTION),
    ];

    let start_row = (height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        draw_centered(out, width, start_row + i as u16, msg, *color)?;
    }
    Ok(())
}
