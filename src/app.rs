//! Terminal front end: raw mode, input threads and the frame loop.

use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use glam::Vec2;

use crate::audio::{AudioSink, TerminalAudio};
use crate::config::GameConfig;
use crate::display::{self, TerminalCanvas};
use crate::engine::Engine;
use crate::error::Result;
use crate::game::InputSource;
use crate::gesture::{GestureDecoder, GestureWorker, ReplaySource};
use crate::input::{ControlEvent, KeyboardTracker};
use crate::level::LevelProvider;
use crate::sprites::SpriteProvider;

/// Set up the terminal, play until the mode controller exits, and restore
/// the terminal whatever happened.
pub fn run(
    config: GameConfig,
    levels: &dyn LevelProvider,
    sprites: &dyn SpriteProvider,
) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let cell = Vec2::new(config.display.cell_width, config.display.cell_height);
    let mut canvas = TerminalCanvas::new(cols, rows, cell, config.display.background);

    // Everything that can fail on bad assets happens before raw mode.
    let engine = Engine::new(config, levels, sprites, canvas.viewport())?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from terminals that can
    // report them.  Others keep the hold window.
    let keyboard_enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false)
        && out
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .is_ok();
    log::info!("key release events: {}", keyboard_enhanced);

    // Blocking event reads live on their own thread so the frame loop never
    // waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::Builder::new()
        .name("terminal-input".into())
        .spawn(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break; // receiver dropped → program exiting
                    }
                }
                Err(_) => break,
            }
        })?;

    let result = frame_loop(&mut out, engine, &mut canvas, &rx, keyboard_enhanced);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn start_gesture(config: &GameConfig) -> Option<(GestureWorker, mpsc::Receiver<ControlEvent>)> {
    let gesture = &config.gesture;
    if !gesture.enabled {
        return None;
    }
    let Some(path) = &gesture.replay_path else {
        log::warn!("gesture input enabled but no replay source configured");
        return None;
    };
    let cadence = Duration::from_millis(gesture.cadence_ms);
    let source = match ReplaySource::open(path, cadence) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("gesture input disabled: {}", e);
            return None;
        }
    };
    let decoder = GestureDecoder::new(gesture.bindings.clone(), gesture.hysteresis);
    let (tx, rx) = mpsc::channel();
    match GestureWorker::spawn(Box::new(source), decoder, tx) {
        Ok(worker) => Some((worker, rx)),
        Err(e) => {
            log::warn!("gesture worker failed to start: {}", e);
            None
        }
    }
}

/// Input → simulation → render, once per frame, until the engine is done.
fn frame_loop<W: Write>(
    out: &mut W,
    mut engine: Engine,
    canvas: &mut TerminalCanvas,
    rx: &mpsc::Receiver<Event>,
    release_events: bool,
) -> Result<()> {
    let framerate = engine.config().display.framerate.max(1);
    let frame_time = Duration::from_secs_f32(1.0 / framerate as f32);
    let mut keys = KeyboardTracker::for_framerate(framerate).with_release_events(release_events);
    let mut audio = TerminalAudio::new(stdout(), engine.config().audio.bell);
    let gesture = start_gesture(engine.config());
    let mut last = Instant::now();

    while !engine.is_finished() {
        let frame_start = Instant::now();
        keys.begin_frame();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(key) => {
                    if let Some(cmd) = keys.key_event(&key) {
                        engine.command(cmd)?;
                    }
                }
                Event::Resize(cols, rows) => {
                    canvas.resize(cols, rows);
                    engine.set_viewport(canvas.viewport());
                }
                _ => {}
            }
        }
        for edge in keys.end_frame() {
            engine.control(InputSource::Keyboard, edge);
        }
        if let Some((_, gesture_rx)) = &gesture {
            while let Ok(edge) = gesture_rx.try_recv() {
                engine.control(InputSource::Gesture, edge);
            }
        }

        // ── Simulate ──────────────────────────────────────────────────────────
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        engine.tick(dt)?;
        for clip in engine.drain_sounds() {
            audio.play(clip);
        }

        display::render(out, &engine, canvas)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }

    if let Some((worker, _)) = gesture {
        worker.shutdown();
    }
    Ok(())
}
