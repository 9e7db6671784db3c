//! Input vocabulary shared by the keyboard and the gesture decoder.
//!
//! Both sources end up as `ControlEvent`s produced by diffing two
//! `ControlSet`s, so a held key and a held gesture look the same to the
//! player: one `Pressed`, nothing while held, one `Released`.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    MoveLeft,
    MoveRight,
    Jump,
    /// Fire, bound to `s` (the "special" key).
    Shoot,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::MoveLeft,
        Control::MoveRight,
        Control::Jump,
        Control::Shoot,
    ];

    fn index(self) -> usize {
        match self {
            Control::MoveLeft => 0,
            Control::MoveRight => 1,
            Control::Jump => 2,
            Control::Shoot => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Pressed(Control),
    Released(Control),
}

/// Which controls are held right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSet {
    held: [bool; 4],
}

impl ControlSet {
    pub fn is_held(&self, control: Control) -> bool {
        self.held[control.index()]
    }

    pub fn set(&mut self, control: Control, held: bool) {
        self.held[control.index()] = held;
    }

    pub fn apply(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Pressed(c) => self.set(c, true),
            ControlEvent::Released(c) => self.set(c, false),
        }
    }

    pub fn union(&self, other: &ControlSet) -> ControlSet {
        let mut out = *self;
        for c in Control::ALL {
            out.set(c, self.is_held(c) || other.is_held(c));
        }
        out
    }

    pub fn any(&self) -> bool {
        self.held.iter().any(|h| *h)
    }

    /// Move to `next`, returning one event per control that changed.
    /// Unchanged controls produce nothing.
    pub fn transition(&mut self, next: ControlSet) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        for c in Control::ALL {
            match (self.is_held(c), next.is_held(c)) {
                (false, true) => events.push(ControlEvent::Pressed(c)),
                (true, false) => events.push(ControlEvent::Released(c)),
                _ => {}
            }
        }
        *self = next;
        events
    }
}

// ── Menu / session commands ───────────────────────────────────────────────────

/// Discrete one-shot commands, acted on by whichever screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Confirm,
    Pause,
    /// End the current session and show the result.
    EndSession,
    /// Leave the program.
    Exit,
}

pub fn command_for(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    match code {
        KeyCode::Up => Some(Command::Up),
        KeyCode::Down => Some(Command::Down),
        KeyCode::Enter => Some(Command::Confirm),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::Pause),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::EndSession),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Exit),
        KeyCode::Esc => Some(Command::Exit),
        _ => None,
    }
}

fn control_for(code: &KeyCode) -> Option<Control> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Control::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Control::MoveRight),
        KeyCode::Char(' ') | KeyCode::Char('w') | KeyCode::Char('W') => Some(Control::Jump),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Control::Shoot),
        _ => None,
    }
}

// ── Keyboard tracking ─────────────────────────────────────────────────────────

/// Turns raw key events into control edges.
///
/// Terminals with keyboard enhancement send real releases, and a key is
/// held from its press until its release.  Classic terminals only repeat
/// presses, so there a key counts as held while its last press or repeat
/// is younger than `hold_window` frames.
#[derive(Debug)]
pub struct KeyboardTracker {
    key_frame: HashMap<KeyCode, u64>,
    frame: u64,
    hold_window: u64,
    release_events: bool,
    held: ControlSet,
}

impl KeyboardTracker {
    pub fn new(hold_window: u64) -> Self {
        Self {
            key_frame: HashMap::new(),
            frame: 0,
            hold_window,
            release_events: false,
            held: ControlSet::default(),
        }
    }

    /// Hold window covering roughly 150 ms at `framerate`.
    pub fn for_framerate(framerate: u32) -> Self {
        Self::new((framerate.max(1) as u64 * 15).div_ceil(100))
    }

    /// Trust `Release` events instead of the hold window.  Only for
    /// terminals that report key releases.
    pub fn with_release_events(mut self, enabled: bool) -> Self {
        self.release_events = enabled;
        self
    }

    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Record a key event.  Returns the menu/session command it maps to,
    /// if any; only presses produce commands.
    pub fn key_event(&mut self, event: &KeyEvent) -> Option<Command> {
        match event.kind {
            KeyEventKind::Press => {
                self.key_frame.insert(event.code, self.frame);
                command_for(event.code, event.modifiers)
            }
            KeyEventKind::Repeat => {
                self.key_frame.insert(event.code, self.frame);
                None
            }
            KeyEventKind::Release => {
                self.key_frame.remove(&event.code);
                None
            }
        }
    }

    fn is_held(&self, key: &KeyCode) -> bool {
        self.key_frame
            .get(key)
            .map(|&last| self.release_events || self.frame.saturating_sub(last) <= self.hold_window)
            .unwrap_or(false)
    }

    /// Control edges since the previous call.
    pub fn end_frame(&mut self) -> Vec<ControlEvent> {
        let mut next = ControlSet::default();
        for key in self.key_frame.keys() {
            if let Some(control) = control_for(key) {
                if self.is_held(key) {
                    next.set(control, true);
                }
            }
        }
        if !self.release_events {
            let frame = self.frame;
            let window = self.hold_window;
            self.key_frame
                .retain(|_, last| frame.saturating_sub(*last) <= window);
        }
        self.held.transition(next)
    }

    /// Forget every key, releasing anything held.
    pub fn reset(&mut self) -> Vec<ControlEvent> {
        self.key_frame.clear();
        self.held.transition(ControlSet::default())
    }
}
