//! Menu and play-mode state machine.
//!
//! ```text
//! Menu ──Countdown──▶ TimeSelect ──20/40/60s──▶ Playing ──time up──▶ GameOver ──▶ Menu
//!   └───Adventure─────────────────────────────▶ Playing ◀─┐ score ≥ threshold:
//!                                                         └─ switch map, stay
//! ```
//!
//! The controller owns the only `ModeSession`.  It never touches the world
//! itself; transitions that need the level rebuilt or dropped come back to
//! the caller as `Directive`s.

use serde::{Deserialize, Serialize};

use crate::input::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeKind {
    /// Fixed duration, ends on timeout.
    Countdown,
    /// Open-ended, moves to the next map on reaching the score threshold.
    Adventure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeRules {
    /// Countdown lengths offered on the time-select screen, in seconds.
    pub countdown_options: Vec<u32>,
    pub adventure_threshold: u32,
    pub countdown_map: String,
    /// Adventure maps in order; the last one repeats.
    pub adventure_maps: Vec<String>,
    /// Seconds the result screen stays up before returning to the menu.
    pub game_over_secs: f32,
}

impl Default for ModeRules {
    fn default() -> Self {
        Self {
            countdown_options: vec![20, 40, 60],
            adventure_threshold: 500,
            countdown_map: "world2".to_string(),
            adventure_maps: vec!["world2".to_string(), "world".to_string()],
            game_over_secs: 5.0,
        }
    }
}

impl ModeRules {
    /// Every map a session could load, without duplicates.
    pub fn all_maps(&self) -> Vec<String> {
        let mut maps = vec![self.countdown_map.clone()];
        for m in &self.adventure_maps {
            if !maps.contains(m) {
                maps.push(m.clone());
            }
        }
        maps
    }

    fn adventure_map(&self, index: usize) -> String {
        let last = self.adventure_maps.len().saturating_sub(1);
        self.adventure_maps
            .get(index.min(last))
            .cloned()
            .unwrap_or_else(|| self.countdown_map.clone())
    }
}

/// Score and clock of one play session.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSession {
    pub mode: ModeKind,
    pub score: u32,
    /// Simulated seconds played on the current map.
    pub elapsed: f32,
    /// Countdown length; `None` in Adventure.
    pub duration: Option<f32>,
    pub map: String,
    /// Position in the adventure map sequence.
    pub map_index: usize,
}

impl ModeSession {
    pub fn countdown(duration: f32, map: String) -> Self {
        Self {
            mode: ModeKind::Countdown,
            score: 0,
            elapsed: 0.0,
            duration: Some(duration),
            map,
            map_index: 0,
        }
    }

    pub fn adventure(map: String) -> Self {
        Self {
            mode: ModeKind::Adventure,
            score: 0,
            elapsed: 0.0,
            duration: None,
            map,
            map_index: 0,
        }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Whole seconds left on the countdown, rounded down like the HUD shows.
    pub fn remaining_secs(&self) -> Option<u32> {
        self.duration
            .map(|d| (d - self.elapsed.floor()).max(0.0) as u32)
    }

    pub fn is_expired(&self) -> bool {
        self.duration.is_some_and(|d| self.elapsed >= d)
    }
}

pub const MENU_OPTIONS: [&str; 3] = ["Countdown", "Adventure", "Quit"];

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Menu { selected: usize },
    TimeSelect { selected: usize },
    Playing { session: ModeSession, paused: bool },
    GameOver { mode: ModeKind, final_score: u32, shown: f32 },
}

/// Work the caller must do to keep the world in step with the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Build a fresh level for a new session.
    StartLevel { map: String },
    /// Same session, new map: clear every group and load `map`.
    SwitchMap { map: String },
    /// The session is over; drop the level.
    EndLevel,
    /// Leave the program.
    Exit,
}

#[derive(Debug, Clone)]
pub struct ModeController {
    rules: ModeRules,
    screen: Screen,
    finished: bool,
}

fn cycle(selected: usize, len: usize, up: bool) -> usize {
    let len = len.max(1);
    if up {
        (selected + len - 1) % len
    } else {
        (selected + 1) % len
    }
}

impl ModeController {
    pub fn new(rules: ModeRules) -> Self {
        Self {
            rules,
            screen: Screen::Menu { selected: 0 },
            finished: false,
        }
    }

    pub fn rules(&self) -> &ModeRules {
        &self.rules
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn session(&self) -> Option<&ModeSession> {
        match &self.screen {
            Screen::Playing { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ModeSession> {
        match &mut self.screen {
            Screen::Playing { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.screen, Screen::Playing { paused: true, .. })
    }

    /// Simulation runs only while playing and not paused.
    pub fn is_simulating(&self) -> bool {
        matches!(self.screen, Screen::Playing { paused: false, .. })
    }

    fn finish(&mut self) -> Option<Directive> {
        log::info!("exit requested from {:?}", self.screen_name());
        self.finished = true;
        Some(Directive::Exit)
    }

    fn start(&mut self, session: ModeSession) -> Option<Directive> {
        log::info!(
            "starting {:?} on '{}' (duration {:?})",
            session.mode,
            session.map,
            session.duration
        );
        let map = session.map.clone();
        self.screen = Screen::Playing {
            session,
            paused: false,
        };
        Some(Directive::StartLevel { map })
    }

    fn end_session(&mut self) -> Option<Directive> {
        let Screen::Playing { session, .. } = &self.screen else {
            return None;
        };
        log::info!("{:?} session over, final score {}", session.mode, session.score);
        self.screen = Screen::GameOver {
            mode: session.mode,
            final_score: session.score,
            shown: 0.0,
        };
        Some(Directive::EndLevel)
    }

    pub fn screen_name(&self) -> &'static str {
        match self.screen {
            Screen::Menu { .. } => "menu",
            Screen::TimeSelect { .. } => "time-select",
            Screen::Playing { .. } => "playing",
            Screen::GameOver { .. } => "game-over",
        }
    }

    /// Apply a discrete command.  Commands the active screen does not use
    /// are ignored.
    pub fn command(&mut self, cmd: Command) -> Option<Directive> {
        if self.finished {
            return None;
        }
        if cmd == Command::Exit {
            return self.finish();
        }
        match &mut self.screen {
            Screen::Menu { selected } => match cmd {
                Command::Up | Command::Down => {
                    *selected = cycle(*selected, MENU_OPTIONS.len(), cmd == Command::Up);
                    None
                }
                Command::Confirm => match *selected {
                    0 => {
                        self.screen = Screen::TimeSelect { selected: 0 };
                        None
                    }
                    1 => {
                        let map = self.rules.adventure_map(0);
                        self.start(ModeSession::adventure(map))
                    }
                    _ => self.finish(),
                },
                _ => None,
            },
            Screen::TimeSelect { selected } => match cmd {
                Command::Up | Command::Down => {
                    let len = self.rules.countdown_options.len();
                    *selected = cycle(*selected, len, cmd == Command::Up);
                    None
                }
                Command::Confirm => {
                    let Some(secs) = self.rules.countdown_options.get(*selected).copied() else {
                        return None;
                    };
                    let map = self.rules.countdown_map.clone();
                    self.start(ModeSession::countdown(secs as f32, map))
                }
                Command::EndSession => {
                    self.screen = Screen::Menu { selected: 0 };
                    None
                }
                _ => None,
            },
            Screen::Playing { paused, .. } => match cmd {
                Command::Pause => {
                    *paused = !*paused;
                    log::debug!("paused = {}", *paused);
                    None
                }
                Command::EndSession => self.end_session(),
                _ => None,
            },
            Screen::GameOver { .. } => match cmd {
                Command::Confirm => {
                    self.screen = Screen::Menu { selected: 0 };
                    None
                }
                _ => None,
            },
        }
    }

    /// Per-frame bookkeeping, called after the simulation phases.
    ///
    /// Advances the session clock (not while paused), ends an expired
    /// countdown, switches map when an adventure crosses its threshold, and
    /// times out the result screen.
    pub fn update(&mut self, dt: f32) -> Option<Directive> {
        if self.finished {
            return None;
        }
        let threshold = self.rules.adventure_threshold;
        match &mut self.screen {
            Screen::Playing { paused: true, .. } => None,
            Screen::Playing { session, .. } => {
                session.elapsed += dt;
                match session.mode {
                    ModeKind::Countdown if session.is_expired() => self.end_session(),
                    ModeKind::Adventure if session.score >= threshold => {
                        let next = session.map_index + 1;
                        let map = self.rules.adventure_map(next);
                        log::info!(
                            "score {} reached {}, switching to '{}'",
                            session.score,
                            threshold,
                            map
                        );
                        session.map_index = next;
                        session.map = map.clone();
                        session.score = 0;
                        session.elapsed = 0.0;
                        Some(Directive::SwitchMap { map })
                    }
                    _ => None,
                }
            }
            Screen::GameOver { shown, .. } => {
                *shown += dt;
                if *shown >= self.rules.game_over_secs {
                    self.screen = Screen::Menu { selected: 0 };
                }
                None
            }
            Screen::Menu { .. } | Screen::TimeSelect { .. } => None,
        }
    }
}
