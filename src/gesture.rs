//! Hand-pose to control decoding.
//!
//! A binding compares two landmarks of one hand (a fingertip and the joint
//! below it) along one axis.  The decoder keeps the held state of every
//! binding per hand and only reports transitions of the combined state, so
//! holding a pose produces a single `Pressed` and letting go a single
//! `Released`.
//!
//! Capture runs on its own thread.  The decoded events cross to the game
//! loop over an `mpsc` channel and nothing else is shared.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::input::{Control, ControlEvent, ControlSet};

/// Landmarks per hand in the pose model's layout.
pub const LANDMARK_COUNT: usize = 21;

/// Normalized image coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

pub type Hand = Vec<Landmark>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// How the tip must relate to the joint for the control to be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Tip coordinate below the joint's (a raised finger on the y axis).
    Less,
    Greater,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureBinding {
    pub control: Control,
    pub tip: usize,
    pub joint: usize,
    pub axis: Axis,
    pub comparison: Comparison,
}

impl GestureBinding {
    pub fn new(control: Control, tip: usize, joint: usize, axis: Axis, comparison: Comparison) -> Self {
        Self {
            control,
            tip,
            joint,
            axis,
            comparison,
        }
    }

    /// Index finger, middle finger, thumb and pinky.
    pub fn default_layout() -> Vec<GestureBinding> {
        vec![
            GestureBinding::new(Control::MoveLeft, 8, 7, Axis::Y, Comparison::Less),
            GestureBinding::new(Control::MoveRight, 12, 11, Axis::Y, Comparison::Less),
            GestureBinding::new(Control::Jump, 4, 3, Axis::X, Comparison::Greater),
            GestureBinding::new(Control::Shoot, 20, 19, Axis::Y, Comparison::Less),
        ]
    }

    /// How far past the threshold the hand is; positive means held.
    /// `None` when the hand lacks either landmark.
    pub fn margin(&self, hand: &[Landmark]) -> Option<f32> {
        let tip = hand.get(self.tip)?;
        let joint = hand.get(self.joint)?;
        let (t, j) = match self.axis {
            Axis::X => (tip.x, joint.x),
            Axis::Y => (tip.y, joint.y),
        };
        Some(match self.comparison {
            Comparison::Less => j - t,
            Comparison::Greater => t - j,
        })
    }
}

// ── Decoder ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GestureDecoder {
    bindings: Vec<GestureBinding>,
    hysteresis: f32,
    /// Per tracked hand, per binding: held last frame.
    hands: Vec<Vec<bool>>,
    output: ControlSet,
}

impl GestureDecoder {
    pub fn new(bindings: Vec<GestureBinding>, hysteresis: f32) -> Self {
        Self {
            bindings,
            hysteresis: hysteresis.max(0.0),
            hands: Vec::new(),
            output: ControlSet::default(),
        }
    }

    /// Decode one frame.  `None` (no hand detected, or the frame could not
    /// be read) releases everything.
    pub fn decode(&mut self, hands: Option<&[Hand]>) -> Vec<ControlEvent> {
        let hands = hands.unwrap_or(&[]);
        self.hands.resize_with(hands.len(), || vec![false; self.bindings.len()]);

        for (state, hand) in self.hands.iter_mut().zip(hands) {
            for (held, binding) in state.iter_mut().zip(&self.bindings) {
                *held = match binding.margin(hand) {
                    None => false,
                    Some(m) if *held => m > -self.hysteresis,
                    Some(m) => m > self.hysteresis,
                };
            }
        }

        let mut combined = ControlSet::default();
        for i in 0..self.hands.len() {
            combined = combined.union(&self.hand_state(i));
        }
        self.output.transition(combined)
    }

    /// Controls held by tracked hand `index` as of the last decode.
    pub fn hand_state(&self, index: usize) -> ControlSet {
        let mut set = ControlSet::default();
        if let Some(state) = self.hands.get(index) {
            for (held, binding) in state.iter().zip(&self.bindings) {
                if *held {
                    set.set(binding.control, true);
                }
            }
        }
        set
    }

    pub fn held(&self) -> ControlSet {
        self.output
    }

    /// Release everything, returning the release events.
    pub fn release_all(&mut self) -> Vec<ControlEvent> {
        self.hands.clear();
        self.output.transition(ControlSet::default())
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// A recoverable failure to read one frame from the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameError(pub String);

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame acquisition failed: {}", self.0)
    }
}

impl std::error::Error for FrameError {}

/// Camera plus pose model.  Blocks for at most one frame period.
pub trait LandmarkSource: Send {
    /// `Ok(Some(hands))` for a frame (possibly with no hands),
    /// `Ok(None)` when the stream has ended.
    fn next_frame(&mut self) -> std::result::Result<Option<Vec<Hand>>, FrameError>;
}

/// Replays recorded frames from a JSON-lines file: one JSON array of hands
/// per line, each hand an array of `{x, y}` landmarks.  Blank lines and
/// `null` mean no hand in view.
pub struct ReplaySource<R> {
    lines: Lines<R>,
    cadence: Duration,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path, cadence: Duration) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| GameError::AssetMissing(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_reader(BufReader::new(file), cadence))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R, cadence: Duration) -> Self {
        Self {
            lines: reader.lines(),
            cadence,
        }
    }
}

impl<R: BufRead + Send> LandmarkSource for ReplaySource<R> {
    fn next_frame(&mut self) -> std::result::Result<Option<Vec<Hand>>, FrameError> {
        if !self.cadence.is_zero() {
            thread::sleep(self.cadence);
        }
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        let line = line.map_err(|e| FrameError(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let hands: Option<Vec<Hand>> =
            serde_json::from_str(line).map_err(|e| FrameError(e.to_string()))?;
        Ok(Some(hands.unwrap_or_default()))
    }
}

// ── Worker thread ─────────────────────────────────────────────────────────────

pub struct GestureWorker {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl GestureWorker {
    /// Start capturing on a dedicated thread.  Decoded events go to `tx`;
    /// the worker exits when the source ends, the receiver is dropped, or
    /// `shutdown` is called.
    pub fn spawn(
        mut source: Box<dyn LandmarkSource>,
        mut decoder: GestureDecoder,
        tx: mpsc::Sender<ControlEvent>,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("gesture-capture".into())
            .spawn(move || {
                let mut failures: u64 = 0;
                while !stop_flag.load(Ordering::Relaxed) {
                    let events = match source.next_frame() {
                        Ok(Some(hands)) => decoder.decode(Some(&hands)),
                        Ok(None) => {
                            log::info!("landmark stream ended");
                            for event in decoder.release_all() {
                                let _ = tx.send(event);
                            }
                            return;
                        }
                        Err(e) => {
                            failures += 1;
                            if failures == 1 || failures % 100 == 0 {
                                log::warn!("{} ({} so far)", e, failures);
                            }
                            decoder.decode(None)
                        }
                    };
                    for event in events {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            })?;
        Ok(Self {
            handle: Some(handle),
            stop,
        })
    }

    /// Ask the worker to stop and wait for it.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("gesture worker panicked");
            }
        }
    }
}

impl Drop for GestureWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
