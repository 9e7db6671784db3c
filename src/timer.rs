//! Countdown timer driven by frame delta time.
//!
//! The "callback" is whatever the owner does when `advance` reports a
//! fire: the spawner creates an enemy, the player clears its shot cooldown,
//! a muzzle flash removes itself.  `advance_with` runs a closure in place
//! for owners that prefer that shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    /// Seconds between start and fire.
    pub duration: f32,
    elapsed: f32,
    pub repeat: bool,
    active: bool,
}

impl Timer {
    /// A timer that fires once per `start`.
    pub fn one_shot(duration: f32) -> Self {
        Self::new(duration, false, false)
    }

    /// A repeating timer that is already running.
    pub fn repeating(duration: f32) -> Self {
        Self::new(duration, true, true)
    }

    pub fn new(duration: f32, repeat: bool, autostart: bool) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            repeat,
            active: autostart,
        }
    }

    /// (Re)activate, discarding any progress.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    /// Deactivate without firing.
    pub fn stop(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Add `dt` and report whether the timer fired during this call.
    ///
    /// Fires at most once per call.  Overshoot past `duration` is dropped,
    /// not carried into the next period.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.duration {
            return false;
        }
        self.elapsed = 0.0;
        self.active = self.repeat;
        true
    }

    /// Like `advance`, running `on_fire` synchronously when the timer fires.
    pub fn advance_with<F: FnOnce()>(&mut self, dt: f32, on_fire: F) -> bool {
        let fired = self.advance(dt);
        if fired {
            on_fire();
        }
        fired
    }
}
