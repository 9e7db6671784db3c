//! Fire-and-forget sound cues.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Shoot,
    Impact,
    Music,
}

impl Clip {
    pub fn key(self) -> &'static str {
        match self {
            Clip::Shoot => "shoot",
            Clip::Impact => "impact",
            Clip::Music => "music",
        }
    }
}

/// Plays clips by key.  Nothing is returned and nothing is awaited.
pub trait AudioSink {
    fn play(&mut self, clip: Clip);
}

/// The terminal has no mixer: clips are logged, and impacts can ring the bell.
pub struct TerminalAudio<W: Write> {
    out: W,
    bell: bool,
}

impl<W: Write> TerminalAudio<W> {
    pub fn new(out: W, bell: bool) -> Self {
        Self { out, bell }
    }
}

impl<W: Write> AudioSink for TerminalAudio<W> {
    fn play(&mut self, clip: Clip) {
        log::trace!("play {}", clip.key());
        if self.bell && clip == Clip::Impact {
            let _ = self.out.write_all(b"\x07");
            let _ = self.out.flush();
        }
    }
}
