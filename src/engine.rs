//! Ties the mode controller to the running level.
//!
//! The engine is the single owner of simulation state.  Input arrives as
//! commands and control edges, time arrives through `tick`, and the
//! controller's directives decide when a level is built, swapped or
//! dropped.  Every map the configured modes can reach is loaded and
//! checked up front so a broken asset stops the program before the first
//! frame.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::Clip;
use crate::camera::{Camera, RenderSink};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::game::{FrameReport, Game, InputSource};
use crate::input::{Command, ControlEvent};
use crate::level::{LevelData, LevelProvider};
use crate::mode::{Directive, ModeController, Screen};
use crate::sprites::{SpriteBank, SpriteProvider};

pub struct Engine {
    config: Arc<GameConfig>,
    sprites: Arc<SpriteBank>,
    levels: HashMap<String, LevelData>,
    controller: ModeController,
    game: Option<Game>,
    viewport: Vec2,
    rng: StdRng,
    sounds: Vec<Clip>,
}

impl Engine {
    pub fn new(
        config: GameConfig,
        levels: &dyn LevelProvider,
        sprites: &dyn SpriteProvider,
        viewport: Vec2,
    ) -> Result<Self> {
        let mut bank = SpriteBank::load(sprites)?;
        let mut loaded = HashMap::new();
        for name in config.modes.all_maps() {
            let level = levels.load(&name)?;
            level.validate()?;
            bank.preload_tiles(sprites, level.tile_glyphs())?;
            log::debug!("preloaded map '{}'", name);
            loaded.insert(name, level);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            controller: ModeController::new(config.modes.clone()),
            config: Arc::new(config),
            sprites: Arc::new(bank),
            levels: loaded,
            game: None,
            viewport,
            rng,
            sounds: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn screen(&self) -> &Screen {
        self.controller.screen()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.controller.is_finished()
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        if let Some(game) = &mut self.game {
            game.set_viewport(viewport);
        }
    }

    /// Clips queued since the last call.
    pub fn drain_sounds(&mut self) -> Vec<Clip> {
        std::mem::take(&mut self.sounds)
    }

    pub fn command(&mut self, cmd: Command) -> Result<()> {
        match self.controller.command(cmd) {
            Some(directive) => self.apply(directive),
            None => Ok(()),
        }
    }

    /// Control edges only matter while a level is loaded.
    pub fn control(&mut self, source: InputSource, event: ControlEvent) {
        if let Some(game) = &mut self.game {
            game.apply_control(source, event);
        }
    }

    /// Advance by `dt` seconds.  The world only moves while playing and not
    /// paused; the controller then checks the session's end conditions.
    pub fn tick(&mut self, dt: f32) -> Result<Option<FrameReport>> {
        let mut report = None;
        if self.controller.is_simulating() {
            if let (Some(game), Some(session)) = (&mut self.game, self.controller.session_mut()) {
                let frame = game.frame(dt, session);
                self.sounds.extend(frame.sounds.iter().copied());
                report = Some(frame);
            }
        }
        if let Some(directive) = self.controller.update(dt) {
            self.apply(directive)?;
        }
        Ok(report)
    }

    fn apply(&mut self, directive: Directive) -> Result<()> {
        log::debug!("directive {:?}", directive);
        match directive {
            Directive::StartLevel { map } => {
                let seed = self.rng.gen();
                let level = preloaded(&self.levels, &map)?;
                let game = Game::new(
                    level,
                    Arc::clone(&self.sprites),
                    Arc::clone(&self.config),
                    self.viewport,
                    seed,
                )?;
                self.game = Some(game);
                self.sounds.push(Clip::Music);
            }
            Directive::SwitchMap { map } => {
                let level = preloaded(&self.levels, &map)?;
                match &mut self.game {
                    Some(game) => game.load_level(level)?,
                    None => {
                        let seed = self.rng.gen();
                        self.game = Some(Game::new(
                            level,
                            Arc::clone(&self.sprites),
                            Arc::clone(&self.config),
                            self.viewport,
                            seed,
                        )?);
                    }
                }
            }
            Directive::EndLevel | Directive::Exit => {
                self.game = None;
            }
        }
        Ok(())
    }

    /// Draw the current level, if any, through `camera`.
    pub fn draw(&self, camera: &Camera, sink: &mut dyn RenderSink) {
        if let Some(game) = &self.game {
            camera.draw(game.world(), game.focus(), game.level_size(), sink);
        }
    }
}

fn preloaded<'a>(levels: &'a HashMap<String, LevelData>, map: &str) -> Result<&'a LevelData> {
    levels
        .get(map)
        .ok_or_else(|| GameError::AssetMissing(format!("map '{}' was not preloaded", map)))
}
